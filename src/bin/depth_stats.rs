//! Depth Distribution Stats Tool
//!
//! Scans a VCF for per-record depth, reports the distribution (quantiles +
//! ASCII histogram) and suggests adaptive minDP/maxDP cutoffs. The final
//! stdout line is the machine-parsable pair `minDP<TAB>maxDP`; everything
//! human-readable goes to stderr.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use svpost_tools::depth::{self, CallerTool, DepthStats, ThresholdPair};
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-depth-stats")
        .version("0.1.0")
        .about("Depth distribution statistics and adaptive minDP/maxDP estimation")
        .author("Megan Johnson")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("VCF")
                .help("Input VCF file (gzip supported)")
                .required(true),
        )
        .arg(
            Arg::new("tool")
                .short('t')
                .long("tool")
                .value_name("CALLER")
                .help("Variant caller: cutesv, sniffles2, svim, pbsv, deepvariant")
                .required(true),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output statistics JSON file")
                .default_value("depth_stats.json"),
        )
        .arg(
            Arg::new("no_histogram")
                .long("no-histogram")
                .help("Skip the ASCII depth histogram")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let tool_name = matches.get_one::<String>("tool").unwrap();
    let stats_file = PathBuf::from(matches.get_one::<String>("stats").unwrap());

    let tool = CallerTool::from_name(tool_name)
        .ok_or_else(|| anyhow::anyhow!("unknown caller tool: {}", tool_name))?;

    eprintln!("🧬 Depth Distribution Stats");
    eprintln!("Input: {}", input_file.display());
    eprintln!("Tool: {}", tool.name());
    eprintln!("Reading VCF file: {} ...", input_file.display());

    let depths = depth::collect_depths(&input_file, tool.strategy())?;
    let stats = DepthStats::from_depths(&depths)?;
    let thresholds = ThresholdPair::from_depths(&depths)?;

    eprintln!("\n==== DP Statistics ====");
    eprintln!("Total variants : {}", stats.count);
    eprintln!("Min DP         : {}", stats.min);
    eprintln!("Mean DP        : {:.2}", stats.mean);
    eprintln!("Max DP         : {}", stats.max);

    eprintln!("\n---- Quantiles Distribution ----");
    for (name, value) in &stats.quantiles {
        eprintln!("{:12}: {:.2}", name, value);
    }

    eprintln!("\n==== Recommended Filters ====");
    eprintln!("Anchor (Median): {:.2}", stats.median);
    eprintln!("Strategy       : [ 0.5 * Median, 2.0 * Median ]");
    eprintln!("Suggested minDP : {}", thresholds.min_dp);
    eprintln!("Suggested maxDP : {}", thresholds.max_dp);

    if !matches.get_flag("no_histogram") {
        eprintln!(
            "\n==== DP Histogram (Cutoff Preview: {}-{}) ====",
            thresholds.min_dp, thresholds.max_dp
        );
        eprint!("{}", depth::render_histogram(&depths, &stats, thresholds));
    }

    stats.export_json(&stats_file)?;
    eprintln!("💾 Statistics saved to: {}", stats_file.display());

    // machine-parsable threshold pair for downstream orchestration
    println!("{}", thresholds);

    Ok(())
}
