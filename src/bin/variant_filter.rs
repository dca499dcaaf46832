//! Variant Predicate Filter Tool
//!
//! Filter VCF records on genotype pattern, allele-fraction range and depth
//! range. Depth cutoffs are estimated from the input unless both --min-dp
//! and --max-dp are given.

use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use svpost_tools::depth::{self, CallerTool, ThresholdPair};
use svpost_tools::filter::{FilterCriteria, VariantFilter};
use svpost_tools::vcf::Genotype;
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-filter")
        .version("0.1.0")
        .about("Filter variant records on genotype, allele fraction and depth")
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
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("VCF")
                .help("Output filtered VCF file")
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
            Arg::new("genotype")
                .long("genotype")
                .value_name("GT")
                .help("Heterozygous genotype pattern to keep")
                .default_value("0/1"),
        )
        .arg(
            Arg::new("vaf_low")
                .long("vaf-low")
                .value_name("FRACTION")
                .help("Inclusive lower allele-fraction bound")
                .default_value("0.35"),
        )
        .arg(
            Arg::new("vaf_high")
                .long("vaf-high")
                .value_name("FRACTION")
                .help("Inclusive upper allele-fraction bound")
                .default_value("0.65"),
        )
        .arg(
            Arg::new("min_dp")
                .long("min-dp")
                .value_name("DP")
                .help("Explicit minimum depth (requires --max-dp)")
                .requires("max_dp"),
        )
        .arg(
            Arg::new("max_dp")
                .long("max-dp")
                .value_name("DP")
                .help("Explicit maximum depth (requires --min-dp)")
                .requires("min_dp"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output statistics JSON file")
                .default_value("filter_stats.json"),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output_file = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let tool_name = matches.get_one::<String>("tool").unwrap();
    let stats_file = PathBuf::from(matches.get_one::<String>("stats").unwrap());
    let vaf_low: f64 = matches.get_one::<String>("vaf_low").unwrap().parse()?;
    let vaf_high: f64 = matches.get_one::<String>("vaf_high").unwrap().parse()?;

    let tool = CallerTool::from_name(tool_name)
        .ok_or_else(|| anyhow::anyhow!("unknown caller tool: {}", tool_name))?;
    let genotype_arg = matches.get_one::<String>("genotype").unwrap();
    let genotype = Genotype::parse(genotype_arg)
        .ok_or_else(|| anyhow::anyhow!("invalid genotype pattern: {}", genotype_arg))?;
    if vaf_low > vaf_high {
        anyhow::bail!("--vaf-low must not exceed --vaf-high");
    }

    println!("🎯 Variant Predicate Filter");
    println!("Input: {}", input_file.display());
    println!("Output: {}", output_file.display());
    println!("Tool: {}", tool.name());
    println!(
        "Criteria: GT={}, VAF=[{:.2}, {:.2}]",
        genotype, vaf_low, vaf_high
    );

    let thresholds = match (
        matches.get_one::<String>("min_dp"),
        matches.get_one::<String>("max_dp"),
    ) {
        (Some(min), Some(max)) => ThresholdPair::new(min.parse()?, max.parse()?)?,
        _ => {
            println!("📐 Estimating depth thresholds from input...");
            let depths = depth::collect_depths(&input_file, tool.strategy())?;
            ThresholdPair::from_depths(&depths)?
        }
    };
    println!(
        "Depth range: [{}, {}]",
        thresholds.min_dp, thresholds.max_dp
    );

    let filter = VariantFilter::new(FilterCriteria {
        genotype,
        vaf_low,
        vaf_high,
        depth: thresholds,
        tool,
    });
    let stats = filter.filter_file(&input_file, &output_file)?;

    println!("📊 Filtering Results:");
    println!("  Records seen: {}", stats.total_seen);
    println!("  Passed: {}", stats.passed);
    println!(
        "  Failed predicates: {} (GT {}, VAF {}, DP {})",
        stats.failed(),
        stats.failed_genotype,
        stats.failed_vaf,
        stats.failed_depth
    );
    println!(
        "  Skipped (missing data): {} (GT {}, DP {}, VAF {})",
        stats.skipped(),
        stats.skipped_no_genotype,
        stats.skipped_no_depth,
        stats.skipped_no_vaf
    );
    println!("  Malformed lines: {}", stats.malformed);

    stats.export_json(&stats_file)?;
    println!("💾 Statistics saved to: {}", stats_file.display());

    Ok(())
}
