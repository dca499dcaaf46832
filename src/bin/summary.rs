//! Filtering Summary Tool
//!
//! Counts records before/after filtering and renders a plain-text summary,
//! optionally folding in the splitter's per-class counts and indel length
//! histogram.

use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use svpost_tools::reporting::{self, CountSummary};
use svpost_tools::split::SplitStats;
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-summary")
        .version("0.1.0")
        .about("Before/after record counts and indel statistics")
        .author("Megan Johnson")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("VCF")
                .help("Original (pre-filter) VCF file")
                .required(true),
        )
        .arg(
            Arg::new("filtered")
                .short('f')
                .long("filtered")
                .value_name("VCF")
                .help("Filtered VCF file")
                .required(true),
        )
        .arg(
            Arg::new("split_stats")
                .long("split-stats")
                .value_name("JSON")
                .help("Splitter statistics JSON to include in the summary"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("TXT")
                .help("Write the plain-text summary to this file as well"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output statistics JSON file")
                .default_value("summary_stats.json"),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let filtered_file = PathBuf::from(matches.get_one::<String>("filtered").unwrap());
    let stats_file = PathBuf::from(matches.get_one::<String>("stats").unwrap());

    println!("📊 Filtering Summary Tool");
    println!("Input: {}", input_file.display());
    println!("Filtered: {}", filtered_file.display());

    let before = reporting::count_records(&input_file)?;
    let after = reporting::count_records(&filtered_file)?;
    let mut summary = CountSummary::new(before, after)?;

    if let Some(split_path) = matches.get_one::<String>("split_stats") {
        let json = std::fs::read_to_string(split_path)?;
        let split: SplitStats = serde_json::from_str(&json)?;
        summary = summary.with_split(split);
    }

    let text = summary.render_text();
    print!("{}", text);
    if let Some(output) = matches.get_one::<String>("output") {
        std::fs::write(output, &text)?;
        println!("📝 Summary written to: {}", output);
    }

    summary.export_json(&stats_file)?;
    println!("💾 Statistics saved to: {}", stats_file.display());

    Ok(())
}
