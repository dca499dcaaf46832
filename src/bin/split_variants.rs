//! Variant Class Splitter Tool
//!
//! Splits a filtered VCF into SNP and indel outputs by comparing ref/alt
//! allele lengths. Multi-allelic records are classified by their first
//! alternate allele.

use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use svpost_tools::split::{VariantSplitter, LENGTH_BIN_LABELS};
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-split")
        .version("0.1.0")
        .about("Split a filtered VCF into SNP and indel outputs")
        .author("Megan Johnson")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("VCF")
                .help("Input (filtered) VCF file")
                .required(true),
        )
        .arg(
            Arg::new("snp")
                .long("snp")
                .value_name("VCF")
                .help("Output VCF for SNP records")
                .required(true),
        )
        .arg(
            Arg::new("indel")
                .long("indel")
                .value_name("VCF")
                .help("Output VCF for indel records")
                .required(true),
        )
        .arg(
            Arg::new("other")
                .long("other")
                .value_name("VCF")
                .help("Output VCF for MNP/symbolic records (counted but unwritten if omitted)"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output statistics JSON file")
                .default_value("split_stats.json"),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let snp_file = PathBuf::from(matches.get_one::<String>("snp").unwrap());
    let indel_file = PathBuf::from(matches.get_one::<String>("indel").unwrap());
    let other_file = matches.get_one::<String>("other").map(PathBuf::from);
    let stats_file = PathBuf::from(matches.get_one::<String>("stats").unwrap());

    println!("🧬 Variant Class Splitter");
    println!("Input: {}", input_file.display());
    println!("SNP output: {}", snp_file.display());
    println!("Indel output: {}", indel_file.display());

    let stats = VariantSplitter.split_file(&input_file, &snp_file, &indel_file, other_file.as_ref())?;

    println!("📊 Split Results:");
    println!("  Total records: {}", stats.total);
    println!("  SNPs: {}", stats.snps);
    println!("  Indels: {}", stats.indels);
    println!("  Other (MNP/symbolic): {}", stats.other);
    println!("  Malformed lines: {}", stats.malformed);
    println!("  Indel lengths (ins/del per bin):");
    for (i, label) in LENGTH_BIN_LABELS.iter().enumerate() {
        println!(
            "    {:>5} bp : {} / {}",
            label, stats.histogram.insertions[i], stats.histogram.deletions[i]
        );
    }

    stats.export_json(&stats_file)?;
    println!("💾 Statistics saved to: {}", stats_file.display());

    Ok(())
}
