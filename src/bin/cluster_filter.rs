//! Variant Cluster Filter Tool
//!
//! Removes variants packed closer together than expected under a random
//! placement model. Densities are measured separately for a designated
//! high-density chromosome (SDR) and the remaining background; both
//! members of any too-close pair are removed.

use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use svpost_tools::cluster::{ClusterConfig, ClusterFilter};
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-cluster-filter")
        .version("0.1.0")
        .about("Density-based variant cluster filtering")
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
            Arg::new("sdr_chrom")
                .long("sdr-chrom")
                .value_name("CHROM")
                .help("Chromosome treated as its own high-density region")
                .default_value("Chr1_RagTag"),
        )
        .arg(
            Arg::new("p_value")
                .short('p')
                .long("p-value")
                .value_name("P")
                .help("Gap probability cutoff under the random placement model")
                .default_value("0.05"),
        )
        .arg(
            Arg::new("min_threshold")
                .long("min-threshold")
                .value_name("BP")
                .help("Lower bound for the gap threshold in bp")
                .default_value("10"),
        )
        .arg(
            Arg::new("fai")
                .long("fai")
                .value_name("FAI")
                .help("Genome .fai index for contig lengths (wins over ##contig headers)"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output statistics JSON file")
                .default_value("cluster_stats.json"),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output_file = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let stats_file = PathBuf::from(matches.get_one::<String>("stats").unwrap());

    let config = ClusterConfig {
        sdr_chrom: matches.get_one::<String>("sdr_chrom").unwrap().clone(),
        p_value: matches.get_one::<String>("p_value").unwrap().parse()?,
        min_threshold: matches.get_one::<String>("min_threshold").unwrap().parse()?,
        fai: matches.get_one::<String>("fai").map(PathBuf::from),
    };

    println!("🧬 Variant Cluster Filter");
    println!("Input: {}", input_file.display());
    println!("Output: {}", output_file.display());
    println!(
        "SDR chromosome: {}, p-value: {}, floor: {} bp",
        config.sdr_chrom, config.p_value, config.min_threshold
    );

    let stats = ClusterFilter::new(config).filter_file(&input_file, &output_file)?;

    println!("📊 Cluster Filtering Results:");
    println!(
        "  SDR density: {:.6}/bp -> threshold {} bp",
        stats.density_sdr, stats.threshold_sdr
    );
    println!(
        "  Background density: {:.6}/bp -> threshold {} bp",
        stats.density_background, stats.threshold_background
    );
    println!("  Kept: {}", stats.kept);
    println!("  Removed: {}", stats.removed);

    stats.export_json(&stats_file)?;
    println!("💾 Statistics saved to: {}", stats_file.display());

    Ok(())
}
