//! Post-processing Pipeline Tool
//!
//! Runs the full per-file pipeline (threshold estimation, predicate
//! filtering, SNP/indel splitting) for a batch of caller outputs. One
//! failing file never aborts the batch; failures land in the report.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use svpost_tools::depth::{CallerTool, ThresholdPair};
use svpost_tools::pipeline::{self, PipelineConfig};
use svpost_tools::reporting::CountSummary;
use svpost_tools::vcf::Genotype;
use svpost_tools::ToolStats;

fn main() -> Result<()> {
    let matches = Command::new("svpost-pipeline")
        .version("0.1.0")
        .about("Batch post-processing of variant caller outputs")
        .author("Megan Johnson")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("TOOL=VCF")
                .help("Caller and its VCF, e.g. sniffles2=s1.vcf.gz (repeatable)")
                .action(ArgAction::Append)
                .required(true),
        )
        .arg(
            Arg::new("outdir")
                .short('O')
                .long("outdir")
                .value_name("DIR")
                .help("Directory receiving filtered/split outputs")
                .default_value("."),
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
                .help("Explicit minimum depth for every run (requires --max-dp)")
                .requires("max_dp"),
        )
        .arg(
            Arg::new("max_dp")
                .long("max-dp")
                .value_name("DP")
                .help("Explicit maximum depth for every run (requires --min-dp)")
                .requires("min_dp"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("JSON")
                .help("Output batch report JSON file")
                .default_value("pipeline_report.json"),
        )
        .get_matches();

    let outdir = PathBuf::from(matches.get_one::<String>("outdir").unwrap());
    let report_file = PathBuf::from(matches.get_one::<String>("report").unwrap());
    let genotype_arg = matches.get_one::<String>("genotype").unwrap();
    let genotype = Genotype::parse(genotype_arg)
        .ok_or_else(|| anyhow::anyhow!("invalid genotype pattern: {}", genotype_arg))?;
    let vaf_low: f64 = matches.get_one::<String>("vaf_low").unwrap().parse()?;
    let vaf_high: f64 = matches.get_one::<String>("vaf_high").unwrap().parse()?;

    let thresholds = match (
        matches.get_one::<String>("min_dp"),
        matches.get_one::<String>("max_dp"),
    ) {
        (Some(min), Some(max)) => Some(ThresholdPair::new(min.parse()?, max.parse()?)?),
        _ => None,
    };

    let mut inputs = Vec::new();
    for entry in matches.get_many::<String>("input").unwrap() {
        let (tool_name, path) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected TOOL=VCF, got: {}", entry))?;
        let tool = CallerTool::from_name(tool_name)
            .ok_or_else(|| anyhow::anyhow!("unknown caller tool: {}", tool_name))?;
        inputs.push((PathBuf::from(path), tool));
    }

    println!("🧬 SV/SNP Post-processing Pipeline");
    println!("Runs: {}", inputs.len());
    println!("Output directory: {}", outdir.display());
    std::fs::create_dir_all(&outdir)?;

    let config = PipelineConfig {
        genotype,
        vaf_low,
        vaf_high,
        thresholds,
        outdir,
    };
    let report = pipeline::run_batch(&inputs, &config);

    for run in &report.runs {
        println!("✅ {}", run.status_line());
        let summary = CountSummary::new(run.records_before(), run.records_after())?
            .with_split(run.split.clone());
        for line in summary.render_text().lines() {
            println!("   {}", line);
        }
    }
    for failure in &report.failures {
        println!("❌ {} {}: {}", failure.tool, failure.input, failure.reason);
    }

    println!(
        "📈 Batch complete: {} processed, {} failed",
        report.processed(),
        report.failed()
    );
    report.export_json(&report_file)?;
    println!("💾 Report saved to: {}", report_file.display());

    if report.processed() == 0 && report.failed() > 0 {
        anyhow::bail!("every input failed");
    }
    Ok(())
}
