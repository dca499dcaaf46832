//! Per-file pipeline driver and batch runner
//!
//! For one (file, tool) pair: estimate depth thresholds, filter, split into
//! SNP/indel outputs. Failures are values, not aborts: each run yields a
//! `Result<ToolRunSummary, PipelineError>` and the batch runner records
//! failures and moves on to the next file.

use crate::depth::{self, CallerTool, ThresholdPair};
use crate::filter::{FilterCriteria, VariantFilter};
use crate::reporting::{BatchReport, RunFailure, ToolRunSummary};
use crate::split::VariantSplitter;
use crate::vcf::Genotype;
use crate::{sample_name_from_path, SvpostError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A per-file pipeline failure: which input, which tool, what went wrong
#[derive(Error, Debug)]
#[error("{tool} {input}: {source}")]
pub struct PipelineError {
    pub tool: String,
    pub input: String,
    #[source]
    pub source: SvpostError,
}

/// Settings shared by every run in a batch
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Heterozygous genotype pattern to keep
    pub genotype: Genotype,
    pub vaf_low: f64,
    pub vaf_high: f64,
    /// Explicit thresholds; when `None` they are estimated per file
    pub thresholds: Option<ThresholdPair>,
    /// Directory receiving the filtered/split outputs
    pub outdir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            genotype: Genotype {
                a: 0,
                b: 1,
                phased: false,
            },
            vaf_low: 0.35,
            vaf_high: 0.65,
            thresholds: None,
            outdir: PathBuf::from("."),
        }
    }
}

/// Output paths for one run, derived from the sample name and tool
pub struct RunOutputs {
    pub filtered: PathBuf,
    pub snps: PathBuf,
    pub indels: PathBuf,
    pub other: PathBuf,
}

impl RunOutputs {
    pub fn for_run(outdir: &Path, sample: &str, tool: CallerTool) -> RunOutputs {
        let stem = format!("{}.{}", sample, tool.name());
        RunOutputs {
            filtered: outdir.join(format!("{}.filtered.vcf", stem)),
            snps: outdir.join(format!("{}.snp.vcf", stem)),
            indels: outdir.join(format!("{}.indel.vcf", stem)),
            other: outdir.join(format!("{}.other.vcf", stem)),
        }
    }
}

/// Run the full pipeline for one input file
pub fn run_tool(
    input: &Path,
    tool: CallerTool,
    config: &PipelineConfig,
) -> Result<ToolRunSummary, PipelineError> {
    let fail = |source: SvpostError| PipelineError {
        tool: tool.name().to_string(),
        input: input.display().to_string(),
        source,
    };

    let thresholds = match config.thresholds {
        Some(pair) => pair,
        None => {
            let depths = depth::collect_depths(input, tool.strategy()).map_err(fail)?;
            ThresholdPair::from_depths(&depths).map_err(fail)?
        }
    };

    let sample = sample_name_from_path(input);
    let outputs = RunOutputs::for_run(&config.outdir, &sample, tool);

    let filter = VariantFilter::new(FilterCriteria {
        genotype: config.genotype,
        vaf_low: config.vaf_low,
        vaf_high: config.vaf_high,
        depth: thresholds,
        tool,
    });
    let filter_stats = filter.filter_file(input, &outputs.filtered).map_err(fail)?;

    let split_stats = VariantSplitter
        .split_file(
            &outputs.filtered,
            &outputs.snps,
            &outputs.indels,
            Some(&outputs.other),
        )
        .map_err(fail)?;

    Ok(ToolRunSummary {
        tool: tool.name().to_string(),
        input: input.display().to_string(),
        sample,
        thresholds,
        filter: filter_stats,
        split: split_stats,
    })
}

/// Run every (file, tool) pair, collecting failures instead of aborting
pub fn run_batch(inputs: &[(PathBuf, CallerTool)], config: &PipelineConfig) -> BatchReport {
    let mut report = BatchReport::default();
    for (input, tool) in inputs {
        match run_tool(input, *tool, config) {
            Ok(summary) => report.runs.push(summary),
            Err(err) => report.failures.push(RunFailure {
                tool: err.tool.clone(),
                input: err.input.clone(),
                reason: err.source.to_string(),
            }),
        }
    }
    report
}
