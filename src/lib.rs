//! svpost-tools
//!
//! Post-processing filter tools for SV and SNP/indel variant calls.
//!
//! This library provides shared functionality for:
//! - Depth distribution statistics and adaptive minDP/maxDP estimation
//! - Genotype / allele-fraction / depth predicate filtering
//! - SNP vs indel class splitting
//! - Variant cluster (density) filtering
//! - Per-file and batch summary reporting

pub mod cluster;
pub mod depth;
pub mod filter;
pub mod pipeline;
pub mod reporting;
pub mod split;
pub mod vcf;

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the filtering library.
///
/// Per-line problems (`MalformedRecord`) are recovered locally by the
/// components; per-file problems abort that file's run and are collected by
/// the batch driver.
#[derive(Error, Debug)]
pub enum SvpostError {
    #[error("input file not found or unreadable: {path} ({source})")]
    InputNotFound {
        path: String,
        source: std::io::Error,
    },
    #[error("no usable depth values found for threshold estimation")]
    NoDepthData,
    #[error("malformed VCF record: {0}")]
    MalformedRecord(String),
    #[error("inconsistent depth thresholds: minDP {min_dp} > maxDP {max_dp}")]
    ThresholdInconsistency { min_dp: u32, max_dp: u32 },
    #[error("filtered record count {after} exceeds input count {before}")]
    CountInconsistency { before: u64, after: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Trait for statistics structures exported as JSON next to the tool output
pub trait ToolStats: Serialize {
    fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<(), SvpostError> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Derive a sample/run name from a variant file path (`s1.vcf.gz` -> `s1`)
pub fn sample_name_from_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .trim_end_matches(".gz")
        .trim_end_matches(".vcf")
        .to_string()
}
