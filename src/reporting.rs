//! Summary counting and batch reporting
//!
//! Aggregates before/after record counts, per-class splits and indel
//! statistics into per-file summaries and a batch-level report.

use crate::depth::ThresholdPair;
use crate::filter::FilterStats;
use crate::split::{SplitStats, LENGTH_BIN_LABELS};
use crate::vcf;
use crate::SvpostError;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

/// Count data lines (header excluded) in a variant file
pub fn count_records<P: AsRef<Path>>(path: P) -> Result<u64, SvpostError> {
    let reader = vcf::open_vcf(path)?;
    let mut count = 0u64;
    for line in reader.lines() {
        let line = line?;
        if !vcf::is_header(&line) && !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Before/after counts for one filtering run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountSummary {
    pub before: u64,
    pub after: u64,
    pub removed: u64,
    pub retained_pct: f64,
    pub split: Option<SplitStats>,
}

impl crate::ToolStats for CountSummary {}

impl CountSummary {
    pub fn new(before: u64, after: u64) -> Result<CountSummary, SvpostError> {
        if after > before {
            return Err(SvpostError::CountInconsistency { before, after });
        }
        let retained_pct = if before > 0 {
            (after as f64 / before as f64) * 100.0
        } else {
            0.0
        };
        Ok(CountSummary {
            before,
            after,
            removed: before - after,
            retained_pct,
            split: None,
        })
    }

    pub fn with_split(mut self, split: SplitStats) -> CountSummary {
        self.split = Some(split);
        self
    }

    /// Plain-text rendering of the summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("==== Filtering Summary ====\n");
        out.push_str(&format!("Records before : {}\n", self.before));
        out.push_str(&format!("Records after  : {}\n", self.after));
        out.push_str(&format!("Records removed: {}\n", self.removed));
        out.push_str(&format!("Retained       : {:.1}%\n", self.retained_pct));
        if let Some(split) = &self.split {
            out.push_str(&format!(
                "Classes        : {} SNP / {} indel / {} other\n",
                split.snps, split.indels, split.other
            ));
            out.push_str("Indel lengths (ins/del per bin):\n");
            for (i, label) in LENGTH_BIN_LABELS.iter().enumerate() {
                out.push_str(&format!(
                    "  {:>5} bp : {} / {}\n",
                    label, split.histogram.insertions[i], split.histogram.deletions[i]
                ));
            }
        }
        out
    }
}

/// Result of one (file, tool) pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRunSummary {
    pub tool: String,
    pub input: String,
    pub sample: String,
    pub thresholds: ThresholdPair,
    pub filter: FilterStats,
    pub split: SplitStats,
}

impl ToolRunSummary {
    pub fn records_before(&self) -> u64 {
        self.filter.total_seen
    }

    pub fn records_after(&self) -> u64 {
        self.filter.passed
    }

    /// One-line status in the batch log
    pub fn status_line(&self) -> String {
        format!(
            "{} {}: {} -> {} records (minDP={}, maxDP={})",
            self.tool,
            self.sample,
            self.records_before(),
            self.records_after(),
            self.thresholds.min_dp,
            self.thresholds.max_dp
        )
    }
}

/// A per-file failure recorded by the batch driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    pub tool: String,
    pub input: String,
    pub reason: String,
}

/// Aggregated outcome of a batch of per-tool runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub runs: Vec<ToolRunSummary>,
    pub failures: Vec<RunFailure>,
}

impl crate::ToolStats for BatchReport {}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.runs.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_summary() {
        let summary = CountSummary::new(100, 80).unwrap();
        assert_eq!(summary.removed, 20);
        assert!((summary.retained_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_count_summary_rejects_growth() {
        assert!(matches!(
            CountSummary::new(10, 11),
            Err(SvpostError::CountInconsistency { .. })
        ));
    }

    #[test]
    fn test_count_summary_empty_input() {
        let summary = CountSummary::new(0, 0).unwrap();
        assert_eq!(summary.retained_pct, 0.0);
    }

    #[test]
    fn test_render_text_includes_split() {
        let mut split = SplitStats::default();
        split.snps = 3;
        split.indels = 1;
        split.histogram.record(-4);
        let text = CountSummary::new(5, 4)
            .unwrap()
            .with_split(split)
            .render_text();
        assert!(text.contains("Records before : 5"));
        assert!(text.contains("3 SNP / 1 indel"));
        assert!(text.contains("2-5"));
    }

    #[test]
    fn test_count_records_skips_header() {
        let path = std::env::temp_dir().join("svpost_count.vcf");
        std::fs::write(
            &path,
            "##fileformat=VCFv4.2\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t1\t.\tA\tT\t.\tPASS\t.\n\
             chr1\t2\t.\tA\tT\t.\tPASS\t.\n",
        )
        .unwrap();
        assert_eq!(count_records(&path).unwrap(), 2);
    }
}
