//! Depth extraction strategies and adaptive threshold estimation
//!
//! Each variant caller encodes per-sample depth differently:
//! - pbsv / svim / deepvariant: a plain `DP` sub-field
//! - cutesv / sniffles2: reference/variant read counts (`DR` + `DV`)
//!
//! Thresholds are anchored on the median of the observed depth
//! distribution: minDP = max(5, 0.5 * median), maxDP = 2.0 * median.

use crate::vcf::{self, VcfRecord};
use crate::SvpostError;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

/// Absolute lower bound for minDP, so very shallow runs never filter at 0-1x
const MIN_DP_FLOOR: u32 = 5;

/// DR/DV pairs with more than this ratio between them are excluded from
/// threshold estimation (unbalanced for a het call)
const MAX_BALANCE_RATIO: f64 = 3.0;

/// Supported variant callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerTool {
    CuteSv,
    Sniffles2,
    Svim,
    Pbsv,
    DeepVariant,
}

impl CallerTool {
    pub fn from_name(name: &str) -> Option<CallerTool> {
        match name.to_ascii_lowercase().as_str() {
            "cutesv" => Some(CallerTool::CuteSv),
            "sniffles2" | "sniffles" => Some(CallerTool::Sniffles2),
            "svim" => Some(CallerTool::Svim),
            "pbsv" => Some(CallerTool::Pbsv),
            "deepvariant" => Some(CallerTool::DeepVariant),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CallerTool::CuteSv => "cutesv",
            CallerTool::Sniffles2 => "sniffles2",
            CallerTool::Svim => "svim",
            CallerTool::Pbsv => "pbsv",
            CallerTool::DeepVariant => "deepvariant",
        }
    }

    pub fn strategy(&self) -> DepthStrategy {
        match self {
            CallerTool::CuteSv | CallerTool::Sniffles2 => DepthStrategy::DrDv,
            CallerTool::Svim | CallerTool::Pbsv | CallerTool::DeepVariant => {
                DepthStrategy::FormatDp
            }
        }
    }
}

/// How depth and allele fraction are read out of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStrategy {
    /// Per-sample `DP` sub-field; allele fraction from `VAF`/`AF` or `AD`
    FormatDp,
    /// `DR` + `DV` read counts; allele fraction DV / (DR + DV)
    DrDv,
}

impl DepthStrategy {
    /// Total depth used for filtering
    pub fn depth(&self, rec: &VcfRecord) -> Option<u32> {
        match self {
            DepthStrategy::FormatDp => rec.format_field("DP")?.parse().ok(),
            DepthStrategy::DrDv => {
                let (dr, dv) = self.read_counts(rec)?;
                Some(dr + dv)
            }
        }
    }

    /// Depth used for threshold estimation. For DR/DV callers only balanced
    /// het-like records contribute; zero depths never do.
    pub fn estimation_depth(&self, rec: &VcfRecord) -> Option<u32> {
        match self {
            DepthStrategy::FormatDp => self.depth(rec).filter(|dp| *dp > 0),
            DepthStrategy::DrDv => {
                let (dr, dv) = self.read_counts(rec)?;
                if dr == 0 || dv == 0 {
                    return None;
                }
                let ratio = dr.max(dv) as f64 / dr.min(dv) as f64;
                if ratio <= MAX_BALANCE_RATIO {
                    Some(dr + dv)
                } else {
                    None
                }
            }
        }
    }

    /// Variant allele fraction in [0, 1]
    pub fn vaf(&self, rec: &VcfRecord) -> Option<f64> {
        match self {
            DepthStrategy::FormatDp => {
                for key in ["VAF", "AF"] {
                    if let Some(value) = rec.format_field(key) {
                        // multi-allelic VAFs are comma separated; first ALT only
                        if let Ok(vaf) = value.split(',').next()?.parse::<f64>() {
                            return Some(vaf);
                        }
                    }
                }
                let ad = rec.format_field("AD")?;
                let mut counts = ad.split(',');
                let ref_count: u32 = counts.next()?.parse().ok()?;
                let alt_count: u32 = counts.next()?.parse().ok()?;
                let total = match rec.format_field("DP").and_then(|dp| dp.parse().ok()) {
                    Some(dp) => dp,
                    None => ref_count + alt_count,
                };
                if total == 0 {
                    return None;
                }
                Some(alt_count as f64 / total as f64)
            }
            DepthStrategy::DrDv => {
                let (dr, dv) = self.read_counts(rec)?;
                if dr + dv == 0 {
                    return None;
                }
                Some(dv as f64 / (dr + dv) as f64)
            }
        }
    }

    fn read_counts(&self, rec: &VcfRecord) -> Option<(u32, u32)> {
        let dr = rec.format_field("DR")?.parse().ok()?;
        let dv = rec.format_field("DV")?.parse().ok()?;
        Some((dr, dv))
    }
}

/// Adaptive depth cutoffs, invariant `min_dp <= max_dp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub min_dp: u32,
    pub max_dp: u32,
}

impl ThresholdPair {
    pub fn new(min_dp: u32, max_dp: u32) -> Result<ThresholdPair, SvpostError> {
        if min_dp > max_dp {
            return Err(SvpostError::ThresholdInconsistency { min_dp, max_dp });
        }
        Ok(ThresholdPair { min_dp, max_dp })
    }

    /// Median-anchored estimate over the observed depths.
    ///
    /// minDP = max(5, floor(0.5 * median)) clamped to maxDP,
    /// maxDP = floor(2.0 * median). When every depth equals D the pair is
    /// exactly (D, D).
    pub fn from_depths(depths: &[u32]) -> Result<ThresholdPair, SvpostError> {
        if depths.is_empty() {
            return Err(SvpostError::NoDepthData);
        }
        let mut sorted = depths.to_vec();
        sorted.sort_unstable();
        if sorted[0] == sorted[sorted.len() - 1] {
            return ThresholdPair::new(sorted[0], sorted[0]);
        }
        let median = quantile(&sorted, 0.5);
        let max_dp = (median * 2.0).floor() as u32;
        let min_dp = ((median * 0.5).floor() as u32).max(MIN_DP_FLOOR).min(max_dp);
        ThresholdPair::new(min_dp, max_dp)
    }

    pub fn contains(&self, dp: u32) -> bool {
        dp >= self.min_dp && dp <= self.max_dp
    }
}

impl std::fmt::Display for ThresholdPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.min_dp, self.max_dp)
    }
}

/// Summary of the observed depth distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthStats {
    pub count: usize,
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    pub median: f64,
    /// (label, value) rows: P1, P5, P10, P25, P50, P75, P90, P95, P99, P99.5
    pub quantiles: Vec<(String, f64)>,
}

impl crate::ToolStats for DepthStats {}

const QUANTILE_TABLE: [(&str, f64); 10] = [
    ("P1", 0.01),
    ("P5", 0.05),
    ("P10", 0.10),
    ("P25", 0.25),
    ("Median(P50)", 0.50),
    ("P75", 0.75),
    ("P90", 0.90),
    ("P95", 0.95),
    ("P99", 0.99),
    ("P99.5", 0.995),
];

impl DepthStats {
    pub fn from_depths(depths: &[u32]) -> Result<DepthStats, SvpostError> {
        if depths.is_empty() {
            return Err(SvpostError::NoDepthData);
        }
        let mut sorted = depths.to_vec();
        sorted.sort_unstable();
        let sum: u64 = sorted.iter().map(|&d| d as u64).sum();
        let quantiles = QUANTILE_TABLE
            .iter()
            .map(|&(name, q)| (name.to_string(), quantile(&sorted, q)))
            .collect();
        Ok(DepthStats {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum as f64 / sorted.len() as f64,
            median: quantile(&sorted, 0.5),
            quantiles,
        })
    }
}

/// Linear-interpolated quantile of an already sorted list
fn quantile(sorted: &[u32], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
}

/// Collect estimation depths for one file. Records without a usable depth
/// field and malformed lines are skipped, never fatal.
pub fn collect_depths<P: AsRef<Path>>(
    path: P,
    strategy: DepthStrategy,
) -> Result<Vec<u32>, SvpostError> {
    let reader = vcf::open_vcf(path)?;
    let mut depths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if vcf::is_header(&line) || line.trim().is_empty() {
            continue;
        }
        let rec = match VcfRecord::parse(&line) {
            Ok(rec) => rec,
            Err(_) => continue,
        };
        if let Some(dp) = strategy.estimation_depth(&rec) {
            depths.push(dp);
        }
    }
    Ok(depths)
}

/// ASCII histogram of the depth distribution with median and cutoff markers
pub fn render_histogram(depths: &[u32], stats: &DepthStats, thresholds: ThresholdPair) -> String {
    const BINS: usize = 60;
    const BAR_WIDTH: f64 = 50.0;

    let p99 = stats
        .quantiles
        .iter()
        .find(|(name, _)| name == "P99")
        .map(|(_, value)| *value)
        .unwrap_or(stats.max as f64);

    // cap the display range so a long tail does not flatten the main peak
    let mut display_max = (thresholds.max_dp as f64 * 1.5).max(p99);
    if display_max > stats.median * 5.0 {
        display_max = stats.median * 5.0;
    }
    if display_max < 1.0 {
        display_max = 1.0;
    }

    let mut hist = [0u64; BINS];
    for &dp in depths {
        if (dp as f64) > display_max {
            continue;
        }
        let idx = (((dp as f64) / display_max) * BINS as f64) as usize;
        hist[idx.min(BINS - 1)] += 1;
    }
    let tallest = hist.iter().copied().max().unwrap_or(0);
    let scale = if tallest > 0 {
        BAR_WIDTH / tallest as f64
    } else {
        1.0
    };

    let bin_width = display_max / BINS as f64;
    let mut out = String::new();
    for (i, &count) in hist.iter().enumerate() {
        let low = (i as f64 * bin_width) as u32;
        let high = ((i + 1) as f64 * bin_width) as u32;
        let bar = "*".repeat((count as f64 * scale) as usize);

        let mut mark = String::new();
        if (low as f64) <= stats.median && stats.median < high as f64 {
            mark.push_str(" <--- Median");
        }
        if low <= thresholds.min_dp && thresholds.min_dp < high {
            mark.push_str(" [Min Cutoff]");
        }
        if low <= thresholds.max_dp && thresholds.max_dp < high {
            mark.push_str(" [Max Cutoff]");
        }
        out.push_str(&format!("{:3}-{:3} | {}{}\n", low, high, bar, mark));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> VcfRecord {
        VcfRecord::parse(line).unwrap()
    }

    #[test]
    fn test_thresholds_from_example_distribution() {
        // median of [5, 10, 11, 12, 50] is 11 -> (max(5, 5), 22); the 50x
        // outlier falls outside the suggested range
        let t = ThresholdPair::from_depths(&[5, 10, 12, 11, 50]).unwrap();
        assert_eq!(t.min_dp, 5);
        assert_eq!(t.max_dp, 22);
        assert!(!t.contains(50));
        assert!(t.contains(12));
    }

    #[test]
    fn test_thresholds_are_deterministic_and_ordered() {
        let depths = [3, 7, 90, 14, 14, 2, 55, 8];
        let a = ThresholdPair::from_depths(&depths).unwrap();
        let b = ThresholdPair::from_depths(&depths).unwrap();
        assert_eq!(a, b);
        assert!(a.min_dp <= a.max_dp);
    }

    #[test]
    fn test_thresholds_all_equal_degenerate() {
        let t = ThresholdPair::from_depths(&[30, 30, 30]).unwrap();
        assert_eq!((t.min_dp, t.max_dp), (30, 30));
    }

    #[test]
    fn test_thresholds_low_median_clamps_floor() {
        // median 2 -> maxDP 4 is below the floor of 5, so minDP clamps down
        let t = ThresholdPair::from_depths(&[1, 2, 3]).unwrap();
        assert_eq!((t.min_dp, t.max_dp), (4, 4));
    }

    #[test]
    fn test_thresholds_empty_is_no_depth_data() {
        assert!(matches!(
            ThresholdPair::from_depths(&[]),
            Err(SvpostError::NoDepthData)
        ));
    }

    #[test]
    fn test_threshold_pair_rejects_inverted() {
        assert!(matches!(
            ThresholdPair::new(10, 5),
            Err(SvpostError::ThresholdInconsistency { .. })
        ));
    }

    #[test]
    fn test_format_dp_strategy() {
        let rec = record("chr1\t100\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:20:10,10");
        assert_eq!(DepthStrategy::FormatDp.depth(&rec), Some(20));
        assert_eq!(DepthStrategy::FormatDp.vaf(&rec), Some(0.5));
        let missing = record("chr1\t100\t.\tA\tT\t.\tPASS\t.\tGT:DP\t0/1:.");
        assert_eq!(DepthStrategy::FormatDp.depth(&missing), None);
    }

    #[test]
    fn test_format_dp_prefers_vaf_field_over_ad() {
        let rec = record("chr1\t100\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD:VAF\t0/1:20:10,10:0.4");
        assert_eq!(DepthStrategy::FormatDp.vaf(&rec), Some(0.4));
    }

    #[test]
    fn test_drdv_strategy_depth_and_vaf() {
        let rec = record("chr1\t100\t.\tN\t<INS>\t.\tPASS\t.\tGT:DR:DV\t0/1:12:8");
        assert_eq!(DepthStrategy::DrDv.depth(&rec), Some(20));
        assert_eq!(DepthStrategy::DrDv.vaf(&rec), Some(0.4));
        assert_eq!(DepthStrategy::DrDv.estimation_depth(&rec), Some(20));
    }

    #[test]
    fn test_drdv_estimation_excludes_unbalanced() {
        // 16:4 is a 4x imbalance; used for filtering but not estimation
        let rec = record("chr1\t100\t.\tN\t<DEL>\t.\tPASS\t.\tGT:DR:DV\t0/1:16:4");
        assert_eq!(DepthStrategy::DrDv.depth(&rec), Some(20));
        assert_eq!(DepthStrategy::DrDv.estimation_depth(&rec), None);

        let hom = record("chr1\t100\t.\tN\t<DEL>\t.\tPASS\t.\tGT:DR:DV\t1/1:0:20");
        assert_eq!(DepthStrategy::DrDv.estimation_depth(&hom), None);
    }

    #[test]
    fn test_caller_tool_dispatch() {
        assert_eq!(CallerTool::from_name("CuteSV"), Some(CallerTool::CuteSv));
        assert_eq!(CallerTool::from_name("unknown"), None);
        assert_eq!(CallerTool::Sniffles2.strategy(), DepthStrategy::DrDv);
        assert_eq!(CallerTool::Pbsv.strategy(), DepthStrategy::FormatDp);
    }

    #[test]
    fn test_depth_stats_summary() {
        let stats = DepthStats::from_depths(&[5, 10, 12, 11, 50]).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 50);
        assert_eq!(stats.median, 11.0);
        assert!((stats.mean - 17.6).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [10, 20, 30, 40];
        assert_eq!(quantile(&sorted, 0.0), 10.0);
        assert_eq!(quantile(&sorted, 1.0), 40.0);
        assert_eq!(quantile(&sorted, 0.5), 25.0);
    }
}
