//! Variant predicate filter
//!
//! Streams one VCF file through the three-way predicate (genotype pattern,
//! allele-fraction range, depth range) and re-emits passing records
//! verbatim, header included. Records missing a required field are counted
//! per reason rather than silently dropped; unparseable lines are counted
//! as malformed and skipped.

use crate::depth::{CallerTool, DepthStrategy, ThresholdPair};
use crate::vcf::{self, Genotype, VcfRecord};
use crate::SvpostError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// Configuration for one filtering pass
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// Heterozygous call pattern, e.g. 0/1
    pub genotype: Genotype,
    /// Inclusive allele-fraction bounds
    pub vaf_low: f64,
    pub vaf_high: f64,
    /// Inclusive depth bounds
    pub depth: ThresholdPair,
    /// Caller whose field layout the input uses
    pub tool: CallerTool,
}

/// Outcome of evaluating one record against the criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    FailGenotype,
    FailVaf,
    FailDepth,
    MissingGenotype,
    MissingDepth,
    MissingVaf,
}

/// Filtering counters; `passed + failed + skipped + malformed == total_seen`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterStats {
    pub total_seen: u64,
    pub passed: u64,
    pub failed_genotype: u64,
    pub failed_vaf: u64,
    pub failed_depth: u64,
    pub skipped_no_genotype: u64,
    pub skipped_no_depth: u64,
    pub skipped_no_vaf: u64,
    pub malformed: u64,
}

impl crate::ToolStats for FilterStats {}

impl FilterStats {
    pub fn failed(&self) -> u64 {
        self.failed_genotype + self.failed_vaf + self.failed_depth
    }

    pub fn skipped(&self) -> u64 {
        self.skipped_no_genotype + self.skipped_no_depth + self.skipped_no_vaf
    }

    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::FailGenotype => self.failed_genotype += 1,
            Verdict::FailVaf => self.failed_vaf += 1,
            Verdict::FailDepth => self.failed_depth += 1,
            Verdict::MissingGenotype => self.skipped_no_genotype += 1,
            Verdict::MissingDepth => self.skipped_no_depth += 1,
            Verdict::MissingVaf => self.skipped_no_vaf += 1,
        }
    }
}

/// Predicate filter over a variant stream
pub struct VariantFilter {
    pub criteria: FilterCriteria,
    strategy: DepthStrategy,
}

impl VariantFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        let strategy = criteria.tool.strategy();
        Self { criteria, strategy }
    }

    /// Evaluate one record. Missing-data outcomes take precedence so that
    /// the skip accounting never overlaps the predicate failures.
    pub fn evaluate(&self, rec: &VcfRecord) -> Verdict {
        let genotype = match rec.genotype() {
            Some(gt) => gt,
            None => return Verdict::MissingGenotype,
        };
        let dp = match self.strategy.depth(rec) {
            Some(dp) => dp,
            None => return Verdict::MissingDepth,
        };
        let vaf = match self.strategy.vaf(rec) {
            Some(vaf) => vaf,
            None => return Verdict::MissingVaf,
        };

        if !genotype.matches(&self.criteria.genotype) {
            return Verdict::FailGenotype;
        }
        if vaf < self.criteria.vaf_low || vaf > self.criteria.vaf_high {
            return Verdict::FailVaf;
        }
        if !self.criteria.depth.contains(dp) {
            return Verdict::FailDepth;
        }
        Verdict::Pass
    }

    /// Single pass over `input`, writing header lines and passing records
    /// verbatim to `output`.
    pub fn filter_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<FilterStats, SvpostError> {
        let reader = vcf::open_vcf(input)?;
        let mut writer = BufWriter::new(File::create(output)?);
        let mut stats = FilterStats::default();

        for line in reader.lines() {
            let line = line?;
            if vcf::is_header(&line) {
                writeln!(writer, "{}", line)?;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            stats.total_seen += 1;

            let rec = match VcfRecord::parse(&line) {
                Ok(rec) => rec,
                Err(_) => {
                    stats.malformed += 1;
                    continue;
                }
            };
            let verdict = self.evaluate(&rec);
            stats.record(verdict);
            if verdict == Verdict::Pass {
                writeln!(writer, "{}", rec.raw())?;
            }
        }
        writer.flush()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            genotype: Genotype::parse("0/1").unwrap(),
            vaf_low: 0.35,
            vaf_high: 0.65,
            depth: ThresholdPair::new(5, 12).unwrap(),
            tool: CallerTool::DeepVariant,
        }
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const HEADER: &str = "##fileformat=VCFv4.2\n\
        ##source=test\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";

    fn dv_line(pos: u64, gt: &str, dp: u32, ad: &str) -> String {
        format!(
            "chr1\t{}\t.\tA\tT\t30\tPASS\t.\tGT:DP:AD\t{}:{}:{}\n",
            pos, gt, dp, ad
        )
    }

    #[test]
    fn test_evaluate_each_predicate() {
        let filter = VariantFilter::new(criteria());
        let pass = VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:10:5,5").unwrap();
        assert_eq!(filter.evaluate(&pass), Verdict::Pass);

        let hom = VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t1/1:10:0,10").unwrap();
        assert_eq!(filter.evaluate(&hom), Verdict::FailGenotype);

        let low_vaf =
            VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:10:8,2").unwrap();
        assert_eq!(filter.evaluate(&low_vaf), Verdict::FailVaf);

        let deep =
            VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:50:25,25").unwrap();
        assert_eq!(filter.evaluate(&deep), Verdict::FailDepth);

        let no_gt = VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t./.:10:5,5").unwrap();
        assert_eq!(filter.evaluate(&no_gt), Verdict::MissingGenotype);

        let no_dp = VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:AD\t0/1:5,5").unwrap();
        assert_eq!(filter.evaluate(&no_dp), Verdict::MissingDepth);
    }

    #[test]
    fn test_vaf_bounds_are_inclusive() {
        let mut wide = criteria();
        wide.depth = ThresholdPair::new(5, 50).unwrap();
        let filter = VariantFilter::new(wide);

        // AD 13,7 at DP 20 is exactly VAF 0.35
        let lower =
            VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:20:13,7").unwrap();
        assert_eq!(filter.evaluate(&lower), Verdict::Pass);
        // AD 7,13 at DP 20 is exactly VAF 0.65
        let upper =
            VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:20:7,13").unwrap();
        assert_eq!(filter.evaluate(&upper), Verdict::Pass);
        let outside =
            VcfRecord::parse("chr1\t1\t.\tA\tT\t.\tPASS\t.\tGT:DP:AD\t0/1:100:34,66").unwrap();
        assert_eq!(filter.evaluate(&outside), Verdict::FailVaf);
    }

    #[test]
    fn test_filter_file_end_to_end() {
        // depths [5, 10, 12, 11, 50]: 0/1+VAF ok for 3 records, of which 2
        // fall inside [5, 12]
        let mut content = String::from(HEADER);
        content.push_str(&dv_line(100, "0/1", 5, "3,2")); // pass (vaf 0.4)
        content.push_str(&dv_line(200, "1/1", 10, "0,10")); // fail genotype
        content.push_str(&dv_line(300, "0/1", 12, "6,6")); // pass (vaf 0.5)
        content.push_str(&dv_line(400, "0/1", 11, "9,2")); // fail vaf
        content.push_str(&dv_line(500, "0/1", 50, "25,25")); // fail depth
        content.push_str("chr1\tbroken\n"); // malformed

        let input = write_temp("svpost_filter_in.vcf", &content);
        let output = std::env::temp_dir().join("svpost_filter_out.vcf");

        let filter = VariantFilter::new(criteria());
        let stats = filter.filter_file(&input, &output).unwrap();

        assert_eq!(stats.total_seen, 6);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed_genotype, 1);
        assert_eq!(stats.failed_vaf, 1);
        assert_eq!(stats.failed_depth, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(
            stats.passed + stats.failed() + stats.skipped() + stats.malformed,
            stats.total_seen
        );

        let mut written = String::new();
        File::open(&output)
            .unwrap()
            .read_to_string(&mut written)
            .unwrap();
        // header preserved verbatim, only passing data lines follow
        assert!(written.starts_with(HEADER));
        assert_eq!(written.lines().filter(|l| !l.starts_with('#')).count(), 2);
        assert!(written.contains("\t100\t"));
        assert!(written.contains("\t300\t"));
    }

    #[test]
    fn test_filter_is_idempotent_on_own_output() {
        let mut content = String::from(HEADER);
        content.push_str(&dv_line(100, "0/1", 10, "5,5"));
        content.push_str(&dv_line(200, "0/1", 50, "25,25"));

        let input = write_temp("svpost_idem_in.vcf", &content);
        let once = std::env::temp_dir().join("svpost_idem_once.vcf");
        let twice = std::env::temp_dir().join("svpost_idem_twice.vcf");

        let filter = VariantFilter::new(criteria());
        let first = filter.filter_file(&input, &once).unwrap();
        let second = filter.filter_file(&once, &twice).unwrap();

        assert_eq!(first.passed, 1);
        assert_eq!(second.total_seen, first.passed);
        assert_eq!(second.passed, first.passed);
        assert_eq!(
            std::fs::read_to_string(&once).unwrap(),
            std::fs::read_to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_missing_input_is_input_not_found() {
        let filter = VariantFilter::new(criteria());
        let out = std::env::temp_dir().join("svpost_never_written.vcf");
        assert!(matches!(
            filter.filter_file("/no/such/file.vcf", &out),
            Err(SvpostError::InputNotFound { .. })
        ));
    }
}
