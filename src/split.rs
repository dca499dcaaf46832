//! SNP / indel class splitting
//!
//! Classifies each filtered record by comparing reference and alternate
//! allele lengths and writes disjoint SNP / indel outputs. Multi-allelic
//! records are classified by their FIRST alternate allele only; they are
//! never decomposed. Symbolic alleles (`<DEL>`), breakends and multi-base
//! substitutions (MNPs) classify as Other.

use crate::vcf::{self, VcfRecord};
use crate::SvpostError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// Variant class derived from ref/alt allele lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantClass {
    Snp,
    Indel,
    Other,
}

/// Classify by the first alternate allele
pub fn classify(rec: &VcfRecord) -> VariantClass {
    match rec.alt_alleles.first() {
        Some(alt) => classify_alleles(&rec.ref_allele, alt),
        None => VariantClass::Other,
    }
}

fn classify_alleles(ref_allele: &str, alt: &str) -> VariantClass {
    // symbolic SV alleles and breakend notation carry no literal sequence
    if alt.starts_with('<') || alt.contains('[') || alt.contains(']') || alt == "." || alt == "*" {
        return VariantClass::Other;
    }
    if ref_allele.len() == 1 && alt.len() == 1 {
        VariantClass::Snp
    } else if ref_allele.len() != alt.len() {
        VariantClass::Indel
    } else {
        VariantClass::Other
    }
}

/// Signed indel length: alt minus ref, so insertions are positive and
/// deletions negative
pub fn indel_length(rec: &VcfRecord) -> Option<i64> {
    match classify(rec) {
        VariantClass::Indel => {
            let alt = rec.alt_alleles.first()?;
            Some(alt.len() as i64 - rec.ref_allele.len() as i64)
        }
        _ => None,
    }
}

pub const LENGTH_BIN_LABELS: [&str; 5] = ["1", "2-5", "6-20", "21-50", ">50"];

/// Indel length histogram, bucketed per sign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndelHistogram {
    pub insertions: [u64; 5],
    pub deletions: [u64; 5],
}

impl IndelHistogram {
    pub fn record(&mut self, length: i64) {
        if length == 0 {
            return;
        }
        let bin = Self::bin_index(length.unsigned_abs());
        if length > 0 {
            self.insertions[bin] += 1;
        } else {
            self.deletions[bin] += 1;
        }
    }

    fn bin_index(len: u64) -> usize {
        match len {
            1 => 0,
            2..=5 => 1,
            6..=20 => 2,
            21..=50 => 3,
            _ => 4,
        }
    }

    pub fn total(&self) -> u64 {
        self.insertions.iter().sum::<u64>() + self.deletions.iter().sum::<u64>()
    }
}

/// Splitting counters and indel statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitStats {
    pub total: u64,
    pub snps: u64,
    pub indels: u64,
    pub other: u64,
    pub malformed: u64,
    pub histogram: IndelHistogram,
}

impl crate::ToolStats for SplitStats {}

/// Splits a filtered VCF into per-class outputs
pub struct VariantSplitter;

impl VariantSplitter {
    /// Route every record to exactly one output. Header lines go to all
    /// outputs verbatim. When `other_out` is `None`, Other records are
    /// still counted but not written.
    pub fn split_file<P: AsRef<Path>>(
        &self,
        input: P,
        snp_out: P,
        indel_out: P,
        other_out: Option<P>,
    ) -> Result<SplitStats, SvpostError> {
        let reader = vcf::open_vcf(input)?;
        let mut snp_writer = BufWriter::new(File::create(snp_out)?);
        let mut indel_writer = BufWriter::new(File::create(indel_out)?);
        let mut other_writer = match other_out {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        let mut stats = SplitStats::default();

        for line in reader.lines() {
            let line = line?;
            if vcf::is_header(&line) {
                writeln!(snp_writer, "{}", line)?;
                writeln!(indel_writer, "{}", line)?;
                if let Some(w) = other_writer.as_mut() {
                    writeln!(w, "{}", line)?;
                }
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            stats.total += 1;

            let rec = match VcfRecord::parse(&line) {
                Ok(rec) => rec,
                Err(_) => {
                    stats.malformed += 1;
                    continue;
                }
            };
            match classify(&rec) {
                VariantClass::Snp => {
                    stats.snps += 1;
                    writeln!(snp_writer, "{}", rec.raw())?;
                }
                VariantClass::Indel => {
                    stats.indels += 1;
                    if let Some(len) = indel_length(&rec) {
                        stats.histogram.record(len);
                    }
                    writeln!(indel_writer, "{}", rec.raw())?;
                }
                VariantClass::Other => {
                    stats.other += 1;
                    if let Some(w) = other_writer.as_mut() {
                        writeln!(w, "{}", rec.raw())?;
                    }
                }
            }
        }
        snp_writer.flush()?;
        indel_writer.flush()?;
        if let Some(mut w) = other_writer {
            w.flush()?;
        }
        Ok(stats)
    }
}
