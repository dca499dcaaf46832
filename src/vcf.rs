//! VCF text-format reading and record model
//!
//! Handles plain and gzip-compressed VCF input, header passthrough, and
//! parsing of data lines into `VcfRecord` with FORMAT/sample sub-field
//! access. Records keep the raw line so passing records can be re-emitted
//! verbatim.

use crate::SvpostError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Minimum number of tab-separated columns in a VCF data line
/// (CHROM POS ID REF ALT QUAL FILTER INFO)
const MIN_FIELDS: usize = 8;

/// Open a VCF file for line-based reading, transparently decompressing `.gz`
pub fn open_vcf<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, SvpostError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SvpostError::InputNotFound {
        path: path.display().to_string(),
        source,
    })?;

    let is_gz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Header lines start with `#` and are passed through verbatim
pub fn is_header(line: &str) -> bool {
    line.starts_with('#')
}

/// A single-sample genotype call parsed from the GT sub-field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genotype {
    pub a: u32,
    pub b: u32,
    pub phased: bool,
}

impl Genotype {
    /// Parse a diploid GT string (`0/1`, `1|0`). Missing (`./.`) or haploid
    /// calls yield `None`.
    pub fn parse(gt: &str) -> Option<Genotype> {
        let (sep, phased) = if gt.contains('|') {
            ('|', true)
        } else {
            ('/', false)
        };
        let mut parts = gt.split(sep);
        let a = parts.next()?.parse().ok()?;
        let b = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Genotype { a, b, phased })
    }

    /// Compare against a configured pattern. Unphased calls compare as
    /// unordered allele sets (0/1 == 1/0); phased calls compare in order.
    pub fn matches(&self, pattern: &Genotype) -> bool {
        if self.phased {
            self.a == pattern.a && self.b == pattern.b
        } else {
            (self.a == pattern.a && self.b == pattern.b)
                || (self.a == pattern.b && self.b == pattern.a)
        }
    }

    pub fn is_het(&self) -> bool {
        self.a != self.b
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sep = if self.phased { '|' } else { '/' };
        write!(f, "{}{}{}", self.a, sep, self.b)
    }
}

/// One parsed VCF data line (first sample column only)
#[derive(Debug, Clone)]
pub struct VcfRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub qual: String,
    pub filter: String,
    pub info: String,
    /// FORMAT keys (`GT:DP:AD` -> ["GT", "DP", "AD"]); empty if absent
    pub format: Vec<String>,
    /// Sample sub-fields aligned with `format`; empty if absent
    pub sample: Vec<String>,
    line: String,
}

impl VcfRecord {
    /// Parse a tab-separated data line. FORMAT/sample columns are optional;
    /// the fixed leading columns are not.
    pub fn parse(line: &str) -> Result<VcfRecord, SvpostError> {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(SvpostError::MalformedRecord(format!(
                "expected at least {} columns, found {}",
                MIN_FIELDS,
                fields.len()
            )));
        }

        let pos: u64 = fields[1].parse().map_err(|_| {
            SvpostError::MalformedRecord(format!("invalid POS value: {}", fields[1]))
        })?;

        let (format, sample) = if fields.len() >= 10 {
            (
                fields[8].split(':').map(str::to_string).collect(),
                fields[9].split(':').map(str::to_string).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(VcfRecord {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            ref_allele: fields[3].to_string(),
            alt_alleles: fields[4].split(',').map(str::to_string).collect(),
            qual: fields[5].to_string(),
            filter: fields[6].to_string(),
            info: fields[7].to_string(),
            format,
            sample,
            line: line.trim_end().to_string(),
        })
    }

    /// Look up a per-sample sub-field by FORMAT key. `.` counts as missing.
    pub fn format_field(&self, key: &str) -> Option<&str> {
        let idx = self.format.iter().position(|k| k == key)?;
        match self.sample.get(idx).map(String::as_str) {
            None | Some(".") => None,
            Some(value) => Some(value),
        }
    }

    /// Genotype of the first sample, if callable
    pub fn genotype(&self) -> Option<Genotype> {
        Genotype::parse(self.format_field("GT")?)
    }

    /// The original input line, for verbatim re-emission
    pub fn raw(&self) -> &str {
        &self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "chr1\t100\t.\tA\tT\t30\tPASS\tSVTYPE=SNP\tGT:DP:AD\t0/1:20:10,10";

    #[test]
    fn test_parse_record_fields() {
        let rec = VcfRecord::parse(LINE).unwrap();
        assert_eq!(rec.chrom, "chr1");
        assert_eq!(rec.pos, 100);
        assert_eq!(rec.ref_allele, "A");
        assert_eq!(rec.alt_alleles, vec!["T"]);
        assert_eq!(rec.format_field("DP"), Some("20"));
        assert_eq!(rec.format_field("AD"), Some("10,10"));
        assert_eq!(rec.format_field("DV"), None);
        assert_eq!(rec.raw(), LINE);
    }

    #[test]
    fn test_parse_multiallelic_alts() {
        let line = "chr1\t100\t.\tA\tT,TT\t.\tPASS\t.\tGT\t0/1";
        let rec = VcfRecord::parse(line).unwrap();
        assert_eq!(rec.alt_alleles, vec!["T", "TT"]);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(matches!(
            VcfRecord::parse("chr1\t100\t.\tA"),
            Err(SvpostError::MalformedRecord(_))
        ));
        assert!(matches!(
            VcfRecord::parse("chr1\tnot-a-number\t.\tA\tT\t.\tPASS\t."),
            Err(SvpostError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_missing_format_column_is_not_fatal() {
        let rec = VcfRecord::parse("chr1\t100\t.\tA\tT\t.\tPASS\t.").unwrap();
        assert!(rec.format.is_empty());
        assert_eq!(rec.format_field("DP"), None);
        assert!(rec.genotype().is_none());
    }

    #[test]
    fn test_genotype_order_insensitive_when_unphased() {
        let pattern = Genotype::parse("0/1").unwrap();
        assert!(Genotype::parse("1/0").unwrap().matches(&pattern));
        assert!(Genotype::parse("0/1").unwrap().matches(&pattern));
        assert!(!Genotype::parse("1/1").unwrap().matches(&pattern));
        assert!(!Genotype::parse("1/2").unwrap().matches(&pattern));
    }

    #[test]
    fn test_genotype_order_sensitive_when_phased() {
        let pattern = Genotype::parse("0/1").unwrap();
        assert!(Genotype::parse("0|1").unwrap().matches(&pattern));
        assert!(!Genotype::parse("1|0").unwrap().matches(&pattern));
    }

    #[test]
    fn test_genotype_missing_call() {
        assert!(Genotype::parse("./.").is_none());
        assert!(Genotype::parse("1").is_none());
    }
}
