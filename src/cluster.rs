//! Density-based variant cluster filter
//!
//! Variants packed closer together than expected under a random (Poisson)
//! placement model are likely alignment artifacts. This filter estimates
//! per-bp variant density separately for a designated high-density
//! chromosome (SDR) and the remaining background, converts each density
//! into a minimum-gap threshold, and removes BOTH members of any
//! same-chromosome pair closer than the active threshold.

use crate::vcf;
use crate::SvpostError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Background genome size assumed when no contig lengths are available
const FALLBACK_BACKGROUND_BP: u64 = 372_000_000;

/// Stand-in density when a region has no observed variants
const EPSILON_DENSITY: f64 = 1e-6;

/// Configuration for one cluster-filter pass
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Chromosome treated as its own high-density region
    pub sdr_chrom: String,
    /// Gaps with probability below this under the Poisson model are
    /// treated as non-random clustering
    pub p_value: f64,
    /// Lower bound for the gap threshold in bp
    pub min_threshold: u64,
    /// Optional .fai index; lengths found here win over ##contig headers
    pub fai: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            sdr_chrom: "Chr1_RagTag".to_string(),
            p_value: 0.05,
            min_threshold: 10,
            fai: None,
        }
    }
}

/// Cluster filtering counters and derived thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStats {
    pub kept: u64,
    pub removed: u64,
    pub density_sdr: f64,
    pub density_background: f64,
    pub threshold_sdr: u64,
    pub threshold_background: u64,
}

impl crate::ToolStats for ClusterStats {}

/// Parse contig lengths from a .fai index (name, length columns)
pub fn contig_lengths_from_fai<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, u64>, SvpostError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SvpostError::InputNotFound {
        path: path.display().to_string(),
        source,
    })?;
    let mut lengths = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut fields = line.split('\t');
        if let (Some(name), Some(len)) = (fields.next(), fields.next()) {
            if let Ok(len) = len.parse() {
                lengths.insert(name.to_string(), len);
            }
        }
    }
    Ok(lengths)
}

/// Parse contig lengths from `##contig=<ID=...,length=...>` header lines
pub fn contig_lengths_from_header<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, u64>, SvpostError> {
    let reader = vcf::open_vcf(path)?;
    let mut lengths = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if !line.starts_with('#') {
            break;
        }
        if let Some(rest) = line.strip_prefix("##contig=<") {
            let body = rest.trim_end_matches('>');
            let mut id = None;
            let mut len = None;
            for kv in body.split(',') {
                if let Some(value) = kv.strip_prefix("ID=") {
                    id = Some(value.to_string());
                } else if let Some(value) = kv.strip_prefix("length=") {
                    len = value.parse().ok();
                }
            }
            if let (Some(id), Some(len)) = (id, len) {
                lengths.insert(id, len);
            }
        }
    }
    Ok(lengths)
}

/// Minimum-gap threshold for a region of the given variant density:
/// gaps shorter than -ln(1 - p) / density occur with probability < p
pub fn distance_threshold(density: f64, p_value: f64, min_threshold: u64) -> u64 {
    if density <= 1e-9 {
        return min_threshold;
    }
    let computed = (-(1.0 - p_value).ln() / density) as u64;
    computed.max(min_threshold)
}

struct PendingVariant {
    line: String,
    chrom: String,
    pos: u64,
    keep: bool,
}

fn flush_pending(
    var: PendingVariant,
    writer: &mut BufWriter<File>,
    kept: &mut u64,
    removed: &mut u64,
) -> Result<(), SvpostError> {
    if var.keep {
        writeln!(writer, "{}", var.line)?;
        *kept += 1;
    } else {
        *removed += 1;
    }
    Ok(())
}

/// Two-pass cluster filter over one VCF file
pub struct ClusterFilter {
    pub config: ClusterConfig,
}

impl ClusterFilter {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Pass 1 measures densities, pass 2 rewrites the file with clustered
    /// pairs removed. Header lines pass through verbatim.
    pub fn filter_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ClusterStats, SvpostError> {
        let input = input.as_ref();
        let mut lengths = match &self.config.fai {
            Some(fai) => contig_lengths_from_fai(fai)?,
            None => HashMap::new(),
        };
        for (chrom, len) in contig_lengths_from_header(input)? {
            lengths.entry(chrom).or_insert(len);
        }

        let (density_sdr, density_background) = self.region_densities(input, &lengths)?;
        let threshold_sdr =
            distance_threshold(density_sdr, self.config.p_value, self.config.min_threshold);
        let threshold_background = distance_threshold(
            density_background,
            self.config.p_value,
            self.config.min_threshold,
        );

        let reader = vcf::open_vcf(input)?;
        let mut writer = BufWriter::new(File::create(output)?);
        let mut buffer: Vec<PendingVariant> = Vec::new();
        let mut kept = 0u64;
        let mut removed = 0u64;

        for line in reader.lines() {
            let line = line?;
            if vcf::is_header(&line) {
                writeln!(writer, "{}", line)?;
                continue;
            }
            let mut fields = line.split('\t');
            let chrom = match fields.next() {
                Some(chrom) => chrom.to_string(),
                None => continue,
            };
            let pos: u64 = match fields.next().and_then(|p| p.parse().ok()) {
                Some(pos) => pos,
                None => continue,
            };
            let threshold = if chrom == self.config.sdr_chrom {
                threshold_sdr
            } else {
                threshold_background
            };

            let mut current = PendingVariant {
                line: line.clone(),
                chrom,
                pos,
                keep: true,
            };
            let mut retained = Vec::new();
            for mut prev in buffer.drain(..) {
                if prev.chrom != current.chrom {
                    flush_pending(prev, &mut writer, &mut kept, &mut removed)?;
                    continue;
                }
                let dist = current.pos.saturating_sub(prev.pos);
                if dist > threshold {
                    flush_pending(prev, &mut writer, &mut kept, &mut removed)?;
                } else {
                    // both members of a close pair are suspect
                    prev.keep = false;
                    current.keep = false;
                    retained.push(prev);
                }
            }
            retained.push(current);
            buffer = retained;
        }
        for var in buffer {
            flush_pending(var, &mut writer, &mut kept, &mut removed)?;
        }
        writer.flush()?;

        Ok(ClusterStats {
            kept,
            removed,
            density_sdr,
            density_background,
            threshold_sdr,
            threshold_background,
        })
    }

    /// Per-bp variant density for the SDR chromosome and the background.
    /// Falls back to max observed position, then to an assumed genome
    /// size, when contig lengths are unknown.
    fn region_densities(
        &self,
        input: &Path,
        lengths: &HashMap<String, u64>,
    ) -> Result<(f64, f64), SvpostError> {
        let reader = vcf::open_vcf(input)?;
        let mut count_sdr = 0u64;
        let mut count_other = 0u64;
        let mut max_pos_sdr = 0u64;

        for line in reader.lines() {
            let line = line?;
            if vcf::is_header(&line) {
                continue;
            }
            let mut fields = line.split('\t');
            let chrom = match fields.next() {
                Some(chrom) => chrom,
                None => continue,
            };
            let pos: u64 = match fields.next().and_then(|p| p.parse().ok()) {
                Some(pos) => pos,
                None => continue,
            };
            if chrom == self.config.sdr_chrom {
                count_sdr += 1;
                max_pos_sdr = max_pos_sdr.max(pos);
            } else {
                count_other += 1;
            }
        }

        let mut len_sdr = lengths.get(&self.config.sdr_chrom).copied().unwrap_or(0);
        if len_sdr == 0 {
            len_sdr = if max_pos_sdr > 0 { max_pos_sdr } else { 1 };
        }

        let mut len_background: u64 = lengths
            .iter()
            .filter(|(chrom, _)| chrom.as_str() != self.config.sdr_chrom)
            .map(|(_, len)| len)
            .sum();
        if len_background == 0 {
            len_background = FALLBACK_BACKGROUND_BP;
        }

        let mut density_sdr = count_sdr as f64 / len_sdr as f64;
        let mut density_background = count_other as f64 / len_background as f64;
        if density_sdr == 0.0 {
            density_sdr = EPSILON_DENSITY;
        }
        if density_background == 0.0 {
            density_background = EPSILON_DENSITY;
        }
        Ok((density_sdr, density_background))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_threshold_formula() {
        // density 1/1000 bp, p = 0.05 -> -ln(0.95) * 1000 ~ 51 bp
        assert_eq!(distance_threshold(0.001, 0.05, 10), 51);
        // sparse regions still get at least the floor
        assert_eq!(distance_threshold(0.5, 0.05, 10), 10);
        assert_eq!(distance_threshold(0.0, 0.05, 10), 10);
    }

    #[test]
    fn test_contig_lengths_from_header() {
        let dir = std::env::temp_dir();
        let input = dir.join("svpost_cluster_header.vcf");
        std::fs::write(
            &input,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1,length=1000000>\n\
             ##contig=<ID=chr2,length=2000000,assembly=test>\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        )
        .unwrap();
        let lengths = contig_lengths_from_header(&input).unwrap();
        assert_eq!(lengths.get("chr1"), Some(&1_000_000));
        assert_eq!(lengths.get("chr2"), Some(&2_000_000));
    }

    #[test]
    fn test_cluster_filter_removes_both_neighbors() {
        let dir = std::env::temp_dir();
        let input = dir.join("svpost_cluster_in.vcf");
        let output = dir.join("svpost_cluster_out.vcf");
        // 4 variants on a 500 bp contig: density 0.008/bp, so the computed
        // gap (-ln(0.95)/0.008 ~ 6 bp) is raised to the 10 bp floor
        std::fs::write(
            &input,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1,length=500>\n\
             ##contig=<ID=chrX,length=1000000>\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t100\t.\tA\tT\t.\tPASS\t.\n\
             chr1\t105\t.\tA\tT\t.\tPASS\t.\n\
             chr1\t300\t.\tA\tT\t.\tPASS\t.\n\
             chr1\t450\t.\tA\tT\t.\tPASS\t.\n",
        )
        .unwrap();

        let filter = ClusterFilter::new(ClusterConfig {
            sdr_chrom: "chrX".to_string(),
            ..ClusterConfig::default()
        });
        let stats = filter.filter_file(&input, &output).unwrap();
        assert_eq!(stats.threshold_background, 10);

        // positions 100 and 105 are 5 bp apart: both removed
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.kept, 2);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(!written.contains("\t100\t"));
        assert!(!written.contains("\t105\t"));
        assert!(written.contains("\t300\t"));
        assert!(written.contains("\t450\t"));
    }
}
