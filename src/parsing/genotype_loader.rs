
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use log::{debug, info, trace};
use noodles::vcf;
use noodles::vcf::variant::record::samples::keys::key as vcf_key;
use noodles_util::variant::io::reader::Builder as VcfBuilder;
use std::path::Path;

use crate::data_types::genotype::{GenotypeCall, GenotypeError, GenotypeTable};
use crate::data_types::locus::GenomicLocus;

/// Genotypes pulled from a variant file, plus the header details needed downstream
#[derive(Debug)]
pub struct LoadedGenotypes {
    /// The canonical genotype table; loci are in file order
    table: GenotypeTable,
    /// Contig lengths declared in the header, when present
    chrom_lengths: IndexMap<String, u64>,
    /// Number of records that were not simple SNVs
    skipped_records: usize
}

impl LoadedGenotypes {
    // getters
    pub fn table(&self) -> &GenotypeTable {
        &self.table
    }

    pub fn chrom_lengths(&self) -> &IndexMap<String, u64> {
        &self.chrom_lengths
    }

    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    pub fn into_table(self) -> GenotypeTable {
        self.table
    }
}

/// Loads every SNV genotype from a VCF, VCF.gz or BCF file.
/// Records where REF or any ALT is longer than one base are skipped and counted.
/// # Arguments
/// * `vcf_fn` - the variant file, format is detected automatically
/// # Errors
/// * if the file cannot be opened or parsed
/// * if a genotype is not diploid
/// * if two SNV records share a locus, e.g. a split multi-allelic site
pub fn load_vcf_genotypes(vcf_fn: &Path) -> anyhow::Result<LoadedGenotypes> {
    let mut vcf_reader = VcfBuilder::default()
        .build_from_path(vcf_fn)
        .with_context(|| format!("Error while opening {vcf_fn:?}:"))?;
    let vcf_header = vcf_reader.read_header()
        .with_context(|| format!("Error while reading header of {vcf_fn:?}:"))?;

    let samples: Vec<String> = vcf_header.sample_names().iter().cloned().collect();
    let chrom_lengths: IndexMap<String, u64> = vcf_header.contigs().iter()
        .filter_map(|(name, contig)| contig.length().map(|l| (name.clone(), l as u64)))
        .collect();
    debug!("Found {} samples and {} contig lengths in {vcf_fn:?}", samples.len(), chrom_lengths.len());

    let mut loci = vec![];
    let mut calls = vec![];
    let mut skipped_records = 0;
    for result in vcf_reader.records(&vcf_header) {
        let record = result.with_context(|| format!("Error while reading record from {vcf_fn:?}:"))?;
        let record_buf = vcf::variant::RecordBuf::try_from_variant_record(&vcf_header, record.as_ref())?;

        if !is_snv(&record_buf) {
            trace!("Skipping non-SNV record at {}:{:?}", record_buf.reference_sequence_name(), record_buf.variant_start());
            skipped_records += 1;
            continue;
        }

        let locus = record_locus(&record_buf)?;
        let row = parse_sample_calls(&record_buf, samples.len())
            .with_context(|| format!("Error while parsing genotypes at {locus}:"))?;
        trace!("{locus}\t{row:?}");
        loci.push(locus);
        calls.push(row);
    }

    info!("Loaded {} SNV loci for {} samples from {vcf_fn:?}, skipped {skipped_records} other records.", loci.len(), samples.len());
    let table = GenotypeTable::new(loci, samples, calls)?;
    Ok(LoadedGenotypes {
        table,
        chrom_lengths,
        skipped_records
    })
}

/// True if REF and every ALT are a single base
fn is_snv(record: &vcf::variant::RecordBuf) -> bool {
    let alts = record.alternate_bases().as_ref();
    record.reference_bases().len() == 1 &&
        !alts.is_empty() &&
        alts.iter().all(|a| a.len() == 1)
}

/// Builds the locus, carrying the first ID and the REF base
fn record_locus(record: &vcf::variant::RecordBuf) -> anyhow::Result<GenomicLocus> {
    let chrom = record.reference_sequence_name();
    let position = record.variant_start()
        .ok_or(anyhow!("Missing POS for record on {chrom}"))?
        .get() as u64; // 1-based
    let id = record.ids().as_ref().iter().next().cloned();
    let reference = Some(record.reference_bases().to_string());
    Ok(GenomicLocus::with_annotation(chrom, position, id, reference))
}

/// Extracts one unphased diploid call per sample from the record
fn parse_sample_calls(record: &vcf::variant::RecordBuf, num_samples: usize) -> Result<Vec<GenotypeCall>, GenotypeError> {
    let all_samples = record.samples();
    (0..num_samples)
        .map(|sample_index| {
            let Some(sample) = all_samples.get_index(sample_index) else {
                return Ok(GenotypeCall::Missing);
            };
            match sample.get(vcf_key::GENOTYPE).flatten() {
                Some(gt) => parse_genotype(gt),
                None => Ok(GenotypeCall::Missing)
            }
        })
        .collect()
}

/// Converts a GT value into a call; any missing allele makes the whole call missing.
/// # Arguments
/// * `gt` - the GT field from the record
fn parse_genotype(gt: &vcf::variant::record_buf::samples::sample::Value) -> Result<GenotypeCall, GenotypeError> {
    let vcf::variant::record_buf::samples::sample::Value::Genotype(genotype) = gt else {
        return Err(GenotypeError::Malformed { call: format!("{gt:?}") });
    };

    let alleles = genotype.as_ref();
    if alleles.len() != 2 {
        return Err(GenotypeError::UnsupportedPloidy { call: format!("{alleles:?}"), ploidy: alleles.len() });
    }
    match (alleles[0].position(), alleles[1].position()) {
        (Some(i1), Some(i2)) => {
            let to_index = |i: usize| u8::try_from(i)
                .map_err(|_| GenotypeError::Malformed { call: format!("{alleles:?}") });
            Ok(GenotypeCall::Called(to_index(i1)?, to_index(i2)?).unphased())
        },
        _ => Ok(GenotypeCall::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_small_vcf() {
        let vcf_fn = PathBuf::from("test_data/small_cohort/cohort.vcf");
        let loaded = load_vcf_genotypes(&vcf_fn).unwrap();
        assert_eq!(loaded.skipped_records(), 2);
        assert_eq!(loaded.chrom_lengths().get("chr1"), Some(&1000));
        assert_eq!(loaded.chrom_lengths().get("chr2"), Some(&500));

        let table = loaded.table();
        let samples: Vec<&str> = table.samples().iter().map(|s| s.as_str()).collect();
        assert_eq!(samples, vec!["s1", "s2", "s3", "s4"]);
        assert_eq!(table.num_loci(), 5);

        let first = &table.loci()[0];
        assert_eq!(first.chrom(), "chr1");
        assert_eq!(first.position(), 100);
        assert_eq!(first.id(), Some("rs1"));
        assert_eq!(first.reference(), Some("A"));
        assert_eq!(table.loci()[1].id(), None);

        // phased and unphased calls come out identical and sorted
        assert_eq!(table.calls()[0], vec![
            GenotypeCall::Called(0, 0), GenotypeCall::Called(0, 1), GenotypeCall::Called(0, 1), GenotypeCall::Called(1, 1)
        ]);
        // half-missing calls are missing
        assert_eq!(table.calls()[1][3], GenotypeCall::Missing);
        // multi-allelic SNVs keep their allele indices
        assert_eq!(table.calls()[2][0], GenotypeCall::Called(1, 2));
    }

    #[test]
    fn test_split_multiallelic_rejected() {
        // two SNV records at chr1:100 with the same REF
        let vcf_fn = PathBuf::from("test_data/small_cohort/split_multiallelic.vcf");
        let err = load_vcf_genotypes(&vcf_fn).unwrap_err();
        let root = err.downcast_ref::<GenotypeError>();
        assert_eq!(root, Some(&GenotypeError::DuplicateLocus { locus: "chr1:100".to_string() }));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_vcf_genotypes(&PathBuf::from("test_data/does_not_exist.vcf")).is_err());
    }
}
