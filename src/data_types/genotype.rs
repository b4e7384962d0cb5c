
use indexmap::IndexSet;
use rustc_hash::FxHashSet as HashSet;
use std::str::FromStr;

use crate::data_types::locus::GenomicLocus;

/// Separator used for phased genotype calls
const PHASED_SEPARATOR: char = '|';
/// Separator used for unphased genotype calls
const UNPHASED_SEPARATOR: char = '/';
/// Marker for a missing allele
const MISSING_ALLELE: &str = ".";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GenotypeError {
    #[error("malformed genotype call: {call:?}")]
    Malformed { call: String },
    #[error("only diploid calls are supported, found {ploidy} alleles in {call:?}")]
    UnsupportedPloidy { call: String, ploidy: usize },
    #[error("duplicate sample identifier in genotype table: {sample}")]
    DuplicateSample { sample: String },
    #[error("locus {locus} appears more than once; split multi-allelic records must be merged first (e.g. bcftools norm -m+)")]
    DuplicateLocus { locus: String },
    #[error("expected {expected} rows of calls (one per locus), found {found}")]
    LocusCountMismatch { expected: usize, found: usize },
    #[error("locus {locus} has {found} calls, expected {expected} (one per sample)")]
    SampleCountMismatch { locus: String, expected: usize, found: usize }
}

/// Collapses any phased separators in a genotype string into unphased separators.
/// Phase order is irrelevant for allele counting, so `0|1` becomes `0/1`.
/// Applying this twice gives the same result as applying it once.
/// # Arguments
/// * `call` - the raw genotype string, e.g. `1|0`
pub fn unphase_genotype(call: &str) -> String {
    call.replace(PHASED_SEPARATOR, &UNPHASED_SEPARATOR.to_string())
}

/// A diploid genotype call for one sample at one locus.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenotypeCall {
    /// At least one allele could not be resolved, e.g. `./.` or `./1`
    Missing,
    /// Both allele indices; 0 is the reference allele
    Called(u8, u8)
}

impl GenotypeCall {
    /// Returns the same call with the allele copies sorted, so `1/0` and `0/1` compare equal.
    pub fn unphased(self) -> Self {
        match self {
            GenotypeCall::Missing => GenotypeCall::Missing,
            GenotypeCall::Called(a, b) => GenotypeCall::Called(a.min(b), a.max(b))
        }
    }

    /// Returns true if this call is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, GenotypeCall::Missing)
    }
}

impl FromStr for GenotypeCall {
    type Err = GenotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unphased = unphase_genotype(s.trim());
        if unphased.is_empty() {
            return Err(GenotypeError::Malformed { call: s.to_string() });
        }
        if unphased == MISSING_ALLELE {
            // a bare "." is how VCF spells a fully missing call
            return Ok(GenotypeCall::Missing);
        }

        let alleles: Vec<&str> = unphased.split(UNPHASED_SEPARATOR).collect();
        if alleles.len() != 2 {
            return Err(GenotypeError::UnsupportedPloidy { call: s.to_string(), ploidy: alleles.len() });
        }
        if alleles.iter().any(|&a| a == MISSING_ALLELE) {
            return Ok(GenotypeCall::Missing);
        }

        let parse_index = |a: &str| -> Result<u8, GenotypeError> {
            a.parse::<u8>().map_err(|_| GenotypeError::Malformed { call: s.to_string() })
        };
        Ok(GenotypeCall::Called(parse_index(alleles[0])?, parse_index(alleles[1])?).unphased())
    }
}

impl std::fmt::Display for GenotypeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenotypeCall::Missing => write!(f, "./."),
            GenotypeCall::Called(a, b) => write!(f, "{a}/{b}")
        }
    }
}

/// The canonical locus-by-sample matrix of genotype calls that feeds allele counting.
/// Every input shape (VCF, string matrix) is converted into this before any counting happens.
#[derive(Clone, Debug, PartialEq)]
pub struct GenotypeTable {
    /// Loci along the row axis
    loci: Vec<GenomicLocus>,
    /// Sample identifiers along the column axis
    samples: IndexSet<String>,
    /// Row-major calls; `calls[locus_index][sample_index]`
    calls: Vec<Vec<GenotypeCall>>
}

impl GenotypeTable {
    /// General constructor with shape checks
    /// # Arguments
    /// * `loci` - the loci, one per row
    /// * `samples` - sample identifiers, one per column
    /// * `calls` - the genotype calls, one row per locus
    /// # Errors
    /// * if a sample identifier is duplicated
    /// * if a locus is duplicated
    /// * if the number of rows or columns does not match `loci` and `samples`
    pub fn new(loci: Vec<GenomicLocus>, samples: Vec<String>, calls: Vec<Vec<GenotypeCall>>) -> Result<Self, GenotypeError> {
        let mut sample_set: IndexSet<String> = IndexSet::with_capacity(samples.len());
        for sample in samples.into_iter() {
            if sample_set.contains(&sample) {
                return Err(GenotypeError::DuplicateSample { sample });
            }
            sample_set.insert(sample);
        }

        let mut seen_loci: HashSet<&GenomicLocus> = HashSet::with_capacity_and_hasher(loci.len(), Default::default());
        for locus in loci.iter() {
            if !seen_loci.insert(locus) {
                return Err(GenotypeError::DuplicateLocus { locus: locus.to_string() });
            }
        }

        if calls.len() != loci.len() {
            return Err(GenotypeError::LocusCountMismatch { expected: loci.len(), found: calls.len() });
        }
        for (locus, row) in loci.iter().zip(calls.iter()) {
            if row.len() != sample_set.len() {
                return Err(GenotypeError::SampleCountMismatch {
                    locus: locus.to_string(), expected: sample_set.len(), found: row.len()
                });
            }
        }

        Ok(Self {
            loci,
            samples: sample_set,
            calls
        })
    }

    /// Adapter for string matrices such as `[["0/1", "1|1"], ["./.", "0/0"]]`.
    /// Every call is unphased while parsing.
    /// # Arguments
    /// * `loci` - the loci, one per row
    /// * `samples` - sample identifiers, one per column
    /// * `rows` - genotype strings, one row per locus
    /// # Errors
    /// * if any genotype string fails to parse
    /// * if the shape checks in `new(...)` fail
    pub fn from_strings<S: AsRef<str>>(loci: Vec<GenomicLocus>, samples: Vec<String>, rows: &[Vec<S>]) -> Result<Self, GenotypeError> {
        let calls: Vec<Vec<GenotypeCall>> = rows.iter()
            .map(|row| {
                row.iter()
                    .map(|s| s.as_ref().parse::<GenotypeCall>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;
        Self::new(loci, samples, calls)
    }

    /// Returns a copy of this table with every call unphased.
    pub fn unphased(&self) -> Self {
        let calls = self.calls.iter()
            .map(|row| row.iter().map(|c| c.unphased()).collect())
            .collect();
        Self {
            loci: self.loci.clone(),
            samples: self.samples.clone(),
            calls
        }
    }

    /// Returns the column index of a sample if it exists
    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.get_index_of(sample)
    }

    // getters
    pub fn loci(&self) -> &[GenomicLocus] {
        &self.loci
    }

    pub fn samples(&self) -> &IndexSet<String> {
        &self.samples
    }

    pub fn calls(&self) -> &[Vec<GenotypeCall>] {
        &self.calls
    }

    pub fn num_loci(&self) -> usize {
        self.loci.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unphase_genotype() {
        assert_eq!(unphase_genotype("0|1"), "0/1");
        assert_eq!(unphase_genotype("1|0"), "1/0");
        assert_eq!(unphase_genotype("0/1"), "0/1");
        assert_eq!(unphase_genotype(".|."), "./.");

        // idempotent
        for gt in ["0|1", "2|3", "./.", "1/1", "0|0"] {
            let once = unphase_genotype(gt);
            assert_eq!(unphase_genotype(&once), once);
        }
    }

    #[test]
    fn test_parse_calls() {
        assert_eq!("0/1".parse::<GenotypeCall>().unwrap(), GenotypeCall::Called(0, 1));
        assert_eq!("1|0".parse::<GenotypeCall>().unwrap(), GenotypeCall::Called(0, 1));
        assert_eq!("3/2".parse::<GenotypeCall>().unwrap(), GenotypeCall::Called(2, 3));
        assert_eq!("./.".parse::<GenotypeCall>().unwrap(), GenotypeCall::Missing);
        assert_eq!(".".parse::<GenotypeCall>().unwrap(), GenotypeCall::Missing);
        assert_eq!("./1".parse::<GenotypeCall>().unwrap(), GenotypeCall::Missing);

        // out of range indices still parse, the counter rejects them
        assert_eq!("0/7".parse::<GenotypeCall>().unwrap(), GenotypeCall::Called(0, 7));

        assert!(matches!("1".parse::<GenotypeCall>(), Err(GenotypeError::UnsupportedPloidy { ploidy: 1, .. })));
        assert!(matches!("0/1/1".parse::<GenotypeCall>(), Err(GenotypeError::UnsupportedPloidy { ploidy: 3, .. })));
        assert!(matches!("A/T".parse::<GenotypeCall>(), Err(GenotypeError::Malformed { .. })));
        assert!(matches!("".parse::<GenotypeCall>(), Err(GenotypeError::Malformed { .. })));
    }

    #[test]
    fn test_call_unphased_idempotent() {
        let calls = [GenotypeCall::Called(1, 0), GenotypeCall::Called(2, 2), GenotypeCall::Missing];
        for call in calls {
            assert_eq!(call.unphased().unphased(), call.unphased());
        }
        assert_eq!(GenotypeCall::Called(1, 0).unphased().to_string(), "0/1");
    }

    #[test]
    fn test_table_shape_checks() {
        let loci = vec![GenomicLocus::new("chr1", 10), GenomicLocus::new("chr1", 20)];
        let samples = vec!["s1".to_string(), "s2".to_string()];

        let table = GenotypeTable::from_strings(
            loci.clone(), samples.clone(),
            &[vec!["0|1", "1/1"], vec!["./.", "1|0"]]
        ).unwrap();
        assert_eq!(table.num_loci(), 2);
        assert_eq!(table.sample_index("s2"), Some(1));
        assert_eq!(table.sample_index("s3"), None);
        assert_eq!(table.calls()[1][1], GenotypeCall::Called(0, 1));
        assert_eq!(table.unphased(), table.unphased().unphased());

        let dup = GenotypeTable::from_strings(
            loci.clone(), vec!["s1".to_string(), "s1".to_string()],
            &[vec!["0/1", "1/1"], vec!["./.", "1/0"]]
        );
        assert_eq!(dup.unwrap_err(), GenotypeError::DuplicateSample { sample: "s1".to_string() });

        let repeated = GenotypeTable::from_strings(
            vec![GenomicLocus::new("chr1", 10), GenomicLocus::new("chr1", 10)], samples.clone(),
            &[vec!["0/0", "1/1"], vec!["0/0", "0/0"]]
        );
        assert_eq!(repeated.unwrap_err(), GenotypeError::DuplicateLocus { locus: "chr1:10".to_string() });

        let short_rows = GenotypeTable::from_strings(loci.clone(), samples.clone(), &[vec!["0/1", "1/1"]]);
        assert!(matches!(short_rows, Err(GenotypeError::LocusCountMismatch { expected: 2, found: 1 })));

        let short_cols = GenotypeTable::from_strings(loci, samples, &[vec!["0/1"], vec!["0/0", "0/0"]]);
        assert!(matches!(short_cols, Err(GenotypeError::SampleCountMismatch { expected: 2, found: 1, .. })));
    }
}
