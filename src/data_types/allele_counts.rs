
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::data_types::locus::GenomicLocus;

/// Number of allele indices tracked per locus: the reference plus up to three alternates
pub const MAX_ALLELES: usize = 4;

/// Named columns of a count table, used when filtering loci
#[derive(AsRefStr, Clone, Copy, Debug, EnumIter, EnumString, Eq, Hash, PartialEq)]
pub enum CountColumn {
    #[strum(serialize = "n_called")]
    Called,
    #[strum(serialize = "n_missing")]
    Missing,
    #[strum(serialize = "n_0")]
    Allele0,
    #[strum(serialize = "n_1")]
    Allele1,
    #[strum(serialize = "n_2")]
    Allele2,
    #[strum(serialize = "n_3")]
    Allele3
}

/// Allele tallies for a single group at a single locus
#[derive(Clone, Debug, PartialEq)]
pub struct LocusAlleleCounts {
    /// The locus these counts belong to
    locus: GenomicLocus,
    /// Samples with a fully resolved call
    n_called: u64,
    /// Samples with a missing call
    n_missing: u64,
    /// Occurrences of each allele index across both copies of every called sample
    n_alleles: [u64; MAX_ALLELES]
}

impl LocusAlleleCounts {
    /// Constructor
    pub fn new(locus: GenomicLocus, n_called: u64, n_missing: u64, n_alleles: [u64; MAX_ALLELES]) -> Self {
        Self {
            locus, n_called, n_missing, n_alleles
        }
    }

    /// Returns the value of a named column
    pub fn column(&self, column: CountColumn) -> u64 {
        match column {
            CountColumn::Called => self.n_called,
            CountColumn::Missing => self.n_missing,
            CountColumn::Allele0 => self.n_alleles[0],
            CountColumn::Allele1 => self.n_alleles[1],
            CountColumn::Allele2 => self.n_alleles[2],
            CountColumn::Allele3 => self.n_alleles[3]
        }
    }

    /// Total number of called alleles; twice `n_called` for diploid calls
    pub fn total_alleles(&self) -> u64 {
        self.n_alleles.iter().sum()
    }

    // getters
    pub fn locus(&self) -> &GenomicLocus {
        &self.locus
    }

    pub fn n_called(&self) -> u64 {
        self.n_called
    }

    pub fn n_missing(&self) -> u64 {
        self.n_missing
    }

    pub fn n_alleles(&self) -> &[u64; MAX_ALLELES] {
        &self.n_alleles
    }
}

/// All per-locus counts for one group
#[derive(Clone, Debug, PartialEq)]
pub struct CountTable {
    /// Group label
    group: String,
    /// Number of samples in the group
    group_size: usize,
    /// One entry per retained locus
    rows: Vec<LocusAlleleCounts>
}

impl CountTable {
    /// Constructor
    pub fn new(group: String, group_size: usize, rows: Vec<LocusAlleleCounts>) -> Self {
        Self {
            group, group_size, rows
        }
    }

    /// Returns a copy of this table keeping only the rows that pass `keep`
    pub fn retain_rows<F: Fn(&LocusAlleleCounts) -> bool>(&self, keep: F) -> Self {
        Self {
            group: self.group.clone(),
            group_size: self.group_size,
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect()
        }
    }

    // getters
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn rows(&self) -> &[LocusAlleleCounts] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_column_names() {
        let names: Vec<String> = CountColumn::iter().map(|c| c.as_ref().to_string()).collect();
        assert_eq!(names, vec!["n_called", "n_missing", "n_0", "n_1", "n_2", "n_3"]);
        assert_eq!(CountColumn::from_str("n_2").unwrap(), CountColumn::Allele2);
        assert!(CountColumn::from_str("n_4").is_err());
    }

    #[test]
    fn test_column_lookup() {
        let counts = LocusAlleleCounts::new(GenomicLocus::new("chr1", 5), 3, 1, [4, 1, 1, 0]);
        assert_eq!(counts.column(CountColumn::Called), 3);
        assert_eq!(counts.column(CountColumn::Missing), 1);
        assert_eq!(counts.column(CountColumn::Allele0), 4);
        assert_eq!(counts.column(CountColumn::Allele2), 1);
        assert_eq!(counts.total_alleles(), 6);
    }

    #[test]
    fn test_retain_rows() {
        let table = CountTable::new("g".to_string(), 2, vec![
            LocusAlleleCounts::new(GenomicLocus::new("chr1", 5), 2, 0, [4, 0, 0, 0]),
            LocusAlleleCounts::new(GenomicLocus::new("chr1", 6), 1, 1, [1, 1, 0, 0]),
        ]);
        let filtered = table.retain_rows(|r| r.n_missing() == 0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.group_size(), 2);
        assert_eq!(table.len(), 2);
    }
}
