
use crate::data_types::allele_counts::MAX_ALLELES;
use crate::data_types::locus::GenomicLocus;

/// Allele proportions for a single group at a single locus
#[derive(Clone, Debug, PartialEq)]
pub struct LocusAlleleProportions {
    /// The locus these proportions belong to
    locus: GenomicLocus,
    /// Fraction of called alleles carrying each allele index
    proportions: [f64; MAX_ALLELES]
}

impl LocusAlleleProportions {
    /// Constructor
    pub fn new(locus: GenomicLocus, proportions: [f64; MAX_ALLELES]) -> Self {
        Self {
            locus, proportions
        }
    }

    // getters
    pub fn locus(&self) -> &GenomicLocus {
        &self.locus
    }

    pub fn proportions(&self) -> &[f64; MAX_ALLELES] {
        &self.proportions
    }
}

/// All per-locus proportions for one group
#[derive(Clone, Debug, PartialEq)]
pub struct ProportionTable {
    /// Group label
    group: String,
    /// One entry per locus with at least one called allele
    rows: Vec<LocusAlleleProportions>
}

impl ProportionTable {
    /// Constructor
    pub fn new(group: String, rows: Vec<LocusAlleleProportions>) -> Self {
        Self {
            group, rows
        }
    }

    // getters
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn rows(&self) -> &[LocusAlleleProportions] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
