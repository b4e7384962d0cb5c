
use serde::{Deserialize, Serialize};

/// A single genomic position under analysis.
/// Positions are 1-based, matching VCF POS.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GenomicLocus {
    /// Chromosome or contig name
    chrom: String,
    /// The 1-based position on `chrom`
    position: u64,
    /// Optional variant identifier, usually the VCF ID column
    id: Option<String>,
    /// Optional reference allele
    reference: Option<String>
}

impl GenomicLocus {
    /// Constructor for a bare (chromosome, position) locus
    pub fn new(chrom: impl Into<String>, position: u64) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            id: None,
            reference: None
        }
    }

    /// Constructor that also carries the VCF-level annotations
    /// # Arguments
    /// * `chrom` - the chromosome name
    /// * `position` - 1-based position
    /// * `id` - optional identifier
    /// * `reference` - optional reference allele
    pub fn with_annotation(chrom: impl Into<String>, position: u64, id: Option<String>, reference: Option<String>) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            id,
            reference
        }
    }

    // getters
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl std::fmt::Display for GenomicLocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chrom, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_getters() {
        let locus = GenomicLocus::with_annotation("chr1", 1500, Some("rs42".to_string()), Some("A".to_string()));
        assert_eq!(locus.to_string(), "chr1:1500");
        assert_eq!(locus.chrom(), "chr1");
        assert_eq!(locus.position(), 1500);
        assert_eq!(locus.id(), Some("rs42"));
        assert_eq!(locus.reference(), Some("A"));

        let bare = GenomicLocus::new("chr2", 10);
        assert_eq!(bare.id(), None);
        assert_eq!(bare.reference(), None);
    }
}
