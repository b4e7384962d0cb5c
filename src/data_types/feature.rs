
/// A genomic interval of interest (e.g. a gene) with arbitrary attached metadata.
/// Coordinates are 1-based and closed.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature<T> {
    /// Chromosome name
    chrom: String,
    /// First position covered
    start: u64,
    /// Last position covered
    end: u64,
    /// Caller data carried through unchanged
    metadata: T
}

impl<T> Feature<T> {
    /// Constructor
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, metadata: T) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            metadata
        }
    }

    // getters
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn metadata(&self) -> &T {
        &self.metadata
    }
}

/// A feature together with the DAR value assigned to it
#[derive(Clone, Debug, PartialEq)]
pub struct AssignedFeature<T> {
    /// The original feature
    feature: Feature<T>,
    /// Mean of the overlapping scores, or the configured fill value
    dar: Option<f64>,
    /// Number of scored ranges that overlapped the feature
    num_overlaps: usize
}

impl<T> AssignedFeature<T> {
    /// Constructor
    pub fn new(feature: Feature<T>, dar: Option<f64>, num_overlaps: usize) -> Self {
        Self {
            feature, dar, num_overlaps
        }
    }

    // getters
    pub fn feature(&self) -> &Feature<T> {
        &self.feature
    }

    pub fn dar(&self) -> Option<f64> {
        self.dar
    }

    pub fn num_overlaps(&self) -> usize {
        self.num_overlaps
    }
}
