
use serde::Serialize;

use crate::data_types::locus::GenomicLocus;

/// The smoothing strategy that produced `dar_region`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SmoothingWindow {
    /// A span in basepairs, centered on the origin locus
    Fixed(u64),
    /// An odd number of loci, centered on the origin locus by rank
    Loci(usize)
}

impl SmoothingWindow {
    /// Positions (or loci) covered to the (left, right) of the origin.
    /// A fixed span covers exactly `span` positions; odd spans are centered and even spans lean one base left.
    pub fn flanks(&self) -> (u64, u64) {
        match self {
            SmoothingWindow::Fixed(span) => (span / 2, span.saturating_sub(1) / 2),
            SmoothingWindow::Loci(n) => {
                let k = (n.saturating_sub(1) / 2) as u64;
                (k, k)
            }
        }
    }
}

/// Whether the ranges of a table describe origin loci or smoothing windows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum RangeShape {
    #[strum(serialize = "origin")]
    Origin,
    #[strum(serialize = "region")]
    Region
}

/// A scored interval; 1-based closed coordinates.
/// The origin locus is always kept so the range can be flipped back to point form.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredRange {
    /// The locus the scores were computed at
    locus: GenomicLocus,
    /// First position covered
    start: u64,
    /// Last position covered
    end: u64,
    /// Point estimate at the origin locus
    dar_origin: f64,
    /// Window-smoothed estimate, if smoothing was requested
    dar_region: Option<f64>
}

impl ScoredRange {
    /// Creates a point range `[pos, pos]` at the origin locus
    pub fn from_origin(locus: GenomicLocus, dar_origin: f64, dar_region: Option<f64>) -> Self {
        let position = locus.position();
        Self {
            locus,
            start: position,
            end: position,
            dar_origin,
            dar_region
        }
    }

    /// Returns the same scores spanning a new interval
    pub fn with_interval(&self, start: u64, end: u64) -> Self {
        Self {
            locus: self.locus.clone(),
            start,
            end,
            dar_origin: self.dar_origin,
            dar_region: self.dar_region
        }
    }

    /// A range is point-like when it covers a single position
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    // getters
    pub fn locus(&self) -> &GenomicLocus {
        &self.locus
    }

    pub fn chrom(&self) -> &str {
        self.locus.chrom()
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn dar_origin(&self) -> f64 {
        self.dar_origin
    }

    pub fn dar_region(&self) -> Option<f64> {
        self.dar_region
    }
}

/// The DAR results for one contrast
#[derive(Clone, Debug, PartialEq)]
pub struct DarTable {
    /// Contrast label
    contrast: String,
    /// The smoothing window behind `dar_region`, if any
    window: Option<SmoothingWindow>,
    /// Current representation of the ranges
    shape: RangeShape,
    /// Scored ranges, sorted by chromosome (first appearance) and origin position
    ranges: Vec<ScoredRange>
}

impl DarTable {
    /// Constructor
    pub fn new(contrast: String, window: Option<SmoothingWindow>, shape: RangeShape, ranges: Vec<ScoredRange>) -> Self {
        Self {
            contrast, window, shape, ranges
        }
    }

    // getters
    pub fn contrast(&self) -> &str {
        &self.contrast
    }

    pub fn window(&self) -> Option<SmoothingWindow> {
        self.window
    }

    pub fn shape(&self) -> RangeShape {
        self.shape
    }

    pub fn ranges(&self) -> &[ScoredRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_and_interval() {
        let range = ScoredRange::from_origin(GenomicLocus::new("chr1", 100), 0.5, Some(0.25));
        assert!(range.is_point());
        assert_eq!((range.start(), range.end()), (100, 100));

        let window = range.with_interval(90, 110);
        assert!(!window.is_point());
        assert_eq!(window.locus(), range.locus());
        assert_eq!(window.dar_region(), Some(0.25));
    }

    #[test]
    fn test_flanks() {
        // 50 + 1 + 49 = 100 positions
        assert_eq!(SmoothingWindow::Fixed(100).flanks(), (50, 49));
        assert_eq!(SmoothingWindow::Fixed(101).flanks(), (50, 50));
        assert_eq!(SmoothingWindow::Fixed(1).flanks(), (0, 0));
        assert_eq!(SmoothingWindow::Loci(5).flanks(), (2, 2));
        assert_eq!(SmoothingWindow::Loci(1).flanks(), (0, 0));
        assert_eq!(RangeShape::Region.to_string(), "region");
    }
}
