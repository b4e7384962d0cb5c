/*!
# Range flipper
Switches a DAR table between its two representations:
* origin form, where each scored range is the single position `[p, p]` of the locus the score was computed at
* region form, where each scored range is the smoothing window that produced its `dar_region`

The window geometry lives here and is shared with the DAR calculator, so the region intervals are exactly the windows that were averaged.
Without edge extension, flipping twice always returns the original table.
*/
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashSet as HashSet;
use std::ops::Range;

use crate::data_types::locus::GenomicLocus;
use crate::data_types::scored_range::{DarTable, RangeShape, ScoredRange, SmoothingWindow};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FlipError {
    #[error("contrast {contrast} has no smoothing window, so there is no region to flip to")]
    NoRegion { contrast: String },
    #[error("contrast {contrast} is not sorted by chromosome and position at {locus}")]
    Unsorted { contrast: String, locus: String }
}

/// Splits loci into runs of consecutive entries on the same chromosome.
/// Loci are expected to be grouped by chromosome and sorted by position within each group.
pub fn chromosome_runs(loci: &[&GenomicLocus]) -> Vec<Range<usize>> {
    let mut runs = vec![];
    let mut run_start = 0;
    for i in 1..=loci.len() {
        if i == loci.len() || loci[i].chrom() != loci[run_start].chrom() {
            runs.push(run_start..i);
            run_start = i;
        }
    }
    runs
}

/// For every locus, returns the inclusive index range `(first, last)` of loci that fall inside its window.
/// Windows never cross chromosomes, and loci near a chromosome edge simply get fewer neighbors.
/// # Arguments
/// * `loci` - loci grouped by chromosome and sorted by position
/// * `window` - the smoothing strategy
pub fn window_bounds(loci: &[&GenomicLocus], window: SmoothingWindow) -> Vec<(usize, usize)> {
    let mut bounds = Vec::with_capacity(loci.len());
    for run in chromosome_runs(loci) {
        match window {
            SmoothingWindow::Loci(_) => {
                let k = window.flanks().0 as usize;
                for i in run.clone() {
                    let first = i.saturating_sub(k).max(run.start);
                    let last = (i + k).min(run.end - 1);
                    bounds.push((first, last));
                }
            },
            SmoothingWindow::Fixed(_) => {
                let (left, right) = window.flanks();
                let positions: Vec<u64> = loci[run.clone()].iter().map(|l| l.position()).collect();
                for &p in positions.iter() {
                    let lower = p.saturating_sub(left);
                    let upper = p.saturating_add(right);
                    let first = positions.partition_point(|&x| x < lower);
                    // always >= 1 since p itself is inside the window
                    let last = positions.partition_point(|&x| x <= upper) - 1;
                    bounds.push((run.start + first, run.start + last));
                }
            }
        }
    }
    bounds
}

/// Returns the genomic interval covered by the window of locus `index`.
/// Fixed windows cover exactly the span around the origin; loci windows run from the first to the last contributing locus.
fn window_interval(loci: &[&GenomicLocus], bounds: (usize, usize), index: usize, window: SmoothingWindow) -> (u64, u64) {
    match window {
        SmoothingWindow::Fixed(_) => {
            let p = loci[index].position();
            let (left, right) = window.flanks();
            (p.saturating_sub(left).max(1), p.saturating_add(right))
        },
        SmoothingWindow::Loci(_) => (loci[bounds.0].position(), loci[bounds.1].position())
    }
}

/// Returns the first locus that breaks chromosome grouping or position order, if any
fn first_unsorted<'a>(loci: &[&'a GenomicLocus]) -> Option<&'a GenomicLocus> {
    let mut finished: HashSet<&str> = Default::default();
    for pair in loci.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        if previous.chrom() == current.chrom() {
            if current.position() < previous.position() {
                return Some(current);
            }
        } else {
            finished.insert(previous.chrom());
            if finished.contains(current.chrom()) {
                return Some(current);
            }
        }
    }
    None
}

/// Flips a DAR table to the other representation.
/// # Arguments
/// * `table` - the table to flip
/// * `extend_edges` - when flipping to region form, stretch the first window on each chromosome to position 1 and the last window to the chromosome end
/// * `chrom_lengths` - optional chromosome lengths; without an entry the last window keeps its own end
/// # Errors
/// * if the table is in origin form and was computed without smoothing
/// * if the origin loci are not grouped by chromosome and sorted by position
pub fn flip_ranges(table: &DarTable, extend_edges: bool, chrom_lengths: Option<&IndexMap<String, u64>>) -> Result<DarTable, FlipError> {
    match table.shape() {
        RangeShape::Region => {
            if extend_edges {
                debug!("Edge extension has no effect when flipping {} back to origin ranges", table.contrast());
            }
            let ranges = table.ranges().iter()
                .map(|r| r.with_interval(r.locus().position(), r.locus().position()))
                .collect();
            Ok(DarTable::new(table.contrast().to_string(), table.window(), RangeShape::Origin, ranges))
        },
        RangeShape::Origin => {
            let window = table.window()
                .ok_or_else(|| FlipError::NoRegion { contrast: table.contrast().to_string() })?;
            let loci: Vec<&GenomicLocus> = table.ranges().iter().map(|r| r.locus()).collect();
            if let Some(locus) = first_unsorted(&loci) {
                return Err(FlipError::Unsorted { contrast: table.contrast().to_string(), locus: locus.to_string() });
            }
            let bounds = window_bounds(&loci, window);

            let mut ranges: Vec<ScoredRange> = table.ranges().iter()
                .zip(bounds.iter())
                .enumerate()
                .map(|(i, (range, &b))| {
                    let (start, end) = window_interval(&loci, b, i, window);
                    range.with_interval(start, end)
                })
                .collect();

            if extend_edges {
                for run in chromosome_runs(&loci) {
                    let first = run.start;
                    let last = run.end - 1;
                    ranges[first] = ranges[first].with_interval(1, ranges[first].end());
                    let chrom_end = chrom_lengths
                        .and_then(|cl| cl.get(ranges[last].chrom()).copied())
                        .unwrap_or(ranges[last].end());
                    ranges[last] = ranges[last].with_interval(ranges[last].start(), chrom_end);
                }
            }

            Ok(DarTable::new(table.contrast().to_string(), Some(window), RangeShape::Region, ranges))
        }
    }
}
