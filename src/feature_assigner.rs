/*!
# Feature assigner
Projects DAR scores onto caller features (e.g. genes) by averaging every scored range that overlaps each feature.
Every input feature comes back out, in order; features without any overlap receive the configured fill value.
*/
use coitrees::{COITree, Interval, IntervalTree};
use derive_builder::Builder;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use strum_macros::EnumString;

use crate::data_types::feature::{AssignedFeature, Feature};
use crate::data_types::scored_range::{DarTable, RangeShape, ScoredRange};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AssignError {
    #[error("position {position} on {chrom} does not fit the interval index")]
    CoordinateOverflow { chrom: String, position: u64 },
    #[error("invalid interval {chrom}:{start}-{end}, start must be >= 1 and <= end")]
    InvalidInterval { chrom: String, start: u64, end: u64 }
}

/// Which DAR value gets averaged onto features
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum DarValue {
    /// The per-locus point estimate
    #[strum(ascii_case_insensitive, serialize = "origin")]
    #[clap(name = "origin")]
    Origin,
    /// The window-smoothed estimate
    #[default]
    #[strum(ascii_case_insensitive, serialize = "region")]
    #[clap(name = "region")]
    Region
}

/// Non-fatal signal that the selected value does not match the shape of the ranges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeAdvisory {
    /// `region` was selected but the ranges are origin loci
    RegionOnPoints,
    /// `origin` was selected but the ranges are smoothing windows
    OriginOnWindows
}

impl std::fmt::Display for ShapeAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeAdvisory::RegionOnPoints => write!(f, "dar_val=region was selected, but the ranges are origin loci; consider flipping them to region windows first"),
            ShapeAdvisory::OriginOnWindows => write!(f, "dar_val=origin was selected, but the ranges span smoothing windows; consider flipping them back to origin loci first")
        }
    }
}

/// Controls how scores are projected onto features
#[derive(Builder, Clone, Copy, Debug, Default, Serialize)]
#[builder(default)]
pub struct AssignConfig {
    /// The score to average
    dar_val: DarValue,
    /// Value for features without overlapping scores; None means missing
    fill: Option<f64>
}

impl AssignConfig {
    pub fn dar_val(&self) -> DarValue {
        self.dar_val
    }

    pub fn fill(&self) -> Option<f64> {
        self.fill
    }
}

/// The result of a feature assignment
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureAssignment<T> {
    /// One entry per input feature, same order
    features: Vec<AssignedFeature<T>>,
    /// Set when `dar_val` looks mismatched with the range shape
    advisory: Option<ShapeAdvisory>
}

impl<T> FeatureAssignment<T> {
    pub fn features(&self) -> &[AssignedFeature<T>] {
        &self.features
    }

    pub fn advisory(&self) -> Option<ShapeAdvisory> {
        self.advisory
    }

    pub fn into_features(self) -> Vec<AssignedFeature<T>> {
        self.features
    }
}

/// Converts a 1-based closed interval into coitrees coordinates
fn to_coi(chrom: &str, start: u64, end: u64) -> Result<(i32, i32), AssignError> {
    if start == 0 || start > end {
        return Err(AssignError::InvalidInterval { chrom: chrom.to_string(), start, end });
    }
    let convert = |position: u64| {
        i32::try_from(position).map_err(|_| AssignError::CoordinateOverflow { chrom: chrom.to_string(), position })
    };
    Ok((convert(start)?, convert(end)?))
}

/// Decides whether `dar_val` looks mismatched with the ranges.
/// A declared shape wins; otherwise the geometry decides, where all single-position ranges count as origin form.
fn shape_advisory(ranges: &[ScoredRange], shape: Option<RangeShape>, dar_val: DarValue) -> Option<ShapeAdvisory> {
    if ranges.is_empty() {
        return None;
    }
    let shape = shape.unwrap_or_else(|| {
        if ranges.iter().all(|r| r.is_point()) { RangeShape::Origin } else { RangeShape::Region }
    });
    match (dar_val, shape) {
        (DarValue::Region, RangeShape::Origin) => Some(ShapeAdvisory::RegionOnPoints),
        (DarValue::Origin, RangeShape::Region) => Some(ShapeAdvisory::OriginOnWindows),
        _ => None
    }
}

/// Averages the selected DAR value of every overlapping range onto each feature.
/// Ranges without the selected value (e.g. no `dar_region`) are ignored.
/// The shape advisory is inferred from the range geometry; use `assign_table_dar(...)` when the table shape is known.
/// # Arguments
/// * `ranges` - scored ranges in either origin or region form
/// * `features` - the target features, returned in the same order
/// * `config` - value selection and fill
/// # Errors
/// * if a range or feature has invalid coordinates
pub fn assign_feature_dar<T>(ranges: &[ScoredRange], features: Vec<Feature<T>>, config: &AssignConfig) -> Result<FeatureAssignment<T>, AssignError> {
    assign_ranges(ranges, None, features, config)
}

/// Same as `assign_feature_dar(...)`, but the advisory follows the shape recorded on `table`.
/// This keeps single-locus region windows (e.g. `region_loci = 1`) from being flagged as origin ranges.
/// # Errors
/// * if a range or feature has invalid coordinates
pub fn assign_table_dar<T>(table: &DarTable, features: Vec<Feature<T>>, config: &AssignConfig) -> Result<FeatureAssignment<T>, AssignError> {
    assign_ranges(table.ranges(), Some(table.shape()), features, config)
}

fn assign_ranges<T>(ranges: &[ScoredRange], shape: Option<RangeShape>, features: Vec<Feature<T>>, config: &AssignConfig) -> Result<FeatureAssignment<T>, AssignError> {
    let advisory = shape_advisory(ranges, shape, config.dar_val);
    if let Some(a) = advisory {
        warn!("{a}");
    }

    // build one lookup tree per chromosome, metadata is the range index
    let mut chrom_intervals: IndexMap<&str, Vec<Interval<usize>>> = Default::default();
    for (index, range) in ranges.iter().enumerate() {
        let (first, last) = to_coi(range.chrom(), range.start(), range.end())?;
        chrom_intervals.entry(range.chrom()).or_default()
            .push(Interval::new(first, last, index));
    }
    let lookup_trees: IndexMap<&str, COITree<usize, usize>> = chrom_intervals.iter()
        .map(|(&chrom, intervals)| (chrom, COITree::new(intervals)))
        .collect();

    let selected = |range: &ScoredRange| -> Option<f64> {
        match config.dar_val {
            DarValue::Origin => Some(range.dar_origin()),
            DarValue::Region => range.dar_region()
        }
    };

    let mut assigned = Vec::with_capacity(features.len());
    let mut num_filled = 0;
    for feature in features.into_iter() {
        let (first, last) = to_coi(feature.chrom(), feature.start(), feature.end())?;
        let mut total = 0.0;
        let mut count = 0_usize;
        if let Some(tree) = lookup_trees.get(feature.chrom()) {
            tree.query(first, last, |node| {
                // metadata is a value or a reference depending on the coitrees backend
                if let Some(value) = selected(&ranges[node.metadata.clone()]) {
                    total += value;
                    count += 1;
                }
            });
        }

        let dar = if count > 0 {
            Some(total / count as f64)
        } else {
            num_filled += 1;
            config.fill
        };
        assigned.push(AssignedFeature::new(feature, dar, count));
    }
    debug!("Assigned DAR to {} features, {num_filled} without overlapping scores", assigned.len());

    Ok(FeatureAssignment {
        features: assigned,
        advisory
    })
}
