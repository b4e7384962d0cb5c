/*!
# DAR calculator
Computes the Differential Allelic Representation for each contrast.
At each locus shared by every group in a contrast, the contrast-weighted difference of allele proportions is reduced to its Euclidean norm
and scaled by √2, the largest distance between two proportion vectors, giving `dar_origin` in [0, 1].
Optionally, `dar_region` averages `dar_origin` over a window of neighboring loci.

## Example usage
```rust
use dar::dar_calculator::{compute_dar, DarConfigBuilder};
use dar::data_types::contrast::Contrast;
use dar::data_types::locus::GenomicLocus;
use dar::data_types::proportions::{LocusAlleleProportions, ProportionTable};
use indexmap::IndexMap;

let locus = GenomicLocus::new("chr1", 100);
let mut props: IndexMap<String, ProportionTable> = IndexMap::new();
props.insert("a".to_string(), ProportionTable::new("a".to_string(), vec![
    LocusAlleleProportions::new(locus.clone(), [1.0, 0.0, 0.0, 0.0])
]));
props.insert("b".to_string(), ProportionTable::new("b".to_string(), vec![
    LocusAlleleProportions::new(locus.clone(), [0.0, 1.0, 0.0, 0.0])
]));

let contrast = Contrast::pairwise("a", "b").unwrap();
let config = DarConfigBuilder::default().region_loci(Some(3)).build().unwrap();
let results = compute_dar(&props, &[contrast], &config).unwrap();
assert_eq!(results[0].ranges()[0].dar_origin(), 1.0);
assert_eq!(results[0].ranges()[0].dar_region(), Some(1.0));
```
*/
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;
use std::f64::consts::SQRT_2;

use crate::data_types::allele_counts::MAX_ALLELES;
use crate::data_types::contrast::Contrast;
use crate::data_types::locus::GenomicLocus;
use crate::data_types::proportions::ProportionTable;
use crate::data_types::scored_range::{DarTable, RangeShape, ScoredRange, SmoothingWindow};
use crate::range_flipper::window_bounds;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DarError {
    #[error("contrast {contrast} references group {group}, which has no proportion table")]
    UnknownGroup { contrast: String, group: String },
    #[error("group {group} holds locus {locus} more than once")]
    DuplicateLocus { group: String, locus: String },
    #[error("smoothing was requested but neither region_fixed nor region_loci was provided")]
    MissingWindow,
    #[error("region_loci must be a positive odd number, found {value}")]
    InvalidRegionLoci { value: usize },
    #[error("region_fixed must be > 0")]
    InvalidRegionFixed
}

/// Controls the smoothing applied on top of the per-locus scores
#[derive(Builder, Clone, Copy, Debug, Default, Serialize)]
#[builder(default)]
pub struct DarConfig {
    /// Window span in basepairs, split evenly around each origin locus; wins over `region_loci`
    region_fixed: Option<u64>,
    /// Odd number of loci centered on each origin locus
    region_loci: Option<usize>,
    /// If true, smoothing is required even when no window was given, which is an error
    smooth: bool
}

impl DarConfig {
    /// Resolves the configuration into the smoothing window to use, if any.
    /// # Errors
    /// * if `smooth` is set without any window
    /// * if `region_loci` is zero or even, or `region_fixed` is zero
    pub fn smoothing_window(&self) -> Result<Option<SmoothingWindow>, DarError> {
        match (self.region_fixed, self.region_loci) {
            (Some(span), opt_loci) => {
                if span == 0 {
                    return Err(DarError::InvalidRegionFixed);
                }
                if opt_loci.is_some() {
                    warn!("Both region_fixed and region_loci were provided, using region_fixed={span}");
                }
                Ok(Some(SmoothingWindow::Fixed(span)))
            },
            (None, Some(num_loci)) => {
                if num_loci % 2 == 0 {
                    return Err(DarError::InvalidRegionLoci { value: num_loci });
                }
                Ok(Some(SmoothingWindow::Loci(num_loci)))
            },
            (None, None) => {
                if self.smooth {
                    Err(DarError::MissingWindow)
                } else {
                    Ok(None)
                }
            }
        }
    }

    // getters
    pub fn region_fixed(&self) -> Option<u64> {
        self.region_fixed
    }

    pub fn region_loci(&self) -> Option<usize> {
        self.region_loci
    }

    pub fn smooth(&self) -> bool {
        self.smooth
    }
}

/// Computes DAR for every contrast, returning one table per contrast in the same order.
/// # Arguments
/// * `proportions` - per-group proportion tables; groups may hold different loci
/// * `contrasts` - the contrasts to compute
/// * `config` - smoothing options
/// # Errors
/// * if the smoothing configuration is invalid
/// * if any contrast references a group without a proportion table
/// * if a referenced table repeats a locus
pub fn compute_dar(proportions: &IndexMap<String, ProportionTable>, contrasts: &[Contrast], config: &DarConfig) -> Result<Vec<DarTable>, DarError> {
    let window = config.smoothing_window()?;

    // check everything before we start
    for contrast in contrasts.iter() {
        if let Some(group) = contrast.coefficients().keys().find(|g| !proportions.contains_key(*g)) {
            return Err(DarError::UnknownGroup {
                contrast: contrast.name().to_string(), group: group.clone()
            });
        }
    }

    // loci are matched across groups by value, so each must be unique within a table
    let referenced: IndexSet<&str> = contrasts.iter()
        .flat_map(|c| c.coefficients().keys().map(|g| g.as_str()))
        .collect();
    for group in referenced.into_iter() {
        let mut seen: HashSet<&GenomicLocus> = Default::default();
        if let Some(row) = proportions[group].rows().iter().find(|r| !seen.insert(r.locus())) {
            return Err(DarError::DuplicateLocus { group: group.to_string(), locus: row.locus().to_string() });
        }
    }

    let results = contrasts.par_iter()
        .map(|contrast| {
            let table = contrast_dar(proportions, contrast, window);
            info!("Contrast {}: {} shared loci", contrast.name(), table.len());
            table
        })
        .collect();
    Ok(results)
}

/// Computes the DAR table for a single, pre-validated contrast
fn contrast_dar(proportions: &IndexMap<String, ProportionTable>, contrast: &Contrast, window: Option<SmoothingWindow>) -> DarTable {
    let referenced: Vec<(&ProportionTable, f64)> = contrast.coefficients().iter()
        .map(|(group, &coef)| (&proportions[group.as_str()], coef))
        .collect();

    // lookups for every group other than the first, which drives the iteration order
    let lookups: Vec<HashMap<&GenomicLocus, &[f64; MAX_ALLELES]>> = referenced[1..].iter()
        .map(|(table, _)| {
            table.rows().iter()
                .map(|r| (r.locus(), r.proportions()))
                .collect()
        })
        .collect();

    let (first_table, first_coef) = referenced[0];
    let mut scored: Vec<(&GenomicLocus, f64)> = first_table.rows().iter()
        .filter_map(|row| {
            let mut delta: [f64; MAX_ALLELES] = row.proportions().map(|p| first_coef * p);
            for (lookup, (_, coef)) in lookups.iter().zip(referenced[1..].iter()) {
                let other = lookup.get(row.locus())?;
                for (d, p) in delta.iter_mut().zip(other.iter()) {
                    *d += coef * p;
                }
            }
            Some((row.locus(), dar_from_delta(&delta)))
        })
        .collect();
    debug!(
        "Contrast {}: {} of {} loci in {} are shared by all groups",
        contrast.name(), scored.len(), first_table.len(), first_table.group()
    );

    // group by chromosome in order of first appearance, then by position
    let mut chrom_rank: HashMap<&str, usize> = Default::default();
    for &(locus, _) in scored.iter() {
        let next_rank = chrom_rank.len();
        chrom_rank.entry(locus.chrom()).or_insert(next_rank);
    }
    scored.sort_by_key(|(locus, _)| (chrom_rank[locus.chrom()], locus.position()));

    let loci: Vec<&GenomicLocus> = scored.iter().map(|(l, _)| *l).collect();
    let dar_origin: Vec<f64> = scored.iter().map(|(_, d)| *d).collect();
    let dar_region: Vec<Option<f64>> = match window {
        Some(w) => smooth_dar(&loci, &dar_origin, w).into_iter().map(Some).collect(),
        None => vec![None; loci.len()]
    };

    let ranges = loci.into_iter()
        .zip(dar_origin)
        .zip(dar_region)
        .map(|((locus, origin), region)| ScoredRange::from_origin(locus.clone(), origin, region))
        .collect();
    DarTable::new(contrast.name().to_string(), window, RangeShape::Origin, ranges)
}

/// Scales the norm of a contrast-weighted proportion difference by √2, the largest distance between two proportion vectors.
/// Contrasts whose sides carry more than unit weight can exceed that, so the result is capped at 1.
/// # Arguments
/// * `delta` - per-allele weighted difference
pub fn dar_from_delta(delta: &[f64; MAX_ALLELES]) -> f64 {
    let norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
    (norm / SQRT_2).min(1.0)
}

/// Averages `dar_origin` over each locus' window.
/// # Arguments
/// * `loci` - loci grouped by chromosome and sorted by position
/// * `dar_origin` - the per-locus scores, same order as `loci`
/// * `window` - the smoothing strategy
pub fn smooth_dar(loci: &[&GenomicLocus], dar_origin: &[f64], window: SmoothingWindow) -> Vec<f64> {
    window_bounds(loci, window).into_iter()
        .map(|(first, last)| {
            let values = &dar_origin[first..=last];
            values.iter().sum::<f64>() / values.len() as f64
        })
        .collect()
}
