
use indexmap::IndexMap;
use serde::Serialize;

use crate::data_types::allele_counts::CountTable;
use crate::data_types::genotype::GenotypeTable;
use crate::data_types::proportions::ProportionTable;
use crate::data_types::scored_range::DarTable;

/// High level statistics for a compute run, saved to the debug folder
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Number of samples in the genotype table
    num_samples: usize,
    /// Number of SNV loci loaded
    num_loci: usize,
    /// Number of records skipped while loading
    skipped_records: usize,
    /// Per-group locus tracking
    groups: Vec<GroupSummary>,
    /// Per-contrast results
    contrasts: Vec<ContrastSummary>
}

#[derive(Debug, Serialize)]
struct GroupSummary {
    group: String,
    num_samples: usize,
    loci_counted: usize,
    loci_after_filter: usize,
    loci_with_proportions: usize
}

#[derive(Debug, Serialize)]
struct ContrastSummary {
    contrast: String,
    shared_loci: usize,
    mean_dar_origin: Option<f64>,
    max_dar_origin: Option<f64>
}

impl RunSummary {
    /// Gathers the summary from each pipeline stage output
    pub fn new(
        genotypes: &GenotypeTable,
        skipped_records: usize,
        counts: &IndexMap<String, CountTable>,
        filtered: &IndexMap<String, CountTable>,
        proportions: &IndexMap<String, ProportionTable>,
        dar_tables: &[DarTable]
    ) -> Self {
        let groups = counts.iter()
            .map(|(group, table)| GroupSummary {
                group: group.clone(),
                num_samples: table.group_size(),
                loci_counted: table.len(),
                loci_after_filter: filtered.get(group).map(|t| t.len()).unwrap_or_default(),
                loci_with_proportions: proportions.get(group).map(|t| t.len()).unwrap_or_default()
            })
            .collect();

        let contrasts = dar_tables.iter()
            .map(|table| {
                let values: Vec<f64> = table.ranges().iter().map(|r| r.dar_origin()).collect();
                let (mean_dar_origin, max_dar_origin) = if values.is_empty() {
                    (None, None)
                } else {
                    (
                        Some(values.iter().sum::<f64>() / values.len() as f64),
                        values.iter().copied().reduce(f64::max)
                    )
                };
                ContrastSummary {
                    contrast: table.contrast().to_string(),
                    shared_loci: table.len(),
                    mean_dar_origin,
                    max_dar_origin
                }
            })
            .collect();

        Self {
            num_samples: genotypes.samples().len(),
            num_loci: genotypes.num_loci(),
            skipped_records,
            groups,
            contrasts
        }
    }
}
