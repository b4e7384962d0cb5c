
use indexmap::IndexMap;
use log::debug;

use crate::data_types::allele_counts::{CountTable, MAX_ALLELES};
use crate::data_types::proportions::{LocusAlleleProportions, ProportionTable};

/// Converts each group's allele counts into allele proportions.
/// Loci without any called allele carry no representation information and are left out of that group's table.
/// # Arguments
/// * `tables` - per-group count tables, possibly holding different loci
pub fn counts_to_proportions(tables: &IndexMap<String, CountTable>) -> IndexMap<String, ProportionTable> {
    tables.iter()
        .map(|(group, table)| {
            let rows: Vec<LocusAlleleProportions> = table.rows().iter()
                .filter_map(|row| {
                    let total = row.total_alleles();
                    if total == 0 {
                        return None;
                    }
                    let mut proportions = [0.0; MAX_ALLELES];
                    for (p, &n) in proportions.iter_mut().zip(row.n_alleles().iter()) {
                        *p = n as f64 / total as f64;
                    }
                    Some(LocusAlleleProportions::new(row.locus().clone(), proportions))
                })
                .collect();

            let excluded = table.len() - rows.len();
            if excluded > 0 {
                debug!("Excluded {excluded} loci with no called alleles from group {group}");
            }
            (group.clone(), ProportionTable::new(group.clone(), rows))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use crate::data_types::allele_counts::LocusAlleleCounts;
    use crate::data_types::locus::GenomicLocus;

    #[test]
    fn test_proportions() {
        let mut tables: IndexMap<String, CountTable> = Default::default();
        tables.insert("g1".to_string(), CountTable::new("g1".to_string(), 3, vec![
            LocusAlleleCounts::new(GenomicLocus::new("chr1", 1), 3, 0, [3, 2, 1, 0]),
            LocusAlleleCounts::new(GenomicLocus::new("chr1", 2), 0, 3, [0, 0, 0, 0]),
            LocusAlleleCounts::new(GenomicLocus::new("chr1", 3), 2, 1, [0, 0, 1, 3]),
        ]));
        tables.insert("g2".to_string(), CountTable::new("g2".to_string(), 1, vec![]));

        let props = counts_to_proportions(&tables);
        let g1 = &props["g1"];
        assert_eq!(g1.len(), 2);
        assert_eq!(g1.rows()[0].locus(), &GenomicLocus::new("chr1", 1));
        assert_approx_eq!(g1.rows()[0].proportions()[0], 0.5);
        assert_approx_eq!(g1.rows()[0].proportions()[1], 1.0 / 3.0);
        assert_approx_eq!(g1.rows()[0].proportions()[2], 1.0 / 6.0);
        assert_eq!(g1.rows()[0].proportions()[3], 0.0);
        assert_eq!(g1.rows()[1].locus(), &GenomicLocus::new("chr1", 3));
        assert_approx_eq!(g1.rows()[1].proportions()[3], 0.75);

        for row in g1.rows() {
            let total: f64 = row.proportions().iter().sum();
            assert_approx_eq!(total, 1.0);
        }

        // empty tables stay empty
        assert!(props["g2"].is_empty());
        assert_eq!(props["g2"].group(), "g2");
    }
}
