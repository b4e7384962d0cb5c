/*!
# Allele counter
Tallies, for every locus and every sample group, how many samples were called or missing and how often each allele index was observed.
Calls are unphased before counting, so the order of the two allele copies never matters.

## Example usage
```rust
use dar::allele_counter::count_alleles;
use dar::data_types::genotype::GenotypeTable;
use dar::data_types::locus::GenomicLocus;
use dar::data_types::sample_groups::SampleGroups;

let table = GenotypeTable::from_strings(
    vec![GenomicLocus::new("chr1", 100)],
    vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
    &[vec!["0|1", "1/1", "./."]]
).unwrap();
let groups = SampleGroups::new(vec![("a", vec!["s1", "s2"]), ("b", vec!["s3"])]).unwrap();

let counts = count_alleles(&table, &groups).unwrap();
let a = &counts["a"].rows()[0];
assert_eq!((a.n_called(), a.n_missing()), (2, 0));
assert_eq!(a.n_alleles(), &[1, 3, 0, 0]);
assert_eq!(counts["b"].rows()[0].n_missing(), 1);
```
*/
use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;

use crate::data_types::allele_counts::{CountTable, LocusAlleleCounts, MAX_ALLELES};
use crate::data_types::genotype::{GenotypeCall, GenotypeTable};
use crate::data_types::sample_groups::SampleGroups;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CountError {
    #[error("sample {sample} from group {group} is not present in the genotype table")]
    MissingSample { group: String, sample: String },
    #[error("allele index {index} for sample {sample} at {locus} is outside the supported range 0..{max}", max = MAX_ALLELES - 1)]
    AlleleIndexOutOfRange { locus: String, sample: String, index: u8 }
}

/// Counts alleles for every group at every locus of the table.
/// Output tables follow the group order and contain every locus of `table`, in order.
/// # Arguments
/// * `table` - the locus-by-sample genotype calls
/// * `groups` - the partition of samples into groups
/// # Errors
/// * if a group references a sample that is not a column of `table`
/// * if any call in a group carries an allele index above 3
pub fn count_alleles(table: &GenotypeTable, groups: &SampleGroups) -> Result<IndexMap<String, CountTable>, CountError> {
    // resolve every sample up front so we fail before doing any work
    let mut resolved: Vec<(String, Vec<usize>)> = Vec::with_capacity(groups.len());
    for (group, samples) in groups.iter() {
        let indices = samples.iter()
            .map(|s| {
                table.sample_index(s).ok_or_else(|| CountError::MissingSample {
                    group: group.clone(), sample: s.clone()
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;
        resolved.push((group.clone(), indices));
    }

    let tables: Vec<CountTable> = resolved.into_par_iter()
        .map(|(group, sample_indices)| -> Result<CountTable, CountError> {
            debug!("Counting alleles for group {group} ({} samples, {} loci)", sample_indices.len(), table.num_loci());
            let rows = table.loci().iter()
                .zip(table.calls().iter())
                .map(|(locus, calls)| -> Result<LocusAlleleCounts, CountError> {
                    let mut n_called = 0;
                    let mut n_missing = 0;
                    let mut n_alleles = [0_u64; MAX_ALLELES];
                    for &si in sample_indices.iter() {
                        match calls[si].unphased() {
                            GenotypeCall::Missing => n_missing += 1,
                            GenotypeCall::Called(a0, a1) => {
                                for allele in [a0, a1] {
                                    let slot = n_alleles.get_mut(allele as usize)
                                        .ok_or_else(|| CountError::AlleleIndexOutOfRange {
                                            locus: locus.to_string(),
                                            sample: table.samples()[si].clone(),
                                            index: allele
                                        })?;
                                    *slot += 1;
                                }
                                n_called += 1;
                            }
                        }
                    }
                    Ok(LocusAlleleCounts::new(locus.clone(), n_called, n_missing, n_alleles))
                })
                .collect::<Result<Vec<_>, CountError>>()?;
            Ok(CountTable::new(group, sample_indices.len(), rows))
        })
        .collect::<Result<_, CountError>>()?;

    Ok(tables.into_iter()
        .map(|t| (t.group().to_string(), t))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::locus::GenomicLocus;

    fn samples(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("s{i}")).collect()
    }

    fn example_table() -> GenotypeTable {
        GenotypeTable::from_strings(
            vec![GenomicLocus::new("chr1", 10), GenomicLocus::new("chr1", 20), GenomicLocus::new("chr2", 5)],
            samples(6),
            &[
                vec!["0/0", "0|1", "1/1", "0/2", "./.", "2|3"],
                vec!["./.", "./.", "./.", "0/0", "0/0", "0/1"],
                vec!["1|0", "0|1", "0/1", "3/3", "3/3", "."],
            ]
        ).unwrap()
    }

    fn example_groups() -> SampleGroups {
        SampleGroups::new(vec![
            ("g1", vec!["s1", "s2", "s3"]),
            ("g2", vec!["s4", "s5", "s6"]),
        ]).unwrap()
    }

    #[test]
    fn test_counts() {
        let counts = count_alleles(&example_table(), &example_groups()).unwrap();
        assert_eq!(counts.len(), 2);

        let g1 = &counts["g1"];
        assert_eq!(g1.group_size(), 3);
        assert_eq!(g1.len(), 3);
        assert_eq!(g1.rows()[0].n_alleles(), &[3, 3, 0, 0]);
        assert_eq!((g1.rows()[1].n_called(), g1.rows()[1].n_missing()), (0, 3));
        assert_eq!(g1.rows()[1].n_alleles(), &[0, 0, 0, 0]);
        assert_eq!(g1.rows()[2].n_alleles(), &[3, 3, 0, 0]);

        let g2 = &counts["g2"];
        assert_eq!((g2.rows()[0].n_called(), g2.rows()[0].n_missing()), (2, 1));
        assert_eq!(g2.rows()[0].n_alleles(), &[1, 0, 2, 1]);
        assert_eq!(g2.rows()[1].n_alleles(), &[5, 1, 0, 0]);
        assert_eq!(g2.rows()[2].n_alleles(), &[0, 0, 0, 4]);
    }

    #[test]
    fn test_count_invariants() {
        let counts = count_alleles(&example_table(), &example_groups()).unwrap();
        for table in counts.values() {
            for row in table.rows() {
                assert_eq!(row.n_called() + row.n_missing(), table.group_size() as u64);
                assert_eq!(row.total_alleles(), 2 * row.n_called());
            }
        }
    }

    #[test]
    fn test_order_independence() {
        // same data with samples shuffled and allele copies swapped
        let shuffled = GenotypeTable::from_strings(
            vec![GenomicLocus::new("chr1", 10), GenomicLocus::new("chr1", 20), GenomicLocus::new("chr2", 5)],
            vec!["s6", "s3", "s1", "s5", "s2", "s4"].into_iter().map(String::from).collect(),
            &[
                vec!["3|2", "1/1", "0/0", "./.", "1|0", "2/0"],
                vec!["1/0", "./.", "./.", "0/0", "./.", "0/0"],
                vec![".", "1/0", "0|1", "3/3", "1|0", "3/3"],
            ]
        ).unwrap();
        let expected = count_alleles(&example_table(), &example_groups()).unwrap();
        let observed = count_alleles(&shuffled, &example_groups()).unwrap();
        assert_eq!(expected, observed);
    }

    #[test]
    fn test_missing_sample() {
        let groups = SampleGroups::new(vec![("g1", vec!["s1"]), ("g2", vec!["s9"])]).unwrap();
        assert_eq!(
            count_alleles(&example_table(), &groups).unwrap_err(),
            CountError::MissingSample { group: "g2".to_string(), sample: "s9".to_string() }
        );
    }

    #[test]
    fn test_allele_out_of_range() {
        let table = GenotypeTable::from_strings(
            vec![GenomicLocus::new("chr1", 10)],
            samples(2),
            &[vec!["0/1", "0/4"]]
        ).unwrap();
        let groups = SampleGroups::new(vec![("g1", vec!["s1"]), ("g2", vec!["s2"])]).unwrap();
        assert_eq!(
            count_alleles(&table, &groups).unwrap_err(),
            CountError::AlleleIndexOutOfRange { locus: "chr1:10".to_string(), sample: "s2".to_string(), index: 4 }
        );

        // the bad call is fine if nobody asks for it
        let groups = SampleGroups::new(vec![("g1", vec!["s1"])]).unwrap();
        assert!(count_alleles(&table, &groups).is_ok());
    }
}
