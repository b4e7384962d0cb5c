/*!
# DAR
Differential Allelic Representation between groups of non-isogenic samples.
The pipeline stages are plain functions that callers chain together:
genotypes are counted per group, filtered, turned into allele proportions, and compared across group contrasts.

## Example usage
```rust
use dar::allele_counter::count_alleles;
use dar::dar_calculator::{compute_dar, DarConfigBuilder};
use dar::data_types::contrast::Contrast;
use dar::data_types::genotype::GenotypeTable;
use dar::data_types::locus::GenomicLocus;
use dar::data_types::sample_groups::SampleGroups;
use dar::locus_filter::{filter_loci, LocusPredicate};
use dar::proportions::counts_to_proportions;

let loci = vec![GenomicLocus::new("chr1", 100), GenomicLocus::new("chr1", 200)];
let samples = vec!["s1".to_string(), "s2".to_string(), "s3".to_string(), "s4".to_string()];
let table = GenotypeTable::from_strings(loci, samples, &[
    vec!["0/0", "0|0", "1/1", "1|1"],
    vec!["0/1", "1|0", "0/1", "1/0"]
]).unwrap();
let groups = SampleGroups::new(vec![("wt", vec!["s1", "s2"]), ("mut", vec!["s3", "s4"])]).unwrap();

let counts = count_alleles(&table, &groups).unwrap();
let filtered = filter_loci(&counts, &LocusPredicate::default());
let proportions = counts_to_proportions(&filtered);

let contrast: Contrast = "mut-wt".parse().unwrap();
let config = DarConfigBuilder::default().build().unwrap();
let results = compute_dar(&proportions, &[contrast], &config).unwrap();

// the first locus is fully divergent between the groups
let ranges = results[0].ranges();
assert_eq!(ranges.len(), 2);
assert_eq!(ranges[0].dar_origin(), 1.0);
assert_eq!(ranges[1].dar_origin(), 0.0);
```
*/

/// Counts alleles per locus for each sample group
pub mod allele_counter;
/// Command line interface functionality
pub mod cli;
/// Core logic for computing DAR scores over group contrasts
pub mod dar_calculator;
/// Contains various shared data types
pub mod data_types;
/// Projects DAR scores onto genomic features
pub mod feature_assigner;
/// Predicate based filtering of count tables
pub mod locus_filter;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Converts allele counts into proportions
pub mod proportions;
/// Switches DAR tables between origin and region ranges
pub mod range_flipper;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
