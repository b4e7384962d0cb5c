
/// Per-locus allele tallies for one group
pub mod allele_counts;
/// Named linear combinations of groups
pub mod contrast;
/// Caller-supplied features and their assigned DAR values
pub mod feature;
/// Genotype calls, unphasing, and the canonical genotype table
pub mod genotype;
/// Genomic loci, the atomic row of every table
pub mod locus;
/// Per-locus allele proportions for one group
pub mod proportions;
/// The partition of samples into named groups
pub mod sample_groups;
/// DAR scores attached to genomic ranges
pub mod scored_range;
