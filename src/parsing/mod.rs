/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Reads DAR tables back in for feature assignment
pub mod dar_reader;
/// Loads BED features
pub mod features;
/// Loads genotype calls from VCF files with noodles
pub mod genotype_loader;
/// Loads the sample to group assignments
pub mod sample_groups;
