/*!
# Writers module
Contains the logic for writing the output files for the compute and assign commands.
*/
/// Writes DAR tables, one row per scored range
pub mod dar_writer;
/// Writes features with their assigned DAR values
pub mod feature_writer;
/// Run statistics for the debug folder
pub mod run_summary;
