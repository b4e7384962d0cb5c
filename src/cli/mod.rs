/*!
# CLI module
Command line interface functionality that is specific to DAR.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The assign CLI subcommand
pub mod assign;
/// The compute CLI subcommand
pub mod compute;
