
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::data_types::scored_range::{DarTable, ScoredRange};

/// Wrapper for writing DAR tables to a single file, one row per scored range
pub struct DarWriter {
    /// Handle on the writer
    csv_writer: csv::Writer<File>
}

/// Contains all the data written to each row of a DAR file
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DarRow {
    /// Contrast label
    pub contrast: String,
    /// Chromosome of the range
    pub chrom: String,
    /// First position covered, 1-based
    pub start: u64,
    /// Last position covered, 1-based inclusive
    pub end: u64,
    /// Position of the locus the scores were computed at
    pub origin_pos: u64,
    /// Variant ID, if any
    pub id: Option<String>,
    /// Reference base, if any
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Point estimate at the origin
    pub dar_origin: f64,
    /// Window-smoothed estimate
    pub dar_region: Option<f64>
}

impl DarRow {
    /// Creates a row from a scored range
    pub fn new(contrast: &str, range: &ScoredRange) -> Self {
        let locus = range.locus();
        Self {
            contrast: contrast.to_string(),
            chrom: locus.chrom().to_string(),
            start: range.start(),
            end: range.end(),
            origin_pos: locus.position(),
            id: locus.id().map(|s| s.to_string()),
            reference: locus.reference().map(|s| s.to_string()),
            dar_origin: range.dar_origin(),
            dar_region: range.dar_region()
        }
    }
}

impl DarWriter {
    /// Creates a new DAR writer
    /// # Arguments
    /// * `filename` - path to the filename that will get opened, must be .csv/.tsv
    pub fn new(filename: &Path) -> csv::Result<Self> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        Ok(Self {
            csv_writer
        })
    }

    /// Appends every range in a table to the output
    /// # Arguments
    /// * `table` - the DAR results for one contrast
    pub fn write_table(&mut self, table: &DarTable) -> csv::Result<()> {
        for range in table.ranges().iter() {
            let row = DarRow::new(table.contrast(), range);
            self.csv_writer.serialize(&row)?;
        }
        Ok(())
    }

    /// Flushes any buffered rows
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.csv_writer.flush()
    }
}

/// Convenience function that writes a full set of tables to a file
/// # Arguments
/// * `filename` - the output path (tsv/csv)
/// * `tables` - all the tables to write, in order
pub fn write_dar_tables(filename: &Path, tables: &[DarTable]) -> csv::Result<()> {
    let mut writer = DarWriter::new(filename)?;
    for table in tables.iter() {
        writer.write_table(table)?;
    }
    writer.flush()?;
    Ok(())
}
