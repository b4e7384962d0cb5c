
use std::fs::File;
use std::path::Path;

use crate::data_types::feature::AssignedFeature;

/// Written in place of a missing DAR value
pub const MISSING_VALUE: &str = "NA";

/// Writes assigned features as BED-like rows: `contrast chrom start end <metadata...> dar`.
/// Starts are converted back to 0-based; metadata columns are padded to the widest feature.
pub struct FeatureWriter {
    /// Handle on the writer
    csv_writer: csv::Writer<File>,
    /// Number of metadata columns in the header
    num_metadata: usize
}

impl FeatureWriter {
    /// Creates the writer and emits the header
    /// # Arguments
    /// * `filename` - the output path (tsv/csv)
    /// * `num_metadata` - number of metadata columns to reserve
    pub fn new(filename: &Path, num_metadata: usize) -> csv::Result<Self> {
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(false)
            .from_path(filename)?;

        let mut header: Vec<String> = ["contrast", "chrom", "start", "end"].iter().map(|s| s.to_string()).collect();
        header.extend((1..=num_metadata).map(|i| format!("meta_{i}")));
        header.push("dar".to_string());
        csv_writer.write_record(&header)?;

        Ok(Self {
            csv_writer,
            num_metadata
        })
    }

    /// Appends all features assigned for one contrast
    /// # Arguments
    /// * `contrast` - the contrast label for these rows
    /// * `features` - the assigned features, metadata being the extra BED columns
    pub fn write_features(&mut self, contrast: &str, features: &[AssignedFeature<Vec<String>>]) -> csv::Result<()> {
        for assigned in features.iter() {
            let feature = assigned.feature();
            let mut record: Vec<String> = Vec::with_capacity(5 + self.num_metadata);
            record.push(contrast.to_string());
            record.push(feature.chrom().to_string());
            record.push(feature.start().saturating_sub(1).to_string());
            record.push(feature.end().to_string());
            for i in 0..self.num_metadata {
                record.push(feature.metadata().get(i).cloned().unwrap_or_default());
            }
            record.push(match assigned.dar() {
                Some(v) => v.to_string(),
                None => MISSING_VALUE.to_string()
            });
            self.csv_writer.write_record(&record)?;
        }
        Ok(())
    }

    /// Flushes any buffered rows
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.csv_writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::feature::Feature;

    #[test]
    fn test_feature_rows() {
        let features = vec![
            AssignedFeature::new(Feature::new("chr1", 90, 210, vec!["geneA".to_string(), "+".to_string()]), Some(0.5), 2),
            AssignedFeature::new(Feature::new("chr2", 1, 1000, vec!["geneC".to_string()]), None, 0),
        ];
        let out_fn = std::env::temp_dir().join(format!("feature_writer_test_{}.tsv", std::process::id()));
        let mut writer = FeatureWriter::new(&out_fn, 2).unwrap();
        writer.write_features("case-control", &features).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let text = std::fs::read_to_string(&out_fn).unwrap();
        std::fs::remove_file(&out_fn).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "contrast\tchrom\tstart\tend\tmeta_1\tmeta_2\tdar",
            "case-control\tchr1\t89\t210\tgeneA\t+\t0.5",
            "case-control\tchr2\t0\t1000\tgeneC\t\tNA",
        ]);
    }
}
