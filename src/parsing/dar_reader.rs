
use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

use crate::data_types::locus::GenomicLocus;
use crate::data_types::scored_range::{DarTable, RangeShape, ScoredRange};
use crate::writers::dar_writer::DarRow;

/// Loads DAR tables written by the DAR writer, one table per contrast in order of first appearance.
/// The shape is region if any range covers more than its origin position; the smoothing window is not stored and comes back as `None`.
/// # Arguments
/// * `dar_fn` - the DAR file (tsv/csv)
/// # Errors
/// * if the file cannot be opened or a row fails to deserialize
pub fn load_dar_tables(dar_fn: &Path) -> anyhow::Result<Vec<DarTable>> {
    let is_csv: bool = dar_fn.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(dar_fn)
        .with_context(|| format!("Error while opening {dar_fn:?}:"))?;

    let mut contrast_ranges: IndexMap<String, Vec<ScoredRange>> = Default::default();
    for result in csv_reader.deserialize() {
        let row: DarRow = result.with_context(|| format!("Error while reading {dar_fn:?}"))?;
        let locus = GenomicLocus::with_annotation(row.chrom, row.origin_pos, row.id, row.reference);
        let range = ScoredRange::from_origin(locus, row.dar_origin, row.dar_region)
            .with_interval(row.start, row.end);
        contrast_ranges.entry(row.contrast).or_default().push(range);
    }

    let tables: Vec<DarTable> = contrast_ranges.into_iter()
        .map(|(contrast, ranges)| {
            let is_origin = ranges.iter().all(|r| r.is_point() && r.start() == r.locus().position());
            let shape = if is_origin { RangeShape::Origin } else { RangeShape::Region };
            debug!("Loaded {} {shape} ranges for contrast {contrast}", ranges.len());
            DarTable::new(contrast, None, shape, ranges)
        })
        .collect();
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::scored_range::SmoothingWindow;
    use crate::writers::dar_writer::write_dar_tables;

    #[test]
    fn test_write_and_reload() {
        let ranges = vec![
            ScoredRange::from_origin(GenomicLocus::with_annotation("chr1", 100, Some("rs1".to_string()), Some("A".to_string())), 0.25, Some(0.5)),
            ScoredRange::from_origin(GenomicLocus::new("chr1", 200), 1.0, None),
        ];
        let origin = DarTable::new("case-control".to_string(), Some(SmoothingWindow::Loci(3)), RangeShape::Origin, ranges.clone());
        let region_ranges = ranges.iter().map(|r| r.with_interval(50, 250)).collect();
        let region = DarTable::new("a-b".to_string(), Some(SmoothingWindow::Loci(3)), RangeShape::Region, region_ranges);

        let out_fn = std::env::temp_dir().join(format!("dar_reader_test_{}.tsv", std::process::id()));
        write_dar_tables(&out_fn, &[origin.clone(), region.clone()]).unwrap();
        let text = std::fs::read_to_string(&out_fn).unwrap();
        assert!(text.starts_with("contrast\tchrom\tstart\tend\torigin_pos\tid\tref\tdar_origin\tdar_region\n"));
        assert!(text.contains("case-control\tchr1\t200\t200\t200\t\t\t1.0\t\n"));

        let loaded = load_dar_tables(&out_fn).unwrap();
        std::fs::remove_file(&out_fn).unwrap();
        assert_eq!(loaded.len(), 2);

        // the window is not stored in the file
        assert_eq!(loaded[0], DarTable::new("case-control".to_string(), None, RangeShape::Origin, ranges));
        assert_eq!(loaded[1].shape(), RangeShape::Region);
        assert_eq!(loaded[1].ranges()[1].locus().position(), 200);
        assert_eq!((loaded[1].ranges()[1].start(), loaded[1].ranges()[1].end()), (50, 250));
    }
}
