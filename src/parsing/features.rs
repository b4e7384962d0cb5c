
use anyhow::{anyhow, bail, Context};
use log::debug;
use std::fs::File;
use std::path::Path;

use crate::data_types::feature::Feature;

/// Opens a plain or gzip compressed (including bgzip) text file
fn open_text_file(filename: &Path) -> anyhow::Result<Box<dyn std::io::Read>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::read::MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Loads a BED(.gz) file of features.
/// BED coordinates are 0-based half-open and get converted to 1-based closed.
/// Any columns after the third are kept, in order, as the feature metadata.
/// Header lines (`#`, `track`, `browser`) are skipped.
/// # Arguments
/// * `bed_fn` - the BED file to load
/// # Errors
/// * if the file cannot be read
/// * if a row is missing coordinates or has an empty interval
pub fn load_bed_features(bed_fn: &Path) -> anyhow::Result<Vec<Feature<Vec<String>>>> {
    debug!("Loading features from {bed_fn:?}...");
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true) // metadata columns are optional
        .comment(Some(b'#'))
        .from_reader(open_text_file(bed_fn)?);

    let mut features = vec![];
    for result in csv_reader.records() {
        let row = result.with_context(|| format!("Error while reading {bed_fn:?}"))?;
        let chrom = row.get(0).ok_or(anyhow!("Missing chromosome on row: {row:?}"))?;
        if chrom.is_empty() || chrom.starts_with("track") || chrom.starts_with("browser") {
            continue;
        }

        let start: u64 = row.get(1).ok_or(anyhow!("Missing start on row: {row:?}"))?
            .trim().parse()
            .with_context(|| format!("Error while parsing start for row: {row:?}"))?;
        let end: u64 = row.get(2).ok_or(anyhow!("Missing end on row: {row:?}"))?
            .trim().parse()
            .with_context(|| format!("Error while parsing end for row: {row:?}"))?;
        if end <= start {
            bail!("Empty or inverted interval on row: {row:?}");
        }

        let metadata: Vec<String> = row.iter().skip(3).map(|s| s.to_string()).collect();
        features.push(Feature::new(chrom, start + 1, end, metadata));
    }

    debug!("Loaded {} features from {bed_fn:?}", features.len());
    Ok(features)
}
