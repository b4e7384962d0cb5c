
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

use crate::data_types::sample_groups::SampleGroups;

/// Loads a TSV file with two columns and no header: sample, then group.
/// Groups keep the order in which they first appear.
/// # Arguments
/// * `groups_fn` - the TSV file to parse
/// # Errors
/// * if the file cannot be read or a row is missing a column
/// * if the resulting groups are invalid (e.g. a duplicated sample)
pub fn load_sample_groups(groups_fn: &Path) -> anyhow::Result<SampleGroups> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false) // no headers in the file, disable so we do not skip first row
        .comment(Some(b'#'))
        .from_path(groups_fn)
        .with_context(|| format!("Error while opening {groups_fn:?}:"))?;

    let mut entries: IndexMap<String, Vec<String>> = Default::default();
    for result in csv_reader.records() {
        let row = result.with_context(|| format!("Error while reading {groups_fn:?}"))?;
        let sample = row.get(0).ok_or(anyhow!("Missing sample on row: {row:?}"))?.trim();
        let group = row.get(1).ok_or(anyhow!("Missing group on row: {row:?}"))?.trim();
        entries.entry(group.to_string()).or_default().push(sample.to_string());
    }

    let sample_groups = SampleGroups::new(entries)
        .with_context(|| format!("Error while building sample groups from {groups_fn:?}:"))?;
    for (group, samples) in sample_groups.iter() {
        debug!("Group {group}: {} samples", samples.len());
    }
    Ok(sample_groups)
}
