
use anyhow::Context;
use std::io::{BufWriter, Write};
use std::fs::File;
use std::path::Path;

/// This will save a generic serializable struct to pretty-printed JSON.
/// Paths ending in `.gz` are gzip compressed.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let file: Box<dyn std::io::Write> = if out_filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[derive(serde::Serialize)]
    struct Example {
        label: String,
        values: Vec<u64>
    }

    #[test]
    fn test_save_json() {
        let data = Example { label: "a-b".to_string(), values: vec![1, 2] };
        let out_fn = std::env::temp_dir().join(format!("json_io_test_{}.json.gz", std::process::id()));
        save_json(&data, &out_fn).unwrap();

        let mut text = String::new();
        flate2::read::MultiGzDecoder::new(File::open(&out_fn).unwrap())
            .read_to_string(&mut text).unwrap();
        std::fs::remove_file(&out_fn).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["label"], "a-b");
        assert_eq!(parsed["values"][1], 2);
    }
}
