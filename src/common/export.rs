//! Writing summaries to JSON and CSV files

use crate::common::data_structures::Scores;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

type Result<T> = core::result::Result<T, ExportError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error(path))?;
        }
    }
    File::create(path).map_err(io_error(path))
}

/// Serializes `value` as indented JSON, creating parent directories as needed
pub fn write_json_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Writes one row per label with a column for every dataset seen in any row
///
/// # Arguments
/// * `label_header` - Name of the first column, e.g. `"budget"`
/// * `rows` - Labels and their scores, written in the given order
/// * `path` - Output CSV path
///
/// Dataset columns are sorted by name. Values are written with four decimals;
/// datasets missing from a row are left empty.
pub fn write_metrics_csv(label_header: &str, rows: &[(String, Scores)], path: &Path) -> Result<()> {
    let datasets: BTreeSet<&str> = rows
        .iter()
        .flat_map(|(_, scores)| scores.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(create_file(path)?);

    let mut header = vec![label_header];
    header.extend(datasets.iter().copied());
    writer.write_record(&header)?;

    for (label, scores) in rows {
        let mut record = vec![label.clone()];
        record.extend(datasets.iter().map(|dataset| {
            scores
                .get(*dataset)
                .map(|value| format!("{:.4}", value))
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(io_error(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_write_json_pretty_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/summary.json");

        let value = BTreeMap::from([("a", 1)]);
        write_json_pretty(&value, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_write_metrics_csv_union_of_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.csv");

        let rows = vec![
            (
                "1k".to_string(),
                Scores::from([
                    ("OSWorld-G".to_string(), 0.61234),
                    ("ScreenSpot-Pro".to_string(), 0.5),
                ]),
            ),
            (
                "10k".to_string(),
                Scores::from([("ScreenSpot-Pro".to_string(), 0.51)]),
            ),
        ];
        write_metrics_csv("budget", &rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "budget,OSWorld-G,ScreenSpot-Pro");
        assert_eq!(lines[1], "1k,0.6123,0.5000");
        assert_eq!(lines[2], "10k,,0.5100");
    }

    #[test]
    fn test_write_metrics_csv_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.csv");

        write_metrics_csv("budget", &[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "budget");
    }
}
