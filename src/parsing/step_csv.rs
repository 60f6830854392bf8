//! Loading per-step accuracies exported to CSV

use crate::analysis::constants::{OSWORLD_G, SCREENSPOT_PRO};
use crate::common::data_structures::{Scores, StepSeries};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepCsvError {
    #[error("Failed to read step CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Step CSV {0} has no 'step' column")]
    MissingStepColumn(String),
}

type Result<T> = core::result::Result<T, StepCsvError>;

/// Accepted column names and the label they are stored under.
/// Later columns overwrite earlier ones for the same label.
const COLUMN_ALIASES: [(&str, &str); 4] = [
    ("OS-World-G", OSWORLD_G),
    ("OSWorld-G", OSWORLD_G),
    ("ScreenSpot-Pro", SCREENSPOT_PRO),
    ("ScreenSpot Pro", SCREENSPOT_PRO),
];

/// Reads a `step,<benchmark>...` CSV into a step series
///
/// Steps may be written as floats (`40.0`) and are truncated. Empty or
/// non-numeric cells are skipped, as are rows without any value.
pub fn load_step_csv(path: &Path) -> Result<StepSeries> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let step_index = headers
        .iter()
        .position(|header| header.trim() == "step")
        .ok_or_else(|| StepCsvError::MissingStepColumn(path.display().to_string()))?;

    let columns: Vec<(usize, &str)> = COLUMN_ALIASES
        .iter()
        .filter_map(|(alias, label)| {
            headers
                .iter()
                .position(|header| header.trim() == *alias)
                .map(|index| (index, *label))
        })
        .collect();

    let mut series = StepSeries::new();
    for record in reader.records() {
        let record = record?;

        let Some(step) = record
            .get(step_index)
            .and_then(|cell| cell.trim().parse::<f64>().ok())
            .filter(|step| step.is_finite() && *step >= 0.0)
        else {
            continue;
        };

        let scores: Scores = columns
            .iter()
            .filter_map(|(index, label)| {
                record
                    .get(*index)
                    .and_then(|cell| cell.trim().parse::<f64>().ok())
                    .map(|value| (label.to_string(), value))
            })
            .collect();

        if !scores.is_empty() {
            series.insert(step.trunc() as u64, scores);
        }
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("steps.csv");
        fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_load_step_csv_header_variants() {
        let (_dir, path) = write_csv(
            "step,OS-World-G,ScreenSpot Pro\n\
             10.0,0.61,0.50\n\
             20,0.62,\n\
             ,0.9,0.9\n\
             abc,0.9,0.9\n\
             30,n/a,\n",
        );

        let series = load_step_csv(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[&10][OSWORLD_G], 0.61);
        assert_eq!(series[&10][SCREENSPOT_PRO], 0.50);
        assert_eq!(series[&20].len(), 1);
        assert!(!series.contains_key(&30));
    }

    #[test]
    fn test_load_step_csv_canonical_names() {
        let (_dir, path) = write_csv("ScreenSpot-Pro,step,OSWorld-G\n50.6,250,61.1\n");

        let series = load_step_csv(&path).unwrap();
        assert_eq!(series[&250][SCREENSPOT_PRO], 50.6);
        assert_eq!(series[&250][OSWORLD_G], 61.1);
    }

    #[test]
    fn test_load_step_csv_without_step_column() {
        let (_dir, path) = write_csv("iteration,OSWorld-G\n1,0.5\n");
        assert!(matches!(
            load_step_csv(&path),
            Err(StepCsvError::MissingStepColumn(_))
        ));
    }

    #[test]
    fn test_load_step_csv_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            load_step_csv(&temp_dir.path().join("missing.csv")),
            Err(StepCsvError::Csv(_))
        ));
    }
}
