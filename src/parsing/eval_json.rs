//! Reading accuracies from `grounding_eval_*.json` evaluation dumps
//!
//! Eval files are named `grounding_eval_<dataset>_huggingface_<timestamp>.json`
//! and hold either a top-level `accuracy` or a nested `metrics.accuracy`.

use crate::analysis::constants::DATASET_NAME_MAP;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name prefix of every eval dump
pub const EVAL_PREFIX: &str = "grounding_eval_";

#[derive(Error, Debug)]
pub enum EvalJsonError {
    #[error("Failed to read eval file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse eval JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("No numeric accuracy in {0}")]
    MissingAccuracy(String),
}

type Result<T> = core::result::Result<T, EvalJsonError>;

/// Returns `true` for files named `grounding_eval_*.json`
pub fn is_grounding_eval_json(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(EVAL_PREFIX) && name.ends_with(".json"))
}

/// Maps a dataset stem to its display label; unknown stems are kept as-is
pub fn dataset_label(stem: &str) -> String {
    DATASET_NAME_MAP
        .iter()
        .find(|(raw, _)| *raw == stem)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| stem.to_string())
}

/// Extracts the dataset label from an eval file name
///
/// # Returns
/// `None` if the file is not an eval dump or no dataset tokens precede
/// `huggingface`.
pub fn extract_dataset_from_filename(path: &Path) -> Option<String> {
    if !is_grounding_eval_json(path) {
        return None;
    }

    let name = path.file_name()?.to_str()?;
    let tail = name.strip_prefix(EVAL_PREFIX)?;

    let stem = tail
        .split('_')
        .take_while(|token| *token != "huggingface")
        .map(|token| token.strip_suffix(".json").unwrap_or(token))
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        None
    } else {
        Some(dataset_label(&stem))
    }
}

/// Pulls a numeric accuracy from a parsed eval dump
///
/// Top-level `accuracy` wins over `metrics.accuracy`.
pub fn accuracy_from_value(value: &Value) -> Option<f64> {
    value
        .get("accuracy")
        .and_then(Value::as_f64)
        .or_else(|| {
            value
                .get("metrics")
                .and_then(|metrics| metrics.get("accuracy"))
                .and_then(Value::as_f64)
        })
}

/// Reads the accuracy stored in an eval file
pub fn read_accuracy(path: &Path) -> Result<f64> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    accuracy_from_value(&value)
        .ok_or_else(|| EvalJsonError::MissingAccuracy(path.display().to_string()))
}

/// Like [`read_accuracy`], treating any failure as "no result"
pub fn parse_accuracy_from_json(path: &Path) -> Option<f64> {
    match read_accuracy(path) {
        Ok(accuracy) => Some(accuracy),
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[rstest]
    #[case("grounding_eval_screenspot-pro-eval_huggingface_20250101.json", true)]
    #[case("grounding_eval_x.json", true)]
    #[case("eval_screenspot.json", false)]
    #[case("grounding_eval_screenspot-pro-eval.txt", false)]
    fn test_is_grounding_eval_json(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_grounding_eval_json(&PathBuf::from(name)), expected);
    }

    #[rstest]
    #[case(
        "grounding_eval_screenspot-pro-eval_huggingface_20250101_1200.json",
        Some("ScreenSpot-Pro")
    )]
    #[case(
        "grounding_eval_osworld-g-eval-refined_huggingface_1.json",
        Some("OSWorld-G")
    )]
    #[case("grounding_eval_my_custom_set_huggingface_1.json", Some("my_custom_set"))]
    #[case("grounding_eval_screenspot-v2.json", Some("screenspot-v2"))]
    #[case("grounding_eval__huggingface_1.json", None)]
    #[case("eval_screenspot-pro-eval_huggingface_1.json", None)]
    fn test_extract_dataset_from_filename(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            extract_dataset_from_filename(&PathBuf::from(name)).as_deref(),
            expected
        );
    }

    #[rstest]
    #[case(r#"{"accuracy": 0.5}"#, Some(0.5))]
    #[case(r#"{"metrics": {"accuracy": 0.61}}"#, Some(0.61))]
    #[case(r#"{"accuracy": 0.7, "metrics": {"accuracy": 0.1}}"#, Some(0.7))]
    #[case(r#"{"accuracy": "0.5"}"#, None)]
    #[case(r#"{"accuracy": "n/a", "metrics": {"accuracy": 42}}"#, Some(42.0))]
    #[case(r#"{"results": []}"#, None)]
    fn test_accuracy_from_value(#[case] json: &str, #[case] expected: Option<f64>) {
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(accuracy_from_value(&value), expected);
    }

    #[test]
    fn test_parse_accuracy_from_file() {
        let temp_dir = TempDir::new().unwrap();

        let good = temp_dir.path().join("grounding_eval_a_huggingface_1.json");
        fs::write(&good, r#"{"metrics": {"accuracy": 0.664}}"#).unwrap();
        assert_eq!(parse_accuracy_from_json(&good), Some(0.664));

        let malformed = temp_dir.path().join("grounding_eval_b_huggingface_1.json");
        fs::write(&malformed, "{ not json").unwrap();
        assert_eq!(parse_accuracy_from_json(&malformed), None);
        assert!(matches!(
            read_accuracy(&malformed),
            Err(EvalJsonError::JsonParse(_))
        ));

        let missing = temp_dir.path().join("does_not_exist.json");
        assert!(matches!(
            read_accuracy(&missing),
            Err(EvalJsonError::FileRead(_))
        ));

        let no_accuracy = temp_dir.path().join("grounding_eval_c_huggingface_1.json");
        fs::write(&no_accuracy, r#"{"total": 10}"#).unwrap();
        assert!(matches!(
            read_accuracy(&no_accuracy),
            Err(EvalJsonError::MissingAccuracy(_))
        ));
    }
}
