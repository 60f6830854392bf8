//! File parsing for evaluation results
//!
//! - [`eval_json`]: per-checkpoint `grounding_eval_*.json` dumps
//! - [`markdown`]: DAPO training logs and the RL rounds journal entry
//! - [`step_csv`]: per-step accuracies exported to CSV

pub mod eval_json;
pub mod markdown;
pub mod step_csv;

pub use eval_json::{extract_dataset_from_filename, is_grounding_eval_json, parse_accuracy_from_json};
pub use markdown::{DapoBenchmark, DapoLog, RoundsReport};
pub use step_csv::StepCsvError;
