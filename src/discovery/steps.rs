//! Checkpoint (step) directories inside an experiment directory
//!
//! Step directories are named `global_step_<N>` or `checkpoint-<N>` and hold
//! the `grounding_eval_*.json` dumps for that checkpoint.

use crate::analysis::constants::REQUIRED_EVAL_PREFIXES;
use crate::common::data_structures::{Scores, StepSeries};
use crate::parsing::eval_json::{
    extract_dataset_from_filename, is_grounding_eval_json, parse_accuracy_from_json,
};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

static STEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(global_step_|checkpoint-)(\d+)").unwrap());

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Extracts the step number from a step directory name
///
/// Falls back to the last run of digits when the name does not follow the
/// `global_step_`/`checkpoint-` convention.
pub fn step_number(name: &str) -> Option<u64> {
    if let Some(captures) = STEP_RE.captures(name) {
        return captures[2].parse().ok();
    }

    DIGITS_RE
        .find_iter(name)
        .last()
        .and_then(|digits| digits.as_str().parse().ok())
}

pub fn is_step_dir_name(name: &str) -> bool {
    name.starts_with("global_step_") || name.starts_with("checkpoint-")
}

/// Lists step directories of an experiment, sorted by name
pub fn list_step_dirs(experiment_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(experiment_dir)? {
        let path = entry?.path();
        let is_step = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_step_dir_name);
        if is_step && path.is_dir() {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Number of step directories; unreadable experiments count as zero
pub fn count_step_dirs(experiment_dir: &Path) -> usize {
    list_step_dirs(experiment_dir).map_or(0, |dirs| dirs.len())
}

/// Eval files directly inside a step directory, sorted by name
fn eval_files(step_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(step_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && is_grounding_eval_json(path))
            .collect(),
        Err(e) => {
            debug!("Cannot read {}: {}", step_dir.display(), e);
            Vec::new()
        }
    };

    files.sort();
    files
}

/// Reads every eval dump in a step directory into dataset scores
///
/// When a dataset was evaluated more than once, the file sorting last
/// (latest timestamp) wins.
pub fn collect_step_scores(step_dir: &Path) -> Scores {
    let mut scores = Scores::new();
    for file in eval_files(step_dir) {
        let Some(dataset) = extract_dataset_from_filename(&file) else {
            continue;
        };
        if let Some(accuracy) = parse_accuracy_from_json(&file) {
            scores.insert(dataset, accuracy);
        }
    }
    scores
}

/// Collects scores for every numbered step that has at least one result
pub fn collect_step_series(experiment_dir: &Path) -> StepSeries {
    let step_dirs = match list_step_dirs(experiment_dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            debug!("Cannot list steps of {}: {}", experiment_dir.display(), e);
            return StepSeries::new();
        }
    };

    let mut series = StepSeries::new();
    for step_dir in step_dirs {
        let Some(step) = dir_step_number(&step_dir) else {
            continue;
        };
        let scores = collect_step_scores(&step_dir);
        if !scores.is_empty() {
            series.insert(step, scores);
        }
    }
    series
}

fn dir_step_number(step_dir: &Path) -> Option<u64> {
    step_dir
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(step_number)
}

fn has_all_required_evals(step_dir: &Path) -> bool {
    let names: Vec<String> = eval_files(step_dir)
        .iter()
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect();

    REQUIRED_EVAL_PREFIXES.iter().all(|prefix| {
        let prefix = format!("{}_", prefix);
        names.iter().any(|name| name.starts_with(&prefix))
    })
}

/// Picks the checkpoint whose results represent an experiment
///
/// Preference order, taking the highest step within each tier:
/// 1. steps with results for every required benchmark
/// 2. steps with any eval result
/// 3. any step directory
///
/// # Returns
/// `None` if the experiment has no step directories.
pub fn find_best_step_dir(experiment_dir: &Path) -> Option<PathBuf> {
    let step_dirs = list_step_dirs(experiment_dir).ok()?;
    if step_dirs.is_empty() {
        return None;
    }

    let latest = |dirs: Vec<&PathBuf>| -> Option<PathBuf> {
        dirs.into_iter()
            .max_by_key(|dir| dir_step_number(dir))
            .cloned()
    };

    let with_all: Vec<&PathBuf> = step_dirs
        .iter()
        .filter(|dir| has_all_required_evals(dir))
        .collect();
    if !with_all.is_empty() {
        return latest(with_all);
    }

    let with_any: Vec<&PathBuf> = step_dirs
        .iter()
        .filter(|dir| !eval_files(dir).is_empty())
        .collect();
    if !with_any.is_empty() {
        return latest(with_any);
    }

    latest(step_dirs.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_eval(step_dir: &Path, dataset: &str, timestamp: &str, accuracy: f64) {
        fs::create_dir_all(step_dir).unwrap();
        fs::write(
            step_dir.join(format!(
                "grounding_eval_{}_huggingface_{}.json",
                dataset, timestamp
            )),
            format!(r#"{{"accuracy": {}}}"#, accuracy),
        )
        .unwrap();
    }

    #[rstest]
    #[case("global_step_120", Some(120))]
    #[case("checkpoint-45", Some(45))]
    #[case("run3_global_step_7", Some(7))]
    #[case("step_1_of_30", Some(30))]
    #[case("final", None)]
    fn test_step_number(#[case] name: &str, #[case] expected: Option<u64>) {
        assert_eq!(step_number(name), expected);
    }

    #[test]
    fn test_list_and_count_step_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("global_step_20")).unwrap();
        fs::create_dir_all(root.join("checkpoint-5")).unwrap();
        fs::create_dir_all(root.join("logs")).unwrap();
        fs::write(root.join("global_step_30"), "not a dir").unwrap();

        let dirs = list_step_dirs(root).unwrap();
        assert_eq!(dirs.len(), 2);
        assert_eq!(count_step_dirs(root), 2);
        assert_eq!(count_step_dirs(&root.join("missing")), 0);
    }

    #[test]
    fn test_collect_step_series() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_eval(&root.join("global_step_20"), "osworld-g-eval-refined", "1", 0.61);
        write_eval(&root.join("global_step_20"), "screenspot-pro-eval", "1", 0.50);
        write_eval(&root.join("global_step_100"), "screenspot-pro-eval", "1", 0.51);
        // Re-evaluation with a later timestamp replaces the earlier one
        write_eval(&root.join("global_step_100"), "screenspot-pro-eval", "2", 0.52);
        fs::create_dir_all(root.join("global_step_200")).unwrap();
        fs::write(root.join("global_step_100").join("notes.json"), "{}").unwrap();

        let series = collect_step_series(root);
        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![20, 100]);
        assert_eq!(series[&20]["OSWorld-G"], 0.61);
        assert_eq!(series[&100]["ScreenSpot-Pro"], 0.52);
        assert_eq!(series[&100].len(), 1);
    }

    #[test]
    fn test_find_best_step_prefers_complete_results() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_eval(&root.join("global_step_50"), "osworld-g-eval-refined", "1", 0.6);
        write_eval(&root.join("global_step_50"), "screenspot-pro-eval", "1", 0.5);
        write_eval(&root.join("global_step_80"), "screenspot-pro-eval", "1", 0.5);
        fs::create_dir_all(root.join("global_step_90")).unwrap();

        let best = find_best_step_dir(root).unwrap();
        assert!(best.ends_with("global_step_50"));
    }

    #[test]
    fn test_find_best_step_falls_back_to_any_results() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_eval(&root.join("global_step_40"), "screenspot-pro-eval", "1", 0.5);
        write_eval(&root.join("global_step_80"), "screenspot-pro-eval", "1", 0.5);
        fs::create_dir_all(root.join("global_step_90")).unwrap();

        let best = find_best_step_dir(root).unwrap();
        assert!(best.ends_with("global_step_80"));
    }

    #[test]
    fn test_find_best_step_falls_back_to_latest() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("global_step_9")).unwrap();
        fs::create_dir_all(root.join("global_step_10")).unwrap();

        let best = find_best_step_dir(root).unwrap();
        assert!(best.ends_with("global_step_10")); // numeric, not lexical
    }

    #[test]
    fn test_find_best_step_without_steps() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_best_step_dir(temp_dir.path()).is_none());
        assert!(find_best_step_dir(&temp_dir.path().join("missing")).is_none());
    }
}
