//! Experiment directories under the results root
//!
//! Coldstart runs are named `grpo-coldstart-<budget>-on-<data>...`, where the
//! budget uses `_` as decimal separator (`3_3k` is 3.3k samples). Ablations are
//! marked with `_temp_<value>` or `ui_venus_like` in the directory name.

use crate::analysis::constants::{
    COLDSTART_10K_PREFIX, COLDSTART_63K_PREFIX, COLDSTART_PREFIX, OLD_PIPELINE_MARKER,
    TEMPERATURE_MARKER, UI_VENUS_MARKER,
};
use crate::common::data_structures::{LabeledScores, Scores};
use crate::discovery::steps::{collect_step_scores, count_step_dirs, find_best_step_dir};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to list experiments in {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

type Result<T> = core::result::Result<T, DiscoveryError>;

static BUDGET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^grpo-coldstart-([^-]+)-on-").unwrap());

/// Name tokens are separated by `-` or `_`
static NAME_TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]").unwrap());

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>:\\/_|?*]").unwrap());

/// Temperature variants of the 10k run: directory marker and summary key.
/// The baseline (0.85) has no marker.
const TEMPERATURE_VARIANTS: [(&str, &str); 2] = [("1_0", "temp_1.0"), ("0_65", "temp_0.65")];

/// Summary key of the 10k run without a temperature marker
pub const BASELINE_TEMPERATURE_KEY: &str = "temp_0.85";

/// Summary keys of the 63k hyperparameter ablation
pub const DEFAULT_VARIANT_KEY: &str = "default";
pub const UI_VENUS_VARIANT_KEY: &str = "ui_venus_like";

fn dir_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

/// Extracts the SFT budget from a coldstart directory name (`3_3k` becomes `3.3k`)
pub fn budget_label(name: &str) -> Option<String> {
    BUDGET_RE
        .captures(name)
        .map(|captures| captures[1].replace('_', "."))
}

/// Numeric value of a budget label in thousands, for ordering
///
/// Labels that do not parse sort last.
pub fn budget_sort_key(label: &str) -> f64 {
    let normalized = label.to_lowercase().replace(' ', "").replace(',', ".");
    let number = normalized.strip_suffix('k').unwrap_or(&normalized);
    number.parse().unwrap_or(f64::INFINITY)
}

/// Sorts budget labels numerically
pub fn sort_budgets<S: AsRef<str>>(labels: &mut [S]) {
    labels.sort_by(|a, b| budget_sort_key(a.as_ref()).total_cmp(&budget_sort_key(b.as_ref())));
}

/// Replaces characters that are awkward in file names with `_`
pub fn sanitize_for_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// Lists directories under `root` whose name satisfies `filter`, sorted by name
pub fn list_experiment_dirs(root: &Path, filter: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let io_error = |source| DiscoveryError::Io {
        path: root.display().to_string(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() && filter(dir_name(&path)) {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// All coldstart experiment directories
pub fn coldstart_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    list_experiment_dirs(root, |name| name.starts_with(COLDSTART_PREFIX))
}

/// Coldstart runs with default hyperparameters, ordered by budget
pub fn baseline_coldstart_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = list_experiment_dirs(root, is_baseline_coldstart)?;
    dirs.sort_by(|a, b| {
        let key = |path: &PathBuf| budget_label(dir_name(path)).map_or(f64::INFINITY, |l| budget_sort_key(&l));
        key(a).total_cmp(&key(b))
    });
    Ok(dirs)
}

fn is_baseline_coldstart(name: &str) -> bool {
    name.starts_with(COLDSTART_PREFIX)
        && !name.contains(TEMPERATURE_MARKER)
        && !name.contains(UI_VENUS_MARKER)
}

/// Scores of the best checkpoint of an experiment, if it has any checkpoint
pub fn best_step_scores(experiment_dir: &Path) -> Option<Scores> {
    find_best_step_dir(experiment_dir).map(|step_dir| collect_step_scores(&step_dir))
}

/// Best-checkpoint scores per SFT budget
///
/// Only default-hyperparameter runs are included, so ablations of the same
/// budget do not replace the baseline result. Runs without any scores are
/// left out.
pub fn collect_coldstart(root: &Path) -> Result<LabeledScores> {
    let mut coldstart = LabeledScores::new();
    for dir in list_experiment_dirs(root, is_baseline_coldstart)? {
        let Some(budget) = budget_label(dir_name(&dir)) else {
            debug!("No budget in {}", dir.display());
            continue;
        };
        match best_step_scores(&dir) {
            Some(scores) if !scores.is_empty() => {
                coldstart.insert(budget, scores);
            }
            _ => debug!("No results in {}", dir.display()),
        }
    }
    Ok(coldstart)
}

/// The first directory (by name) matching `filter`
fn first_dir(root: &Path, filter: impl Fn(&str) -> bool) -> Result<Option<PathBuf>> {
    Ok(list_experiment_dirs(root, filter)?.into_iter().next())
}

/// Best-checkpoint scores of the 10k runs with varying sampling temperature
///
/// Keys are `temp_0.85` (baseline), `temp_1.0` and `temp_0.65`. A variant
/// whose run exists but has no results maps to empty scores.
pub fn collect_temperature_ablations(root: &Path) -> Result<LabeledScores> {
    let mut variants = LabeledScores::new();

    let baseline = first_dir(root, |name| {
        name.starts_with(COLDSTART_10K_PREFIX) && !name.contains(TEMPERATURE_MARKER)
    })?;
    if let Some(scores) = baseline.as_deref().and_then(best_step_scores) {
        variants.insert(BASELINE_TEMPERATURE_KEY.to_string(), scores);
    }

    for (marker, key) in TEMPERATURE_VARIANTS {
        let marker = format!("{}{}", TEMPERATURE_MARKER, marker);
        let dir = first_dir(root, |name| {
            name.starts_with(COLDSTART_10K_PREFIX) && name.contains(&marker)
        })?;
        if let Some(scores) = dir.as_deref().and_then(best_step_scores) {
            variants.insert(key.to_string(), scores);
        }
    }

    Ok(variants)
}

/// Best-checkpoint scores of the 63k run with default and UI-Venus-like hyperparameters
pub fn collect_ui_venus_ablations(root: &Path) -> Result<LabeledScores> {
    let mut variants = LabeledScores::new();

    for (key, venus) in [(DEFAULT_VARIANT_KEY, false), (UI_VENUS_VARIANT_KEY, true)] {
        let dir = first_dir(root, |name| {
            name.starts_with(COLDSTART_63K_PREFIX) && name.contains(UI_VENUS_MARKER) == venus
        })?;
        if let Some(scores) = dir.as_deref().and_then(best_step_scores) {
            variants.insert(key.to_string(), scores);
        }
    }

    Ok(variants)
}

/// Label of a 10k run in temperature comparisons
pub fn temperature_label(name: &str) -> &'static str {
    if name.contains("_temp_1_0") {
        "temp 1.0"
    } else if name.contains("_temp_0_65") {
        "temp 0.65"
    } else {
        "temp 0.85"
    }
}

fn temperature_order(label: &str) -> u8 {
    match label {
        "temp 0.65" => 0,
        "temp 0.85" => 1,
        _ => 2,
    }
}

/// All 10k runs, ordered by sampling temperature
pub fn temperature_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = list_experiment_dirs(root, |name| name.starts_with(COLDSTART_10K_PREFIX))?;
    dirs.sort_by_key(|dir| temperature_order(temperature_label(dir_name(dir))));
    Ok(dirs)
}

/// The first default and the first UI-Venus-like 63k run, with their labels
pub fn ui_venus_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut selected = Vec::new();
    for (key, venus) in [(DEFAULT_VARIANT_KEY, false), (UI_VENUS_VARIANT_KEY, true)] {
        if let Some(dir) = first_dir(root, |name| {
            name.starts_with(COLDSTART_63K_PREFIX) && name.contains(UI_VENUS_MARKER) == venus
        })? {
            selected.push((key.to_string(), dir));
        }
    }
    Ok(selected)
}

/// Returns `true` when `old` appears as a whole token of the run name
///
/// `grpo-coldstart-63k-on-mix_old` matches; `coldstart` alone does not.
pub fn is_old_pipeline_run(name: &str) -> bool {
    NAME_TOKEN_SEPARATOR
        .split(name)
        .any(|token| token == OLD_PIPELINE_MARKER)
}

/// Picks one 63k experiment directory
///
/// # Arguments
/// * `root` - Results root
/// * `pattern` - Optional glob relative to `root`; the first matching
///   directory (by path) is used
/// * `fallback` - Predicate on directory names used when no glob is given or
///   nothing matches; among matching 63k runs the one with the most
///   checkpoints wins
pub fn pick_experiment(
    root: &Path,
    pattern: Option<&str>,
    fallback: impl Fn(&str) -> bool,
) -> Option<PathBuf> {
    if let Some(pattern) = pattern {
        let full_pattern = root.join(pattern);
        match glob::glob(&full_pattern.to_string_lossy()) {
            Ok(paths) => {
                let mut matches: Vec<PathBuf> = paths
                    .filter_map(|entry| entry.ok())
                    .filter(|path| path.is_dir())
                    .collect();
                matches.sort();
                if let Some(first) = matches.into_iter().next() {
                    return Some(first);
                }
                debug!("No directory matches {}", full_pattern.display());
            }
            Err(e) => warn!("Invalid glob pattern '{}': {}", pattern, e),
        }
    }

    let mut candidates = match list_experiment_dirs(root, |name| {
        name.starts_with(COLDSTART_63K_PREFIX) && fallback(name)
    }) {
        Ok(candidates) => candidates,
        Err(e) => {
            debug!("{}", e);
            return None;
        }
    };

    // Stable sort keeps name order among runs with equal checkpoint counts
    candidates.sort_by_key(|dir| std::cmp::Reverse(count_step_dirs(dir)));
    candidates.into_iter().next()
}

/// The default-hyperparameter 63k run with the most checkpoints, or any 63k run
pub fn pick_default_63k(root: &Path) -> Option<PathBuf> {
    pick_experiment(root, None, |name| !name.contains(UI_VENUS_MARKER))
        .or_else(|| pick_experiment(root, None, |_| true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_eval(step_dir: &Path, dataset: &str, accuracy: f64) {
        fs::create_dir_all(step_dir).unwrap();
        fs::write(
            step_dir.join(format!("grounding_eval_{}_huggingface_1.json", dataset)),
            format!(r#"{{"accuracy": {}}}"#, accuracy),
        )
        .unwrap();
    }

    fn write_run(root: &Path, name: &str, step: u64, osworld: f64, sspro: f64) {
        let step_dir = root.join(name).join(format!("global_step_{}", step));
        write_eval(&step_dir, "osworld-g-eval-refined", osworld);
        write_eval(&step_dir, "screenspot-pro-eval", sspro);
    }

    fn results_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_run(root, "grpo-coldstart-1k-on-mix", 100, 0.60, 0.48);
        write_run(root, "grpo-coldstart-3_3k-on-mix", 100, 0.62, 0.49);
        write_run(root, "grpo-coldstart-10k-on-mix", 100, 0.63, 0.50);
        write_run(root, "grpo-coldstart-10k-on-mix_temp_1_0", 100, 0.64, 0.51);
        write_run(root, "grpo-coldstart-10k-on-mix_temp_0_65", 100, 0.61, 0.47);
        write_run(root, "grpo-coldstart-63k-on-mix", 150, 0.66, 0.52);
        write_run(root, "grpo-coldstart-63k-on-mix_ui_venus_like", 150, 0.65, 0.53);
        fs::create_dir_all(root.join("grpo-coldstart-5k-on-mix/global_step_10")).unwrap();
        fs::create_dir_all(root.join("unrelated-run")).unwrap();

        temp_dir
    }

    #[rstest]
    #[case("grpo-coldstart-3_3k-on-mix", Some("3.3k"))]
    #[case("grpo-coldstart-63k-on-mix_ui_venus_like", Some("63k"))]
    #[case("grpo-coldstart-10k", None)]
    #[case("grpo-7b-stage-1", None)]
    fn test_budget_label(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(budget_label(name).as_deref(), expected);
    }

    #[test]
    fn test_budget_ordering() {
        let mut labels = vec!["63k", "unknown", "10k", "3.3k", "1k", "2,5k"];
        sort_budgets(&mut labels);
        assert_eq!(labels, vec!["1k", "2,5k", "3.3k", "10k", "63k", "unknown"]);

        assert_eq!(budget_sort_key("3.3K"), 3.3);
        assert_eq!(budget_sort_key(" 20 k"), 20.0);
        assert!(budget_sort_key("all").is_infinite());
    }

    #[rstest]
    #[case("grpo-coldstart-3_3k-on-mix", "grpo-coldstart-3_3k-on-mix")]
    #[case("a/b:c*d?", "a_b_c_d_")]
    #[case("<x|y>", "_x_y_")]
    fn test_sanitize_for_filename(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize_for_filename(name), expected);
    }

    #[test]
    fn test_collect_coldstart_excludes_ablations() {
        let tree = results_tree();
        let coldstart = collect_coldstart(tree.path()).unwrap();

        assert_eq!(
            coldstart.keys().cloned().collect::<Vec<_>>(),
            vec!["10k", "1k", "3.3k", "63k"]
        );
        assert_eq!(coldstart["10k"]["OSWorld-G"], 0.63);
        assert_eq!(coldstart["63k"]["ScreenSpot-Pro"], 0.52);
    }

    #[test]
    fn test_collect_temperature_ablations() {
        let tree = results_tree();
        let ablations = collect_temperature_ablations(tree.path()).unwrap();

        assert_eq!(ablations.len(), 3);
        assert_eq!(ablations["temp_0.85"]["OSWorld-G"], 0.63);
        assert_eq!(ablations["temp_1.0"]["OSWorld-G"], 0.64);
        assert_eq!(ablations["temp_0.65"]["ScreenSpot-Pro"], 0.47);
    }

    #[test]
    fn test_collect_ui_venus_ablations() {
        let tree = results_tree();
        let ablations = collect_ui_venus_ablations(tree.path()).unwrap();

        assert_eq!(ablations["default"]["OSWorld-G"], 0.66);
        assert_eq!(ablations["ui_venus_like"]["ScreenSpot-Pro"], 0.53);
    }

    #[test]
    fn test_ablations_missing_runs() {
        let temp_dir = TempDir::new().unwrap();
        write_run(temp_dir.path(), "grpo-coldstart-1k-on-mix", 10, 0.6, 0.5);

        assert!(collect_temperature_ablations(temp_dir.path()).unwrap().is_empty());
        assert!(collect_ui_venus_ablations(temp_dir.path()).unwrap().is_empty());
        assert!(collect_coldstart(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_directory_orderings() {
        let tree = results_tree();

        let baseline: Vec<String> = baseline_coldstart_dirs(tree.path())
            .unwrap()
            .iter()
            .map(|dir| dir_name(dir).to_string())
            .collect();
        assert_eq!(
            baseline,
            vec![
                "grpo-coldstart-1k-on-mix",
                "grpo-coldstart-3_3k-on-mix",
                "grpo-coldstart-5k-on-mix",
                "grpo-coldstart-10k-on-mix",
                "grpo-coldstart-63k-on-mix",
            ]
        );

        let temperatures: Vec<&str> = temperature_dirs(tree.path())
            .unwrap()
            .iter()
            .map(|dir| temperature_label(dir_name(dir)))
            .collect();
        assert_eq!(temperatures, vec!["temp 0.65", "temp 0.85", "temp 1.0"]);

        let venus: Vec<String> = ui_venus_dirs(tree.path())
            .unwrap()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(venus, vec!["default", "ui_venus_like"]);
    }

    #[rstest]
    #[case("grpo-coldstart-63k-on-mix-old", true)]
    #[case("grpo-coldstart-63k-on-mix_old_initial", true)]
    #[case("old-pipeline-63k", true)]
    #[case("grpo-coldstart-63k-on-mix", false)]
    #[case("grpo-coldstart-63k-on-golden", false)]
    #[case("grpo-coldstart-63k-on-mix_older", false)]
    fn test_is_old_pipeline_run(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_old_pipeline_run(name), expected);
    }

    #[test]
    fn test_pick_experiment() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for step in [10, 20, 30] {
            fs::create_dir_all(root.join(format!("grpo-coldstart-63k-on-a/global_step_{}", step)))
                .unwrap();
        }
        fs::create_dir_all(root.join("grpo-coldstart-63k-on-a-old/global_step_250")).unwrap();
        for step in [10, 20, 30, 40] {
            fs::create_dir_all(root.join(format!(
                "grpo-coldstart-63k-on-b_ui_venus_like/global_step_{}",
                step
            )))
            .unwrap();
        }

        let old = pick_experiment(root, Some("*-old*"), is_old_pipeline_run).unwrap();
        assert!(old.ends_with("grpo-coldstart-63k-on-a-old"));

        // Glob without matches falls back to the predicate
        let new = pick_experiment(root, Some("nothing-*"), |name| !is_old_pipeline_run(name))
            .unwrap();
        assert!(new.ends_with("grpo-coldstart-63k-on-b_ui_venus_like"));

        // Without globs the old run still wins its slot despite having fewer checkpoints
        let old = pick_experiment(root, None, is_old_pipeline_run).unwrap();
        assert!(old.ends_with("grpo-coldstart-63k-on-a-old"));

        let default = pick_default_63k(root).unwrap();
        assert!(default.ends_with("grpo-coldstart-63k-on-a"));

        assert!(pick_experiment(root, None, |name| name.contains("missing")).is_none());
    }
}
