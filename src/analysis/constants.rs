//! Naming conventions and reference numbers used throughout the reports
//!
//! Reference accuracies are the published or previously measured numbers the
//! charts compare against, and the fallbacks used when result files are missing.

use crate::common::data_structures::BenchmarkPair;

/// Display label for the refined OSWorld-G benchmark
pub const OSWORLD_G: &str = "OSWorld-G";

/// Display label for the ScreenSpot-Pro benchmark
pub const SCREENSPOT_PRO: &str = "ScreenSpot-Pro";

/// Dataset stems in eval file names mapped to display labels
pub const DATASET_NAME_MAP: [(&str, &str); 2] = [
    ("screenspot-pro-eval", SCREENSPOT_PRO),
    ("osworld-g-eval-refined", OSWORLD_G),
];

/// Benchmarks plotted side by side when an experiment has both
pub const PREFERRED_DATASETS: [&str; 2] = [OSWORLD_G, SCREENSPOT_PRO];

/// File name prefixes a checkpoint needs to count as fully evaluated
pub const REQUIRED_EVAL_PREFIXES: [&str; 2] = [
    "grounding_eval_osworld-g-eval-refined",
    "grounding_eval_screenspot-pro-eval",
];

/// SFT checkpoint accuracies (fractions) the RL runs start from
pub const SFT_BASELINE: [(&str, f64); 2] = [(OSWORLD_G, 0.6640), (SCREENSPOT_PRO, 0.5008)];

/// Looks up the SFT baseline for a dataset label
pub fn sft_baseline(dataset: &str) -> Option<f64> {
    SFT_BASELINE
        .iter()
        .find(|(label, _)| *label == dataset)
        .map(|(_, value)| *value)
}

/// Experiment directory prefixes
pub const COLDSTART_PREFIX: &str = "grpo-coldstart-";
pub const COLDSTART_10K_PREFIX: &str = "grpo-coldstart-10k-";
pub const COLDSTART_63K_PREFIX: &str = "grpo-coldstart-63k-";

/// Marker for temperature ablation runs, e.g. `_temp_1_0`
pub const TEMPERATURE_MARKER: &str = "_temp_";

/// Marker for runs using UI-Venus-like hyperparameters
pub const UI_VENUS_MARKER: &str = "ui_venus_like";

/// Name token marking runs of the first RL pipeline, e.g. `..._old` or `...-old-...`
pub const OLD_PIPELINE_MARKER: &str = "old";

/// SFT-7B 63k accuracies (percent) reported in the journal
pub const JOURNAL_SFT_BASELINE: BenchmarkPair = BenchmarkPair::new(50.09, 60.1);

/// Final accuracies of the initial RL pipeline
pub const JOURNAL_OLD_PIPELINE_FINAL: BenchmarkPair = BenchmarkPair::new(50.66, 61.1);

/// Final accuracies of the improved RL pipeline
pub const JOURNAL_NEW_PIPELINE_FINAL: BenchmarkPair = BenchmarkPair::new(53.57, 63.6);

/// Accuracies after each round of the improved RL pipeline
pub const JOURNAL_PER_ROUND: [(u32, BenchmarkPair); 2] = [
    (1, BenchmarkPair::new(51.42, 63.1)),
    (2, BenchmarkPair::new(53.57, 63.6)),
];

/// Training steps of the initial RL pipeline
pub const OLD_PIPELINE_STEPS: u64 = 250;

/// Training steps of the improved RL pipeline (round 2)
pub const NEW_PIPELINE_STEPS: u64 = 194;

/// Rescales old-pipeline OSWorld-G numbers onto the refined benchmark
pub const OLD_OSWORLD_SCALE: f64 = 0.90425531914;

/// Sample counts used to recompute accuracy from correct counts
pub const SCREENSPOT_PRO_TOTAL: u32 = 1581;
pub const OSWORLD_TOTAL: u32 = 564;

/// GTA1-7B accuracies (fractions) on the OSWorld-G eval sets
pub const GTA1_OSWORLD_BASELINE: f64 = 0.551;
pub const GTA1_OSWORLD_REFINED_BASELINE: f64 = 0.677;

/// Default location of the per-step CSV exported for the old pipeline
pub const OLD_PIPELINE_CSV: &str = "old_initial_rl_steps_from_json.csv";

/// Default location of the journal entry with per-round results
pub const ROUNDS_JOURNAL: &str = "journal/improve_rl_gains_through_better_diversity.md";
