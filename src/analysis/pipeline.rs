//! Comparisons between the initial and the improved RL pipeline on the 63k SFT model

use crate::analysis::constants::{
    JOURNAL_NEW_PIPELINE_FINAL, JOURNAL_OLD_PIPELINE_FINAL, JOURNAL_SFT_BASELINE,
    NEW_PIPELINE_STEPS, OLD_OSWORLD_SCALE, OLD_PIPELINE_CSV, OLD_PIPELINE_STEPS, OSWORLD_G,
    SCREENSPOT_PRO,
};
use crate::common::data_structures::{to_percent, BenchmarkPair, StepSeries};
use crate::common::plots::{
    create_panel_figure, BarChart, BarGroup, LineChart, LineSeriesSpec, Panel, PlotError,
    ReferenceLine, GRAY,
};
use crate::discovery::experiments::{is_old_pipeline_run, pick_default_63k, pick_experiment};
use crate::discovery::steps::collect_step_series;
use crate::parsing::markdown::{load_rounds_markdown, RoundsReport};
use crate::parsing::step_csv::load_step_csv;
use log::{info, warn};
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to generate plot: {0}")]
    Plot(#[from] PlotError),
}

type Result<T> = core::result::Result<T, PipelineError>;

const OLD_COLOR: RGBColor = RGBColor(0x5d, 0xad, 0xe2);
const NEW_COLOR: RGBColor = RGBColor(0x27, 0xae, 0x60);
const SS_PRO_COLOR: RGBColor = RGBColor(0xcd, 0x5c, 0x5c);
const OS_WORLD_COLOR: RGBColor = RGBColor(0x2e, 0x86, 0xab);

/// Percent-normalized `(step, accuracy)` points of one dataset
fn percent_points(series: &StepSeries, dataset: &str) -> Vec<(f64, f64)> {
    series
        .iter()
        .filter_map(|(step, scores)| {
            scores
                .get(dataset)
                .map(|value| (*step as f64, to_percent(*value)))
        })
        .collect()
}

fn pair_value(pair: &BenchmarkPair, dataset: &str) -> f64 {
    pair.for_dataset(dataset).unwrap_or(f64::NAN)
}

/// Per-step accuracies of the initial pipeline
///
/// An exported CSV takes precedence over scanning `old_dir`.
fn load_old_series(old_csv: Option<&Path>, old_dir: Option<&Path>) -> StepSeries {
    if let Some(csv_path) = old_csv.filter(|path| path.exists()) {
        match load_step_csv(csv_path) {
            Ok(series) if !series.is_empty() => {
                info!("Old pipeline steps from {}", csv_path.display());
                return series;
            }
            Ok(_) => warn!("{} holds no step results", csv_path.display()),
            Err(e) => warn!("Ignoring {}: {}", csv_path.display(), e),
        }
    }

    old_dir.map(collect_step_series).unwrap_or_default()
}

/// One panel per headline dataset comparing both pipelines over training steps
///
/// Missing curves are replaced by the journal's key points: the improved
/// pipeline by SFT baseline and round 2 result, and, when neither pipeline has
/// data, the initial one by SFT baseline and its final result.
pub fn stepwise_panels(old: &StepSeries, new: &StepSeries) -> Vec<Panel> {
    [OSWORLD_G, SCREENSPOT_PRO]
        .into_iter()
        .map(|dataset| {
            let baseline = pair_value(&JOURNAL_SFT_BASELINE, dataset);
            let scale = if dataset == OSWORLD_G {
                OLD_OSWORLD_SCALE
            } else {
                1.0
            };

            let mut old_points: Vec<(f64, f64)> = percent_points(old, dataset)
                .into_iter()
                .map(|(step, value)| (step, value * scale))
                .collect();
            let mut new_points = percent_points(new, dataset);
            let mut note = None;

            if old_points.is_empty() && new_points.is_empty() {
                old_points = vec![
                    (0.0, baseline * scale),
                    (
                        OLD_PIPELINE_STEPS as f64,
                        pair_value(&JOURNAL_OLD_PIPELINE_FINAL, dataset) * scale,
                    ),
                ];
                note = Some("Fallback: using key points".to_string());
            }
            if new_points.is_empty() {
                new_points = vec![
                    (0.0, baseline),
                    (
                        NEW_PIPELINE_STEPS as f64,
                        pair_value(&JOURNAL_NEW_PIPELINE_FINAL, dataset),
                    ),
                ];
            }

            let mut chart = LineChart::new(dataset, "Global step", "Accuracy (%)");
            if !old_points.is_empty() {
                chart
                    .series
                    .push(LineSeriesSpec::new("old RL", old_points, OLD_COLOR));
            }
            chart
                .series
                .push(LineSeriesSpec::new("new RL", new_points, NEW_COLOR));
            chart.references.push(ReferenceLine::new(
                format!("{} baseline", dataset),
                baseline,
                GRAY,
            ));
            chart.note = note;
            Panel::Line(chart)
        })
        .collect()
}

/// Step series of the initial and the improved pipeline, in that order
///
/// # Arguments
/// * `results_root` - Directory holding the 63k experiments
/// * `old_glob` / `new_glob` - Optional globs selecting each pipeline's run;
///   otherwise the 63k run with the most checkpoints whose name does (or does
///   not) carry an `old` token is used
/// * `old_csv` - CSV with the initial pipeline's per-step results; defaults to
///   `old_initial_rl_steps_from_json.csv` in `output_dir` when present
/// * `output_dir` - Directory searched for the default CSV
///
/// The initial series comes from the CSV when it holds any rows, otherwise
/// from the selected run directory. Missing series are left empty.
pub fn select_series(
    results_root: &Path,
    old_glob: Option<&str>,
    new_glob: Option<&str>,
    old_csv: Option<&Path>,
    output_dir: &Path,
) -> (StepSeries, StepSeries) {
    let old_dir = pick_experiment(results_root, old_glob, is_old_pipeline_run);
    let new_dir = pick_experiment(results_root, new_glob, |name| !is_old_pipeline_run(name));

    let default_csv = output_dir.join(OLD_PIPELINE_CSV);
    let old_csv = old_csv.or(Some(default_csv.as_path()));

    let old = load_old_series(old_csv, old_dir.as_deref());
    let new = new_dir
        .as_deref()
        .map(collect_step_series)
        .unwrap_or_default();

    (old, new)
}

/// Overlays per-step accuracy of the initial and improved pipeline
///
/// Runs are chosen by [`select_series`]; see there for the arguments.
/// Writes `pipeline_stepwise_overlay.png` to `output_dir`.
///
/// # Returns
/// Path of the written figure
pub fn generate_stepwise_overlay(
    results_root: &Path,
    old_glob: Option<&str>,
    new_glob: Option<&str>,
    old_csv: Option<&Path>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let (old, new) = select_series(results_root, old_glob, new_glob, old_csv, output_dir);

    if new.is_empty() {
        warn!("No improved pipeline results found; using key points");
    }
    if old.is_empty() {
        warn!("No initial pipeline results found");
    }

    let path = output_dir.join("pipeline_stepwise_overlay.png");
    create_panel_figure(
        &stepwise_panels(&old, &new),
        "63k step-wise: old vs new pipeline",
        &path,
    )?;
    info!("Plot saved to: {}", path.display());
    Ok(path)
}

/// Grouped bars of SFT baseline, initial pipeline and each improved round
pub fn rounds_chart(report: &RoundsReport) -> BarChart {
    let stages = [
        ("SFT-7B 63k", Some(report.baseline)),
        ("old RL (250 steps)", Some(JOURNAL_OLD_PIPELINE_FINAL)),
        ("Round 1", report.round(1)),
        ("Round 2", report.round(2)),
    ];

    let categories = stages.iter().map(|(label, _)| label.to_string()).collect();
    let ss_pro: Vec<Option<f64>> = stages
        .iter()
        .map(|(_, pair)| pair.map(|pair| pair.ss_pro))
        .collect();
    let os_world: Vec<Option<f64>> = stages
        .iter()
        .map(|(_, pair)| pair.map(|pair| pair.os_world_g))
        .collect();

    let percent_labels = |values: &[Option<f64>], decimals: usize| -> Vec<String> {
        values
            .iter()
            .map(|value| value.map_or_else(String::new, |v| format!("{:.*}%", decimals, v)))
            .collect()
    };

    let groups = vec![
        BarGroup::new("SS Pro", ss_pro.clone(), SS_PRO_COLOR)
            .with_value_labels(percent_labels(&ss_pro, 2)),
        BarGroup::new("OS-World-G", os_world.clone(), OS_WORLD_COLOR)
            .with_value_labels(percent_labels(&os_world, 1)),
    ];

    let mut chart = BarChart::new(
        "Scalability by Rounds (old vs new)",
        "Accuracy (%)",
        categories,
        groups,
    );
    chart.y_range = Some(48.0..70.0);
    chart
}

/// Step-wise curves of the 63k run, or the journal's key points when absent
///
/// Key points always use the published round 2 result, whatever the rounds
/// table says.
pub fn stepwise_63k_chart(series: &StepSeries) -> LineChart {
    let mut chart = LineChart::new("63k: Step-wise performance", "Global step", "Accuracy (%)");

    let ss_pro = percent_points(series, SCREENSPOT_PRO);
    let os_world = percent_points(series, OSWORLD_G);

    if ss_pro.is_empty() && os_world.is_empty() {
        let round_2 = JOURNAL_NEW_PIPELINE_FINAL;
        let steps = [0.0, OLD_PIPELINE_STEPS as f64, NEW_PIPELINE_STEPS as f64];
        let key_points = |values: [f64; 3]| -> Vec<(f64, f64)> {
            steps.iter().copied().zip(values).collect()
        };

        chart.series = vec![
            LineSeriesSpec::new(
                "SS Pro",
                key_points([
                    JOURNAL_SFT_BASELINE.ss_pro,
                    JOURNAL_OLD_PIPELINE_FINAL.ss_pro,
                    round_2.ss_pro,
                ]),
                SS_PRO_COLOR,
            ),
            LineSeriesSpec::new(
                "OS-World-G",
                key_points([
                    JOURNAL_SFT_BASELINE.os_world_g,
                    JOURNAL_OLD_PIPELINE_FINAL.os_world_g,
                    round_2.os_world_g,
                ]),
                OS_WORLD_COLOR,
            ),
        ];
        chart.note = Some("Step-wise data not found; showing key points".to_string());
    } else {
        if !ss_pro.is_empty() {
            chart
                .series
                .push(LineSeriesSpec::new("SS Pro", ss_pro, SS_PRO_COLOR));
        }
        if !os_world.is_empty() {
            chart
                .series
                .push(LineSeriesSpec::new("OS-World-G", os_world, OS_WORLD_COLOR));
        }
    }

    chart.references = vec![
        ReferenceLine::new("SS Pro baseline", JOURNAL_SFT_BASELINE.ss_pro, SS_PRO_COLOR),
        ReferenceLine::new(
            "OS-World-G baseline",
            JOURNAL_SFT_BASELINE.os_world_g,
            OS_WORLD_COLOR,
        ),
    ];
    chart
}

/// Rounds summary next to the 63k step-wise curve
///
/// # Arguments
/// * `results_root` - Directory holding the 63k experiments
/// * `journal` - Markdown journal entry with the per-round results table
/// * `output_dir` - Directory where `pipeline_scalability.png` is written
pub fn generate_scalability(results_root: &Path, journal: &Path, output_dir: &Path) -> Result<PathBuf> {
    let report = load_rounds_markdown(journal);

    let series = match pick_default_63k(results_root) {
        Some(dir) => {
            info!("Step-wise 63k results from {}", dir.display());
            collect_step_series(&dir)
        }
        None => {
            warn!("No 63k experiment under {}", results_root.display());
            StepSeries::new()
        }
    };

    let panels = [
        Panel::Bar(rounds_chart(&report)),
        Panel::Line(stepwise_63k_chart(&series)),
    ];

    let path = output_dir.join("pipeline_scalability.png");
    create_panel_figure(&panels, "Pipeline Scalability: New vs Old", &path)?;
    info!("Plot saved to: {}", path.display());
    Ok(path)
}
