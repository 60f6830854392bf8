//! Coldstart sweep: RL runs started from SFT checkpoints of different budgets
//!
//! Produces per-experiment scaling curves, the best-checkpoint summary per
//! budget, and comparisons for the temperature and UI-Venus ablations.

use crate::analysis::constants::{sft_baseline, OSWORLD_G, PREFERRED_DATASETS, SCREENSPOT_PRO};
use crate::common::data_structures::{
    AblationSummary, ColdstartSummary, LabeledScores, PerStepSummary, StepSeries,
};
use crate::common::export::{write_json_pretty, write_metrics_csv, ExportError};
use crate::common::plots::{
    create_bar_chart, create_line_chart, create_panel_figure, series_color, BarChart, BarGroup,
    LineChart, LineSeriesSpec, Panel, PlotError, ReferenceLine, GRAY, LIGHT_GRAY,
};
use crate::discovery::experiments::{
    baseline_coldstart_dirs, budget_label, budget_sort_key, collect_coldstart,
    collect_temperature_ablations, collect_ui_venus_ablations, coldstart_dirs,
    sanitize_for_filename, sort_budgets, temperature_dirs, temperature_label, ui_venus_dirs,
    BASELINE_TEMPERATURE_KEY, DEFAULT_VARIANT_KEY, UI_VENUS_VARIANT_KEY,
};
use crate::discovery::steps::collect_step_series;
use crate::discovery::DiscoveryError;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColdstartError {
    #[error("Failed to scan results: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to write summary: {0}")]
    Export(#[from] ExportError),

    #[error("Failed to generate plot: {0}")]
    Plot(#[from] PlotError),
}

type Result<T> = core::result::Result<T, ColdstartError>;

/// Generates every coldstart artifact under `assets_dir`
///
/// # Arguments
/// * `results_root` - Directory holding the `grpo-coldstart-*` experiments
/// * `assets_dir` - Directory where plots and summaries are written
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Paths of every file written
/// * `Err(ColdstartError)` - If scanning, writing or plotting failed
pub fn generate_coldstart_report(results_root: &Path, assets_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::new();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Scanning {}", results_root.display()));

    let per_step = collect_per_step(results_root)?;
    let coldstart = collect_coldstart(results_root)?;
    let ablations = AblationSummary {
        temperature_10k: collect_temperature_ablations(results_root)?,
        ui_venus_like_63k: collect_ui_venus_ablations(results_root)?,
    };
    spinner.finish_and_clear();

    info!(
        "Found {} experiments with per-step results, {} budgets",
        per_step.len(),
        coldstart.len()
    );

    let scaling_dir = assets_dir.join("scaling");
    for (name, series) in &per_step {
        let path = scaling_dir.join(format!("scaling_{}.png", sanitize_for_filename(name)));
        create_line_chart(&scaling_chart(name, series), &path)?;
        outputs.push(path);
    }
    info!(
        "Generated {} per-experiment scaling plots under {}",
        per_step.len(),
        scaling_dir.display()
    );

    let per_step_path = assets_dir.join("rl_per_step_scaling.json");
    write_json_pretty(&per_step, &per_step_path)?;
    outputs.push(per_step_path);

    let summary = ColdstartSummary {
        coldstart,
        ablations,
    };
    outputs.extend(write_summary_files(&summary, assets_dir)?);

    let figures = [
        plot_coldstart_performance(&summary.coldstart, assets_dir)?,
        plot_coldstart_side_by_side(&summary.coldstart, assets_dir)?,
        plot_temperature_ablations(&summary.ablations.temperature_10k, assets_dir)?,
        plot_ui_venus_vs_default(&summary.ablations.ui_venus_like_63k, assets_dir)?,
        plot_coldstart_overlay(results_root, assets_dir)?,
        plot_temperature_overlay(results_root, assets_dir)?,
        plot_ui_venus_overlay(results_root, assets_dir)?,
    ];
    outputs.extend(figures.into_iter().flatten());

    Ok(outputs)
}

/// Per-step scores of every coldstart experiment that has any results
pub fn collect_per_step(results_root: &Path) -> Result<PerStepSummary> {
    let mut per_step = PerStepSummary::new();
    for dir in coldstart_dirs(results_root)? {
        let series = collect_step_series(&dir);
        if series.is_empty() {
            debug!("No per-step results in {}", dir.display());
            continue;
        }
        if let Some(name) = dir.file_name().and_then(|name| name.to_str()) {
            per_step.insert(name.to_string(), series);
        }
    }
    Ok(per_step)
}

/// Writes `rl_coldstart_summary.json` and `rl_coldstart_metrics.csv`
///
/// CSV rows are ordered by budget size.
pub fn write_summary_files(summary: &ColdstartSummary, assets_dir: &Path) -> Result<Vec<PathBuf>> {
    let summary_path = assets_dir.join("rl_coldstart_summary.json");
    write_json_pretty(summary, &summary_path)?;

    let mut budgets: Vec<&String> = summary.coldstart.keys().collect();
    sort_budgets(&mut budgets);
    let rows: Vec<(String, _)> = budgets
        .into_iter()
        .map(|budget| (budget.clone(), summary.coldstart[budget].clone()))
        .collect();

    let csv_path = assets_dir.join("rl_coldstart_metrics.csv");
    write_metrics_csv("budget", &rows, &csv_path)?;

    Ok(vec![summary_path, csv_path])
}

/// Dataset labels present anywhere in a step series, sorted
fn series_datasets(series: &StepSeries) -> BTreeSet<&str> {
    series
        .values()
        .flat_map(|scores| scores.keys().map(String::as_str))
        .collect()
}

/// `(step, accuracy)` points of one dataset
fn dataset_points(series: &StepSeries, dataset: &str) -> Vec<(f64, f64)> {
    series
        .iter()
        .filter_map(|(step, scores)| scores.get(dataset).map(|value| (*step as f64, *value)))
        .collect()
}

/// Dashed SFT baselines for the headline datasets among `datasets`
fn baseline_references<'a>(datasets: impl IntoIterator<Item = &'a str>) -> Vec<ReferenceLine> {
    datasets
        .into_iter()
        .filter_map(|dataset| {
            let value = sft_baseline(dataset)?;
            let color = if dataset == OSWORLD_G { GRAY } else { LIGHT_GRAY };
            Some(ReferenceLine::new(
                format!("SFT baseline ({})", dataset),
                value,
                color,
            ))
        })
        .collect()
}

fn scaling_chart(name: &str, series: &StepSeries) -> LineChart {
    let datasets = series_datasets(series);

    let mut chart = LineChart::new(name, "Global step", "Accuracy");
    chart.series = datasets
        .iter()
        .enumerate()
        .map(|(index, dataset)| {
            LineSeriesSpec::new(*dataset, dataset_points(series, dataset), series_color(index))
        })
        .collect();
    chart.references = baseline_references(datasets.iter().copied());
    chart
}

/// Accuracy per dataset against budget size in thousands
fn coldstart_performance_chart(coldstart: &LabeledScores) -> Option<LineChart> {
    let datasets: BTreeSet<&str> = coldstart
        .values()
        .flat_map(|scores| scores.keys().map(String::as_str))
        .collect();

    let mut budgets: Vec<&String> = coldstart.keys().collect();
    sort_budgets(&mut budgets);

    let mut chart = LineChart::new(
        "Coldstart performance vs SFT budget",
        "SFT budget (thousands)",
        "Accuracy",
    );
    for (index, dataset) in datasets.iter().enumerate() {
        let points: Vec<(f64, f64)> = budgets
            .iter()
            .filter_map(|budget| {
                let x = budget_sort_key(budget);
                let value = coldstart[*budget].get(*dataset)?;
                x.is_finite().then_some((x, *value))
            })
            .collect();
        if !points.is_empty() {
            chart
                .series
                .push(LineSeriesSpec::new(*dataset, points, series_color(index)));
        }
    }
    chart.references = baseline_references(datasets.iter().copied());

    (!chart.series.is_empty()).then_some(chart)
}

fn plot_coldstart_performance(coldstart: &LabeledScores, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(chart) = coldstart_performance_chart(coldstart) else {
        warn!("No coldstart results with numeric budgets; skipping performance plot");
        return Ok(None);
    };

    let path = assets_dir.join("rl_coldstart_performance.png");
    create_line_chart(&chart, &path)?;
    Ok(Some(path))
}

/// One panel per headline dataset, budgets as categories
fn coldstart_side_by_side_panels(coldstart: &LabeledScores) -> Vec<Panel> {
    let mut budgets: Vec<&String> = coldstart.keys().collect();
    sort_budgets(&mut budgets);

    PREFERRED_DATASETS
        .iter()
        .filter_map(|dataset| {
            let points: Vec<(f64, f64)> = budgets
                .iter()
                .enumerate()
                .filter_map(|(index, budget)| {
                    coldstart[*budget]
                        .get(*dataset)
                        .map(|value| (index as f64, *value))
                })
                .collect();
            if points.is_empty() {
                return None;
            }

            let mut chart = LineChart::new(*dataset, "SFT budget", "Accuracy");
            chart.series.push(LineSeriesSpec::new(*dataset, points, series_color(0)));
            chart.references = sft_baseline(dataset)
                .map(|value| vec![ReferenceLine::new("SFT baseline", value, GRAY)])
                .unwrap_or_default();
            chart.x_categories = Some(budgets.iter().map(|budget| budget.to_string()).collect());
            Some(Panel::Line(chart))
        })
        .collect()
}

fn plot_coldstart_side_by_side(coldstart: &LabeledScores, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let panels = coldstart_side_by_side_panels(coldstart);
    if panels.is_empty() {
        warn!("No coldstart results; skipping side-by-side plot");
        return Ok(None);
    }

    let path = assets_dir.join("rl_coldstart_side_by_side.png");
    create_panel_figure(
        &panels,
        "Coldstart across SFT budgets (by dataset)",
        &path,
    )?;
    Ok(Some(path))
}

fn has_values(chart: &BarChart) -> bool {
    chart
        .groups
        .iter()
        .any(|group| group.values.iter().any(Option::is_some))
}

fn temperature_ablation_chart(ablations: &LabeledScores) -> BarChart {
    let order = ["temp_0.65", BASELINE_TEMPERATURE_KEY, "temp_1.0"];
    let categories = vec![
        "temp=0.65".to_string(),
        "temp=0.85 (baseline)".to_string(),
        "temp=1.0".to_string(),
    ];

    let groups = [OSWORLD_G, SCREENSPOT_PRO]
        .iter()
        .enumerate()
        .map(|(index, dataset)| {
            let values = order
                .iter()
                .map(|key| ablations.get(*key).and_then(|scores| scores.get(*dataset)).copied())
                .collect();
            BarGroup::new(*dataset, values, series_color(index))
        })
        .collect();

    let mut chart = BarChart::new(
        "Temperature ablations (10k SFT)",
        "Accuracy",
        categories,
        groups,
    );
    chart.references = baseline_references([OSWORLD_G, SCREENSPOT_PRO]);
    chart.decimals = 3;
    chart
}

fn plot_temperature_ablations(ablations: &LabeledScores, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let chart = temperature_ablation_chart(ablations);
    if !has_values(&chart) {
        warn!("No temperature ablation results; skipping ablation plot");
        return Ok(None);
    }

    let path = assets_dir.join("rl_temp_ablations_10k.png");
    create_bar_chart(&chart, &path)?;
    Ok(Some(path))
}

fn ui_venus_chart(ablations: &LabeledScores) -> BarChart {
    let datasets = [OSWORLD_G, SCREENSPOT_PRO];

    let groups = [DEFAULT_VARIANT_KEY, UI_VENUS_VARIANT_KEY]
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let values = datasets
                .iter()
                .map(|dataset| ablations.get(*variant).and_then(|scores| scores.get(*dataset)).copied())
                .collect();
            BarGroup::new(*variant, values, series_color(index))
        })
        .collect();

    let mut chart = BarChart::new(
        "63k: UI Venus parameters vs default",
        "Accuracy",
        datasets.iter().map(|dataset| dataset.to_string()).collect(),
        groups,
    );
    chart.references = baseline_references(datasets);
    chart.decimals = 3;
    chart
}

fn plot_ui_venus_vs_default(ablations: &LabeledScores, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let chart = ui_venus_chart(ablations);
    if !has_values(&chart) {
        warn!("No UI-Venus ablation results; skipping ablation plot");
        return Ok(None);
    }

    let path = assets_dir.join("rl_ui_venus_vs_default_63k.png");
    create_bar_chart(&chart, &path)?;
    Ok(Some(path))
}

/// One panel per dataset, one line per experiment
///
/// Restricted to the headline datasets when any experiment reports them.
fn overlay_panels(experiments: &[(String, StepSeries)]) -> Vec<Panel> {
    let all: BTreeSet<&str> = experiments
        .iter()
        .flat_map(|(_, series)| series_datasets(series))
        .collect();
    let preferred: Vec<&str> = PREFERRED_DATASETS
        .iter()
        .copied()
        .filter(|dataset| all.contains(dataset))
        .collect();
    let datasets: Vec<&str> = if preferred.is_empty() {
        all.into_iter().collect()
    } else {
        preferred
    };

    datasets
        .into_iter()
        .map(|dataset| {
            let mut chart = LineChart::new(dataset, "Global step", "Accuracy");
            chart.series = experiments
                .iter()
                .enumerate()
                .map(|(index, (label, series))| {
                    LineSeriesSpec::new(
                        label.as_str(),
                        dataset_points(series, dataset),
                        series_color(index),
                    )
                })
                .collect();
            chart.references = sft_baseline(dataset)
                .map(|value| vec![ReferenceLine::new("SFT baseline", value, GRAY)])
                .unwrap_or_default();
            Panel::Line(chart)
        })
        .collect()
}

fn plot_overlay(
    experiments: Vec<(String, PathBuf)>,
    title: &str,
    file_name: &str,
    assets_dir: &Path,
) -> Result<Option<PathBuf>> {
    let collected: Vec<(String, StepSeries)> = experiments
        .into_iter()
        .map(|(label, dir)| (label, collect_step_series(&dir)))
        .filter(|(_, series)| !series.is_empty())
        .collect();

    if collected.is_empty() {
        warn!("No per-step results for '{}'; skipping overlay", title);
        return Ok(None);
    }

    let path = assets_dir.join(file_name);
    create_panel_figure(&overlay_panels(&collected), title, &path)?;
    Ok(Some(path))
}

fn plot_coldstart_overlay(results_root: &Path, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let experiments = baseline_coldstart_dirs(results_root)?
        .into_iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            let label = budget_label(name).unwrap_or_else(|| name.to_string());
            (label, dir)
        })
        .collect();

    plot_overlay(
        experiments,
        "Coldstart: full trajectories across SFT budgets",
        "rl_coldstart_scaling_overlay.png",
        assets_dir,
    )
}

fn plot_temperature_overlay(results_root: &Path, assets_dir: &Path) -> Result<Option<PathBuf>> {
    let experiments = temperature_dirs(results_root)?
        .into_iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            (temperature_label(name).to_string(), dir)
        })
        .collect();

    plot_overlay(
        experiments,
        "10k temperature ablations: full trajectories",
        "rl_temp_ablations_10k_scaling.png",
        assets_dir,
    )
}

fn plot_ui_venus_overlay(results_root: &Path, assets_dir: &Path) -> Result<Option<PathBuf>> {
    plot_overlay(
        ui_venus_dirs(results_root)?,
        "63k UI Venus vs default: full trajectories",
        "rl_ui_venus_vs_default_63k_scaling.png",
        assets_dir,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::data_structures::Scores;
    use crate::common::plots::{validate_bar_chart, validate_line_chart};
    use std::fs;
    use tempfile::TempDir;

    fn write_eval(step_dir: &Path, dataset: &str, accuracy: f64) {
        fs::create_dir_all(step_dir).unwrap();
        fs::write(
            step_dir.join(format!("grounding_eval_{}_huggingface_1.json", dataset)),
            format!(r#"{{"accuracy": {}}}"#, accuracy),
        )
        .unwrap();
    }

    fn scores(osworld: f64, sspro: f64) -> Scores {
        Scores::from([
            (OSWORLD_G.to_string(), osworld),
            (SCREENSPOT_PRO.to_string(), sspro),
        ])
    }

    fn sample_coldstart() -> LabeledScores {
        LabeledScores::from([
            ("10k".to_string(), scores(0.63, 0.50)),
            ("1k".to_string(), scores(0.60, 0.48)),
            ("3.3k".to_string(), scores(0.62, 0.49)),
            ("all".to_string(), scores(0.64, 0.51)),
        ])
    }

    #[test]
    fn test_collect_per_step() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let run = root.join("grpo-coldstart-1k-on-mix");
        write_eval(&run.join("global_step_10"), "osworld-g-eval-refined", 0.6);
        write_eval(&run.join("global_step_20"), "osworld-g-eval-refined", 0.62);
        fs::create_dir_all(root.join("grpo-coldstart-2k-on-mix/global_step_10")).unwrap();
        write_eval(&root.join("other-run/global_step_10"), "osworld-g-eval-refined", 0.1);

        let per_step = collect_per_step(root).unwrap();
        assert_eq!(per_step.len(), 1);
        assert_eq!(per_step["grpo-coldstart-1k-on-mix"].len(), 2);
    }

    #[test]
    fn test_write_summary_files() {
        let temp_dir = TempDir::new().unwrap();
        let summary = ColdstartSummary {
            coldstart: sample_coldstart(),
            ablations: AblationSummary {
                temperature_10k: LabeledScores::from([(
                    "temp_1.0".to_string(),
                    scores(0.64, 0.51),
                )]),
                ui_venus_like_63k: LabeledScores::new(),
            },
        };

        let paths = write_summary_files(&summary, temp_dir.path()).unwrap();
        assert_eq!(paths.len(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(json["coldstart"]["3.3k"]["OSWorld-G"], 0.62);
        assert_eq!(
            json["ablations"]["temperature_10k"]["temp_1.0"]["ScreenSpot-Pro"],
            0.51
        );
        assert!(json["ablations"]["ui_venus_like_63k"]
            .as_object()
            .unwrap()
            .is_empty());

        let csv = fs::read_to_string(&paths[1]).unwrap();
        let budgets: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(budgets, vec!["1k", "3.3k", "10k", "all"]);
    }

    #[test]
    fn test_coldstart_performance_chart_skips_unparseable_budgets() {
        let chart = coldstart_performance_chart(&sample_coldstart()).unwrap();

        assert_eq!(chart.series.len(), 2);
        let xs: Vec<f64> = chart.series[0].points.iter().map(|(x, _)| *x).collect();
        assert_eq!(xs, vec![1.0, 3.3, 10.0]);
        assert_eq!(chart.references.len(), 2);
        assert!(validate_line_chart(&chart).is_ok());

        assert!(coldstart_performance_chart(&LabeledScores::new()).is_none());
    }

    #[test]
    fn test_side_by_side_panels() {
        let panels = coldstart_side_by_side_panels(&sample_coldstart());
        assert_eq!(panels.len(), 2);

        let Panel::Line(chart) = &panels[0] else {
            panic!("expected a line panel");
        };
        assert_eq!(chart.title, OSWORLD_G);
        assert_eq!(
            chart.x_categories.as_deref().unwrap(),
            ["1k", "3.3k", "10k", "all"]
        );
        assert_eq!(chart.series[0].points[3], (3.0, 0.64));
    }

    #[test]
    fn test_ablation_charts() {
        let temperatures = LabeledScores::from([
            ("temp_0.85".to_string(), scores(0.63, 0.50)),
            ("temp_0.65".to_string(), Scores::new()),
        ]);
        let chart = temperature_ablation_chart(&temperatures);
        assert_eq!(chart.groups[0].values, vec![None, Some(0.63), None]);
        assert!(has_values(&chart));
        assert!(validate_bar_chart(&chart).is_ok());

        let empty = temperature_ablation_chart(&LabeledScores::new());
        assert!(!has_values(&empty));

        let venus = ui_venus_chart(&LabeledScores::from([(
            "ui_venus_like".to_string(),
            scores(0.65, 0.53),
        )]));
        assert_eq!(venus.groups[0].values, vec![None, None]);
        assert_eq!(venus.groups[1].values, vec![Some(0.65), Some(0.53)]);
    }

    #[test]
    fn test_overlay_panels_prefer_headline_datasets() {
        let series = StepSeries::from([
            (
                10,
                Scores::from([
                    (OSWORLD_G.to_string(), 0.6),
                    ("screenspot-v2".to_string(), 0.9),
                ]),
            ),
            (20, Scores::from([(OSWORLD_G.to_string(), 0.62)])),
        ]);
        let panels = overlay_panels(&[("1k".to_string(), series.clone())]);
        assert_eq!(panels.len(), 1);

        let other = StepSeries::from([(10, Scores::from([("screenspot-v2".to_string(), 0.9)]))]);
        let panels = overlay_panels(&[("1k".to_string(), other)]);
        let Panel::Line(chart) = &panels[0] else {
            panic!("expected a line panel");
        };
        assert_eq!(chart.title, "screenspot-v2");
        assert!(chart.references.is_empty());
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn test_generate_coldstart_report() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("results");
        let assets = temp_dir.path().join("assets");

        for (name, osworld) in [
            ("grpo-coldstart-1k-on-mix", 0.60),
            ("grpo-coldstart-10k-on-mix", 0.63),
            ("grpo-coldstart-10k-on-mix_temp_1_0", 0.64),
            ("grpo-coldstart-63k-on-mix", 0.66),
        ] {
            let step = root.join(name).join("global_step_10");
            write_eval(&step, "osworld-g-eval-refined", osworld);
            write_eval(&step, "screenspot-pro-eval", 0.5);
        }

        let outputs = generate_coldstart_report(&root, &assets).unwrap();
        assert!(outputs.iter().all(|path| path.exists()));
        assert!(assets.join("rl_coldstart_metrics.csv").exists());
        assert!(assets.join("scaling").is_dir());
    }
}
