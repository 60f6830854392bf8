//! DAPO training logs: accuracy over training steps per model run

use crate::analysis::constants::{GTA1_OSWORLD_BASELINE, GTA1_OSWORLD_REFINED_BASELINE};
use crate::common::data_structures::TrendStats;
use crate::common::plots::{
    create_line_chart, LineChart, LineSeriesSpec, PlotError, ReferenceLine, DARK_RED, GRAY, TAB10,
};
use crate::common::tables::{format_table, TrendRow};
use crate::parsing::markdown::{load_dapo_markdown, DapoBenchmark, DapoLog, DapoPoint};
use log::info;
use plotters::style::RGBColor;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DapoError {
    #[error("Failed to read {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("No benchmark tables found in {0}")]
    NoData(String),

    #[error("Failed to write file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to generate plot: {0}")]
    Plot(#[from] PlotError),
}

type Result<T> = core::result::Result<T, DapoError>;

const RED: RGBColor = RGBColor(0xd6, 0x27, 0x28);

/// Known run directories, their display names and colors
const KNOWN_RUNS: [(&str, &str, RGBColor); 3] = [
    (
        "grpo-7b-stage-1-on-103k-filtered-data-dynamic-sampling-clip-high-no-pixmo-uground-seeclick",
        "SFT-7B",
        TAB10[0],
    ),
    (
        "grpo-soup-7b-stage-1-on-103k-filtered-data-dynamic-sampling-clip-high-no-pixmo-uground-seeclick-no-system-prompt",
        "Soup-7B",
        TAB10[1],
    ),
    (
        "uitars-7b-grpo-stage-1-on-103k-filtered-data-dynamic-sampling-clip-high-no-pixmo-uground-seeclick-4nodes",
        "UITARS-7B",
        TAB10[2],
    ),
];

/// Per-benchmark plot settings
struct BenchmarkPlot {
    benchmark: DapoBenchmark,
    title: &'static str,
    label: &'static str,
    gta1_baseline: Option<f64>,
    y_range: (f64, f64),
}

const BENCHMARK_PLOTS: [BenchmarkPlot; 3] = [
    BenchmarkPlot {
        benchmark: DapoBenchmark::OsWorldG,
        title: "OSWorld-G-Eval Benchmark",
        label: "OSWorld-G-Eval",
        gta1_baseline: Some(GTA1_OSWORLD_BASELINE),
        y_range: (0.50, 0.65),
    },
    BenchmarkPlot {
        benchmark: DapoBenchmark::OsWorldGRefined,
        title: "OSWorld-G-Eval-Refined Benchmark",
        label: "OSWorld-G-Eval-Refined",
        gta1_baseline: Some(GTA1_OSWORLD_REFINED_BASELINE),
        y_range: (0.60, 0.75),
    },
    BenchmarkPlot {
        benchmark: DapoBenchmark::ScreenSpotPro,
        title: "ScreenSpot-Pro-Eval Benchmark",
        label: "ScreenSpot-Pro-Eval",
        gta1_baseline: None,
        y_range: (0.45, 0.55),
    },
];

/// Display name of a run; unknown runs keep their directory name
pub fn display_name(run: &str) -> String {
    KNOWN_RUNS
        .iter()
        .find(|(name, _, _)| *name == run)
        .map(|(_, display, _)| display.to_string())
        .unwrap_or_else(|| run.to_string())
}

/// Short display name: known runs by name, others by their first word in capitals
pub fn short_name(run: &str) -> String {
    KNOWN_RUNS
        .iter()
        .find(|(name, _, _)| *name == run)
        .map(|(_, display, _)| display.to_string())
        .unwrap_or_else(|| run.split('-').next().unwrap_or(run).to_uppercase())
}

fn run_color(run: &str) -> RGBColor {
    KNOWN_RUNS
        .iter()
        .find(|(name, _, _)| *name == run)
        .map_or(GRAY, |(_, _, color)| *color)
}

/// Points with a positive accuracy as `(step, accuracy)`
fn positive_points(points: &[DapoPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|point| point.accuracy > 0.0)
        .map(|point| (point.step as f64, point.accuracy))
        .collect()
}

/// Output file name stem: spaces and dashes become underscores
fn safe_name(name: &str) -> String {
    name.replace([' ', '-'], "_")
}

/// Generates DAPO plots and the trend report from a markdown log
///
/// # Arguments
/// * `input` - Markdown file with `### <run> — <benchmark>` tables
/// * `output_dir` - Directory where plots and `dapo-trends.txt` are written
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Paths of every file written
/// * `Err(DapoError)` - If the log is unreadable, empty, or output failed
pub fn generate_dapo_report(input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let log = load_dapo_markdown(input).map_err(|source| DapoError::Input {
        path: input.display().to_string(),
        source,
    })?;
    if log.is_empty() {
        return Err(DapoError::NoData(input.display().to_string()));
    }

    fs::create_dir_all(output_dir)?;
    let mut outputs = Vec::new();

    for plot in &BENCHMARK_PLOTS {
        if let Some(chart) = benchmark_chart(&log, plot) {
            let path = output_dir.join(format!(
                "{}_performance.png",
                safe_name(plot.benchmark.key())
            ));
            create_line_chart(&chart, &path)?;
            info!("Plot saved: {}", path.display());
            outputs.push(path);
        }
    }

    for run in log.keys() {
        if let Some(chart) = model_chart(&log, run) {
            let path = output_dir.join(format!("{}_performance.png", safe_name(run)));
            create_line_chart(&chart, &path)?;
            info!("Individual plot saved for {}", short_name(run));
            outputs.push(path);
        }
    }

    let report = format_trend_report(&log);
    println!("{}", report);

    let report_path = output_dir.join("dapo-trends.txt");
    fs::write(&report_path, report)?;
    outputs.push(report_path);

    Ok(outputs)
}

/// Every run's curve on one benchmark
fn benchmark_chart(log: &DapoLog, plot: &BenchmarkPlot) -> Option<LineChart> {
    let mut chart = LineChart::new(plot.title, "Training Step", "Accuracy");
    chart.y_range = Some(plot.y_range.0..plot.y_range.1);

    for (run, benchmarks) in log {
        let Some(points) = benchmarks.get(&plot.benchmark).map(|p| positive_points(p)) else {
            continue;
        };
        if points.is_empty() {
            continue;
        }
        chart.series.push(
            LineSeriesSpec::new(display_name(run), points, run_color(run)).with_best_highlight(),
        );
    }

    if chart.series.is_empty() {
        return None;
    }

    if let Some(baseline) = plot.gta1_baseline {
        chart
            .references
            .push(ReferenceLine::new("GTA1-7B Baseline", baseline, RED));
    }
    Some(chart)
}

/// One run's curves on every benchmark
fn model_chart(log: &DapoLog, run: &str) -> Option<LineChart> {
    let benchmarks = log.get(run)?;
    let mut chart = LineChart::new(
        format!("{} Model Performance", short_name(run)),
        "Training Step",
        "Accuracy",
    );

    for (index, plot) in BENCHMARK_PLOTS.iter().enumerate() {
        let Some(points) = benchmarks.get(&plot.benchmark).map(|p| positive_points(p)) else {
            continue;
        };
        if !points.is_empty() {
            chart.series.push(
                LineSeriesSpec::new(plot.label, points, TAB10[index]).with_best_highlight(),
            );
        }
    }

    if chart.series.is_empty() {
        return None;
    }

    chart.references = vec![
        ReferenceLine::new("GTA1-7B Baseline (OSWorld)", GTA1_OSWORLD_BASELINE, RED),
        ReferenceLine::new(
            "GTA1-7B Baseline (Refined)",
            GTA1_OSWORLD_REFINED_BASELINE,
            DARK_RED,
        ),
    ];
    Some(chart)
}

/// Initial, final, best and worst accuracy of every run and benchmark
pub fn trend_rows(log: &DapoLog) -> Vec<TrendRow> {
    let mut rows = Vec::new();
    for (run, benchmarks) in log {
        for benchmark in DapoBenchmark::ALL {
            let Some(points) = benchmarks.get(&benchmark) else {
                continue;
            };
            let steps: Vec<(u64, f64)> = points
                .iter()
                .filter(|point| point.accuracy > 0.0)
                .map(|point| (point.step, point.accuracy))
                .collect();
            if let Some(stats) = TrendStats::from_points(&steps) {
                rows.push(TrendRow::new(&short_name(run), benchmark.key(), &stats));
            }
        }
    }
    rows
}

/// The trend table under a report heading
pub fn format_trend_report(log: &DapoLog) -> String {
    format!(
        "{}\nDAPO PERFORMANCE ANALYSIS\n{}\n\n{}",
        "=".repeat(60),
        "=".repeat(60),
        format_table(&trend_rows(log), Some("Training Trends"))
    )
}
