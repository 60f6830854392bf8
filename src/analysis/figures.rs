//! Hard-coded comparison figures from the research journal
//!
//! Every figure is registered by name in [`FIGURES`] together with the file
//! it is written to. The numbers are the published results of each
//! experiment and are not read from disk.

use crate::analysis::constants::{
    JOURNAL_NEW_PIPELINE_FINAL, JOURNAL_OLD_PIPELINE_FINAL, JOURNAL_SFT_BASELINE,
};
use crate::common::data_structures::BenchmarkPair;
use crate::common::plots::{
    create_bar_chart, create_line_chart, create_panel_figure, validate_bar_chart,
    validate_line_chart, BarChart, BarGroup, LineChart, LineSeriesSpec, Panel, PlotError,
    ReferenceLine, TAB10,
};
use crate::common::tables::format_table;
use log::info;
use plotters::style::RGBColor;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FigureError {
    #[error("Unknown figure '{0}', use --list to see the available figures")]
    UnknownFigure(String),

    #[error("Failed to generate plot: {0}")]
    Plot(#[from] PlotError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

type Result<T> = core::result::Result<T, FigureError>;

const REFERENCE_BLUE: RGBColor = RGBColor(0x2e, 0x86, 0xab);
const LIGHT_BLUE: RGBColor = RGBColor(0x5d, 0xad, 0xe2);
const PALE_BLUE: RGBColor = RGBColor(0x85, 0xc1, 0xe9);
const OURS_RED: RGBColor = RGBColor(0xf2, 0x42, 0x36);
const INDIAN_RED: RGBColor = RGBColor(0xcd, 0x5c, 0x5c);
const DARK_RED: RGBColor = RGBColor(0x8b, 0x00, 0x00);
const DARKEST_RED: RGBColor = RGBColor(0x4b, 0x00, 0x00);
const RL_GREEN: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const RL_DARK_GREEN: RGBColor = RGBColor(0x27, 0xae, 0x60);
const RL_TEAL: RGBColor = RGBColor(0x1a, 0xbc, 0x9c);
const SS_PRO_COLOR: RGBColor = RGBColor(0x2e, 0x86, 0xab);
const SS_V2_COLOR: RGBColor = RGBColor(0xf2, 0x42, 0x36);
const SHOWDOWN_COLOR: RGBColor = RGBColor(0xa2, 0x3b, 0x72);
const OSW_COLOR: RGBColor = RGBColor(0xcd, 0x5c, 0x5c);
const RESOLUTION_COLOR: RGBColor = RGBColor(0x4c, 0x8c, 0xbf);
const OVERALL_RED: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);

/// Reds for successive stages of our model, darker as training improves
const STAGE_REDS: [RGBColor; 4] = [
    INDIAN_RED,
    RGBColor(0xa5, 0x2a, 0x2a),
    DARK_RED,
    DARKEST_RED,
];

const SS_PRO_AXIS: &str = "ScreenSpot Pro Accuracy (%)";
const ACCURACY_AXIS: &str = "Accuracy (%)";

/// Published ScreenSpot Pro results of comparable 7B models
const SS_PRO_LEADERBOARD: [(&str, f64); 6] = [
    ("GTA1-7B", 50.1),
    ("SE-GUI-7B", 47.3),
    ("UI-Venus-7B", 50.1),
    ("Phi-Ground-7B", 43.2),
    ("UI-TARS 1.5 7B", 42.0),
    ("UI-TARS 7B", 35.7),
];

/// SFT-7B trained at 4MP with the default prompt
const SFT_4MP: f64 = 36.12;
/// SFT-7B on 10k samples with easy and hard difficulty filtering
const SFT_FILTERED_10K: f64 = 45.22;

/// A rendered figure: one chart, or several panels under a shared title
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: Option<String>,
    pub panels: Vec<Panel>,
    /// Text table written next to the image and printed
    pub table: Option<String>,
}

impl Figure {
    fn single(panel: Panel) -> Self {
        Self {
            title: None,
            panels: vec![panel],
            table: None,
        }
    }

    fn with_panels(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        Self {
            title: Some(title.into()),
            panels,
            table: None,
        }
    }

    fn with_table(mut self, table: String) -> Self {
        self.table = Some(table);
        self
    }

    /// Checks every panel without rendering
    pub fn validate(&self) -> Result<()> {
        if self.panels.is_empty() {
            return Err(PlotError::InvalidData("Figure has no panels".to_string()).into());
        }
        for panel in &self.panels {
            match panel {
                Panel::Line(chart) => validate_line_chart(chart)?,
                Panel::Bar(chart) => validate_bar_chart(chart)?,
            }
        }
        Ok(())
    }

    /// Renders the figure as a PNG file
    pub fn render(&self, output_path: &Path) -> Result<()> {
        match (&self.title, self.panels.as_slice()) {
            (None, [Panel::Line(chart)]) => create_line_chart(chart, output_path)?,
            (None, [Panel::Bar(chart)]) => create_bar_chart(chart, output_path)?,
            (title, panels) => {
                create_panel_figure(panels, title.as_deref().unwrap_or_default(), output_path)?
            }
        }
        Ok(())
    }
}

/// A named entry of the figure registry
pub struct FigureSpec {
    pub name: &'static str,
    pub file_name: &'static str,
    pub description: &'static str,
    pub build: fn() -> Figure,
}

/// Every figure the `figures` command can produce
pub const FIGURES: &[FigureSpec] = &[
    FigureSpec {
        name: "screenspot_pro_comparison",
        file_name: "screenspot_pro_4mp_training_resolution.png",
        description: "4MP training resolution against published 7B models",
        build: screenspot_pro_comparison,
    },
    FigureSpec {
        name: "screenspot_pro_prompt_boost",
        file_name: "screenspot_pro_4mp_with_prompt_boost.png",
        description: "4MP training followed by the better training prompt",
        build: screenspot_pro_prompt_boost,
    },
    FigureSpec {
        name: "screenspot_pro_filtering_alternatives",
        file_name: "screenspot_pro_filtering_alternatives.png",
        description: "Alternative model difficulty filtering approaches",
        build: screenspot_pro_filtering_alternatives,
    },
    FigureSpec {
        name: "screenspot_pro_filtering_with_pro_data",
        file_name: "screenspot_pro_filtering_with_pro_data.png",
        description: "Easy and hard filtering followed by in-house pro app data",
        build: screenspot_pro_filtering_with_pro_data,
    },
    FigureSpec {
        name: "screenspot_pro_instruction_rewriting",
        file_name: "screenspot_pro_instruction_rewriting_negative.png",
        description: "Accuracy lost to LLM and image-aware instruction rewriting",
        build: screenspot_pro_instruction_rewriting,
    },
    FigureSpec {
        name: "screenspot_pro_data_scaling",
        file_name: "screenspot_pro_data_scaling.png",
        description: "ScreenSpot Pro accuracy from 10k to 114k SFT samples",
        build: screenspot_pro_data_scaling,
    },
    FigureSpec {
        name: "os_world_g_data_scaling",
        file_name: "os_world_g_data_scaling.png",
        description: "OS-World-G (refined) accuracy from 10k to 114k SFT samples",
        build: os_world_g_data_scaling,
    },
    FigureSpec {
        name: "eval_fix",
        file_name: "sft_80k_eval_fix_comprehensive.png",
        description: "SFT-80k before and after the evaluation fix among all models",
        build: eval_fix,
    },
    FigureSpec {
        name: "eval_fix_comparison",
        file_name: "sft_80k_eval_fix_comparison.png",
        description: "SFT-80k before and after the evaluation fix side by side",
        build: eval_fix_comparison,
    },
    FigureSpec {
        name: "model_combo",
        file_name: "model_combo_plot.png",
        description: "Best SFT against pro app icon fine-tuning and weight averaging",
        build: model_combo,
    },
    FigureSpec {
        name: "data_scaling_dual",
        file_name: "DataScaling.png",
        description: "ScreenSpot Pro and ScreenSpot V2 accuracy over training samples",
        build: data_scaling_dual,
    },
    FigureSpec {
        name: "resolution_aspect",
        file_name: "accuracy_by_resolution_and_aspect.png",
        description: "ScreenSpot Pro accuracy by image size and aspect ratio",
        build: resolution_aspect,
    },
    FigureSpec {
        name: "multi_dataset_performance",
        file_name: "performance_comparison_with_table.png",
        description: "ScreenSpot Pro, ScreenSpot V2 and Showdown Clicks per model",
        build: multi_dataset_performance,
    },
    FigureSpec {
        name: "rl_ablations",
        file_name: "rl_ablations.png",
        description: "RL temperature and zero-reward data pool ablations",
        build: rl_ablations,
    },
    FigureSpec {
        name: "rl_pipeline_improvements",
        file_name: "rl_pipeline_improvements.png",
        description: "Initial and improved RL pipelines against baselines",
        build: rl_pipeline_improvements,
    },
    FigureSpec {
        name: "progress_sspro_osworld",
        file_name: "progress_sspro_osworld.png",
        description: "SFT-7B and Soup progress with RL on both benchmarks",
        build: progress_sspro_osworld,
    },
    FigureSpec {
        name: "progress_sspro_osworld_nosoup",
        file_name: "progress_sspro_osworld_nosoup.png",
        description: "SFT-7B progress with RL on both benchmarks, without Soup",
        build: progress_sspro_osworld_nosoup,
    },
    FigureSpec {
        name: "sspro_progress_summary",
        file_name: "sspro_progress_summary.png",
        description: "Cumulative ScreenSpot Pro gains of each data improvement",
        build: sspro_progress_summary,
    },
];

/// Looks up a registered figure by name
pub fn find_figure(name: &str) -> Option<&'static FigureSpec> {
    FIGURES.iter().find(|entry| entry.name == name)
}

/// Renders all registered figures, or only the one named by `only`
///
/// # Arguments
/// * `output_dir` - Directory the figures are written to
/// * `only` - Name of a single figure to render
///
/// # Returns
/// Paths of the written images and tables
pub fn generate_figures(output_dir: &Path, only: Option<&str>) -> Result<Vec<PathBuf>> {
    let selected: Vec<&FigureSpec> = match only {
        Some(name) => {
            vec![find_figure(name).ok_or_else(|| FigureError::UnknownFigure(name.to_string()))?]
        }
        None => FIGURES.iter().collect(),
    };

    fs::create_dir_all(output_dir).map_err(|source| FigureError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for entry in selected {
        let figure = (entry.build)();
        let path = output_dir.join(entry.file_name);
        figure.render(&path)?;
        info!("Saved {} to {}", entry.name, path.display());
        written.push(path.clone());

        if let Some(table) = &figure.table {
            let table_path = path.with_extension("txt");
            fs::write(&table_path, format!("{table}\n")).map_err(|source| FigureError::Io {
                path: table_path.clone(),
                source,
            })?;
            println!("{table}");
            written.push(table_path);
        }
    }

    Ok(written)
}

#[derive(Debug, Tabled)]
struct FigureRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "File")]
    file: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
}

/// Table of every registered figure, as printed by `figures --list`
pub fn format_registry() -> String {
    let rows: Vec<FigureRow> = FIGURES
        .iter()
        .map(|entry| FigureRow {
            name: entry.name,
            file: entry.file_name,
            description: entry.description,
        })
        .collect();
    format_table(&rows, Some("Available figures"))
}

/// One bar of a leaderboard
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    label: String,
    value: f64,
    color: RGBColor,
    note: Option<String>,
}

impl Entry {
    fn new(label: &str, value: f64, color: RGBColor) -> Self {
        Self {
            label: label.to_string(),
            value,
            color,
            note: None,
        }
    }

    fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }
}

fn delta_note(from: f64, to: f64) -> String {
    format!("{:+.2}pp", to - from)
}

/// Orders references and our anchor model by accuracy, then places our
/// stages right after the anchor
///
/// Without an anchor the stages follow the sorted references.
/// Each stage is annotated with its change relative to the anchor.
fn leaderboard(
    references: &[(&str, f64)],
    anchor: Option<(&str, f64)>,
    stages: &[(&str, f64)],
) -> Vec<Entry> {
    let mut entries: Vec<Entry> = references
        .iter()
        .map(|&(label, value)| Entry::new(label, value, REFERENCE_BLUE))
        .collect();
    if let Some((label, value)) = anchor {
        entries.push(Entry::new(label, value, OURS_RED));
    }
    entries.sort_by(|a, b| a.value.total_cmp(&b.value));

    let insert_at = match anchor {
        Some((label, _)) => entries
            .iter()
            .position(|entry| entry.label == label)
            .map_or(entries.len(), |index| index + 1),
        None => entries.len(),
    };

    let stage_entries = stages.iter().enumerate().map(|(index, &(label, value))| {
        let color = STAGE_REDS[index.min(STAGE_REDS.len() - 1)];
        let entry = Entry::new(label, value, color);
        match anchor {
            Some((_, base)) => entry.with_note(delta_note(base, value)),
            None => entry,
        }
    });
    let tail = entries.split_off(insert_at);
    entries.extend(stage_entries);
    entries.extend(tail);
    entries
}

fn leaderboard_chart(
    title: &str,
    y_label: &str,
    y_range: Range<f64>,
    entries: &[Entry],
) -> BarChart {
    let categories = entries.iter().map(|entry| entry.label.clone()).collect();
    let values: Vec<f64> = entries.iter().map(|entry| entry.value).collect();
    let colors = entries.iter().map(|entry| entry.color).collect();

    let mut chart = BarChart::new(
        title,
        y_label,
        categories,
        vec![BarGroup::from_values(&values, REFERENCE_BLUE).with_bar_colors(colors)],
    );
    chart.y_range = Some(y_range);
    chart.value_suffix = "%".to_string();
    if entries.iter().any(|entry| entry.note.is_some()) {
        chart.annotations = entries.iter().map(|entry| entry.note.clone()).collect();
    }
    chart
}

fn percent_labels(values: &[f64], decimals: usize) -> Vec<String> {
    values
        .iter()
        .map(|value| format!("{value:.decimals$}%"))
        .collect()
}

fn screenspot_pro_comparison() -> Figure {
    let entries = leaderboard(&SS_PRO_LEADERBOARD, Some(("SFT-7B", SFT_4MP)), &[]);
    Figure::single(Panel::Bar(leaderboard_chart(
        "Increase Training Resolution to 4MP: ScreenSpot Pro Performance",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn screenspot_pro_prompt_boost() -> Figure {
    let entries = leaderboard(
        &SS_PRO_LEADERBOARD,
        Some(("SFT-7B", SFT_4MP)),
        &[("SFT-7B + Better Prompt", 39.03)],
    );
    Figure::single(Panel::Bar(leaderboard_chart(
        "4MP Training + Better Prompt: ScreenSpot Pro Performance",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn screenspot_pro_filtering_alternatives() -> Figure {
    let approaches = [
        ("SFT-7B (No Filtering)", SFT_4MP),
        ("SFT-7B (Qwen + None)", 39.78),
        ("SFT-7B (SE-GUI-3B + GTA1)", 41.62),
        ("SFT-7B (Qwen + GTA1|SE-GUI)", 42.06),
        ("SFT-7B (Qwen + GTA1|UI-Venus)", 44.46),
        ("SFT-7B (Qwen + GTA1)", SFT_FILTERED_10K),
    ];
    let mut entries = leaderboard(&SS_PRO_LEADERBOARD, None, &[]);
    let first = entries.len();
    entries.extend(leaderboard(&[], None, &approaches));
    // No filtering is the baseline the other approaches are measured against
    entries[first].color = OURS_RED;
    for entry in &mut entries[first + 1..] {
        entry.note = Some(delta_note(SFT_4MP, entry.value));
    }

    Figure::single(Panel::Bar(leaderboard_chart(
        "Alternative Model Difficulty Filtering Approaches: ScreenSpot Pro",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn screenspot_pro_filtering_with_pro_data() -> Figure {
    let entries = leaderboard(
        &SS_PRO_LEADERBOARD,
        Some(("SFT-7B", SFT_4MP)),
        &[
            ("SFT-7B + Easy Filter", 39.78),
            ("SFT-7B + Easy+Hard Filter", SFT_FILTERED_10K),
            ("SFT-7B + Pro App Data", 46.11),
        ],
    );
    Figure::single(Panel::Bar(leaderboard_chart(
        "Impact of Filtering + Pro App Data: ScreenSpot Pro Performance",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn screenspot_pro_instruction_rewriting() -> Figure {
    let entries = leaderboard(
        &SS_PRO_LEADERBOARD,
        Some(("SFT-7B", SFT_FILTERED_10K)),
        &[
            ("SFT-7B + LLM Rewriting", 42.25),
            ("SFT-7B + Image-Aware", 39.27),
        ],
    );
    Figure::single(Panel::Bar(leaderboard_chart(
        "Impact of Instruction Rewriting: ScreenSpot Pro Performance",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn screenspot_pro_data_scaling() -> Figure {
    let references: Vec<(&str, f64)> = SS_PRO_LEADERBOARD
        .iter()
        .copied()
        .filter(|(label, _)| *label != "UI-Venus-7B")
        .collect();
    let entries = leaderboard(
        &references,
        Some(("SFT-7B 10k samples", SFT_FILTERED_10K)),
        &[
            ("SFT-7B 20k samples", 46.55),
            ("SFT-7B 35k samples", 47.18),
            ("SFT-7B 80k samples", 49.65),
            ("SFT-7B 114k samples (interpolated)", 50.41),
        ],
    );
    Figure::single(Panel::Bar(leaderboard_chart(
        "Impact of Data Scaling: ScreenSpot Pro Performance",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn os_world_g_data_scaling() -> Figure {
    let sft = [
        ("SFT-7B 10k samples", 51.0),
        ("SFT-7B 20k samples", 57.2),
        ("SFT-7B 35k samples", 56.2),
        ("SFT-7B 80k samples", 57.6),
        ("SFT-7B 114k samples", 59.5),
        ("SFT-7B 114k samples (interpolated)", 60.1),
    ];

    // UI-Venus on the left, our runs in data order, stronger baselines on the right
    let mut entries = vec![Entry::new("UI-Venus-7B", 58.8, REFERENCE_BLUE)];
    entries.extend(sft.iter().enumerate().map(|(index, &(label, value))| {
        let color = if index == 0 {
            OURS_RED
        } else {
            STAGE_REDS[(index - 1).min(STAGE_REDS.len() - 1)]
        };
        let entry = Entry::new(label, value, color);
        if index == 0 {
            entry
        } else {
            entry.with_note(delta_note(sft[0].1, value))
        }
    }));
    entries.extend([
        Entry::new("OpenCUA-7B", 55.3, REFERENCE_BLUE),
        Entry::new("GTA1-32B", 61.9, REFERENCE_BLUE),
        Entry::new("GTA1-7B", 67.7, REFERENCE_BLUE),
    ]);

    Figure::single(Panel::Bar(leaderboard_chart(
        "Impact of Data Scaling: OS-World-G (refined) Performance",
        "OS-World-G (refined) Accuracy (%)",
        50.0..70.0,
        &entries,
    )))
}

const SFT_80K_BEFORE_FIX: f64 = 49.0;
const SFT_80K_AFTER_FIX: f64 = 49.65;

fn eval_fix() -> Figure {
    let mut entries: Vec<Entry> = [
        ("GTA1-7B", 50.1),
        ("SE-GUI-7B", 47.3),
        ("Phi-Ground-7B", 43.2),
        ("UI-TARS 1.5 7B", 42.0),
        ("UI-TARS 7B", 35.7),
    ]
    .iter()
    .map(|&(label, value)| Entry::new(label, value, REFERENCE_BLUE))
    .chain(
        [
            ("SFT-7B (10k)", SFT_FILTERED_10K),
            ("SFT-7B (20k)", 46.55),
            ("SFT-7B (35k)", 47.18),
        ]
        .iter()
        .map(|&(label, value)| Entry::new(label, value, DARKEST_RED)),
    )
    .chain([
        Entry::new(
            "SFT-80k (Before Fix)",
            SFT_80K_BEFORE_FIX,
            RGBColor(0xff, 0x6b, 0x6b),
        ),
        Entry::new(
            "SFT-80k (After Fix)",
            SFT_80K_AFTER_FIX,
            RGBColor(0x2e, 0x8b, 0x57),
        )
        .with_note(delta_note(SFT_80K_BEFORE_FIX, SFT_80K_AFTER_FIX)),
    ])
    .collect();
    entries.sort_by(|a, b| a.value.total_cmp(&b.value));

    Figure::single(Panel::Bar(leaderboard_chart(
        "SFT-80k Evaluation Fix Impact: ScreenSpot Pro Performance vs All Models",
        SS_PRO_AXIS,
        30.0..55.0,
        &entries,
    )))
}

fn eval_fix_comparison() -> Figure {
    let panel = |title: &str, value: f64, color: RGBColor, note: Option<String>| {
        let mut chart = BarChart::new(
            title,
            SS_PRO_AXIS,
            vec!["SFT-80k".to_string()],
            vec![BarGroup::from_values(&[value], color)],
        );
        chart.y_range = Some(48.5..50.2);
        chart.value_suffix = "%".to_string();
        chart.annotations = vec![note];
        Panel::Bar(chart)
    };

    Figure::with_panels(
        "SFT-80k Evaluation Fix Impact Analysis: ScreenSpot Pro Performance",
        vec![
            panel("Before Eval Fix", SFT_80K_BEFORE_FIX, INDIAN_RED, None),
            panel(
                "After Eval Fix",
                SFT_80K_AFTER_FIX,
                DARKEST_RED,
                Some(format!(
                    "{} Improvement",
                    delta_note(SFT_80K_BEFORE_FIX, SFT_80K_AFTER_FIX)
                )),
            ),
        ],
    )
}

fn model_combo() -> Figure {
    let categories = ["Best SFT (SS Pro)", "Icon FT", "Weight Averaged"]
        .iter()
        .map(|label| label.to_string())
        .collect();
    let group = BarGroup::from_values(&[49.65, 49.08, 49.52], TAB10[0])
        .with_bar_colors(TAB10[..3].to_vec());

    let mut chart = BarChart::new(
        "SS Pro: Best vs Pro App Icon FT vs Weight Averaged",
        "SS Pro Accuracy (%)",
        categories,
        vec![group],
    );
    chart.y_range = Some(0.0..100.0);
    chart.value_suffix = "%".to_string();
    Figure::single(Panel::Bar(chart))
}

fn data_scaling_dual() -> Figure {
    const SCALES: [f64; 4] = [10.0, 20.0, 35.0, 80.0];
    let points = |values: [f64; 4]| -> Vec<(f64, f64)> { SCALES.iter().copied().zip(values).collect() };

    let mut ss_pro = LineChart::new("ScreenSpot Pro", "Training Samples (k)", SS_PRO_AXIS);
    ss_pro.series = vec![LineSeriesSpec::new(
        "ScreenSpot Pro",
        points([SFT_FILTERED_10K, 46.55, 47.18, 49.65]),
        SS_PRO_COLOR,
    )];
    ss_pro.y_range = Some(43.0..52.0);

    let mut ss_v2 = LineChart::new(
        "ScreenSpot V2",
        "Training Samples (k)",
        "ScreenSpot V2 Accuracy (%)",
    );
    ss_v2.series = vec![LineSeriesSpec::new(
        "ScreenSpot V2",
        points([91.05, 90.27, 90.66, 90.79]),
        SS_V2_COLOR,
    )];
    ss_v2.y_range = Some(88.0..93.0);

    Figure::with_panels(
        "Data Scaling of SFT-7B",
        vec![Panel::Line(ss_pro), Panel::Line(ss_v2)],
    )
}

/// Overall ScreenSpot Pro accuracy of the 20k model the breakdown was measured on
const RESOLUTION_OVERALL: f64 = 46.55;

fn resolution_panel(
    title: &str,
    x_label: &str,
    labels: &[&str],
    accuracy: &[f64],
    counts: &[u32],
) -> Panel {
    let mut chart = BarChart::new(
        title,
        ACCURACY_AXIS,
        labels.iter().map(|label| label.to_string()).collect(),
        vec![BarGroup::from_values(accuracy, RESOLUTION_COLOR)],
    );
    chart.x_label = x_label.to_string();
    chart.y_range = Some(0.0..82.0);
    chart.value_suffix = "%".to_string();
    chart.annotations = counts.iter().map(|n| Some(format!("n={n}"))).collect();
    chart.references = vec![ReferenceLine::new(
        format!("Overall Accuracy: {RESOLUTION_OVERALL:.1}%"),
        RESOLUTION_OVERALL,
        OVERALL_RED,
    )];
    Panel::Bar(chart)
}

fn resolution_aspect() -> Figure {
    Figure::with_panels(
        "Model Performance on ScreenSpotPro across Image Size and Aspect Ratio",
        vec![
            resolution_panel(
                "By Image Size",
                "Image Size (Megapixels)",
                &["2-3MP", "3-4MP", "4-5MP", "5-6MP", "6-8MP", ">8MP"],
                &[15.79, 54.49, 44.92, 67.78, 43.75, 32.19],
                &[19, 613, 236, 90, 272, 351],
            ),
            resolution_panel(
                "By Aspect Ratio",
                "Aspect Ratio",
                &["1.5", "1.6", "1.8", "3.6"],
                &[56.17, 57.14, 43.33, 39.67],
                &[308, 147, 884, 242],
            ),
        ],
    )
}

/// ScreenSpot V2 accuracy per platform and element type
#[derive(Debug, Clone, Copy)]
struct V2Subsets {
    desktop_text: f64,
    desktop_icon: f64,
    web_text: f64,
    web_icon: f64,
}

impl V2Subsets {
    /// Mean of the desktop mean and the web mean
    fn overall(&self) -> f64 {
        let desktop = (self.desktop_text + self.desktop_icon) / 2.0;
        let web = (self.web_text + self.web_icon) / 2.0;
        (desktop + web) / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelResults {
    name: &'static str,
    ss_pro: Option<f64>,
    ss_v2: Option<V2Subsets>,
    showdown: Option<f64>,
}

impl ModelResults {
    fn scores(&self) -> [Option<f64>; 3] {
        [
            self.ss_pro,
            self.ss_v2.as_ref().map(V2Subsets::overall),
            self.showdown,
        ]
    }

    /// Mean over the datasets the model was evaluated on, 0 when none
    fn mean(&self) -> f64 {
        let available: Vec<f64> = self.scores().into_iter().flatten().collect();
        if available.is_empty() {
            0.0
        } else {
            available.iter().sum::<f64>() / available.len() as f64
        }
    }
}

const MULTI_DATASET_MODELS: [ModelResults; 4] = [
    ModelResults {
        name: "UI-TARS 1.5 7B",
        ss_pro: Some(42.0),
        ss_v2: Some(V2Subsets {
            desktop_text: 92.2,
            desktop_icon: 81.5,
            web_text: 91.0,
            web_icon: 84.2,
        }),
        showdown: Some(67.2),
    },
    ModelResults {
        name: "Phi-Ground-7B",
        ss_pro: Some(43.2),
        ss_v2: Some(V2Subsets {
            desktop_text: 90.2,
            desktop_icon: 76.4,
            web_text: 93.6,
            web_icon: 73.9,
        }),
        showdown: Some(62.5),
    },
    ModelResults {
        name: "SFT-7B (35k)",
        ss_pro: Some(47.18),
        ss_v2: Some(V2Subsets {
            desktop_text: 97.9,
            desktop_icon: 80.7,
            web_text: 94.0,
            web_icon: 86.7,
        }),
        showdown: Some(69.12),
    },
    ModelResults {
        name: "GTA1-7B",
        ss_pro: Some(50.1),
        ss_v2: Some(V2Subsets {
            desktop_text: 94.9,
            desktop_icon: 89.3,
            web_text: 92.3,
            web_icon: 86.7,
        }),
        showdown: Some(68.76),
    },
];

fn ordered_by_mean(models: &[ModelResults]) -> Vec<ModelResults> {
    let mut ordered = models.to_vec();
    ordered.sort_by(|a, b| a.mean().total_cmp(&b.mean()));
    ordered
}

#[derive(Debug, Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "SS Pro")]
    ss_pro: String,
    #[tabled(rename = "SS V2")]
    ss_v2: String,
    #[tabled(rename = "Showdown")]
    showdown: String,
    #[tabled(rename = "Mean")]
    mean: String,
}

fn breakdown_table(models: &[ModelResults]) -> String {
    let cell = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    let rows: Vec<BreakdownRow> = models
        .iter()
        .map(|model| {
            let [ss_pro, ss_v2, showdown] = model.scores();
            BreakdownRow {
                model: model.name.to_string(),
                ss_pro: cell(ss_pro),
                ss_v2: cell(ss_v2),
                showdown: cell(showdown),
                mean: format!("{:.1}", model.mean()),
            }
        })
        .collect();
    format_table(&rows, Some("Performance Breakdown"))
}

fn multi_dataset_performance() -> Figure {
    let models = ordered_by_mean(&MULTI_DATASET_MODELS);
    let categories = models.iter().map(|model| model.name.to_string()).collect();

    let group = |label: &str, color: RGBColor, pick: fn(&ModelResults) -> Option<f64>| {
        BarGroup::new(label, models.iter().map(pick).collect(), color)
    };
    let groups = vec![
        group("ScreenSpot Pro", SS_PRO_COLOR, |model| model.ss_pro),
        group("ScreenSpot V2", SS_V2_COLOR, |model| {
            model.ss_v2.as_ref().map(V2Subsets::overall)
        }),
        group("Showdown Clicks", SHOWDOWN_COLOR, |model| model.showdown),
    ];

    let mut chart = BarChart::new(
        "Multi-Dataset Performance Comparison",
        ACCURACY_AXIS,
        categories,
        groups,
    );
    chart.x_label = "Models (Ordered by Performance)".to_string();
    chart.y_range = Some(0.0..100.0);
    chart.decimals = 1;
    chart.value_suffix = "%".to_string();

    Figure::single(Panel::Bar(chart)).with_table(breakdown_table(&models))
}

/// Grouped SS Pro / OS-World-G bars for one ablation
fn ablation_panel(title: &str, settings: &[(&str, f64, f64)]) -> Panel {
    let categories = settings.iter().map(|(label, _, _)| label.to_string()).collect();
    let ss_pro: Vec<f64> = settings.iter().map(|&(_, ss_pro, _)| ss_pro).collect();
    let os_world: Vec<f64> = settings.iter().map(|&(_, _, os_world)| os_world).collect();

    let mut ss_pro_group = BarGroup::from_values(&ss_pro, SS_PRO_COLOR)
        .with_value_labels(percent_labels(&ss_pro, 2));
    ss_pro_group.label = "SS Pro".to_string();
    let mut os_world_group = BarGroup::from_values(&os_world, OSW_COLOR)
        .with_value_labels(percent_labels(&os_world, 1));
    os_world_group.label = "OS-World-G".to_string();

    let mut chart = BarChart::new(title, ACCURACY_AXIS, categories, vec![ss_pro_group, os_world_group]);
    chart.y_range = Some(52.0..66.0);
    Panel::Bar(chart)
}

fn rl_ablations() -> Figure {
    let selected = JOURNAL_NEW_PIPELINE_FINAL;
    Figure::with_panels(
        "RL Ablations: Temperature and Data Pool",
        vec![
            ablation_panel(
                "Temperature Ablation",
                &[
                    ("temperature 1.4", 53.00, 63.1),
                    ("temperature 1.7 (selected)", selected.ss_pro, selected.os_world_g),
                ],
            ),
            ablation_panel(
                "Data Pool Ablation",
                &[
                    ("20% 0-reward (selected)", selected.ss_pro, selected.os_world_g),
                    ("30% 0-reward", 52.81, 62.5),
                ],
            ),
        ],
    )
}

/// One bar of a progress panel
struct ProgressStage {
    label: &'static str,
    value: f64,
    color: RGBColor,
    /// Value this bar improves on, annotated as a delta
    improves_on: Option<f64>,
}

const fn bar(label: &'static str, value: f64, color: RGBColor) -> ProgressStage {
    ProgressStage {
        label,
        value,
        color,
        improves_on: None,
    }
}

const fn improved(label: &'static str, value: f64, color: RGBColor, from: f64) -> ProgressStage {
    ProgressStage {
        label,
        value,
        color,
        improves_on: Some(from),
    }
}

fn progress_panel(title: &str, bars: &[ProgressStage], y_range: Range<f64>) -> Panel {
    let values: Vec<f64> = bars.iter().map(|bar| bar.value).collect();
    let group = BarGroup::from_values(&values, REFERENCE_BLUE)
        .with_bar_colors(bars.iter().map(|bar| bar.color).collect());

    let mut chart = BarChart::new(
        title,
        ACCURACY_AXIS,
        bars.iter().map(|bar| bar.label.to_string()).collect(),
        vec![group],
    );
    chart.y_range = Some(y_range);
    chart.value_suffix = "%".to_string();
    chart.annotations = bars
        .iter()
        .map(|bar| bar.improves_on.map(|from| delta_note(from, bar.value)))
        .collect();
    Panel::Bar(chart)
}

fn rl_pipeline_improvements() -> Figure {
    let sft = JOURNAL_SFT_BASELINE;
    let initial = JOURNAL_OLD_PIPELINE_FINAL;
    let improved_rl = JOURNAL_NEW_PIPELINE_FINAL;

    Figure::with_panels(
        "Overall Progress with Baselines",
        vec![
            progress_panel(
                "ScreenSpot Pro",
                &[
                    bar("UI-Venus-7B", 50.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 50.1, LIGHT_BLUE),
                    bar("SFT-7B 63k", sft.ss_pro, INDIAN_RED),
                    improved("initial RL (220 steps)", initial.ss_pro, RL_TEAL, sft.ss_pro),
                    improved("improved RL (194 steps)", improved_rl.ss_pro, RL_DARK_GREEN, sft.ss_pro),
                ],
                48.0..56.0,
            ),
            progress_panel(
                "OS-World-G",
                &[
                    bar("UI-Venus-7B", 58.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 67.7, LIGHT_BLUE),
                    bar("GTA1-32B", 61.8, PALE_BLUE),
                    bar("SFT-7B 63k", sft.os_world_g, INDIAN_RED),
                    improved("initial RL (220 steps)", initial.os_world_g, RL_TEAL, sft.os_world_g),
                    improved(
                        "improved RL (194 steps)",
                        improved_rl.os_world_g,
                        RL_DARK_GREEN,
                        sft.os_world_g,
                    ),
                ],
                56.0..70.0,
            ),
        ],
    )
}

const SFT_63K: BenchmarkPair = JOURNAL_SFT_BASELINE;
const SFT_63K_RL: BenchmarkPair = JOURNAL_OLD_PIPELINE_FINAL;
const SOUP_63K: BenchmarkPair = BenchmarkPair::new(51.6, 60.2);
const SOUP_63K_RL: BenchmarkPair = BenchmarkPair::new(52.25, 62.05);

fn progress_sspro_osworld() -> Figure {
    Figure::with_panels(
        "Progress of SFT-7B on ScreenSpot Pro and OS-World-G",
        vec![
            progress_panel(
                "ScreenSpot Pro",
                &[
                    bar("UI-Venus-7B", 50.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 50.1, LIGHT_BLUE),
                    bar("SFT-7B (63k)", SFT_63K.ss_pro, INDIAN_RED),
                    improved("SFT-7B (63k) + RL", SFT_63K_RL.ss_pro, RL_GREEN, SFT_63K.ss_pro),
                    bar("SFT-7B Soup (4x, 63k)", SOUP_63K.ss_pro, DARK_RED),
                    improved("SFT-7B Soup (4x, 63k) + RL", SOUP_63K_RL.ss_pro, RL_DARK_GREEN, SOUP_63K.ss_pro),
                ],
                35.0..55.0,
            ),
            progress_panel(
                "OS-World-G",
                &[
                    bar("UI-Venus-7B", 58.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 67.7, LIGHT_BLUE),
                    bar("GTA1-32B", 61.8, PALE_BLUE),
                    bar("SFT-7B (63k)", SFT_63K.os_world_g, INDIAN_RED),
                    improved("SFT-7B (63k) + RL", SFT_63K_RL.os_world_g, RL_GREEN, SFT_63K.os_world_g),
                    bar("SFT-7B Soup (4x, 63k)", SOUP_63K.os_world_g, DARK_RED),
                    improved("SFT-7B Soup (4x, 63k) + RL", SOUP_63K_RL.os_world_g, RL_DARK_GREEN, SOUP_63K.os_world_g),
                ],
                50.0..70.0,
            ),
        ],
    )
}

fn progress_sspro_osworld_nosoup() -> Figure {
    Figure::with_panels(
        "Progress of SFT-7B on ScreenSpot Pro and OS-World-G (no Soup)",
        vec![
            progress_panel(
                "ScreenSpot Pro",
                &[
                    bar("UI-Venus-7B", 50.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 50.1, LIGHT_BLUE),
                    bar("SFT-7B (63k)", SFT_63K.ss_pro, INDIAN_RED),
                    improved("SFT-7B (63k) + v1 RL pipeline", SFT_63K_RL.ss_pro, RL_GREEN, SFT_63K.ss_pro),
                ],
                35.0..55.0,
            ),
            progress_panel(
                "OS-World-G",
                &[
                    bar("UI-Venus-7B", 58.8, REFERENCE_BLUE),
                    bar("GTA1-7B", 67.7, LIGHT_BLUE),
                    bar("GTA1-32B", 61.8, PALE_BLUE),
                    bar("SFT-7B (63k)", SFT_63K.os_world_g, INDIAN_RED),
                    improved("SFT-7B (63k) + v1 RL pipeline", SFT_63K_RL.os_world_g, RL_GREEN, SFT_63K.os_world_g),
                ],
                50.0..70.0,
            ),
        ],
    )
}

/// Cumulative ScreenSpot Pro gains, in the order the improvements were made
const PROGRESS_STAGES: [(&str, f64); 8] = [
    ("1MP Baseline", 28.65),
    ("4MP", SFT_4MP),
    ("+ Better training prompt", 39.03),
    ("+ Model filtering", SFT_FILTERED_10K),
    ("+ Scale to 20k", 46.55),
    ("+ Scale to 35k", 47.18),
    ("+ Scale to 80K + YouTube", 49.65),
    ("+ Scale to 114K", 50.41),
];

/// Illustrative height of the future bar, shown without a value
const FUTURE_PROJECTION: f64 = 54.5;
const GTA1_SS_PRO: f64 = 50.10;

/// Grays from light to dark, one per bar
fn gray_gradient(count: usize) -> Vec<RGBColor> {
    let (light, dark) = (0.9, 0.35);
    (0..count)
        .map(|index| {
            let t = if count > 1 {
                index as f64 / (count - 1) as f64
            } else {
                0.5
            };
            let level = ((light + (dark - light) * t) * 255.0).round() as u8;
            RGBColor(level, level, level)
        })
        .collect()
}

fn sspro_progress_summary() -> Figure {
    let mut categories: Vec<String> = PROGRESS_STAGES
        .iter()
        .map(|(label, _)| label.to_string())
        .collect();
    categories.push("Future".to_string());

    let mut values: Vec<f64> = PROGRESS_STAGES.iter().map(|&(_, value)| value).collect();
    values.push(FUTURE_PROJECTION);

    let mut labels = percent_labels(&values[..PROGRESS_STAGES.len()], 2);
    labels.push("Pro App Knowledge + RL".to_string());

    let mut annotations = vec![None];
    annotations.extend(
        PROGRESS_STAGES
            .windows(2)
            .map(|pair| Some(delta_note(pair[0].1, pair[1].1))),
    );
    annotations.push(None);

    let group = BarGroup::from_values(&values, REFERENCE_BLUE)
        .with_bar_colors(gray_gradient(values.len()))
        .with_value_labels(labels);

    let mut chart = BarChart::new(
        "How to Train a Strong Grounding Model (Data Perspective)",
        SS_PRO_AXIS,
        categories,
        vec![group],
    );
    chart.y_range = Some(25.0..55.0);
    chart.annotations = annotations;
    chart.references = vec![ReferenceLine::new(
        format!("GTA1-7B {GTA1_SS_PRO:.1}%"),
        GTA1_SS_PRO,
        REFERENCE_BLUE,
    )];
    Figure::single(Panel::Bar(chart))
}
