//! Plotting infrastructure for accuracy charts
//!
//! This module provides line charts (accuracy over training steps or budgets)
//! and bar charts (model comparisons) using the [`plotters`] crate. Charts are
//! saved as PNG files; single charts use a fixed 1200x800 resolution and
//! multi-panel figures grow horizontally with the number of panels.

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Resolution of single-panel charts
pub const CHART_SIZE: (u32, u32) = (1200, 800);

/// Size of each panel in a multi-panel figure
pub const PANEL_SIZE: (u32, u32) = (900, 700);

/// Share of a category slot covered by its bars
const GROUP_WIDTH: f64 = 0.8;

/// Number of dashes drawn for a reference line
const DASHES: usize = 40;

/// Matplotlib's `tab10` color cycle
pub const TAB10: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

pub const GRAY: RGBColor = RGBColor(0x80, 0x80, 0x80);
pub const LIGHT_GRAY: RGBColor = RGBColor(0xb0, 0xb0, 0xb0);
pub const DARK_RED: RGBColor = RGBColor(0x8b, 0x00, 0x00);
pub const FOREST_GREEN: RGBColor = RGBColor(0x22, 0x8b, 0x22);
pub const NOTE_GRAY: RGBColor = RGBColor(0x7f, 0x8c, 0x8d);

/// Picks a color from [`TAB10`], wrapping around
pub fn series_color(index: usize) -> RGBColor {
    TAB10[index % TAB10.len()]
}

/// A single line on a [`LineChart`]
#[derive(Debug, Clone)]
pub struct LineSeriesSpec {
    /// Legend label
    pub label: String,
    /// `(x, y)` points in drawing order. Non-finite points are skipped.
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    /// Circle and annotate the highest point of the series
    pub highlight_best: bool,
}

impl LineSeriesSpec {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            points,
            color,
            highlight_best: false,
        }
    }

    /// Marks the best point of this series on the chart
    pub fn with_best_highlight(mut self) -> Self {
        self.highlight_best = true;
        self
    }
}

/// A dashed horizontal line marking a baseline accuracy
#[derive(Debug, Clone)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

impl ReferenceLine {
    pub fn new(label: impl Into<String>, value: f64, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            value,
            color,
        }
    }
}

/// Description of a line chart
#[derive(Debug, Clone, Default)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeriesSpec>,
    pub references: Vec<ReferenceLine>,
    /// Fixed Y-axis range; derived from the data when `None`
    pub y_range: Option<Range<f64>>,
    /// Names for integer X positions, for charts over categorical axes
    pub x_categories: Option<Vec<String>>,
    /// Small gray text in the lower left corner of the plot
    pub note: Option<String>,
}

impl LineChart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Default::default()
        }
    }
}

/// One set of bars on a [`BarChart`], one value per category
#[derive(Debug, Clone)]
pub struct BarGroup {
    /// Legend label. Groups with an empty label get no legend entry.
    pub label: String,
    /// Bar heights; `None` leaves the slot empty
    pub values: Vec<Option<f64>>,
    pub color: RGBColor,
    /// Per-bar colors overriding [`BarGroup::color`]
    pub bar_colors: Option<Vec<RGBColor>>,
    /// Per-bar text replacing the formatted value
    pub value_labels: Option<Vec<String>>,
}

impl BarGroup {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            values,
            color,
            bar_colors: None,
            value_labels: None,
        }
    }

    /// Creates an unlabeled group where every category has a value
    pub fn from_values(values: &[f64], color: RGBColor) -> Self {
        Self::new("", values.iter().copied().map(Some).collect(), color)
    }

    pub fn with_bar_colors(mut self, colors: Vec<RGBColor>) -> Self {
        self.bar_colors = Some(colors);
        self
    }

    pub fn with_value_labels(mut self, labels: Vec<String>) -> Self {
        self.value_labels = Some(labels);
        self
    }

    fn bar_color(&self, index: usize) -> RGBColor {
        self.bar_colors
            .as_ref()
            .and_then(|colors| colors.get(index).copied())
            .unwrap_or(self.color)
    }
}

/// Description of a (grouped) bar chart over named categories
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub groups: Vec<BarGroup>,
    pub references: Vec<ReferenceLine>,
    /// Fixed Y-axis range; `0..max * 1.15` when `None`
    pub y_range: Option<Range<f64>>,
    /// Decimal places of value labels
    pub decimals: usize,
    /// Appended to value labels, e.g. `"%"`
    pub value_suffix: String,
    /// Extra text above each category, e.g. sample counts or deltas
    pub annotations: Vec<Option<String>>,
}

impl BarChart {
    pub fn new(
        title: impl Into<String>,
        y_label: impl Into<String>,
        categories: Vec<String>,
        groups: Vec<BarGroup>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: y_label.into(),
            categories,
            groups,
            references: Vec::new(),
            y_range: None,
            decimals: 2,
            value_suffix: String::new(),
            annotations: Vec::new(),
        }
    }

    fn value_label(&self, group: &BarGroup, index: usize, value: f64) -> String {
        group
            .value_labels
            .as_ref()
            .and_then(|labels| labels.get(index).cloned())
            .unwrap_or_else(|| format!("{:.*}{}", self.decimals, value, self.value_suffix))
    }
}

/// A panel in a multi-panel figure
#[derive(Debug, Clone)]
pub enum Panel {
    Line(LineChart),
    Bar(BarChart),
}

/// Creates a line chart and saves it as a PNG file
///
/// # Arguments
/// * `chart` - Series, reference lines and labels to draw
/// * `output_path` - Path where the PNG file should be saved. Missing parent
///   directories are created.
///
/// # Returns
/// * `Ok(())` - If the chart was successfully created and saved
/// * `Err(PlotError)` - If the data is invalid or rendering failed
///
/// # Chart Properties
/// * Resolution: 1200x800 pixels
/// * Series: lines with point markers, NaN points dropped
/// * Reference lines: dashed, spanning the full X range
/// * Legend: drawn when any series or reference line is present
pub fn create_line_chart(chart: &LineChart, output_path: &Path) -> Result<()> {
    validate_line_chart(chart)?;
    ensure_parent_dir(output_path)?;

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    draw_line_panel(&root, chart, 40)?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Creates a bar chart and saves it as a PNG file
///
/// # Arguments
/// * `chart` - Categories, bar groups and labels to draw
/// * `output_path` - Path where the PNG file should be saved
///
/// # Returns
/// * `Ok(())` - If the chart was successfully created and saved
/// * `Err(PlotError)` - If the data is invalid or rendering failed
pub fn create_bar_chart(chart: &BarChart, output_path: &Path) -> Result<()> {
    validate_bar_chart(chart)?;
    ensure_parent_dir(output_path)?;

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    draw_bar_panel(&root, chart, 40)?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Creates a figure with panels laid out left to right under a common title
///
/// # Arguments
/// * `panels` - Charts to draw, one per column
/// * `title` - Figure title drawn above all panels
/// * `output_path` - Path where the PNG file should be saved
///
/// # Returns
/// * `Ok(())` - If the figure was successfully created and saved
/// * `Err(PlotError)` - If any panel is invalid or rendering failed
pub fn create_panel_figure(panels: &[Panel], title: &str, output_path: &Path) -> Result<()> {
    if panels.is_empty() {
        return Err(PlotError::InvalidData(
            "Figure needs at least one panel".to_string(),
        ));
    }

    for panel in panels {
        match panel {
            Panel::Line(chart) => validate_line_chart(chart)?,
            Panel::Bar(chart) => validate_bar_chart(chart)?,
        }
    }

    ensure_parent_dir(output_path)?;

    let size = (PANEL_SIZE.0 * panels.len() as u32, PANEL_SIZE.1);
    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let titled = root
        .titled(title, ("sans-serif", 40))
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let areas = titled.split_evenly((1, panels.len()));
    for (area, panel) in areas.iter().zip(panels) {
        match panel {
            Panel::Line(chart) => draw_line_panel(area, chart, 30)?,
            Panel::Bar(chart) => draw_bar_panel(area, chart, 30)?,
        }
    }

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Checks that a line chart has something to draw
pub fn validate_line_chart(chart: &LineChart) -> Result<()> {
    if chart.series.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "Line chart '{}' has no series",
            chart.title
        )));
    }

    line_ranges(chart).map(|_| ())
}

/// Checks that every bar group lines up with the categories
pub fn validate_bar_chart(chart: &BarChart) -> Result<()> {
    if chart.categories.is_empty() || chart.groups.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "Bar chart '{}' needs categories and at least one group",
            chart.title
        )));
    }

    for group in &chart.groups {
        if group.values.len() != chart.categories.len() {
            return Err(PlotError::InvalidData(format!(
                "Group '{}' has {} values for {} categories",
                group.label,
                group.values.len(),
                chart.categories.len()
            )));
        }
    }

    if !chart.annotations.is_empty() && chart.annotations.len() != chart.categories.len() {
        return Err(PlotError::InvalidData(format!(
            "Bar chart '{}' has {} annotations for {} categories",
            chart.title,
            chart.annotations.len(),
            chart.categories.len()
        )));
    }

    bar_y_range(chart).map(|_| ())
}

fn draw_line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &LineChart,
    caption_size: u32,
) -> Result<()> {
    let (x_range, y_range) = line_ranges(chart)?;

    let mut chart_context = ChartBuilder::on(area)
        .caption(&chart.title, ("sans-serif", caption_size))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let categories = chart.x_categories.as_deref().unwrap_or(&[]);
    let category_formatter = |x: &f64| category_label(categories, *x);

    let mut mesh = chart_context.configure_mesh();
    mesh.x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .axis_desc_style(("sans-serif", 28))
        .label_style(("sans-serif", 20));

    if !categories.is_empty() {
        mesh.x_labels(categories.len())
            .x_label_formatter(&category_formatter);
    }

    mesh.draw().map_err(|e| PlotError::Drawing(e.to_string()))?;

    for series in &chart.series {
        let points = finite_points(&series.points);
        if points.is_empty() {
            continue;
        }

        let line_style = series.color.stroke_width(2);
        chart_context
            .draw_series(LineSeries::new(points.iter().copied(), line_style))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        let marker_style = series.color.filled();
        chart_context
            .draw_series(points.iter().map(|&point| Circle::new(point, 4, marker_style)))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        if series.highlight_best {
            draw_best_point(&mut chart_context, series, &points)?;
        }
    }

    draw_reference_lines(&mut chart_context, &chart.references, x_range.clone())?;

    if let Some(note) = &chart.note {
        let position = (
            x_range.start + (x_range.end - x_range.start) * 0.02,
            y_range.start + (y_range.end - y_range.start) * 0.06,
        );
        let style = ("sans-serif", 18).into_font().color(&NOTE_GRAY);
        chart_context
            .draw_series(std::iter::once(Text::new(note.clone(), position, style)))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    chart_context
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

fn draw_best_point<DB: DrawingBackend>(
    chart_context: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    series: &LineSeriesSpec,
    points: &[(f64, f64)],
) -> Result<()> {
    let Some(best) = best_point(points) else {
        return Ok(());
    };

    let initial = points[0].1;
    let gain = if initial == 0.0 {
        0.0
    } else {
        (best.1 - initial) / initial * 100.0
    };

    chart_context
        .draw_series(std::iter::once(Circle::new(
            best,
            10,
            series.color.stroke_width(3),
        )))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let style = ("sans-serif", 18).into_font().color(&series.color);
    chart_context
        .draw_series(std::iter::once(
            EmptyElement::at(best)
                + Text::new(format!("{:.3} ({:+.1}%)", best.1, gain), (12, -24), style),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &BarChart,
    caption_size: u32,
) -> Result<()> {
    let y_range = bar_y_range(chart)?;
    let category_count = chart.categories.len();
    let x_range = -0.5..(category_count as f64 - 0.5);

    let mut chart_context = ChartBuilder::on(area)
        .caption(&chart.title, ("sans-serif", caption_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(85)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let categories = chart.categories.as_slice();
    let category_formatter = |x: &f64| category_label(categories, *x);

    chart_context
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(category_count)
        .x_label_formatter(&category_formatter)
        .x_label_style(("sans-serif", 15))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .axis_desc_style(("sans-serif", 28))
        .label_style(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let bar_width = GROUP_WIDTH / chart.groups.len() as f64;
    let base = y_range.start.max(0.0);
    let value_style = ("sans-serif", 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    let mut tops = vec![base; category_count];

    for (group_index, group) in chart.groups.iter().enumerate() {
        let bars: Vec<(usize, f64, f64)> = group
            .values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                value.filter(|v| v.is_finite()).map(|v| {
                    let left = index as f64 - GROUP_WIDTH / 2.0 + bar_width * group_index as f64;
                    (index, left, v)
                })
            })
            .collect();

        let legend_color = group.color;
        let mut annotation = chart_context
            .draw_series(bars.iter().map(|&(index, left, value)| {
                Rectangle::new(
                    [(left, base), (left + bar_width * 0.95, value)],
                    group.bar_color(index).filled(),
                )
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        if !group.label.is_empty() {
            annotation.label(group.label.as_str()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 16, y + 6)], legend_color.filled())
            });
        }

        chart_context
            .draw_series(bars.iter().map(|&(index, left, value)| {
                let center = left + bar_width * 0.95 / 2.0;
                EmptyElement::at((center, value))
                    + Text::new(
                        chart.value_label(group, index, value),
                        (0, -4),
                        value_style.clone(),
                    )
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        for &(index, _, value) in &bars {
            tops[index] = tops[index].max(value);
        }
    }

    let annotation_style = ("sans-serif", 15)
        .into_font()
        .color(&DARK_RED)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart_context
        .draw_series(
            chart
                .annotations
                .iter()
                .enumerate()
                .filter_map(|(index, text)| text.as_ref().map(|text| (index, text)))
                .map(|(index, text)| {
                    EmptyElement::at((index as f64, tops[index]))
                        + Text::new(text.clone(), (0, -24), annotation_style.clone())
                }),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    draw_reference_lines(&mut chart_context, &chart.references, x_range)?;

    let has_legend = !chart.references.is_empty()
        || chart.groups.iter().any(|group| !group.label.is_empty());
    if has_legend {
        chart_context
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 18))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    Ok(())
}

fn draw_reference_lines<DB: DrawingBackend>(
    chart_context: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    references: &[ReferenceLine],
    x_range: Range<f64>,
) -> Result<()> {
    for reference in references {
        let style = reference.color.stroke_width(2);
        chart_context
            .draw_series(
                dashed_segments(x_range.clone(), reference.value)
                    .map(move |segment| PathElement::new(segment, style)),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(reference.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    Ok(())
}

/// Splits a horizontal line at `y` into evenly spaced dashes
fn dashed_segments(x_range: Range<f64>, y: f64) -> impl Iterator<Item = Vec<(f64, f64)>> {
    let dash = (x_range.end - x_range.start) / (DASHES as f64 * 2.0);
    (0..DASHES).map(move |index| {
        let start = x_range.start + dash * 2.0 * index as f64;
        vec![(start, y), (start + dash, y)]
    })
}

/// Maps an integer X position onto its category name
fn category_label(categories: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }

    categories.get(rounded as usize).cloned().unwrap_or_default()
}

fn finite_points(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

/// Returns the first point with the highest Y value
fn best_point(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    points.iter().copied().fold(None, |best, point| match best {
        Some(current) if current.1 >= point.1 => Some(current),
        _ => Some(point),
    })
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
        (low.min(value), high.max(value))
    })
}

/// Widens `low..high` by `fraction` of its span on both sides
///
/// Degenerate ranges (a single value) are widened relative to the value itself,
/// so the axis never collapses to zero width.
pub fn pad_range(low: f64, high: f64, fraction: f64) -> Range<f64> {
    let span = high - low;
    let pad = if span > 0.0 {
        span * fraction
    } else {
        low.abs().max(1.0) * fraction
    };

    (low - pad)..(high + pad)
}

fn line_ranges(chart: &LineChart) -> Result<(Range<f64>, Range<f64>)> {
    let points: Vec<(f64, f64)> = chart
        .series
        .iter()
        .flat_map(|series| finite_points(&series.points))
        .collect();

    if points.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "Line chart '{}' has no finite points",
            chart.title
        )));
    }

    let (x_min, x_max) = bounds(points.iter().map(|(x, _)| *x));
    let x_range = match &chart.x_categories {
        Some(categories) if !categories.is_empty() => -0.5..(categories.len() as f64 - 0.5),
        _ => pad_range(x_min, x_max, 0.05),
    };

    let y_range = match &chart.y_range {
        Some(range) => checked_range(range, &chart.title)?,
        None => {
            let values = points
                .iter()
                .map(|(_, y)| *y)
                .chain(chart.references.iter().map(|reference| reference.value));
            let (y_min, y_max) = bounds(values);
            pad_range(y_min, y_max, 0.1)
        }
    };

    Ok((x_range, y_range))
}

fn bar_y_range(chart: &BarChart) -> Result<Range<f64>> {
    if let Some(range) = &chart.y_range {
        return checked_range(range, &chart.title);
    }

    let max = chart
        .groups
        .iter()
        .flat_map(|group| group.values.iter().flatten().copied())
        .chain(chart.references.iter().map(|reference| reference.value))
        .filter(|value| value.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    if !max.is_finite() {
        return Err(PlotError::InvalidData(format!(
            "Bar chart '{}' has no finite values",
            chart.title
        )));
    }

    Ok(0.0..(max.max(0.0) * 1.15).max(1.0))
}

fn checked_range(range: &Range<f64>, title: &str) -> Result<Range<f64>> {
    if range.start.is_finite() && range.end.is_finite() && range.start < range.end {
        Ok(range.clone())
    } else {
        Err(PlotError::InvalidData(format!(
            "Chart '{}' has an empty axis range {:?}",
            title, range
        )))
    }
}

fn ensure_parent_dir(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn sample_line_chart() -> LineChart {
        let mut chart = LineChart::new("Test", "Global step", "Accuracy");
        chart.series.push(
            LineSeriesSpec::new(
                "OSWorld-G",
                vec![(10.0, 0.60), (20.0, 0.64), (30.0, f64::NAN), (40.0, 0.62)],
                series_color(0),
            )
            .with_best_highlight(),
        );
        chart
            .references
            .push(ReferenceLine::new("SFT baseline", 0.664, GRAY));
        chart
    }

    fn sample_bar_chart() -> BarChart {
        BarChart::new(
            "Test Bars",
            "Accuracy (%)",
            vec!["A".to_string(), "B".to_string()],
            vec![BarGroup::from_values(&[42.0, 50.1], series_color(0))],
        )
    }

    #[test]
    fn test_line_ranges_skip_nan_and_include_references() {
        let chart = sample_line_chart();
        let (x_range, y_range) = line_ranges(&chart).unwrap();

        assert!(x_range.start < 10.0 && x_range.end > 40.0);
        assert!(y_range.start < 0.60);
        assert!(y_range.end > 0.664); // reference line stays visible
    }

    #[test]
    fn test_line_chart_validation() {
        let empty = LineChart::new("Empty", "x", "y");
        assert!(matches!(
            validate_line_chart(&empty),
            Err(PlotError::InvalidData(_))
        ));

        let mut all_nan = LineChart::new("NaN", "x", "y");
        all_nan.series.push(LineSeriesSpec::new(
            "s",
            vec![(1.0, f64::NAN)],
            series_color(0),
        ));
        assert!(matches!(
            validate_line_chart(&all_nan),
            Err(PlotError::InvalidData(_))
        ));

        let mut inverted = sample_line_chart();
        inverted.y_range = Some(0.7..0.5);
        assert!(matches!(
            validate_line_chart(&inverted),
            Err(PlotError::InvalidData(_))
        ));

        assert!(validate_line_chart(&sample_line_chart()).is_ok());
    }

    #[test]
    fn test_bar_chart_validation() {
        assert!(validate_bar_chart(&sample_bar_chart()).is_ok());

        let mut mismatched = sample_bar_chart();
        mismatched.groups[0].values.push(Some(1.0));
        assert!(matches!(
            validate_bar_chart(&mismatched),
            Err(PlotError::InvalidData(_))
        ));

        let mut missing = sample_bar_chart();
        missing.groups[0].values = vec![None, None];
        assert!(matches!(
            validate_bar_chart(&missing),
            Err(PlotError::InvalidData(_))
        ));

        let mut annotations = sample_bar_chart();
        annotations.annotations = vec![Some("n=19".to_string())];
        assert!(matches!(
            validate_bar_chart(&annotations),
            Err(PlotError::InvalidData(_))
        ));
    }

    #[test]
    fn test_bar_y_range_default() {
        let range = bar_y_range(&sample_bar_chart()).unwrap();
        assert_eq!(range.start, 0.0);
        assert!((range.end - 50.1 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_value_labels() {
        let mut chart = sample_bar_chart();
        chart.decimals = 1;
        chart.value_suffix = "%".to_string();
        let group = chart.groups[0].clone();
        assert_eq!(chart.value_label(&group, 0, 42.04), "42.0%");

        let group = group.with_value_labels(vec!["Future".to_string(), "x".to_string()]);
        assert_eq!(chart.value_label(&group, 0, 54.5), "Future");
    }

    #[rstest]
    #[case(0.0, "A")]
    #[case(1.0, "B")]
    #[case(0.5, "")]
    #[case(-1.0, "")]
    #[case(2.0, "")]
    fn test_category_label(#[case] x: f64, #[case] expected: &str) {
        let categories = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&categories, x), expected);
    }

    #[test]
    fn test_best_point_prefers_first_maximum() {
        let points = vec![(1.0, 0.5), (2.0, 0.7), (3.0, 0.7), (4.0, 0.6)];
        assert_eq!(best_point(&points), Some((2.0, 0.7)));
        assert_eq!(best_point(&[]), None);
    }

    #[test]
    fn test_pad_range() {
        assert_eq!(pad_range(0.0, 10.0, 0.1), -1.0..11.0);

        // Degenerate range still has width
        let single = pad_range(50.0, 50.0, 0.1);
        assert!(single.start < 50.0 && single.end > 50.0);
    }

    #[test]
    fn test_dashed_segments_cover_range() {
        let segments: Vec<_> = dashed_segments(0.0..10.0, 0.5).collect();
        assert_eq!(segments.len(), DASHES);
        assert_eq!(segments[0][0], (0.0, 0.5));
        assert!(segments.iter().all(|s| s[1].0 <= 10.0 && s[0].1 == 0.5));
    }

    #[test]
    fn test_panel_figure_requires_panels() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty_panels.png");
        let result = create_panel_figure(&[], "Nothing", &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
        assert!(!path.exists());
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn test_create_charts_success() {
        let temp_dir = TempDir::new().unwrap();

        let line_path = temp_dir.path().join("line.png");
        assert!(create_line_chart(&sample_line_chart(), &line_path).is_ok());
        assert!(line_path.exists());

        let bar_path = temp_dir.path().join("bar.png");
        assert!(create_bar_chart(&sample_bar_chart(), &bar_path).is_ok());
        assert!(bar_path.exists());

        let panels_path = temp_dir.path().join("panels.png");
        let panels = vec![
            Panel::Line(sample_line_chart()),
            Panel::Bar(sample_bar_chart()),
        ];
        assert!(create_panel_figure(&panels, "Panels", &panels_path).is_ok());
        assert!(panels_path.exists());
    }
}
