//! ASCII table formatting for console and text reports
//!
//! - [`TrendRow`] summarizes one accuracy curve
//! - [`format_table`] renders any [`Tabled`] rows using the [`tabled`] crate

use crate::common::data_structures::TrendStats;
use tabled::{Table, Tabled};

/// One row of a training trend summary
#[derive(Debug, Clone, Tabled)]
pub struct TrendRow {
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "Benchmark")]
    pub benchmark: String,
    #[tabled(rename = "Initial")]
    pub initial: String,
    #[tabled(rename = "Final")]
    pub final_value: String,
    /// Best accuracy and the step it was reached at
    #[tabled(rename = "Best")]
    pub best: String,
    #[tabled(rename = "Worst")]
    pub worst: String,
    #[tabled(rename = "Improvement")]
    pub improvement: String,
    #[tabled(rename = "Range")]
    pub range: String,
}

impl TrendRow {
    /// Creates a row with accuracies formatted to four decimals
    pub fn new(model: &str, benchmark: &str, stats: &TrendStats) -> Self {
        Self {
            model: model.to_string(),
            benchmark: benchmark.to_string(),
            initial: format!("{:.4}", stats.initial),
            final_value: format!("{:.4}", stats.final_value),
            best: format!("{:.4} (step {})", stats.best, stats.best_step),
            worst: format!("{:.4}", stats.worst),
            improvement: format!("{:+.4}", stats.improvement()),
            range: format!("{:.4}", stats.range()),
        }
    }
}

/// Formats rows as an ASCII table using the [`tabled`] crate
///
/// # Arguments
/// * `rows` - Rows to format
/// * `title` - Optional title, underlined with `=`
///
/// # Returns
/// A formatted ASCII table as a [`String`]
pub fn format_table<T: Tabled>(rows: &[T], title: Option<&str>) -> String {
    if rows.is_empty() {
        return "No data available".to_string();
    }

    let table = Table::new(rows).to_string();

    if let Some(title) = title {
        format!("{}\n{}\n{}", title, "=".repeat(title.len()), table)
    } else {
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> TrendStats {
        TrendStats::from_points(&[(10, 0.55), (20, 0.6012), (30, 0.58)]).unwrap()
    }

    #[test]
    fn test_trend_row_formatting() {
        let row = TrendRow::new("SFT-7B", "osworld-g-eval", &sample_stats());

        assert_eq!(row.initial, "0.5500");
        assert_eq!(row.final_value, "0.5800");
        assert_eq!(row.best, "0.6012 (step 20)");
        assert_eq!(row.worst, "0.5500");
        assert_eq!(row.improvement, "+0.0300");
        assert_eq!(row.range, "0.0512");
    }

    #[test]
    fn test_format_table() {
        let rows = vec![TrendRow::new("SFT-7B", "osworld-g-eval", &sample_stats())];

        let table = format_table(&rows, Some("Trends"));
        assert!(table.starts_with("Trends\n======\n"));
        assert!(table.contains("Model"));
        assert!(table.contains("Improvement"));
        assert!(table.contains("SFT-7B"));

        let untitled = format_table(&rows, None);
        assert!(!untitled.contains("Trends"));
    }

    #[test]
    fn test_format_empty_table() {
        let rows: Vec<TrendRow> = Vec::new();
        assert_eq!(format_table(&rows, Some("Trends")), "No data available");
    }
}
