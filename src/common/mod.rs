//! Common infrastructure shared across reports
//!
//! This module provides reusable infrastructure for:
//! - Data structures for accuracy scores and summaries
//! - Plotting line, bar and multi-panel charts
//! - ASCII table formatting
//! - JSON and CSV export

pub mod data_structures;
pub mod export;
pub mod plots;
pub mod tables;

// Re-export commonly used items
pub use data_structures::{Scores, StepSeries};
pub use export::ExportError;
pub use plots::PlotError;
