//! Report generation
//!
//! This module contains the reports the command line exposes:
//! - Cold-start RL scaling and ablations over a results tree
//! - DAPO training-log curves and trends
//! - Old vs improved RL pipeline comparisons
//! - Hard-coded journal figures

pub mod coldstart;
pub mod constants;
pub mod dapo;
pub mod figures;
pub mod pipeline;

// Re-export report entry points for convenience
pub use coldstart::generate_coldstart_report;
pub use dapo::generate_dapo_report;
pub use figures::{format_registry, generate_figures};
pub use pipeline::{generate_scalability, generate_stepwise_overlay};
