//! Locating experiments and checkpoints in a results tree
//!
//! ```text
//! <results root>/
//!   grpo-coldstart-<budget>-on-<data>[_temp_<t>|_ui_venus_like]/
//!     global_step_<N>/ | checkpoint-<N>/
//!       grounding_eval_<dataset>_huggingface_<timestamp>.json
//! ```

pub mod experiments;
pub mod steps;

pub use experiments::DiscoveryError;
