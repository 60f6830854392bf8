use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accuracy per benchmark label, e.g. `"OSWorld-G" -> 0.664`
pub type Scores = BTreeMap<String, f64>;

/// Accuracy per training step, ordered by step
pub type StepSeries = BTreeMap<u64, Scores>;

/// Scores per configuration label (SFT budget, ablation variant)
pub type LabeledScores = BTreeMap<String, Scores>;

/// Per-step scores for every experiment, keyed by experiment directory name
pub type PerStepSummary = BTreeMap<String, StepSeries>;

/// Ablation results collected next to the coldstart sweep
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AblationSummary {
    /// 10k budget runs with varying sampling temperature
    pub temperature_10k: LabeledScores,
    /// 63k budget runs with default and UI-Venus-like hyperparameters
    pub ui_venus_like_63k: LabeledScores,
}

/// Complete output structure for the coldstart sweep
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ColdstartSummary {
    /// Best-step scores per SFT budget
    pub coldstart: LabeledScores,
    /// Overall ablation results
    pub ablations: AblationSummary,
}

/// A pair of accuracies (in percent) on the two headline benchmarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkPair {
    /// ScreenSpot-Pro accuracy
    pub ss_pro: f64,
    /// OSWorld-G accuracy
    pub os_world_g: f64,
}

impl BenchmarkPair {
    pub const fn new(ss_pro: f64, os_world_g: f64) -> Self {
        Self { ss_pro, os_world_g }
    }

    /// Looks up the value for a dataset label such as `"OSWorld-G"`
    pub fn for_dataset(&self, dataset: &str) -> Option<f64> {
        use crate::analysis::constants::{OSWORLD_G, SCREENSPOT_PRO};

        match dataset {
            OSWORLD_G => Some(self.os_world_g),
            SCREENSPOT_PRO => Some(self.ss_pro),
            _ => None,
        }
    }
}

/// Normalizes an accuracy to percent.
///
/// Values at or below 1.0 are treated as fractions.
pub fn to_percent(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

/// Summary statistics of an accuracy curve over training steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendStats {
    /// Accuracy at the first recorded step
    pub initial: f64,
    /// Accuracy at the last recorded step
    pub final_value: f64,
    /// Highest accuracy seen
    pub best: f64,
    /// Step at which [`TrendStats::best`] was first reached
    pub best_step: u64,
    /// Lowest accuracy seen
    pub worst: f64,
}

impl TrendStats {
    /// Computes statistics over `(step, accuracy)` points in recorded order
    ///
    /// # Returns
    /// `None` if `points` is empty.
    pub fn from_points(points: &[(u64, f64)]) -> Option<Self> {
        let (&(_, initial), &(_, final_value)) = (points.first()?, points.last()?);

        let mut stats = Self {
            initial,
            final_value,
            best: initial,
            best_step: points[0].0,
            worst: initial,
        };

        for &(step, accuracy) in &points[1..] {
            if accuracy > stats.best {
                stats.best = accuracy;
                stats.best_step = step;
            }
            stats.worst = stats.worst.min(accuracy);
        }

        Some(stats)
    }

    /// Difference between final and initial accuracy
    pub fn improvement(&self) -> f64 {
        self.final_value - self.initial
    }

    /// Spread between best and worst accuracy
    pub fn range(&self) -> f64 {
        self.best - self.worst
    }

    /// Relative gain of the best point over the initial one, in percent
    pub fn relative_gain_pct(&self) -> f64 {
        if self.initial == 0.0 {
            0.0
        } else {
            (self.best - self.initial) / self.initial * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(0.5), 50.0);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(53.57), 53.57);
    }

    #[test]
    fn test_trend_stats() {
        let points = vec![(10, 0.50), (20, 0.56), (30, 0.48), (40, 0.56), (50, 0.53)];
        let stats = TrendStats::from_points(&points).unwrap();

        assert_eq!(stats.initial, 0.50);
        assert_eq!(stats.final_value, 0.53);
        assert_eq!(stats.best, 0.56);
        assert_eq!(stats.best_step, 20); // first occurrence wins
        assert_eq!(stats.worst, 0.48);
        assert!((stats.improvement() - 0.03).abs() < 1e-12);
        assert!((stats.range() - 0.08).abs() < 1e-12);
        assert!((stats.relative_gain_pct() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_stats_empty() {
        assert!(TrendStats::from_points(&[]).is_none());
    }

    #[test]
    fn test_benchmark_pair_lookup() {
        let pair = BenchmarkPair::new(50.09, 60.1);
        assert_eq!(pair.for_dataset("ScreenSpot-Pro"), Some(50.09));
        assert_eq!(pair.for_dataset("OSWorld-G"), Some(60.1));
        assert_eq!(pair.for_dataset("ScreenSpot-V2"), None);
    }

    #[test]
    fn test_per_step_summary_serializes_steps_as_keys() {
        let mut series = StepSeries::new();
        series.insert(40, Scores::from([("OSWorld-G".to_string(), 0.61)]));
        let mut summary = PerStepSummary::new();
        summary.insert("grpo-coldstart-1k-on-x".to_string(), series);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["grpo-coldstart-1k-on-x"]["40"]["OSWorld-G"], 0.61);
    }
}
