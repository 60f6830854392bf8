//! Parsing of journal markdown: DAPO training logs and per-round result tables

use crate::analysis::constants::{
    JOURNAL_PER_ROUND, JOURNAL_SFT_BASELINE, OSWORLD_TOTAL, SCREENSPOT_PRO_TOTAL,
};
use crate::common::data_structures::BenchmarkPair;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Benchmarks tracked in DAPO training logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DapoBenchmark {
    OsWorldG,
    OsWorldGRefined,
    ScreenSpotPro,
}

impl DapoBenchmark {
    pub const ALL: [DapoBenchmark; 3] = [
        DapoBenchmark::OsWorldG,
        DapoBenchmark::OsWorldGRefined,
        DapoBenchmark::ScreenSpotPro,
    ];

    /// Name of the benchmark as it appears in section headings
    pub fn key(self) -> &'static str {
        match self {
            DapoBenchmark::OsWorldG => "osworld-g-eval",
            DapoBenchmark::OsWorldGRefined => "osworld-g-eval-refined",
            DapoBenchmark::ScreenSpotPro => "screenspot-pro-eval",
        }
    }

    /// Number of samples in the benchmark
    pub fn total(self) -> u32 {
        match self {
            DapoBenchmark::ScreenSpotPro => SCREENSPOT_PRO_TOTAL,
            DapoBenchmark::OsWorldG | DapoBenchmark::OsWorldGRefined => OSWORLD_TOTAL,
        }
    }

    /// Finds the benchmark named in a heading.
    ///
    /// The refined set is checked first since its key contains the plain one.
    pub fn detect(heading: &str) -> Option<Self> {
        [
            DapoBenchmark::OsWorldGRefined,
            DapoBenchmark::OsWorldG,
            DapoBenchmark::ScreenSpotPro,
        ]
        .into_iter()
        .find(|benchmark| heading.contains(benchmark.key()))
    }
}

/// A single evaluated checkpoint from a DAPO log table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DapoPoint {
    pub step: u64,
    pub correct: u32,
    pub total: u32,
    /// `correct / total`, recomputed rather than read from the table
    pub accuracy: f64,
}

/// Evaluation points per model run and benchmark, in table order
pub type DapoLog = BTreeMap<String, BTreeMap<DapoBenchmark, Vec<DapoPoint>>>;

/// Parses DAPO training log tables
///
/// Each `### <model> — <benchmark>` section holds a table whose rows look like
/// `| step | accuracy | correct | ... |`. Sections for other benchmarks,
/// rows with a non-numeric step and rows whose correct count does not parse
/// are skipped. Sections without any rows are left out entirely.
pub fn parse_dapo_markdown(text: &str) -> DapoLog {
    let mut log = DapoLog::new();

    for section in text.split("### ").skip(1) {
        let mut lines = section.trim().lines();
        let Some(heading) = lines.next().map(str::trim) else {
            continue;
        };
        let Some(benchmark) = DapoBenchmark::detect(heading) else {
            debug!("Skipping section '{}'", heading);
            continue;
        };
        let model = heading.replace(&format!(" — {}", benchmark.key()), "");

        // Header row; the separator fails the step check below
        let points: Vec<DapoPoint> = lines
            .skip(1)
            .filter_map(|line| parse_dapo_row(line, benchmark))
            .collect();

        if !points.is_empty() {
            log.entry(model).or_default().insert(benchmark, points);
        }
    }

    log
}

fn parse_dapo_row(line: &str, benchmark: DapoBenchmark) -> Option<DapoPoint> {
    if line.trim().is_empty() || !line.contains('|') {
        return None;
    }

    let cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.len() < 4 {
        return None;
    }

    let step_cell = cells[1];
    if step_cell.is_empty() || !step_cell.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let step = step_cell.parse().ok()?;
    let correct: u32 = match cells[3].replace("**", "").parse() {
        Ok(correct) => correct,
        Err(_) => {
            debug!("Skipping row with unparseable correct count: {}", line);
            return None;
        }
    };

    let total = benchmark.total();
    Some(DapoPoint {
        step,
        correct,
        total,
        accuracy: correct as f64 / total as f64,
    })
}

/// Reads and parses a DAPO markdown file
pub fn load_dapo_markdown(path: &Path) -> std::io::Result<DapoLog> {
    Ok(parse_dapo_markdown(&fs::read_to_string(path)?))
}

/// Accuracies (percent) from the RL rounds journal entry
#[derive(Debug, Clone, PartialEq)]
pub struct RoundsReport {
    /// SFT-7B 63k starting point
    pub baseline: BenchmarkPair,
    /// Results after each RL round
    pub per_round: BTreeMap<u32, BenchmarkPair>,
}

impl Default for RoundsReport {
    fn default() -> Self {
        Self {
            baseline: JOURNAL_SFT_BASELINE,
            per_round: BTreeMap::from(JOURNAL_PER_ROUND),
        }
    }
}

impl RoundsReport {
    /// Results of a round, falling back to the journal's published numbers
    pub fn round(&self, round: u32) -> Option<BenchmarkPair> {
        self.per_round.get(&round).copied().or_else(|| {
            JOURNAL_PER_ROUND
                .iter()
                .find(|(number, _)| *number == round)
                .map(|(_, pair)| *pair)
        })
    }
}

static BASELINE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*SFT-7B\s*63k\s*\|\s*([0-9.]+)%\s*\|\s*([0-9.]+)%\s*\|").unwrap()
});

static ROUNDS_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Performance at each round of RL training[\s\S]*?\n\|[-| ]+\n([\s\S]*?)\n\n")
        .unwrap()
});

/// Parses the SFT baseline row and the per-round results table
///
/// Pieces that are missing keep their published values. A parsed round table
/// replaces the default rounds as a whole.
pub fn parse_rounds_markdown(text: &str) -> RoundsReport {
    let mut report = RoundsReport::default();

    if let Some(captures) = BASELINE_ROW.captures(text) {
        if let (Ok(ss_pro), Ok(os_world_g)) = (captures[1].parse(), captures[2].parse()) {
            report.baseline = BenchmarkPair::new(ss_pro, os_world_g);
        }
    }

    if let Some(captures) = ROUNDS_TABLE.captures(text) {
        let parsed: BTreeMap<u32, BenchmarkPair> = captures[1]
            .lines()
            .filter_map(parse_round_row)
            .collect();

        if !parsed.is_empty() {
            report.per_round = parsed;
        }
    }

    report
}

fn parse_round_row(line: &str) -> Option<(u32, BenchmarkPair)> {
    let cells: Vec<&str> = line
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect();

    if cells.len() < 3 || !cells[0].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let round = cells[0].parse().ok()?;
    let ss_pro = cells[1].replace('%', "").parse().ok()?;
    let os_world_g = cells[2].replace('%', "").parse().ok()?;
    Some((round, BenchmarkPair::new(ss_pro, os_world_g)))
}

/// Reads the rounds journal, using the published numbers if it is unreadable
pub fn load_rounds_markdown(path: &Path) -> RoundsReport {
    match fs::read_to_string(path) {
        Ok(text) => parse_rounds_markdown(&text),
        Err(e) => {
            warn!(
                "Could not read {} ({}); using published round results",
                path.display(),
                e
            );
            RoundsReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    const DAPO_LOG: &str = "\
# DAPO runs

### grpo-7b-run — osworld-g-eval-refined
| Step | Accuracy | Correct | Total |
|------|----------|---------|-------|
| 10 | 0.60 | 340 | 564 |
| 20 | 0.62 | **350** | 564 |
| n/a | 0.62 | 351 | 564 |
| 30 | 0.61 | ? | 564 |

### grpo-7b-run — screenspot-pro-eval
| Step | Accuracy | Correct | Total |
|------|----------|---------|-------|
| 10 | 0.50 | 790 | 1581 |

### grpo-7b-run — osworld-g-eval
| Step | Accuracy | Correct | Total |
|------|----------|---------|-------|
| 10 | 0.55 | 311 | 564 |

### other-run — screenspot-v2
| Step | Accuracy | Correct | Total |
|------|----------|---------|-------|
| 10 | 0.90 | 900 | 1000 |

### empty-run — osworld-g-eval
| Step | Accuracy | Correct | Total |
|------|----------|---------|-------|
";

    #[test]
    fn test_parse_dapo_markdown() {
        let log = parse_dapo_markdown(DAPO_LOG);

        assert_eq!(log.len(), 1);
        let run = &log["grpo-7b-run"];
        assert_eq!(run.len(), 3);

        let refined = &run[&DapoBenchmark::OsWorldGRefined];
        assert_eq!(refined.len(), 2);
        assert_eq!(refined[0].step, 10);
        assert_eq!(refined[1].correct, 350); // bold markers stripped
        assert_eq!(refined[1].total, 564);
        assert!((refined[1].accuracy - 350.0 / 564.0).abs() < 1e-12);

        let ss_pro = &run[&DapoBenchmark::ScreenSpotPro];
        assert_eq!(ss_pro[0].total, 1581);
        assert!((ss_pro[0].accuracy - 790.0 / 1581.0).abs() < 1e-12);

        assert_eq!(run[&DapoBenchmark::OsWorldG][0].correct, 311);
    }

    #[rstest]
    #[case("run — osworld-g-eval-refined", Some(DapoBenchmark::OsWorldGRefined))]
    #[case("run — osworld-g-eval", Some(DapoBenchmark::OsWorldG))]
    #[case("run — screenspot-pro-eval", Some(DapoBenchmark::ScreenSpotPro))]
    #[case("run — screenspot-v2", None)]
    fn test_detect_benchmark(#[case] heading: &str, #[case] expected: Option<DapoBenchmark>) {
        assert_eq!(DapoBenchmark::detect(heading), expected);
    }

    const ROUNDS_JOURNAL: &str = "\
## Results

| Model | SS Pro | OS-World-G |
|-------|--------|------------|
| SFT-7B 63k | 50.5% | 60.7% |

Performance at each round of RL training:

| Round | SS Pro | OS-World-G |
|-------|--------|------------|
| 1 | 51.00% | 62.9% |
| 2 | 53.10% | 63.2% |
| 3 | 54.00% | 64.0% |
| x | 1% | 2% |

More text.
";

    #[test]
    fn test_parse_rounds_markdown() {
        let report = parse_rounds_markdown(ROUNDS_JOURNAL);

        assert_eq!(report.baseline, BenchmarkPair::new(50.5, 60.7));
        assert_eq!(report.per_round.len(), 3);
        assert_eq!(report.round(1), Some(BenchmarkPair::new(51.0, 62.9)));
        assert_eq!(report.round(3), Some(BenchmarkPair::new(54.0, 64.0)));
    }

    #[test]
    fn test_parse_rounds_markdown_partial() {
        let text = "Performance at each round of RL training\n\n| Round | A | B |\n|---|---|---|\n| 1 | 52% | 63% |\n\n";
        let report = parse_rounds_markdown(text);

        // Baseline row missing
        assert_eq!(report.baseline, JOURNAL_SFT_BASELINE);
        assert_eq!(report.round(1), Some(BenchmarkPair::new(52.0, 63.0)));
        // Round 2 absent from the table
        assert_eq!(report.round(2), Some(BenchmarkPair::new(53.57, 63.6)));
        assert_eq!(report.round(5), None);
    }

    #[test]
    fn test_rounds_fallback_when_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let report = load_rounds_markdown(&temp_dir.path().join("missing.md"));
        assert_eq!(report, RoundsReport::default());

        assert_eq!(parse_rounds_markdown("nothing here"), RoundsReport::default());
    }

    #[test]
    fn test_load_dapo_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dapo.md");
        fs::write(&path, DAPO_LOG).unwrap();

        assert_eq!(load_dapo_markdown(&path).unwrap().len(), 1);
        assert!(load_dapo_markdown(&temp_dir.path().join("missing.md")).is_err());
    }
}
