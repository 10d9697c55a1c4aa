use crate::model::WorkerId;
use crate::scheduler::{DayAssignment, Flag, FlagKind, RunOutput, WorkerState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Chiffres clés d'une variation, pour comparer des seeds entre eux.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSummary {
    pub seed: u64,
    pub filled: usize,
    pub unfilled: usize,
    pub doubles: usize,
    /// Chunks réels terminés sans garde.
    pub missed: usize,
    pub flags: usize,
    pub workers_with_two_weekends: usize,
    /// Écart de charge parmi les workers ayant au moins une vraie semaine.
    pub min_duties: u32,
    pub max_duties: u32,
}

impl VariationSummary {
    pub fn compute(
        seed: u64,
        assignments: &BTreeMap<NaiveDate, DayAssignment>,
        flags: &[Flag],
        stats: &BTreeMap<WorkerId, WorkerState>,
    ) -> Self {
        let filled = assignments
            .values()
            .map(|day| {
                [&day.teaching, &day.direct_care_1, &day.direct_care_2]
                    .iter()
                    .filter(|s| s.is_some())
                    .count()
            })
            .sum();
        let count = |kind: FlagKind| flags.iter().filter(|f| f.kind == kind).count();
        let active: Vec<u32> = stats
            .values()
            .filter(|s| !s.weeks_worked.is_empty())
            .map(|s| s.total)
            .collect();

        Self {
            seed,
            filled,
            unfilled: count(FlagKind::UnfilledSlot),
            doubles: count(FlagKind::DoubleLongcall),
            missed: stats.values().map(|s| s.missed_weeks.len()).sum(),
            flags: flags.len(),
            workers_with_two_weekends: stats.values().filter(|s| s.weekend >= 2).count(),
            min_duties: active.iter().copied().min().unwrap_or(0),
            max_duties: active.iter().copied().max().unwrap_or(0),
        }
    }

    /// Plus petit d'abord : trous, puis doublons, puis semaines manquées.
    pub fn quality_key(&self) -> (usize, usize, usize, u32) {
        (
            self.unfilled,
            self.doubles,
            self.missed,
            self.max_duties.saturating_sub(self.min_duties),
        )
    }
}

/// Rendu d'un résumé (texte, tableau, ...).
pub trait SummaryRenderer {
    fn render(&self, summaries: &[VariationSummary]) -> String;
}

/// Une ligne par variation, la meilleure marquée d'une étoile.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSummary;

impl SummaryRenderer for TextSummary {
    fn render(&self, summaries: &[VariationSummary]) -> String {
        let best = best_seed(summaries);
        let mut out = String::new();
        for s in summaries {
            let mark = if Some(s.seed) == best { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{mark} seed {seed}: filled {filled}, unfilled {unfilled}, doubles {doubles}, missed {missed}, flags {flags}, 2+ weekends {two}, duties {min}..{max}",
                seed = s.seed,
                filled = s.filled,
                unfilled = s.unfilled,
                doubles = s.doubles,
                missed = s.missed,
                flags = s.flags,
                two = s.workers_with_two_weekends,
                min = s.min_duties,
                max = s.max_duties,
            );
        }
        out
    }
}

/// Seed de la meilleure variation ; à égalité, le plus petit seed.
pub fn best_seed(summaries: &[VariationSummary]) -> Option<u64> {
    summaries
        .iter()
        .min_by_key(|s| (s.quality_key(), s.seed))
        .map(|s| s.seed)
}

pub fn summarize(outputs: &[RunOutput], renderer: &dyn SummaryRenderer) -> String {
    let summaries: Vec<VariationSummary> = outputs.iter().map(|o| o.summary.clone()).collect();
    renderer.render(&summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(seed: u64, unfilled: usize, doubles: usize) -> VariationSummary {
        VariationSummary {
            seed,
            unfilled,
            doubles,
            ..VariationSummary::default()
        }
    }

    #[test]
    fn best_seed_prefers_fewer_holes_then_fewer_doubles() {
        let all = vec![summary(1, 1, 0), summary(2, 0, 3), summary(3, 0, 1), summary(4, 0, 1)];
        assert_eq!(best_seed(&all), Some(3));
        assert_eq!(best_seed(&[]), None);
    }

    #[test]
    fn text_summary_marks_the_best_line() {
        let text = TextSummary.render(&[summary(1, 2, 0), summary(2, 0, 0)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  seed 1:"));
        assert!(lines[1].starts_with("* seed 2:"));
    }
}
