mod audit;
mod block;
mod doubles;
mod guarantee;
mod matching;
mod rebalance;
mod rules;
mod select;
mod state;
mod stretch;
mod types;
pub(crate) mod util;
mod weekday;
mod weekend;
mod window;

pub use audit::{audit, Violation, ViolationKind};
pub use block::{DayEntry, PreparedBlock};
pub use matching::{AugmentingPath, BipartiteMatcher};
pub use state::{Duty, Ledger, WorkerState};
pub use stretch::{
    build_stretches, split_into_chunks, ChunkId, Stretch, StretchId, StretchIndex, StretchKind,
    WeekChunk,
};
pub use types::{
    DayAssignment, DutyOrigin, EngineOptions, Flag, FlagKind, SchedError, SlotKind,
};
pub use window::{WeekWindow, WindowGroup};

use crate::calendar::days_between;
use crate::model::{Category, WorkerId};
use crate::summary::VariationSummary;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Deux chunks manqués séparés d'au plus ce nombre de jours sont consécutifs.
const CONSECUTIVE_GAP_DAYS: i64 = 9;

/// Paramètres immuables d'un run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx<'a> {
    pub block: &'a PreparedBlock,
    pub opts: EngineOptions,
    pub seed: u64,
}

/// Résultat complet d'un run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub seed: u64,
    pub assignments: BTreeMap<NaiveDate, DayAssignment>,
    pub flags: Vec<Flag>,
    /// Workers exclus absents.
    pub stats: BTreeMap<WorkerId, WorkerState>,
    pub summary: VariationSummary,
}

impl RunOutput {
    pub fn flags_of(&self, kind: FlagKind) -> impl Iterator<Item = &Flag> {
        self.flags.iter().filter(move |f| f.kind == kind)
    }
}

/// Scheduler : un run sur un bloc préparé, phase par phase.
#[derive(Debug)]
pub struct Scheduler<'a> {
    block: &'a PreparedBlock,
    opts: EngineOptions,
    seed: u64,
    ledger: Ledger,
    /// Échanges effectués en cours de run.
    events: Vec<Flag>,
}

impl<'a> Scheduler<'a> {
    pub fn new(block: &'a PreparedBlock, opts: EngineOptions, seed: u64) -> Self {
        Self {
            block,
            opts,
            seed,
            ledger: Ledger::new(block),
            events: Vec::new(),
        }
    }

    pub(crate) fn ctx(&self) -> Ctx<'a> {
        Ctx {
            block: self.block,
            opts: self.opts,
            seed: self.seed,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Accès direct au ledger, pour reprendre un planning déjà partiellement posé.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn match_weekends(&mut self) -> Result<(), SchedError> {
        weekend::match_weekends(self)
    }

    pub fn match_weekends_with<M: BipartiteMatcher>(&mut self, matcher: &M) -> Result<(), SchedError> {
        weekend::match_with(self, matcher)
    }

    pub fn assign_weekdays(&mut self) -> Result<(), SchedError> {
        weekday::assign_weekdays(self)
    }

    pub fn guarantee_minimum(&mut self) -> Result<(), SchedError> {
        guarantee::guarantee_minimum(self)
    }

    pub fn fill_doubles(&mut self) -> Result<(), SchedError> {
        doubles::fill_doubles(self)
    }

    pub fn rebalance(&mut self) -> Result<(), SchedError> {
        rebalance::rebalance(self)
    }

    /// Enchaîne toutes les phases puis assemble la sortie.
    pub fn run(mut self) -> Result<RunOutput, SchedError> {
        self.match_weekends()?;
        self.assign_weekdays()?;
        self.guarantee_minimum()?;
        self.fill_doubles()?;
        self.rebalance()?;
        Ok(self.finish())
    }

    /// Transforme le résidu final en flags et fige la sortie.
    pub fn finish(self) -> RunOutput {
        let mut flags = self.events;
        flags.extend(residual_flags(self.block, &self.ledger));

        let assignments = self.ledger.assignments().clone();
        let stats = self.ledger.states().clone();
        let summary = VariationSummary::compute(self.seed, &assignments, &flags, &stats);
        info!(
            seed = self.seed,
            filled = summary.filled,
            unfilled = summary.unfilled,
            doubles = summary.doubles,
            flags = flags.len(),
            "run finished"
        );
        RunOutput {
            seed: self.seed,
            assignments,
            flags,
            stats,
            summary,
        }
    }
}

/// Un run complet pour un seed.
pub fn run(block: &PreparedBlock, opts: EngineOptions, seed: u64) -> Result<RunOutput, SchedError> {
    Scheduler::new(block, opts, seed).run()
}

/// Variations indépendantes sur le même bloc, évaluées en parallèle.
/// L'ordre de sortie suit celui des seeds.
pub fn run_variations(
    block: &PreparedBlock,
    opts: EngineOptions,
    seeds: &[u64],
) -> Result<Vec<RunOutput>, SchedError> {
    seeds
        .par_iter()
        .map(|seed| run(block, opts, *seed))
        .collect()
}

fn residual_flags(block: &PreparedBlock, ledger: &Ledger) -> Vec<Flag> {
    let calendar = block.calendar();
    let index = block.stretches();
    let mut flags = Vec::new();

    for (date, slot) in ledger.empty_slots(block) {
        flags.push(
            Flag::new(FlagKind::UnfilledSlot, format!("no eligible worker for {slot}")).on(date),
        );
    }

    for (worker, state) in ledger.states() {
        let mut seen = Vec::new();
        for duty in &state.duties {
            if seen.contains(&duty.chunk) {
                continue;
            }
            let in_chunk: Vec<_> = state.duties_in_chunk(duty.chunk).collect();
            if in_chunk.len() >= 2 {
                seen.push(duty.chunk);
                let detail = in_chunk
                    .iter()
                    .map(|d| format!("{} {}", d.date, d.slot))
                    .collect::<Vec<_>>()
                    .join(" + ");
                flags.push(
                    Flag::new(FlagKind::DoubleLongcall, detail)
                        .worker(worker)
                        .on(in_chunk[in_chunk.len() - 1].date),
                );
            }
        }
        for duty in &state.duties {
            if duty.slot == SlotKind::Teaching
                && calendar.is_weekend_or_holiday(duty.date)
                && block.category_on(worker, duty.date) == Some(Category::DirectCare)
            {
                flags.push(
                    Flag::new(
                        FlagKind::CategoryOverride,
                        "direct-care worker on weekend/holiday teaching",
                    )
                    .worker(worker)
                    .on(duty.date),
                );
            }
        }
    }

    for (worker, state) in ledger.states() {
        let chunks: Vec<&WeekChunk> = index
            .chunks_of(worker)
            .filter(|c| c.counts_as_week())
            .collect();
        for chunk in chunks.iter().filter(|c| state.missed_weeks.contains(&c.id)) {
            flags.push(
                Flag::new(
                    FlagKind::NoLongcall,
                    format!("no duty during {}..{}", chunk.start(), chunk.end()),
                )
                .worker(worker)
                .week(chunk.week),
            );
        }

        let mut streak: Vec<&WeekChunk> = Vec::new();
        for chunk in chunks {
            let adjacent = streak
                .last()
                .is_some_and(|prev| days_between(prev.end(), chunk.start()) <= CONSECUTIVE_GAP_DAYS);
            if state.missed_weeks.contains(&chunk.id) && (streak.is_empty() || adjacent) {
                streak.push(chunk);
                continue;
            }
            flush_consecutive(worker, &streak, &mut flags);
            streak.clear();
            if state.missed_weeks.contains(&chunk.id) {
                streak.push(chunk);
            }
        }
        flush_consecutive(worker, &streak, &mut flags);
    }
    flags
}

fn flush_consecutive(worker: &WorkerId, streak: &[&WeekChunk], flags: &mut Vec<Flag>) {
    if streak.len() < 2 {
        return;
    }
    flags.push(
        Flag::new(
            FlagKind::ConsecNoLc,
            format!("{} consecutive week chunks without duty", streak.len()),
        )
        .worker(worker)
        .week(streak[0].week),
    );
}
