//! Gardes week-end et férié par couplage biparti, avant toute garde de semaine.

use super::matching::{AugmentingPath, BipartiteMatcher};
use super::rules::{self, Allowance};
use super::types::{DutyOrigin, SchedError, SlotKind};
use super::{util, Scheduler};
use crate::model::{Category, WorkerId};
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

pub(super) fn match_weekends(scheduler: &mut Scheduler<'_>) -> Result<(), SchedError> {
    match_with(scheduler, &AugmentingPath)
}

pub(super) fn match_with<M: BipartiteMatcher>(
    scheduler: &mut Scheduler<'_>,
    matcher: &M,
) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    let block = ctx.block;
    let calendar = block.calendar();

    let slots: Vec<(NaiveDate, SlotKind)> = calendar
        .dates()
        .filter(|d| calendar.is_weekend_or_holiday(*d))
        .flat_map(|d| SlotKind::WEEKEND.iter().map(move |s| (d, *s)))
        .collect();
    let workers: Vec<&WorkerId> = block.stretches().workers().collect();
    let weekends = |w: usize| block.weekends_worked(workers[w]);
    // week-end isolé : ne compte pas comme semaine travaillée
    let standalone = |w: usize, date: NaiveDate| {
        block
            .stretches()
            .locate(workers[w], date)
            .map_or(true, |chunk| !chunk.counts_as_week())
    };

    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(slots.len());
    for (date, slot) in &slots {
        let mut candidates: Vec<(usize, (bool, u32, Reverse<u32>, u64))> = workers
            .iter()
            .enumerate()
            .filter_map(|(i, w)| {
                rules::check(block, &scheduler.ledger, &ctx.opts, w, *date, *slot, Allowance::STRICT)
                    .ok()?;
                let mismatch = match block.category_on(w, *date)? {
                    Category::Teaching => u32::from(slot.is_direct_care()),
                    Category::DirectCare => 0,
                };
                let key = (
                    standalone(i, *date),
                    mismatch,
                    Reverse(weekends(i)),
                    util::tiebreak(ctx.seed, &(*date, *slot), w),
                );
                Some((i, key))
            })
            .collect();
        candidates.sort_by_key(|(_, key)| *key);
        edges.push(candidates.into_iter().map(|(i, _)| i).collect());
    }

    // (a) workers avec assez de week-ends travaillés
    let threshold = ctx.opts.min_weekends_for_matching;
    let restricted: Vec<Vec<usize>> = edges
        .iter()
        .map(|e| e.iter().copied().filter(|w| weekends(*w) >= threshold).collect())
        .collect();
    let mut matching: Vec<Option<usize>> = vec![None; slots.len()];
    matcher.extend(&restricted, workers.len(), &mut matching);
    let first_pass = matching.iter().flatten().count();

    // (b) tout le vivier, sans défaire ce qui est couplé
    if first_pass < slots.len() {
        matcher.extend(&edges, workers.len(), &mut matching);
    }

    // (c) soulager les workers n'ayant qu'un week-end
    let mut taken = vec![false; workers.len()];
    for w in matching.iter().flatten() {
        taken[*w] = true;
    }
    let mut swaps = 0usize;
    for (left, matched) in matching.iter_mut().enumerate() {
        let Some(current) = *matched else { continue };
        if weekends(current) > 1 {
            continue;
        }
        let date = slots[left].0;
        let keeps_week = !standalone(current, date);
        let replacement = edges[left].iter().copied().find(|w| {
            !taken[*w]
                && weekends(*w) > weekends(current)
                && !(keeps_week && standalone(*w, date))
        });
        if let Some(other) = replacement {
            taken[current] = false;
            taken[other] = true;
            *matched = Some(other);
            swaps += 1;
        }
    }

    let mut placed = 0usize;
    for (left, matched) in matching.iter().enumerate() {
        let Some(w) = matched else { continue };
        let (date, slot) = slots[left];
        scheduler
            .ledger
            .assign(block, workers[*w], date, slot, DutyOrigin::WeekendMatch)?;
        placed += 1;
    }

    debug!(
        slots = slots.len(),
        restricted = first_pass,
        placed,
        swaps,
        "weekend matching done"
    );
    Ok(())
}
