//! Placement des gardes de semaine, semaine ISO par semaine ISO.

use super::rules::Allowance;
use super::select::{self, Scope};
use super::state::Ledger;
use super::stretch::{ChunkId, WeekChunk};
use super::types::{DutyOrigin, SchedError, SlotKind};
use super::window::{WeekWindow, WindowGroup};
use super::{util, Ctx, Scheduler};
use crate::calendar::IsoWeek;
use crate::model::{Category, WorkerId};
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

/// Besoin de garde d'une semaine.
#[derive(Debug, Clone)]
struct Need<'a> {
    chunk: &'a WeekChunk,
    category: Category,
}

/// Clé de priorité : la plus petite passe en premier.
type Rank = (bool, Reverse<usize>, bool, u32, Reverse<usize>, u64);

pub(super) fn assign_weekdays(scheduler: &mut Scheduler<'_>) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    let calendar = ctx.block.calendar();
    let mut window = Some(WeekWindow::first(calendar));
    while let Some(current) = window {
        assign_week(scheduler, &current)?;
        let served = current.served_on_weekend(ctx.block.stretches(), &scheduler.ledger);
        window = current.next(calendar, served);
    }
    Ok(())
}

fn assign_week(scheduler: &mut Scheduler<'_>, window: &WeekWindow) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    let block = ctx.block;
    let index = block.stretches();

    let mut needs: Vec<Need<'_>> = Vec::new();
    for stretch in index.stretches() {
        if !matches!(window.classify(stretch), Some(WindowGroup::A | WindowGroup::C)) {
            continue;
        }
        if window.served_previous.contains(&stretch.id) {
            continue;
        }
        for chunk in stretch.chunks.iter().map(|c| index.chunk(*c)) {
            if chunk.week != window.week || !chunk.is_need() {
                continue;
            }
            if has_duty(&scheduler.ledger, &chunk.worker, chunk.id) {
                continue;
            }
            if let Some(category) = block.chunk_category(chunk) {
                needs.push(Need { chunk, category });
            }
        }
    }

    let mut capacity = window
        .dates()
        .flat_map(|d| {
            SlotKind::slots_for(block.calendar().is_weekend_or_holiday(d))
                .iter()
                .map(move |s| (d, *s))
        })
        .filter(|(d, s)| scheduler.ledger.is_open(block, *d, *s))
        .count();
    let total_needs = needs.len();

    // passe 1 : besoins teaching sur créneaux teaching
    let (mut teaching, mut rest): (Vec<Need<'_>>, Vec<Need<'_>>) = needs
        .into_iter()
        .partition(|n| n.category == Category::Teaching);
    sort_needs(&ctx, &scheduler.ledger, window.week, &mut teaching);
    let mut placed = 0usize;
    for need in teaching {
        if capacity == 0 {
            break;
        }
        if place(scheduler, window, &need, Scope::TeachingOnly)? {
            capacity -= 1;
            placed += 1;
        } else {
            rest.push(need);
        }
    }

    // passe 2 : direct-care et teaching restants (débordement possible)
    sort_needs(&ctx, &scheduler.ledger, window.week, &mut rest);
    for need in rest {
        if capacity == 0 {
            break;
        }
        if place(scheduler, window, &need, Scope::Any)? {
            capacity -= 1;
            placed += 1;
        }
    }

    debug!(
        week = %window.week,
        needs = total_needs,
        placed,
        served_previous = window.served_previous.len(),
        "weekday window done"
    );
    Ok(())
}

fn place(
    scheduler: &mut Scheduler<'_>,
    window: &WeekWindow,
    need: &Need<'_>,
    scope: Scope,
) -> Result<bool, SchedError> {
    let ctx = scheduler.ctx();
    let calendar = ctx.block.calendar();
    // besoin réel : jours ouvrés ; week-end isolé : jours de week-end libres
    let dates: Vec<NaiveDate> = if need.chunk.standalone {
        let free = scheduler
            .ledger
            .state(&need.chunk.worker)
            .is_some_and(|s| s.weekend == 0);
        if !free {
            return Ok(false);
        }
        need.chunk
            .dates
            .iter()
            .copied()
            .filter(|d| window.weekend.contains(d))
            .collect()
    } else {
        need.chunk
            .dates
            .iter()
            .copied()
            .filter(|d| !calendar.is_weekend_or_holiday(*d))
            .collect()
    };

    let Some(pick) = select::best_slot(
        &ctx,
        &scheduler.ledger,
        &need.chunk.worker,
        &dates,
        scope,
        Allowance::STRICT,
    ) else {
        return Ok(false);
    };
    scheduler.ledger.assign(
        ctx.block,
        &need.chunk.worker,
        pick.date,
        pick.slot,
        DutyOrigin::Weekday,
    )?;
    Ok(true)
}

fn sort_needs(ctx: &Ctx<'_>, ledger: &Ledger, week: IsoWeek, needs: &mut [Need<'_>]) {
    needs.sort_by_cached_key(|n| rank(ctx, ledger, week, n.chunk));
}

fn rank(ctx: &Ctx<'_>, ledger: &Ledger, week: IsoWeek, chunk: &WeekChunk) -> Rank {
    let worker = &chunk.worker;
    let Some(state) = ledger.state(worker) else {
        return (true, Reverse(0), true, u32::MAX, Reverse(0), u64::MAX);
    };
    let index = ctx.block.stretches();
    let earlier: Vec<&WeekChunk> = index
        .chunks_of(worker)
        .filter(|c| c.counts_as_week() && c.end() < chunk.start())
        .collect();
    let previous_missed = earlier
        .iter()
        .max_by_key(|c| c.end())
        .is_some_and(|c| state.missed_weeks.contains(&c.id));
    let missed_before = earlier
        .iter()
        .filter(|c| state.missed_weeks.contains(&c.id))
        .count();
    (
        !previous_missed,
        Reverse(missed_before),
        chunk.standalone,
        state.total,
        Reverse(state.weeks_worked.len()),
        util::tiebreak(ctx.seed, &week, worker),
    )
}

fn has_duty(ledger: &Ledger, worker: &WorkerId, chunk: ChunkId) -> bool {
    ledger
        .state(worker)
        .is_some_and(|s| s.duties_in_chunk(chunk).next().is_some())
}
