//! Remplissage des créneaux restés vides, au besoin par une seconde garde
//! dans le même chunk (un jour de semaine + un week-end/férié).

use super::rules::{self, Allowance, Quality};
use super::state::Ledger;
use super::types::{DutyOrigin, SchedError, SlotKind};
use super::{util, Ctx, Scheduler};
use crate::model::WorkerId;
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Clé de classement d'un candidat : la plus petite gagne.
type CandidateKey = (bool, bool, bool, bool, u32, bool, u32, u64);

pub(super) fn fill_doubles(scheduler: &mut Scheduler<'_>) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    let empty = scheduler.ledger.empty_slots(ctx.block);
    if empty.is_empty() {
        return Ok(());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);
    let mut best: Option<((usize, u32), Ledger)> = None;
    for attempt in 0..ctx.opts.double_attempts {
        let order = ordering(&ctx, &empty, attempt, &mut rng);
        let mut ledger = scheduler.ledger.clone();
        for (date, slot) in order {
            fill_one(&ctx, &mut ledger, date, slot)?;
        }
        let score = (ledger.empty_slots(ctx.block).len(), ledger.doubles_count());
        debug!(attempt, unfilled = score.0, doubles = score.1, "doubles attempt");
        if best.as_ref().map_or(true, |(b, _)| score < *b) {
            best = Some((score, ledger));
        }
        if best.as_ref().is_some_and(|((unfilled, _), _)| *unfilled == 0) {
            break;
        }
    }

    if let Some((score, ledger)) = best {
        debug!(unfilled = score.0, doubles = score.1, "doubles filler kept best ordering");
        scheduler.ledger = ledger;
    }
    Ok(())
}

/// Premier essai : week-ends et fériés d'abord, puis ordre chronologique ;
/// essais suivants : ordre tiré du run seed.
fn ordering(
    ctx: &Ctx<'_>,
    empty: &[(NaiveDate, SlotKind)],
    attempt: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<(NaiveDate, SlotKind)> {
    let mut order = empty.to_vec();
    if attempt == 0 {
        let calendar = ctx.block.calendar();
        order.sort_by_key(|(date, slot)| (!calendar.is_weekend_or_holiday(*date), *date, *slot));
    } else {
        order.shuffle(rng);
    }
    order
}

fn fill_one(
    ctx: &Ctx<'_>,
    ledger: &mut Ledger,
    date: NaiveDate,
    slot: SlotKind,
) -> Result<(), SchedError> {
    let relaxed = Allowance {
        double: true,
        category_override: false,
    };
    let chosen = best_candidate(ctx, ledger, date, slot, relaxed).or_else(|| {
        best_candidate(
            ctx,
            ledger,
            date,
            slot,
            Allowance {
                category_override: true,
                ..relaxed
            },
        )
    });
    let Some((worker, quality)) = chosen else {
        return Ok(());
    };
    let origin = if quality.double {
        DutyOrigin::Double
    } else {
        DutyOrigin::Weekday
    };
    ledger.assign(ctx.block, &worker, date, slot, origin)
}

fn best_candidate(
    ctx: &Ctx<'_>,
    ledger: &Ledger,
    date: NaiveDate,
    slot: SlotKind,
    allow: Allowance,
) -> Option<(WorkerId, Quality)> {
    ctx.block
        .entries_on(date)
        .iter()
        .filter_map(|entry| {
            let quality =
                rules::check(ctx.block, ledger, &ctx.opts, &entry.worker, date, slot, allow).ok()?;
            let key = candidate_key(ctx, ledger, &entry.worker, date, slot, &quality)?;
            Some((key, entry.worker.clone(), quality))
        })
        .min_by_key(|(key, _, _)| *key)
        .map(|(_, worker, quality)| (worker, quality))
}

fn candidate_key(
    ctx: &Ctx<'_>,
    ledger: &Ledger,
    worker: &WorkerId,
    date: NaiveDate,
    slot: SlotKind,
    quality: &Quality,
) -> Option<CandidateKey> {
    let state = ledger.state(worker)?;
    let no_makeup = state.missed_weeks.is_empty();
    let weekend_penalty = quality.weekend && state.weekend >= 1;
    let low_weekend_penalty = quality.weekend && state.weekends_worked < 2;
    Some((
        quality.double,
        no_makeup,
        quality.short_gap(&ctx.opts),
        weekend_penalty,
        state.doubles(),
        low_weekend_penalty,
        state.total,
        util::tiebreak(ctx.seed, &(date, slot), worker),
    ))
}
