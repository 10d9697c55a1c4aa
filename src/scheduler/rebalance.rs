use super::rules::{self, Allowance};
use super::stretch::ChunkId;
use super::types::{DutyOrigin, Flag, FlagKind, SchedError, SlotKind};
use super::{util, Scheduler};
use crate::model::WorkerId;
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

/// Rééquilibrage final : un worker à deux semaines manquées ou plus récupère
/// une garde d'un donneur sans semaine manquée, le plus chargé d'abord.
pub(super) fn rebalance(scheduler: &mut Scheduler<'_>) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    for round in 0..ctx.opts.rebalance_rounds {
        let mut receivers: Vec<(WorkerId, usize)> = scheduler
            .ledger
            .states()
            .iter()
            .filter(|(_, s)| s.missed_weeks.len() >= 2)
            .map(|(w, s)| (w.clone(), s.missed_weeks.len()))
            .collect();
        receivers.sort_by_key(|(w, missed)| {
            (Reverse(*missed), util::tiebreak(ctx.seed, &round, w))
        });

        let mut swaps = 0usize;
        for (receiver, _) in receivers {
            let missed: Vec<ChunkId> = match scheduler.ledger.state(&receiver) {
                Some(s) if s.missed_weeks.len() >= 2 => s.missed_weeks.iter().copied().collect(),
                _ => continue,
            };
            for chunk in missed {
                if swap_into(scheduler, &receiver, chunk)? {
                    swaps += 1;
                    break;
                }
            }
        }
        debug!(round, swaps, "rebalance round");
        if swaps == 0 {
            break;
        }
    }
    Ok(())
}

fn swap_into(
    scheduler: &mut Scheduler<'_>,
    receiver: &WorkerId,
    chunk: ChunkId,
) -> Result<bool, SchedError> {
    let ctx = scheduler.ctx();
    let block = ctx.block;
    let calendar = block.calendar();
    let receiver_weekend = scheduler
        .ledger
        .state(receiver)
        .map_or(0, |s| s.weekend);

    let mut offers: Vec<(NaiveDate, SlotKind, WorkerId, u32)> = Vec::new();
    for date in &block.stretches().chunk(chunk).dates {
        let weekend = calendar.is_weekend_or_holiday(*date);
        if weekend && receiver_weekend >= 1 {
            continue;
        }
        for slot in SlotKind::slots_for(weekend) {
            let Some(donor) = scheduler.ledger.slot(*date, *slot) else {
                continue;
            };
            let Some(state) = scheduler.ledger.state(donor) else {
                continue;
            };
            let movable = state
                .duty_on(*date)
                .is_some_and(|d| d.origin != DutyOrigin::WeekendMatch);
            if donor != receiver && state.missed_weeks.is_empty() && movable {
                offers.push((*date, *slot, donor.clone(), state.total));
            }
        }
    }
    offers.sort_by_key(|(date, slot, donor, total)| {
        (Reverse(*total), util::tiebreak(ctx.seed, &(*date, *slot), donor))
    });

    for (date, slot, donor, _) in offers {
        let (_, origin) = scheduler.ledger.unassign(block, date, slot)?;
        let fits = rules::check(
            block,
            &scheduler.ledger,
            &ctx.opts,
            receiver,
            date,
            slot,
            Allowance::STRICT,
        )
        .is_ok_and(|q| !q.short_gap(&ctx.opts));
        if !fits {
            scheduler.ledger.assign(block, &donor, date, slot, origin)?;
            continue;
        }
        scheduler
            .ledger
            .assign(block, receiver, date, slot, DutyOrigin::Rebalance)?;
        scheduler.events.push(
            Flag::new(FlagKind::MissedSwap, format!("{slot} taken over from {donor}"))
                .worker(receiver)
                .on(date),
        );
        return Ok(true);
    }
    Ok(false)
}
