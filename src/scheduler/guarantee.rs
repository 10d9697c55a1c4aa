use super::rules::{self, Allowance};
use super::select::{self, Scope};
use super::types::{DutyOrigin, Flag, FlagKind, SchedError, SlotKind};
use super::{util, Scheduler};
use crate::model::WorkerId;
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

/// Garde minimale : un worker ayant travaillé au moins une vraie semaine ne
/// finit pas à zéro. Les gardes week-end/férié ne sont jamais déplacées.
pub(super) fn guarantee_minimum(scheduler: &mut Scheduler<'_>) -> Result<(), SchedError> {
    let ctx = scheduler.ctx();
    let block = ctx.block;
    let calendar = block.calendar();

    let starving: Vec<WorkerId> = scheduler
        .ledger
        .states()
        .iter()
        .filter(|(_, s)| !s.weeks_worked.is_empty() && s.total == 0)
        .map(|(w, _)| w.clone())
        .collect();

    for worker in starving {
        let dates: Vec<NaiveDate> = block
            .stretches()
            .chunks_of(&worker)
            .filter(|c| c.counts_as_week())
            .flat_map(|c| c.dates.iter().copied())
            .filter(|d| !calendar.is_weekend_or_holiday(*d))
            .collect();

        if let Some(pick) = select::best_slot(
            &ctx,
            &scheduler.ledger,
            &worker,
            &dates,
            Scope::Any,
            Allowance::STRICT,
        ) {
            scheduler
                .ledger
                .assign(block, &worker, pick.date, pick.slot, DutyOrigin::Guarantee)?;
            debug!(worker = %worker, date = %pick.date, "minimum guaranteed from open slot");
            continue;
        }

        // créneaux tenus par des donneurs à au moins deux gardes
        let mut offers: Vec<(NaiveDate, SlotKind, WorkerId, u32)> = Vec::new();
        for date in &dates {
            for slot in SlotKind::WEEKDAY {
                let Some(donor) = scheduler.ledger.slot(*date, slot) else {
                    continue;
                };
                let Some(state) = scheduler.ledger.state(donor) else {
                    continue;
                };
                let movable = state
                    .duty_on(*date)
                    .is_some_and(|d| d.origin != DutyOrigin::WeekendMatch);
                if donor != &worker && state.total >= 2 && movable {
                    offers.push((*date, slot, donor.clone(), state.total));
                }
            }
        }
        // le plus chargé d'abord, puis le créneau de sa catégorie
        offers.sort_by_key(|(date, slot, donor, total)| {
            let cost = block
                .category_on(&worker, *date)
                .map_or(u32::MAX, |category| select::category_cost(category, *slot));
            (
                Reverse(*total),
                cost,
                util::tiebreak(ctx.seed, &(*date, *slot), donor),
            )
        });

        for (date, slot, donor, _) in offers {
            let (_, origin) = scheduler.ledger.unassign(block, date, slot)?;
            let fits = rules::check(
                block,
                &scheduler.ledger,
                &ctx.opts,
                &worker,
                date,
                slot,
                Allowance::STRICT,
            )
            .is_ok();
            if !fits {
                scheduler.ledger.assign(block, &donor, date, slot, origin)?;
                continue;
            }
            scheduler
                .ledger
                .assign(block, &worker, date, slot, DutyOrigin::Guarantee)?;
            scheduler.events.push(
                Flag::new(
                    FlagKind::GuaranteedSwap,
                    format!("{slot} taken over from {donor}"),
                )
                .worker(&worker)
                .on(date),
            );
            break;
        }
    }
    Ok(())
}
