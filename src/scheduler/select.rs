use super::rules::{self, Allowance, Quality};
use super::state::Ledger;
use super::types::SlotKind;
use super::{util, Ctx};
use crate::model::{Category, WorkerId};
use chrono::{Datelike, NaiveDate};

/// Créneaux qu'un besoin peut viser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    /// Créneaux teaching uniquement.
    TeachingOnly,
    /// Tous créneaux ; un teaching ne déborde sur direct-care que si aucun
    /// teaching n'est libre sur ses dates.
    Any,
}

/// Créneau retenu pour un worker.
#[derive(Debug, Clone, Copy)]
pub(super) struct Pick {
    pub date: NaiveDate,
    pub slot: SlotKind,
    pub quality: Quality,
}

/// Meilleur créneau vide et admissible parmi `dates`, sans retour arrière.
pub(super) fn best_slot(
    ctx: &Ctx<'_>,
    ledger: &Ledger,
    worker: &WorkerId,
    dates: &[NaiveDate],
    scope: Scope,
    allow: Allowance,
) -> Option<Pick> {
    let calendar = ctx.block.calendar();
    let mut picks: Vec<(Pick, Category)> = Vec::new();
    for date in dates {
        let Some(category) = ctx.block.category_on(worker, *date) else {
            continue;
        };
        for slot in SlotKind::slots_for(calendar.is_weekend_or_holiday(*date)) {
            if scope == Scope::TeachingOnly && *slot != SlotKind::Teaching {
                continue;
            }
            if let Ok(quality) =
                rules::check(ctx.block, ledger, &ctx.opts, worker, *date, *slot, allow)
            {
                picks.push((
                    Pick {
                        date: *date,
                        slot: *slot,
                        quality,
                    },
                    category,
                ));
            }
        }
    }

    let teaching_open = picks
        .iter()
        .any(|(p, c)| *c == Category::Teaching && p.slot == SlotKind::Teaching);
    if teaching_open {
        picks.retain(|(p, c)| !(*c == Category::Teaching && p.slot.is_direct_care()));
    }

    let state = ledger.state(worker)?;
    picks
        .into_iter()
        .min_by_key(|(p, category)| {
            let mut score = category_cost(*category, p.slot);
            let day = p.date.weekday().num_days_from_monday() as usize;
            score += 3 * state.weekday_histogram[day];
            score += match p.slot {
                SlotKind::DirectCare1 if state.direct_care_1 > state.direct_care_2 => 2,
                SlotKind::DirectCare2 if state.direct_care_2 > state.direct_care_1 => 2,
                _ => 0,
            };
            if p.quality.short_gap(&ctx.opts) {
                score += 4;
            }
            (score, util::tiebreak(ctx.seed, &(p.date, p.slot), worker))
        })
        .map(|(p, _)| p)
}

pub(super) fn category_cost(category: Category, slot: SlotKind) -> u32 {
    match (category, slot) {
        (Category::Teaching, SlotKind::Teaching) => 0,
        (Category::DirectCare, SlotKind::DirectCare1 | SlotKind::DirectCare2) => 1,
        (Category::Teaching, _) => 5,
        // couverture de dernier recours, filtrée en amont en semaine
        (Category::DirectCare, SlotKind::Teaching) => 10,
    }
}
