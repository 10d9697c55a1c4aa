//! Contrôle central des règles dures avant toute pose de garde.

use super::block::PreparedBlock;
use super::state::Ledger;
use super::types::{EngineOptions, SlotKind};
use crate::calendar::{days_between, IsoWeek};
use crate::model::{Category, WorkerId};
use chrono::NaiveDate;

/// Relâchements autorisés par la phase appelante.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Allowance {
    /// Seconde garde dans le même chunk.
    pub double: bool,
    /// Direct-care sur le créneau teaching d'un week-end ou férié.
    pub category_override: bool,
}

impl Allowance {
    pub(super) const STRICT: Allowance = Allowance {
        double: false,
        category_override: false,
    };
}

/// Caractéristiques d'une pose acceptée, utilisées pour le classement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Quality {
    pub double: bool,
    pub category_override: bool,
    pub weekend: bool,
    /// Plus petit écart avec une autre garde du même stretch.
    pub gap: Option<i64>,
}

impl Quality {
    pub(super) fn short_gap(&self, opts: &EngineOptions) -> bool {
        self.gap.is_some_and(|g| g < opts.preferred_gap_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Rejection {
    SlotUnavailable,
    NotEligible,
    Category,
    WeekdayInWeek,
    WeekendCap,
    ChunkFull,
    TwoWeekdays,
    TwoWeekends,
    /// Un férié ne se double jamais, dans un sens comme dans l'autre.
    HolidayDouble,
    GapTooShort,
}

/// Vérifie qu'une pose respecte toutes les règles dures.
pub(super) fn check(
    block: &PreparedBlock,
    ledger: &Ledger,
    opts: &EngineOptions,
    worker: &WorkerId,
    date: NaiveDate,
    slot: SlotKind,
    allow: Allowance,
) -> Result<Quality, Rejection> {
    if !ledger.is_open(block, date, slot) {
        return Err(Rejection::SlotUnavailable);
    }
    if !block.is_eligible_on(worker, date) {
        return Err(Rejection::NotEligible);
    }
    let (Some(chunk), Some(state), Some(category)) = (
        block.stretches().locate(worker, date),
        ledger.state(worker),
        block.category_on(worker, date),
    ) else {
        return Err(Rejection::NotEligible);
    };

    let weekend = block.calendar().is_weekend_or_holiday(date);
    let mut category_override = false;
    if category == Category::DirectCare && slot == SlotKind::Teaching {
        if !weekend || !allow.category_override {
            return Err(Rejection::Category);
        }
        category_override = true;
    }

    if weekend {
        if state.weekend >= opts.max_weekend_duties {
            return Err(Rejection::WeekendCap);
        }
    } else {
        let week = IsoWeek::of(date);
        if state
            .duties
            .iter()
            .any(|d| !d.weekend && IsoWeek::of(d.date) == week)
        {
            return Err(Rejection::WeekdayInWeek);
        }
    }

    let mut in_chunk = state.duties_in_chunk(chunk.id);
    let double = match (in_chunk.next(), in_chunk.next()) {
        (None, _) => false,
        (Some(_), Some(_)) => return Err(Rejection::ChunkFull),
        (Some(existing), None) => {
            if !allow.double {
                return Err(Rejection::ChunkFull);
            }
            match (existing.weekend, weekend) {
                (false, false) => return Err(Rejection::TwoWeekdays),
                (true, true) => return Err(Rejection::TwoWeekends),
                _ => {}
            }
            let calendar = block.calendar();
            if calendar.is_holiday(date)
                || state
                    .duties_in_stretch(chunk.stretch)
                    .any(|d| calendar.is_holiday(d.date))
            {
                return Err(Rejection::HolidayDouble);
            }
            true
        }
    };

    let gap = state
        .duties_in_stretch(chunk.stretch)
        .map(|d| days_between(d.date, date).abs())
        .min();
    if gap.is_some_and(|g| g < opts.min_gap_days) {
        return Err(Rejection::GapTooShort);
    }

    Ok(Quality {
        double,
        category_override,
        weekend,
        gap,
    })
}
