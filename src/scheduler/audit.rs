//! Contrôle a posteriori d'un planning de gardes.

use super::block::PreparedBlock;
use super::types::{DayAssignment, EngineOptions, SlotKind};
use crate::calendar::{days_between, IsoWeek};
use crate::model::{Category, WorkerId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Deux gardes de semaine dans le même chunk.
    TwoWeekdayDouble,
    /// Férié doublé avec une autre garde du même chunk.
    HolidayDouble,
    WeekendCap,
    DirectCare1OnWeekend,
    DirectCareOnWeekdayTeaching,
    TwoWeekdaysInWeek,
    /// Worker absent, exclu, en moonlighting ou date hors bloc.
    IneligibleAssignee,
    GapTooShort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} [{}]: {}", self.kind, self.date, self.worker, self.detail)
    }
}

/// Vérifie les règles dures sur des affectations (issues d'un run ou
/// rechargées depuis le disque).
pub fn audit(
    block: &PreparedBlock,
    opts: &EngineOptions,
    assignments: &BTreeMap<NaiveDate, DayAssignment>,
) -> Vec<Violation> {
    let calendar = block.calendar();
    let mut out = Vec::new();
    let mut per_worker: BTreeMap<&WorkerId, Vec<(NaiveDate, SlotKind)>> = BTreeMap::new();

    for (date, day) in assignments {
        for slot in SlotKind::WEEKDAY {
            let Some(worker) = day.get(slot) else {
                continue;
            };
            per_worker.entry(worker).or_default().push((*date, slot));
            let violation = |kind, detail: String| Violation {
                kind,
                worker: worker.clone(),
                date: *date,
                detail,
            };

            if !calendar.contains(*date) || !block.is_eligible_on(worker, *date) {
                out.push(violation(
                    ViolationKind::IneligibleAssignee,
                    format!("{slot} held while not eligible"),
                ));
                continue;
            }
            let weekend = calendar.is_weekend_or_holiday(*date);
            if weekend && slot == SlotKind::DirectCare1 {
                out.push(violation(
                    ViolationKind::DirectCare1OnWeekend,
                    "direct-care-1 does not exist on weekends and holidays".to_string(),
                ));
            }
            if !weekend
                && slot == SlotKind::Teaching
                && block.category_on(worker, *date) == Some(Category::DirectCare)
            {
                out.push(violation(
                    ViolationKind::DirectCareOnWeekdayTeaching,
                    "direct-care worker on weekday teaching".to_string(),
                ));
            }
        }
    }

    for (worker, duties) in per_worker {
        check_worker(block, opts, worker, &duties, &mut out);
    }
    out
}

fn check_worker(
    block: &PreparedBlock,
    opts: &EngineOptions,
    worker: &WorkerId,
    duties: &[(NaiveDate, SlotKind)],
    out: &mut Vec<Violation>,
) {
    let calendar = block.calendar();
    let weekend: Vec<NaiveDate> = duties
        .iter()
        .map(|(d, _)| *d)
        .filter(|d| calendar.is_weekend_or_holiday(*d))
        .collect();
    if weekend.len() as u32 > opts.max_weekend_duties {
        if let Some(last) = weekend.last() {
            out.push(Violation {
                kind: ViolationKind::WeekendCap,
                worker: worker.clone(),
                date: *last,
                detail: format!("{} weekend/holiday duties", weekend.len()),
            });
        }
    }

    let mut weeks: BTreeMap<IsoWeek, Vec<NaiveDate>> = BTreeMap::new();
    for (date, _) in duties {
        if !calendar.is_weekend_or_holiday(*date) {
            weeks.entry(IsoWeek::of(*date)).or_default().push(*date);
        }
    }
    for (week, dates) in weeks {
        if dates.len() > 1 {
            out.push(Violation {
                kind: ViolationKind::TwoWeekdaysInWeek,
                worker: worker.clone(),
                date: dates[1],
                detail: format!("{} weekday duties in {week}", dates.len()),
            });
        }
    }

    let index = block.stretches();
    for (i, (a, _)) in duties.iter().enumerate() {
        for (b, _) in duties.iter().skip(i + 1) {
            let (Some(ca), Some(cb)) = (index.locate(worker, *a), index.locate(worker, *b)) else {
                continue;
            };
            if ca.stretch != cb.stretch {
                continue;
            }
            let gap = days_between(*a, *b).abs();
            if gap < opts.min_gap_days {
                out.push(Violation {
                    kind: ViolationKind::GapTooShort,
                    worker: worker.clone(),
                    date: *b,
                    detail: format!("{gap} day(s) after {a}"),
                });
            }
            if ca.id == cb.id
                && !calendar.is_weekend_or_holiday(*a)
                && !calendar.is_weekend_or_holiday(*b)
            {
                out.push(Violation {
                    kind: ViolationKind::TwoWeekdayDouble,
                    worker: worker.clone(),
                    date: *b,
                    detail: format!("second weekday duty after {a} in the same week chunk"),
                });
            }
            if ca.id == cb.id && (calendar.is_holiday(*a) || calendar.is_holiday(*b)) {
                out.push(Violation {
                    kind: ViolationKind::HolidayDouble,
                    worker: worker.clone(),
                    date: *b,
                    detail: format!("double with {a} involves a holiday"),
                });
            }
        }
    }
}
