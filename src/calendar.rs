use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Semaine ISO (lundi → dimanche).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl IsoWeek {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Calendrier du bloc : bornes et jours fériés.
#[derive(Debug, Clone)]
pub struct Calendar {
    start: NaiveDate,
    end: NaiveDate,
    holidays: BTreeSet<NaiveDate>,
}

impl Calendar {
    /// Seuls les fériés compris dans le bloc sont retenus.
    pub fn new(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> Self {
        let holidays = holidays
            .iter()
            .copied()
            .filter(|d| start <= *d && *d <= end)
            .collect();
        Self {
            start,
            end,
            holidays,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Samedi, dimanche ou férié : deux créneaux, pas de direct-care-1.
    pub fn is_weekend_or_holiday(&self, date: NaiveDate) -> bool {
        is_weekend(date) || self.is_holiday(date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |d| *d <= self.end)
    }

    pub fn holidays(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Samedi du week-end contenant `date` (samedi ou dimanche).
pub fn weekend_saturday(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date),
        Weekday::Sun => Some(date - Duration::days(1)),
        _ => None,
    }
}

pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}
