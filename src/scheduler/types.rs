use crate::calendar::IsoWeek;
use crate::model::WorkerId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Options du moteur (voir `config::Rules` pour la surcharge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Seuil de week-ends travaillés pour la première passe de matching.
    pub min_weekends_for_matching: u32,
    /// Plafond dur de gardes week-end/férié par worker.
    pub max_weekend_duties: u32,
    /// Nombre d'ordres essayés par le remplissage en doublon.
    pub double_attempts: u32,
    pub min_gap_days: i64,
    pub preferred_gap_days: i64,
    pub rebalance_rounds: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_weekends_for_matching: 2,
            max_weekend_duties: 2,
            double_attempts: 50,
            min_gap_days: 2,
            preferred_gap_days: 3,
            rebalance_rounds: 10,
        }
    }
}

/// Créneau de garde d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    Teaching,
    DirectCare1,
    DirectCare2,
}

impl SlotKind {
    pub const WEEKDAY: [SlotKind; 3] = [
        SlotKind::Teaching,
        SlotKind::DirectCare1,
        SlotKind::DirectCare2,
    ];
    pub const WEEKEND: [SlotKind; 2] = [SlotKind::Teaching, SlotKind::DirectCare2];

    pub fn slots_for(weekend_or_holiday: bool) -> &'static [SlotKind] {
        if weekend_or_holiday {
            &Self::WEEKEND
        } else {
            &Self::WEEKDAY
        }
    }

    pub fn is_direct_care(self) -> bool {
        !matches!(self, SlotKind::Teaching)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlotKind::Teaching => "teaching",
            SlotKind::DirectCare1 => "direct-care-1",
            SlotKind::DirectCare2 => "direct-care-2",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gardes d'une journée. `direct_care_1` reste vide les week-ends et fériés.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAssignment {
    pub teaching: Option<WorkerId>,
    #[serde(rename = "direct-care-1")]
    pub direct_care_1: Option<WorkerId>,
    #[serde(rename = "direct-care-2")]
    pub direct_care_2: Option<WorkerId>,
}

impl DayAssignment {
    pub fn get(&self, slot: SlotKind) -> Option<&WorkerId> {
        match slot {
            SlotKind::Teaching => self.teaching.as_ref(),
            SlotKind::DirectCare1 => self.direct_care_1.as_ref(),
            SlotKind::DirectCare2 => self.direct_care_2.as_ref(),
        }
    }

    pub(crate) fn get_mut(&mut self, slot: SlotKind) -> &mut Option<WorkerId> {
        match slot {
            SlotKind::Teaching => &mut self.teaching,
            SlotKind::DirectCare1 => &mut self.direct_care_1,
            SlotKind::DirectCare2 => &mut self.direct_care_2,
        }
    }

    pub fn holds(&self, worker: &WorkerId) -> bool {
        SlotKind::WEEKDAY
            .iter()
            .any(|s| self.get(*s) == Some(worker))
    }
}

/// Phase ayant produit une garde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DutyOrigin {
    WeekendMatch,
    Weekday,
    Guarantee,
    Double,
    Rebalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    UnfilledSlot,
    DoubleLongcall,
    GuaranteedSwap,
    MissedSwap,
    ConsecNoLc,
    NoLongcall,
    CategoryOverride,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::UnfilledSlot => "UNFILLED_SLOT",
            FlagKind::DoubleLongcall => "DOUBLE_LONGCALL",
            FlagKind::GuaranteedSwap => "GUARANTEED_SWAP",
            FlagKind::MissedSwap => "MISSED_SWAP",
            FlagKind::ConsecNoLc => "CONSEC_NO_LC",
            FlagKind::NoLongcall => "NO_LONGCALL",
            FlagKind::CategoryOverride => "CATEGORY_OVERRIDE",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relâchement de règle ou pénurie ; jamais une erreur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: FlagKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<IsoWeek>,
    pub detail: String,
}

impl Flag {
    pub fn new(kind: FlagKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            worker: None,
            date: None,
            week: None,
            detail: detail.into(),
        }
    }

    pub fn worker(mut self, worker: &WorkerId) -> Self {
        self.worker = Some(worker.clone());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn week(mut self, week: IsoWeek) -> Self {
        self.week = Some(week);
        self
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(date) = self.date {
            write!(f, " {date}")?;
        } else if let Some(week) = self.week {
            write!(f, " {week}")?;
        }
        if let Some(worker) = &self.worker {
            write!(f, " [{worker}]")?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("unknown worker: {0}")]
    UnknownWorker(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("missing configuration field: {0}")]
    MissingField(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no {slot} slot on {date}")]
    NoSuchSlot { date: NaiveDate, slot: SlotKind },
    #[error("{slot} slot on {date} is already filled")]
    SlotOccupied { date: NaiveDate, slot: SlotKind },
    #[error("{slot} slot on {date} is empty")]
    SlotEmpty { date: NaiveDate, slot: SlotKind },
    #[error("worker {worker} is not rostered on {date}")]
    NotRostered { worker: String, date: NaiveDate },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
