use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiant fort pour un Worker
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catégorie de service (et donc de créneau préféré).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Teaching,
    DirectCare,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Teaching => f.write_str("teaching"),
            Category::DirectCare => f.write_str("direct-care"),
        }
    }
}

/// Intervalle de dates inclusif `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("range end must not be before start".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Membre du planning de jour, candidat aux gardes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Catégorie habituelle, utilisée quand un service n'est pas référencé.
    pub category: Category,
    #[serde(default)]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moonlighting: Vec<DateRange>,
}

impl Worker {
    pub fn new<S: AsRef<str>>(id: S, category: Category) -> Self {
        Self {
            id: WorkerId::new(id),
            category,
            excluded: false,
            moonlighting: Vec::new(),
        }
    }

    pub fn is_moonlighting_on(&self, date: NaiveDate) -> bool {
        self.moonlighting.iter().any(|r| r.contains(date))
    }
}

/// Affectation de jour d'un worker sur un service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub worker: WorkerId,
    pub service: String,
    #[serde(default)]
    pub moonlighting: bool,
    /// Service "source" : seul ce type de service ouvre droit aux gardes.
    #[serde(default = "default_source")]
    pub source: bool,
}

fn default_source() -> bool {
    true
}

impl RosterEntry {
    pub fn new<W: AsRef<str>, S: Into<String>>(worker: W, service: S) -> Self {
        Self {
            worker: WorkerId::new(worker),
            service: service.into(),
            moonlighting: false,
            source: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub entries: Vec<RosterEntry>,
}

/// Planning de jour publié : entrée du moteur, jamais modifiée.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRoster {
    pub workers: Vec<Worker>,
    pub days: Vec<RosterDay>,
}

impl DailyRoster {
    pub fn find_worker<'a>(&'a self, id: &WorkerId) -> Option<&'a Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }

    /// Ajoute une entrée au jour `date`, en créant le jour si besoin.
    pub fn push_entry(&mut self, date: NaiveDate, entry: RosterEntry) {
        match self.days.iter_mut().find(|d| d.date == date) {
            Some(day) => day.entries.push(entry),
            None => self.days.push(RosterDay {
                date,
                entries: vec![entry],
            }),
        }
    }
}
