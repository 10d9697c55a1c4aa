use super::stretch::{build_stretches, StretchIndex, WeekChunk};
use super::SchedError;
use crate::calendar::{weekend_saturday, Calendar};
use crate::config::BlockConfig;
use crate::model::{Category, DailyRoster, Worker, WorkerId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Présence d'un worker sur un service source un jour donné.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub worker: WorkerId,
    pub category: Category,
    pub moonlighting: bool,
}

/// Entrée immuable du moteur : planning filtré sur le bloc, stretches et
/// compteurs dérivés. Partagée en lecture seule entre variations.
#[derive(Debug, Clone)]
pub struct PreparedBlock {
    calendar: Calendar,
    workers: BTreeMap<WorkerId, Worker>,
    excluded: BTreeSet<WorkerId>,
    days: BTreeMap<NaiveDate, Vec<DayEntry>>,
    stretches: StretchIndex,
    weekends_worked: BTreeMap<WorkerId, u32>,
}

impl PreparedBlock {
    /// Valide le planning et la configuration puis dérive les stretches.
    ///
    /// Toute référence non résolue est fatale : aucune phase ne s'exécute.
    pub fn new(roster: &DailyRoster, config: &BlockConfig) -> Result<Self, SchedError> {
        config.validate()?;
        let calendar = Calendar::new(config.block_start, config.block_end, &config.holidays);

        let mut workers = BTreeMap::new();
        for worker in &roster.workers {
            if worker.id.as_str().trim().is_empty() {
                return Err(SchedError::UnknownWorker("<empty id>".to_string()));
            }
            if let Some(range) = worker.moonlighting.iter().find(|r| r.end < r.start) {
                return Err(SchedError::InvalidDate(format!(
                    "moonlighting range {}..{} for {}",
                    range.start, range.end, worker.id
                )));
            }
            if workers.insert(worker.id.clone(), worker.clone()).is_some() {
                return Err(SchedError::InvalidConfig(format!(
                    "duplicate worker {}",
                    worker.id
                )));
            }
        }

        let mut excluded: BTreeSet<WorkerId> = workers
            .values()
            .filter(|w| w.excluded)
            .map(|w| w.id.clone())
            .collect();
        for id in &config.excluded {
            if !workers.contains_key(id) {
                warn!(worker = %id, "excluded worker absent from roster");
            }
            excluded.insert(id.clone());
        }

        let mut days: BTreeMap<NaiveDate, Vec<DayEntry>> = BTreeMap::new();
        for day in &roster.days {
            for entry in &day.entries {
                let worker = workers
                    .get(&entry.worker)
                    .ok_or_else(|| SchedError::UnknownWorker(entry.worker.to_string()))?;
                if !entry.source || !calendar.contains(day.date) {
                    continue;
                }
                let category = match config.services.get(&entry.service) {
                    Some(c) => *c,
                    None => {
                        debug!(service = %entry.service, worker = %worker.id, "unmapped service, using worker category");
                        worker.category
                    }
                };
                let moonlighting = entry.moonlighting || worker.is_moonlighting_on(day.date);
                let entries = days.entry(day.date).or_default();
                match entries.iter_mut().find(|e| e.worker == entry.worker) {
                    Some(existing) => existing.moonlighting |= moonlighting,
                    None => entries.push(DayEntry {
                        worker: entry.worker.clone(),
                        category,
                        moonlighting,
                    }),
                }
            }
        }
        for entries in days.values_mut() {
            entries.sort_by(|a, b| a.worker.cmp(&b.worker));
        }

        let stretches = build_stretches(&calendar, &days, &excluded);
        let weekends_worked = count_weekends(&days, &excluded);

        debug!(
            workers = workers.len(),
            excluded = excluded.len(),
            stretches = stretches.stretches().len(),
            chunks = stretches.chunks().len(),
            "block prepared"
        );

        Ok(Self {
            calendar,
            workers,
            excluded,
            days,
            stretches,
            weekends_worked,
        })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn stretches(&self) -> &StretchIndex {
        &self.stretches
    }

    pub fn worker(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.get(id)
    }

    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    pub fn is_excluded(&self, id: &WorkerId) -> bool {
        self.excluded.contains(id)
    }

    pub fn entries_on(&self, date: NaiveDate) -> &[DayEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entry(&self, worker: &WorkerId, date: NaiveDate) -> Option<&DayEntry> {
        self.entries_on(date).iter().find(|e| &e.worker == worker)
    }

    pub fn category_on(&self, worker: &WorkerId, date: NaiveDate) -> Option<Category> {
        self.entry(worker, date).map(|e| e.category)
    }

    /// Catégorie d'un besoin : celle du premier jour du chunk.
    pub fn chunk_category(&self, chunk: &WeekChunk) -> Option<Category> {
        chunk
            .dates
            .iter()
            .find_map(|d| self.category_on(&chunk.worker, *d))
    }

    /// Worker présent, non exclu, hors stretch en moonlighting.
    pub fn is_eligible_on(&self, worker: &WorkerId, date: NaiveDate) -> bool {
        if self.is_excluded(worker) {
            return false;
        }
        self.stretches
            .locate(worker, date)
            .map(|c| c.is_need())
            .unwrap_or(false)
    }

    pub fn weekends_worked(&self, worker: &WorkerId) -> u32 {
        self.weekends_worked.get(worker).copied().unwrap_or(0)
    }
}

fn count_weekends(
    days: &BTreeMap<NaiveDate, Vec<DayEntry>>,
    excluded: &BTreeSet<WorkerId>,
) -> BTreeMap<WorkerId, u32> {
    let mut saturdays: BTreeMap<WorkerId, BTreeSet<NaiveDate>> = BTreeMap::new();
    for (date, entries) in days {
        let Some(saturday) = weekend_saturday(*date) else {
            continue;
        };
        for entry in entries {
            if entry.moonlighting || excluded.contains(&entry.worker) {
                continue;
            }
            saturdays
                .entry(entry.worker.clone())
                .or_default()
                .insert(saturday);
        }
    }
    saturdays
        .into_iter()
        .map(|(w, s)| (w, s.len() as u32))
        .collect()
}
