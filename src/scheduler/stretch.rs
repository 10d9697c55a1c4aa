//! Construction des stretches (jours consécutifs sur service source) et
//! découpage en week chunks.

use super::block::DayEntry;
use crate::calendar::{Calendar, IsoWeek};
use crate::model::WorkerId;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StretchId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u32);

impl fmt::Display for StretchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StretchKind {
    /// Contient au moins un jour de semaine.
    Real,
    /// Uniquement samedi/dimanche/férié.
    StandaloneWeekend,
}

#[derive(Debug, Clone)]
pub struct Stretch {
    pub id: StretchId,
    pub worker: WorkerId,
    pub dates: Vec<NaiveDate>,
    pub kind: StretchKind,
    /// Un seul jour en moonlighting rend tout le stretch inéligible.
    pub moonlighting: bool,
    pub chunks: Vec<ChunkId>,
}

impl Stretch {
    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    pub fn is_standalone(&self) -> bool {
        self.kind == StretchKind::StandaloneWeekend
    }

    pub fn has_weekday_and_weekend(&self, calendar: &Calendar) -> bool {
        let weekend = self
            .dates
            .iter()
            .filter(|d| calendar.is_weekend_or_holiday(**d))
            .count();
        weekend > 0 && weekend < self.dates.len()
    }
}

/// Un besoin de garde : la portion d'un stretch correspondant à une semaine.
#[derive(Debug, Clone)]
pub struct WeekChunk {
    pub id: ChunkId,
    pub stretch: StretchId,
    pub worker: WorkerId,
    pub dates: Vec<NaiveDate>,
    /// Semaine ISO du premier jour de semaine du chunk.
    pub week: IsoWeek,
    pub standalone: bool,
    pub moonlighting: bool,
}

impl WeekChunk {
    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Chunk pouvant recevoir une garde.
    pub fn is_need(&self) -> bool {
        !self.moonlighting
    }

    /// Chunk compté comme semaine travaillée (et donc manquable).
    pub fn counts_as_week(&self) -> bool {
        !self.standalone && !self.moonlighting
    }
}

#[derive(Debug, Clone, Default)]
pub struct StretchIndex {
    stretches: Vec<Stretch>,
    chunks: Vec<WeekChunk>,
    locator: BTreeMap<(WorkerId, NaiveDate), ChunkId>,
    by_worker: BTreeMap<WorkerId, Vec<StretchId>>,
}

impl StretchIndex {
    pub fn stretch(&self, id: StretchId) -> &Stretch {
        &self.stretches[id.0 as usize]
    }

    pub fn chunk(&self, id: ChunkId) -> &WeekChunk {
        &self.chunks[id.0 as usize]
    }

    pub fn stretches(&self) -> &[Stretch] {
        &self.stretches
    }

    pub fn chunks(&self) -> &[WeekChunk] {
        &self.chunks
    }

    /// Chunk du worker contenant `date`, s'il y en a un.
    pub fn locate(&self, worker: &WorkerId, date: NaiveDate) -> Option<&WeekChunk> {
        self.locator
            .get(&(worker.clone(), date))
            .map(|id| self.chunk(*id))
    }

    pub fn stretches_of<'a>(&'a self, worker: &WorkerId) -> impl Iterator<Item = &'a Stretch> + 'a {
        self.by_worker
            .get(worker)
            .into_iter()
            .flatten()
            .map(move |id| self.stretch(*id))
    }

    pub fn chunks_of<'a>(&'a self, worker: &WorkerId) -> impl Iterator<Item = &'a WeekChunk> + 'a {
        self.stretches_of(worker)
            .flat_map(move |s| s.chunks.iter().map(move |c| self.chunk(*c)))
    }

    pub fn workers(&self) -> impl Iterator<Item = &WorkerId> {
        self.by_worker.keys()
    }
}

/// Construit les stretches de tous les workers non exclus.
///
/// Un jour sans service source coupe le stretch ; les services non source
/// n'apparaissent pas dans `days`.
pub fn build_stretches(
    calendar: &Calendar,
    days: &BTreeMap<NaiveDate, Vec<DayEntry>>,
    excluded: &BTreeSet<WorkerId>,
) -> StretchIndex {
    let mut worked: BTreeMap<&WorkerId, Vec<(NaiveDate, bool)>> = BTreeMap::new();
    for (date, entries) in days {
        for entry in entries {
            if excluded.contains(&entry.worker) {
                continue;
            }
            worked
                .entry(&entry.worker)
                .or_default()
                .push((*date, entry.moonlighting));
        }
    }

    let mut index = StretchIndex::default();
    for (worker, dates) in worked {
        for run in consecutive_runs(&dates) {
            push_stretch(&mut index, calendar, worker, run);
        }
    }
    index
}

fn consecutive_runs(dates: &[(NaiveDate, bool)]) -> Vec<&[(NaiveDate, bool)]> {
    let mut runs = Vec::new();
    let mut start = 0usize;
    for i in 1..dates.len() {
        if dates[i].0 - dates[i - 1].0 != Duration::days(1) {
            runs.push(&dates[start..i]);
            start = i;
        }
    }
    if !dates.is_empty() {
        runs.push(&dates[start..]);
    }
    runs
}

fn push_stretch(
    index: &mut StretchIndex,
    calendar: &Calendar,
    worker: &WorkerId,
    run: &[(NaiveDate, bool)],
) {
    let id = StretchId(index.stretches.len() as u32);
    let dates: Vec<NaiveDate> = run.iter().map(|(d, _)| *d).collect();
    let moonlighting = run.iter().any(|(_, m)| *m);
    let kind = if dates.iter().all(|d| calendar.is_weekend_or_holiday(*d)) {
        StretchKind::StandaloneWeekend
    } else {
        StretchKind::Real
    };

    let mut chunk_ids = Vec::new();
    for part in split_into_chunks(calendar, &dates) {
        let chunk_id = ChunkId(index.chunks.len() as u32);
        let key_day = part
            .iter()
            .copied()
            .find(|d| !calendar.is_weekend_or_holiday(*d))
            .unwrap_or(part[0]);
        for date in &part {
            index.locator.insert((worker.clone(), *date), chunk_id);
        }
        index.chunks.push(WeekChunk {
            id: chunk_id,
            stretch: id,
            worker: worker.clone(),
            week: IsoWeek::of(key_day),
            standalone: kind == StretchKind::StandaloneWeekend,
            moonlighting,
            dates: part,
        });
        chunk_ids.push(chunk_id);
    }

    index.stretches.push(Stretch {
        id,
        worker: worker.clone(),
        dates,
        kind,
        moonlighting,
        chunks: chunk_ids,
    });
    index.by_worker.entry(worker.clone()).or_default().push(id);
}

/// Découpe un stretch en week chunks.
///
/// Jusqu'à 7 jours : un seul chunk. Au-delà : coupure aux frontières de
/// semaine ISO, un fragment initial week-end/férié est rattaché au chunk
/// suivant, un fragment final week-end/férié au chunk précédent.
pub fn split_into_chunks(calendar: &Calendar, dates: &[NaiveDate]) -> Vec<Vec<NaiveDate>> {
    if dates.is_empty() {
        return Vec::new();
    }
    if dates.len() <= 7 {
        return vec![dates.to_vec()];
    }

    let mut parts: Vec<Vec<NaiveDate>> = Vec::new();
    for date in dates {
        match parts.last_mut() {
            Some(last) if IsoWeek::of(last[0]) == IsoWeek::of(*date) => last.push(*date),
            _ => parts.push(vec![*date]),
        }
    }

    let weekend_only =
        |part: &[NaiveDate]| part.iter().all(|d| calendar.is_weekend_or_holiday(*d));

    if parts.len() >= 2 && weekend_only(&parts[0]) {
        let mut head = parts.remove(0);
        head.append(&mut parts[0]);
        parts[0] = head;
    }
    if parts.len() >= 2 && weekend_only(&parts[parts.len() - 1]) {
        if let Some(mut tail) = parts.pop() {
            if let Some(prev) = parts.last_mut() {
                prev.append(&mut tail);
            }
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn span(from: NaiveDate, len: i64) -> Vec<NaiveDate> {
        (0..len).map(|i| from + Duration::days(i)).collect()
    }

    #[test]
    fn seven_days_stay_one_chunk_across_iso_boundary() {
        let cal = Calendar::new(d(3, 2), d(3, 29), &[]);
        // mercredi → mardi
        let parts = split_into_chunks(&cal, &span(d(3, 4), 7));
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn long_stretch_merges_leading_and_trailing_weekends() {
        let cal = Calendar::new(d(3, 2), d(4, 5), &[]);
        // samedi 7 → dimanche 22 : [sa, di] + [lu..di] + [lu..di]
        let parts = split_into_chunks(&cal, &span(d(3, 7), 16));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].first(), Some(&d(3, 7)));
        assert_eq!(parts[0].last(), Some(&d(3, 15)));
        assert_eq!(parts[1].first(), Some(&d(3, 16)));

        // lundi 2 → lundi férié 16
        let cal = Calendar::new(d(3, 2), d(4, 5), &[d(3, 16)]);
        let parts = split_into_chunks(&cal, &span(d(3, 2), 15));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].last(), Some(&d(3, 16)));
    }
}
