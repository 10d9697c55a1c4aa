//! Registre d'état : créneaux et compteurs par worker.
//!
//! Seuls `Ledger::assign` et `Ledger::unassign` modifient l'état ; tous les
//! compteurs d'un worker bougent ensemble.

use super::block::PreparedBlock;
use super::stretch::{ChunkId, StretchId};
use super::types::{DayAssignment, DutyOrigin, SchedError, SlotKind};
use crate::calendar::IsoWeek;
use crate::model::WorkerId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Une garde tenue par un worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub date: NaiveDate,
    pub slot: SlotKind,
    pub chunk: ChunkId,
    pub stretch: StretchId,
    pub weekend: bool,
    pub origin: DutyOrigin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    pub total: u32,
    /// Gardes week-end ou férié.
    pub weekend: u32,
    pub direct_care_1: u32,
    pub direct_care_2: u32,
    pub teaching: u32,
    /// Lundi = 0.
    pub weekday_histogram: [u32; 7],
    /// Chunks réels encore sans garde.
    pub missed_weeks: BTreeSet<ChunkId>,
    pub doubled_stretches: BTreeSet<StretchId>,
    pub stretches: Vec<StretchId>,
    pub weeks_worked: Vec<IsoWeek>,
    pub weekends_worked: u32,
    pub duties: Vec<Duty>,
}

impl WorkerState {
    pub fn duties_in_chunk(&self, chunk: ChunkId) -> impl Iterator<Item = &Duty> {
        self.duties.iter().filter(move |d| d.chunk == chunk)
    }

    pub fn duties_in_stretch(&self, stretch: StretchId) -> impl Iterator<Item = &Duty> {
        self.duties.iter().filter(move |d| d.stretch == stretch)
    }

    pub fn duty_on(&self, date: NaiveDate) -> Option<&Duty> {
        self.duties.iter().find(|d| d.date == date)
    }

    pub fn doubles(&self) -> u32 {
        let mut per_chunk: BTreeMap<ChunkId, u32> = BTreeMap::new();
        for duty in &self.duties {
            *per_chunk.entry(duty.chunk).or_default() += 1;
        }
        per_chunk.values().filter(|n| **n >= 2).count() as u32
    }

    fn refresh_doubles(&mut self) {
        let mut per_chunk: BTreeMap<ChunkId, (StretchId, u32)> = BTreeMap::new();
        for duty in &self.duties {
            per_chunk.entry(duty.chunk).or_insert((duty.stretch, 0)).1 += 1;
        }
        self.doubled_stretches = per_chunk
            .values()
            .filter(|(_, n)| *n >= 2)
            .map(|(s, _)| *s)
            .collect();
    }

    fn bump_slot(&mut self, slot: SlotKind, up: bool) {
        let counter = match slot {
            SlotKind::Teaching => &mut self.teaching,
            SlotKind::DirectCare1 => &mut self.direct_care_1,
            SlotKind::DirectCare2 => &mut self.direct_care_2,
        };
        if up {
            *counter += 1;
        } else {
            *counter = counter.saturating_sub(1);
        }
    }
}

/// Registre d'un run : possédé exclusivement par ce run, clonable pour les
/// essais du remplissage en doublon.
#[derive(Debug, Clone)]
pub struct Ledger {
    slots: BTreeMap<NaiveDate, DayAssignment>,
    workers: BTreeMap<WorkerId, WorkerState>,
}

impl Ledger {
    /// Créneaux vides sur tout le bloc, un état par worker non exclu.
    pub fn new(block: &PreparedBlock) -> Self {
        let slots = block
            .calendar()
            .dates()
            .map(|d| (d, DayAssignment::default()))
            .collect();

        let mut workers = BTreeMap::new();
        for worker in block.workers() {
            if block.is_excluded(&worker.id) {
                continue;
            }
            let mut state = WorkerState {
                weekends_worked: block.weekends_worked(&worker.id),
                ..WorkerState::default()
            };
            let mut weeks = BTreeSet::new();
            for stretch in block.stretches().stretches_of(&worker.id) {
                state.stretches.push(stretch.id);
                for chunk in stretch.chunks.iter().map(|c| block.stretches().chunk(*c)) {
                    if chunk.counts_as_week() {
                        state.missed_weeks.insert(chunk.id);
                        weeks.insert(chunk.week);
                    }
                }
            }
            state.weeks_worked = weeks.into_iter().collect();
            workers.insert(worker.id.clone(), state);
        }

        Self { slots, workers }
    }

    pub fn assignments(&self) -> &BTreeMap<NaiveDate, DayAssignment> {
        &self.slots
    }

    pub fn slot(&self, date: NaiveDate, slot: SlotKind) -> Option<&WorkerId> {
        self.slots.get(&date).and_then(|day| day.get(slot))
    }

    /// Créneau existant et vide.
    pub fn is_open(&self, block: &PreparedBlock, date: NaiveDate, slot: SlotKind) -> bool {
        slot_exists(block, date, slot) && self.slot(date, slot).is_none()
    }

    pub fn state(&self, worker: &WorkerId) -> Option<&WorkerState> {
        self.workers.get(worker)
    }

    pub fn states(&self) -> &BTreeMap<WorkerId, WorkerState> {
        &self.workers
    }

    /// Créneaux encore vides, par date puis créneau.
    pub fn empty_slots(&self, block: &PreparedBlock) -> Vec<(NaiveDate, SlotKind)> {
        let calendar = block.calendar();
        self.slots
            .iter()
            .flat_map(|(date, day)| {
                SlotKind::slots_for(calendar.is_weekend_or_holiday(*date))
                    .iter()
                    .filter(move |s| day.get(**s).is_none())
                    .map(move |s| (*date, *s))
            })
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.workers.values().map(|s| s.duties.len()).sum()
    }

    pub fn doubles_count(&self) -> u32 {
        self.workers.values().map(WorkerState::doubles).sum()
    }

    /// Place `worker` sur un créneau vide.
    ///
    /// Ne vérifie que la structure (créneau existant, vide, worker présent) ;
    /// les règles métier passent par `rules::check` en amont.
    pub fn assign(
        &mut self,
        block: &PreparedBlock,
        worker: &WorkerId,
        date: NaiveDate,
        slot: SlotKind,
        origin: DutyOrigin,
    ) -> Result<(), SchedError> {
        if !slot_exists(block, date, slot) {
            return Err(SchedError::NoSuchSlot { date, slot });
        }
        let chunk = block
            .stretches()
            .locate(worker, date)
            .ok_or_else(|| SchedError::NotRostered {
                worker: worker.to_string(),
                date,
            })?;
        let state = self
            .workers
            .get_mut(worker)
            .ok_or_else(|| SchedError::UnknownWorker(worker.to_string()))?;
        let cell = self
            .slots
            .get_mut(&date)
            .ok_or(SchedError::NoSuchSlot { date, slot })?
            .get_mut(slot);
        if cell.is_some() {
            return Err(SchedError::SlotOccupied { date, slot });
        }
        *cell = Some(worker.clone());

        let weekend = block.calendar().is_weekend_or_holiday(date);
        state.total += 1;
        if weekend {
            state.weekend += 1;
        }
        state.weekday_histogram[date.weekday().num_days_from_monday() as usize] += 1;
        state.bump_slot(slot, true);
        state.missed_weeks.remove(&chunk.id);
        let at = state.duties.partition_point(|d| d.date < date);
        state.duties.insert(
            at,
            Duty {
                date,
                slot,
                chunk: chunk.id,
                stretch: chunk.stretch,
                weekend,
                origin,
            },
        );
        state.refresh_doubles();
        Ok(())
    }

    /// Libère un créneau ; renvoie l'ancien titulaire et l'origine de sa garde.
    pub fn unassign(
        &mut self,
        block: &PreparedBlock,
        date: NaiveDate,
        slot: SlotKind,
    ) -> Result<(WorkerId, DutyOrigin), SchedError> {
        if !slot_exists(block, date, slot) {
            return Err(SchedError::NoSuchSlot { date, slot });
        }
        let worker = self
            .slots
            .get_mut(&date)
            .and_then(|day| day.get_mut(slot).take())
            .ok_or(SchedError::SlotEmpty { date, slot })?;
        let state = self
            .workers
            .get_mut(&worker)
            .ok_or_else(|| SchedError::UnknownWorker(worker.to_string()))?;
        let at = state
            .duties
            .iter()
            .position(|d| d.date == date && d.slot == slot)
            .ok_or(SchedError::SlotEmpty { date, slot })?;
        let duty = state.duties.remove(at);

        state.total = state.total.saturating_sub(1);
        if duty.weekend {
            state.weekend = state.weekend.saturating_sub(1);
        }
        let day = date.weekday().num_days_from_monday() as usize;
        state.weekday_histogram[day] = state.weekday_histogram[day].saturating_sub(1);
        state.bump_slot(slot, false);
        let chunk = block.stretches().chunk(duty.chunk);
        if chunk.counts_as_week() && state.duties_in_chunk(duty.chunk).next().is_none() {
            state.missed_weeks.insert(duty.chunk);
        }
        state.refresh_doubles();
        Ok((worker, duty.origin))
    }
}

fn slot_exists(block: &PreparedBlock, date: NaiveDate, slot: SlotKind) -> bool {
    let calendar = block.calendar();
    calendar.contains(date)
        && SlotKind::slots_for(calendar.is_weekend_or_holiday(date)).contains(&slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockConfig;
    use crate::model::{Category, DailyRoster, RosterEntry, Worker};
    use chrono::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    // Semaine du lundi 2 au dimanche 8 mars 2026.
    fn block() -> PreparedBlock {
        let mut roster = DailyRoster::default();
        roster.workers.push(Worker::new("ada", Category::Teaching));
        roster.workers.push(Worker::new("bob", Category::DirectCare));
        for i in 0..7 {
            roster.push_entry(d(2) + Duration::days(i), RosterEntry::new("ada", "wards"));
        }
        for i in 0..5 {
            roster.push_entry(d(2) + Duration::days(i), RosterEntry::new("bob", "clinic"));
        }
        let config = BlockConfig::new(d(2), d(8))
            .with_service("wards", Category::Teaching)
            .with_service("clinic", Category::DirectCare);
        PreparedBlock::new(&roster, &config).unwrap()
    }

    #[test]
    fn assign_and_unassign_move_counters_together() {
        let block = block();
        let mut ledger = Ledger::new(&block);
        let ada = WorkerId::new("ada");
        assert_eq!(ledger.state(&ada).unwrap().missed_weeks.len(), 1);

        ledger
            .assign(&block, &ada, d(4), SlotKind::Teaching, DutyOrigin::Weekday)
            .unwrap();
        ledger
            .assign(&block, &ada, d(7), SlotKind::DirectCare2, DutyOrigin::Double)
            .unwrap();
        let st = ledger.state(&ada).unwrap();
        assert_eq!((st.total, st.weekend, st.teaching, st.direct_care_2), (2, 1, 1, 1));
        assert_eq!(st.weekday_histogram[2], 1);
        assert!(st.missed_weeks.is_empty());
        assert_eq!(st.doubled_stretches.len(), 1);

        let (who, origin) = ledger.unassign(&block, d(7), SlotKind::DirectCare2).unwrap();
        assert_eq!((who, origin), (ada.clone(), DutyOrigin::Double));
        ledger.unassign(&block, d(4), SlotKind::Teaching).unwrap();
        let st = ledger.state(&ada).unwrap();
        assert_eq!((st.total, st.weekend, st.teaching), (0, 0, 0));
        assert!(st.doubled_stretches.is_empty());
        assert_eq!(st.missed_weeks.len(), 1);
    }

    #[test]
    fn structural_errors_are_reported() {
        let block = block();
        let mut ledger = Ledger::new(&block);
        let bob = WorkerId::new("bob");
        assert!(matches!(
            ledger.assign(&block, &bob, d(7), SlotKind::DirectCare1, DutyOrigin::Weekday),
            Err(SchedError::NoSuchSlot { .. })
        ));
        assert!(matches!(
            ledger.assign(&block, &bob, d(7), SlotKind::DirectCare2, DutyOrigin::Weekday),
            Err(SchedError::NotRostered { .. })
        ));
        ledger
            .assign(&block, &bob, d(3), SlotKind::DirectCare1, DutyOrigin::Weekday)
            .unwrap();
        assert!(matches!(
            ledger.assign(&block, &WorkerId::new("ada"), d(3), SlotKind::DirectCare1, DutyOrigin::Weekday),
            Err(SchedError::SlotOccupied { .. })
        ));
        assert!(matches!(
            ledger.unassign(&block, d(5), SlotKind::Teaching),
            Err(SchedError::SlotEmpty { .. })
        ));
        assert_eq!(ledger.empty_slots(&block).len(), 3 * 5 + 2 * 2 - 1);
    }
}
