#![allow(dead_code)]
use chrono::{Duration, NaiveDate};
use longcall::{BlockConfig, Category, DailyRoster, RosterEntry, Worker};

pub const WARDS: &str = "wards";
pub const CLINIC: &str = "clinic";

pub fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

/// Bloc avec deux services : `wards` (teaching) et `clinic` (direct care).
pub fn config(start: NaiveDate, end: NaiveDate) -> BlockConfig {
    BlockConfig::new(start, end)
        .with_service(WARDS, Category::Teaching)
        .with_service(CLINIC, Category::DirectCare)
}

fn service_of(category: Category) -> &'static str {
    match category {
        Category::Teaching => WARDS,
        Category::DirectCare => CLINIC,
    }
}

#[derive(Default)]
pub struct RosterBuilder {
    roster: DailyRoster,
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Déclare un worker et le place `days` jours consécutifs à partir de `from`.
    pub fn worker(mut self, id: &str, category: Category, from: NaiveDate, days: i64) -> Self {
        self.roster.workers.push(Worker::new(id, category));
        self.works(id, service_of(category), from, days)
    }

    pub fn add(mut self, worker: Worker) -> Self {
        self.roster.workers.push(worker);
        self
    }

    pub fn works(mut self, id: &str, service: &str, from: NaiveDate, days: i64) -> Self {
        for offset in 0..days {
            self.roster
                .push_entry(from + Duration::days(offset), RosterEntry::new(id, service));
        }
        self
    }

    pub fn entry(mut self, date: NaiveDate, entry: RosterEntry) -> Self {
        self.roster.push_entry(date, entry);
        self
    }

    pub fn build(mut self) -> DailyRoster {
        self.roster.days.sort_by_key(|day| day.date);
        self.roster
    }
}

/// Une semaine (lundi 2 → dimanche 8 mars) : 5 teaching et 5 direct care
/// sur toute la semaine, plus des renforts du lundi au vendredi.
pub fn one_week(teaching_extras: usize) -> (DailyRoster, BlockConfig) {
    let monday = d(3, 2);
    let mut builder = RosterBuilder::new();
    for i in 1..=5 {
        builder = builder
            .worker(&format!("t{i}"), Category::Teaching, monday, 7)
            .worker(&format!("c{i}"), Category::DirectCare, monday, 7);
    }
    for i in 1..=teaching_extras {
        builder = builder.worker(&format!("tx{i}"), Category::Teaching, monday, 5);
    }
    for i in 1..=7 {
        builder = builder.worker(&format!("cx{i}"), Category::DirectCare, monday, 5);
    }
    (builder.build(), config(monday, d(3, 8)))
}

/// Quatre semaines, deux équipes alternées (lundi → dimanche) de
/// 7 teaching et 12 direct care chacune.
pub fn alternating_teams() -> (DailyRoster, BlockConfig) {
    let monday = d(3, 2);
    let mut builder = RosterBuilder::new();
    for team in 0..2i64 {
        for i in 1..=7 {
            let id = format!("t{team}-{i}");
            builder = builder.add(Worker::new(&id, Category::Teaching));
            for week in [team, team + 2] {
                builder = builder.works(&id, WARDS, monday + Duration::weeks(week), 7);
            }
        }
        for i in 1..=12 {
            let id = format!("c{team}-{i}");
            builder = builder.add(Worker::new(&id, Category::DirectCare));
            for week in [team, team + 2] {
                builder = builder.works(&id, CLINIC, monday + Duration::weeks(week), 7);
            }
        }
    }
    (builder.build(), config(monday, d(3, 29)))
}

/// Six semaines décalées avec un férié, des week-ends isolés, un worker
/// exclu et un moonlighter.
pub fn staggered_block() -> (DailyRoster, BlockConfig) {
    let monday = d(3, 2);
    let mut builder = RosterBuilder::new();
    for i in 0..38usize {
        let category = if i < 14 {
            Category::Teaching
        } else {
            Category::DirectCare
        };
        let id = format!("w{i:02}");
        let service = service_of(category);
        let offset = (i % 3) as i64;
        builder = builder.add(Worker::new(&id, category));
        for week in 0..6i64 {
            let week_start = monday + Duration::weeks(week);
            if (week as usize + i) % 2 == 0 {
                builder = builder.works(&id, service, week_start + Duration::days(offset), 7);
            } else if i % 5 == 0 {
                builder = builder.works(&id, service, week_start + Duration::days(5), 2);
            }
        }
    }

    let mut moonlighter = Worker::new("moon", Category::DirectCare);
    moonlighter.moonlighting = vec![longcall::DateRange::new(d(3, 9), d(3, 15)).unwrap()];
    let mut excluded = Worker::new("chief", Category::Teaching);
    excluded.excluded = true;
    builder = builder
        .add(moonlighter)
        .works("moon", CLINIC, d(3, 9), 7)
        .works("moon", CLINIC, d(3, 23), 7)
        .add(excluded)
        .works("chief", WARDS, monday, 42);

    let mut cfg = config(monday, d(4, 12));
    // lundi de Pâques
    cfg.holidays = vec![d(4, 6), d(12, 25)];
    (builder.build(), cfg)
}
