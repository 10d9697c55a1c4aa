#![forbid(unsafe_code)]
mod common;

use common::{config, d, RosterBuilder, CLINIC, WARDS};
use longcall::scheduler::{Ledger, StretchKind};
use longcall::{Category, DateRange, IsoWeek, PreparedBlock, RosterEntry, SchedError, Worker, WorkerId};

fn id(s: &str) -> WorkerId {
    WorkerId::new(s)
}

#[test]
fn saturday_to_friday_is_one_real_stretch_in_one_chunk() {
    let roster = RosterBuilder::new()
        .worker("sam", Category::Teaching, d(3, 7), 7)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 22))).unwrap();

    let stretches: Vec<_> = block.stretches().stretches_of(&id("sam")).collect();
    assert_eq!(stretches.len(), 1);
    assert_eq!(stretches[0].kind, StretchKind::Real);
    assert_eq!(stretches[0].start(), d(3, 7));
    assert_eq!(stretches[0].end(), d(3, 13));
    assert_eq!(stretches[0].chunks.len(), 1);

    let chunk = block.stretches().chunk(stretches[0].chunks[0]);
    // la semaine du chunk est celle de son premier jour de semaine
    assert_eq!(chunk.week, IsoWeek::of(d(3, 9)));
    assert!(chunk.is_need());

    let ledger = Ledger::new(&block);
    let state = ledger.state(&id("sam")).unwrap();
    assert_eq!(state.weeks_worked, vec![IsoWeek::of(d(3, 9))]);
    assert_eq!(state.missed_weeks.len(), 1);
    assert_eq!(state.weekends_worked, 1);
}

#[test]
fn long_stretch_is_split_per_iso_week() {
    // samedi 7 → dimanche 22 : le week-end de tête rejoint la semaine suivante
    let roster = RosterBuilder::new()
        .worker("long", Category::DirectCare, d(3, 7), 16)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 29))).unwrap();

    let chunks: Vec<_> = block.stretches().chunks_of(&id("long")).collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].start(), d(3, 7));
    assert_eq!(chunks[0].end(), d(3, 15));
    assert_eq!(chunks[0].week, IsoWeek::of(d(3, 9)));
    assert_eq!(chunks[1].start(), d(3, 16));
    assert_eq!(chunks[1].week, IsoWeek::of(d(3, 16)));
    assert_eq!(block.weekends_worked(&id("long")), 3);
}

#[test]
fn non_source_day_breaks_the_stretch() {
    let mut off = RosterEntry::new("nina", "admin");
    off.source = false;
    let roster = RosterBuilder::new()
        .worker("nina", Category::Teaching, d(3, 2), 3)
        .entry(d(3, 5), off)
        .works("nina", WARDS, d(3, 6), 1)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap();

    let stretches: Vec<_> = block.stretches().stretches_of(&id("nina")).collect();
    assert_eq!(stretches.len(), 2);
    assert_eq!(stretches[0].dates.len(), 3);
    assert_eq!(stretches[1].start(), d(3, 6));
    assert!(block.entry(&id("nina"), d(3, 5)).is_none());
}

#[test]
fn standalone_weekend_is_not_a_week_of_work() {
    let roster = RosterBuilder::new()
        .worker("wendy", Category::DirectCare, d(3, 7), 2)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 15))).unwrap();

    let stretch = block.stretches().stretches_of(&id("wendy")).next().unwrap();
    assert_eq!(stretch.kind, StretchKind::StandaloneWeekend);
    let chunk = block.stretches().chunk(stretch.chunks[0]);
    assert!(chunk.standalone);
    assert!(!chunk.counts_as_week());

    let ledger = Ledger::new(&block);
    let state = ledger.state(&id("wendy")).unwrap();
    assert!(state.weeks_worked.is_empty());
    assert!(state.missed_weeks.is_empty());
    assert_eq!(state.weekends_worked, 1);
}

#[test]
fn one_moonlighting_day_makes_the_whole_stretch_ineligible() {
    let mut night = RosterEntry::new("mo", CLINIC);
    night.moonlighting = true;
    let roster = RosterBuilder::new()
        .worker("mo", Category::DirectCare, d(3, 2), 2)
        .entry(d(3, 4), night)
        .works("mo", CLINIC, d(3, 5), 2)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap();

    let stretch = block.stretches().stretches_of(&id("mo")).next().unwrap();
    assert_eq!(stretch.dates.len(), 5);
    assert!(stretch.moonlighting);
    assert!(!block.is_eligible_on(&id("mo"), d(3, 2)));

    let ledger = Ledger::new(&block);
    assert!(ledger.state(&id("mo")).unwrap().weeks_worked.is_empty());
}

#[test]
fn worker_moonlighting_range_marks_entries() {
    let mut worker = Worker::new("ray", Category::Teaching);
    worker.moonlighting = vec![DateRange::new(d(3, 7), d(3, 8)).unwrap()];
    let roster = RosterBuilder::new()
        .add(worker)
        .works("ray", WARDS, d(3, 2), 7)
        .works("ray", WARDS, d(3, 14), 2)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 15))).unwrap();

    assert!(block.entry(&id("ray"), d(3, 7)).unwrap().moonlighting);
    assert!(!block.entry(&id("ray"), d(3, 14)).unwrap().moonlighting);
    // le week-end en moonlighting ne compte pas
    assert_eq!(block.weekends_worked(&id("ray")), 1);
    assert!(block.is_eligible_on(&id("ray"), d(3, 14)));
}

#[test]
fn excluded_workers_have_no_stretch_and_no_state() {
    let mut cfg = config(d(3, 2), d(3, 8));
    cfg.excluded = vec![id("boss"), id("ghost")];
    let mut flagged = Worker::new("lead", Category::Teaching);
    flagged.excluded = true;
    let roster = RosterBuilder::new()
        .worker("boss", Category::Teaching, d(3, 2), 7)
        .add(flagged)
        .works("lead", WARDS, d(3, 2), 7)
        .worker("kim", Category::Teaching, d(3, 2), 7)
        .build();
    let block = PreparedBlock::new(&roster, &cfg).unwrap();

    assert!(block.is_excluded(&id("boss")));
    assert!(block.is_excluded(&id("lead")));
    assert_eq!(block.stretches().stretches_of(&id("boss")).count(), 0);
    assert_eq!(block.stretches().stretches_of(&id("lead")).count(), 0);
    assert_eq!(block.stretches().stretches_of(&id("kim")).count(), 1);

    let ledger = Ledger::new(&block);
    assert!(ledger.state(&id("boss")).is_none());
    assert!(ledger.state(&id("kim")).is_some());
}

#[test]
fn unmapped_service_falls_back_to_worker_category() {
    let roster = RosterBuilder::new()
        .add(Worker::new("una", Category::DirectCare))
        .works("una", "icu", d(3, 2), 5)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap();
    assert_eq!(
        block.category_on(&id("una"), d(3, 3)),
        Some(Category::DirectCare)
    );
}

#[test]
fn entries_outside_the_block_are_ignored() {
    let roster = RosterBuilder::new()
        .worker("early", Category::Teaching, d(2, 23), 14)
        .build();
    let block = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap();
    let stretch = block.stretches().stretches_of(&id("early")).next().unwrap();
    assert_eq!(stretch.start(), d(3, 2));
    assert_eq!(stretch.end(), d(3, 8));
}

#[test]
fn unresolved_references_are_fatal() {
    let roster = RosterBuilder::new()
        .worker("known", Category::Teaching, d(3, 2), 5)
        .entry(d(3, 3), RosterEntry::new("stranger", WARDS))
        .build();
    let err = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap_err();
    assert!(matches!(err, SchedError::UnknownWorker(ref w) if w == "stranger"));

    let roster = RosterBuilder::new()
        .worker("twin", Category::Teaching, d(3, 2), 1)
        .worker("twin", Category::DirectCare, d(3, 3), 1)
        .build();
    let err = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap_err();
    assert!(matches!(err, SchedError::InvalidConfig(_)));

    let mut worker = Worker::new("bad", Category::Teaching);
    worker.moonlighting = vec![DateRange {
        start: d(3, 8),
        end: d(3, 2),
    }];
    let roster = RosterBuilder::new().add(worker).build();
    let err = PreparedBlock::new(&roster, &config(d(3, 2), d(3, 8))).unwrap_err();
    assert!(matches!(err, SchedError::InvalidDate(_)));
}

#[test]
fn invalid_block_configuration_is_fatal() {
    let roster = RosterBuilder::new().build();

    let err = PreparedBlock::new(&roster, &config(d(3, 8), d(3, 2))).unwrap_err();
    assert!(matches!(err, SchedError::InvalidConfig(_)));

    let bare = longcall::BlockConfig::new(d(3, 2), d(3, 8));
    let err = PreparedBlock::new(&roster, &bare).unwrap_err();
    assert!(matches!(err, SchedError::MissingField("services")));
}
