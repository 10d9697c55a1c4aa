#![forbid(unsafe_code)]
mod common;

use common::{config, d, RosterBuilder, WARDS};
use longcall::scheduler::{DutyOrigin, SlotKind, WeekWindow};
use longcall::{Category, FlagKind, PreparedBlock, Scheduler, WorkerId};
use std::collections::BTreeSet;

#[test]
fn weekend_carry_over_skips_only_the_serving_stretch() {
    // x : samedi 7 → lundi 9, puis jeudi 12 → vendredi 13
    let roster = RosterBuilder::new()
        .worker("x", Category::Teaching, d(3, 7), 3)
        .works("x", WARDS, d(3, 12), 2)
        .build();
    let cfg = config(d(3, 2), d(3, 15));
    let block = PreparedBlock::new(&roster, &cfg).unwrap();
    let x = WorkerId::new("x");
    let stretches: Vec<_> = block.stretches().stretches_of(&x).map(|s| s.id).collect();
    assert_eq!(stretches.len(), 2);

    let mut scheduler = Scheduler::new(&block, cfg.options(), 1);
    scheduler.match_weekends().unwrap();
    let duties = scheduler.ledger().state(&x).unwrap().duties.clone();
    assert_eq!(duties.len(), 1);
    assert!(duties[0].weekend);
    assert_eq!(duties[0].stretch, stretches[0]);

    let first = WeekWindow::first(block.calendar());
    let served = first.served_on_weekend(block.stretches(), scheduler.ledger());
    assert_eq!(served, BTreeSet::from([stretches[0]]));

    scheduler.assign_weekdays().unwrap();
    let state = scheduler.ledger().state(&x).unwrap();
    assert_eq!(state.total, 2);
    let weekday = state.duties.iter().find(|duty| !duty.weekend).unwrap();
    assert!(weekday.date == d(3, 12) || weekday.date == d(3, 13), "{}", weekday.date);
    assert_eq!(weekday.stretch, stretches[1]);
    assert_eq!(weekday.origin, DutyOrigin::Weekday);
    assert!(state.missed_weeks.is_empty());
}

#[test]
fn worker_missing_two_weeks_takes_a_duty_from_a_served_donor() {
    let roster = RosterBuilder::new()
        .worker("r", Category::Teaching, d(3, 2), 5)
        .works("r", WARDS, d(3, 9), 5)
        .worker("donor", Category::Teaching, d(3, 2), 5)
        .build();
    let cfg = config(d(3, 2), d(3, 15));
    let block = PreparedBlock::new(&roster, &cfg).unwrap();
    let (r, donor) = (WorkerId::new("r"), WorkerId::new("donor"));

    let mut scheduler = Scheduler::new(&block, cfg.options(), 3);
    scheduler
        .ledger_mut()
        .assign(&block, &donor, d(3, 4), SlotKind::Teaching, DutyOrigin::Weekday)
        .unwrap();
    assert_eq!(scheduler.ledger().state(&r).unwrap().missed_weeks.len(), 2);

    scheduler.rebalance().unwrap();
    let out = scheduler.finish();

    let swaps: Vec<_> = out.flags_of(FlagKind::MissedSwap).collect();
    assert_eq!(swaps.len(), 1, "{:?}", out.flags);
    assert_eq!(swaps[0].worker.as_ref(), Some(&r));
    assert_eq!(swaps[0].date, Some(d(3, 4)));
    assert_eq!(swaps[0].detail, "teaching taken over from donor");
    assert_eq!(out.assignments[&d(3, 4)].teaching.as_ref(), Some(&r));

    assert_eq!(out.stats[&r].missed_weeks.len(), 1);
    assert_eq!(out.stats[&r].duties[0].origin, DutyOrigin::Rebalance);
    assert_eq!(out.stats[&donor].total, 0);
    assert_eq!(out.flags_of(FlagKind::ConsecNoLc).count(), 0);
}

#[test]
fn weekend_matched_duty_is_never_taken_by_the_rebalancer() {
    let roster = RosterBuilder::new()
        .worker("r", Category::Teaching, d(3, 2), 5)
        .works("r", WARDS, d(3, 9), 5)
        .worker("donor", Category::Teaching, d(3, 2), 5)
        .build();
    let cfg = config(d(3, 2), d(3, 15));
    let block = PreparedBlock::new(&roster, &cfg).unwrap();

    let mut scheduler = Scheduler::new(&block, cfg.options(), 3);
    scheduler
        .ledger_mut()
        .assign(
            &block,
            &WorkerId::new("donor"),
            d(3, 4),
            SlotKind::Teaching,
            DutyOrigin::WeekendMatch,
        )
        .unwrap();
    scheduler.rebalance().unwrap();
    let out = scheduler.finish();

    assert_eq!(out.flags_of(FlagKind::MissedSwap).count(), 0);
    assert_eq!(out.stats[&WorkerId::new("r")].total, 0);
    assert_eq!(out.flags_of(FlagKind::ConsecNoLc).count(), 1);
}
