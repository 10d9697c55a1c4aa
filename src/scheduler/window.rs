//! Fenêtre glissante W1 / WE / W2 du placement en semaine.

use super::state::Ledger;
use super::stretch::{Stretch, StretchId, StretchIndex};
use crate::calendar::{Calendar, IsoWeek};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Position d'un stretch par rapport à une fenêtre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGroup {
    /// Touche les jours de semaine de W1.
    A,
    /// Commence dans WE ou W2 : relève de la fenêtre suivante.
    B,
    /// Week-end isolé dans WE.
    C,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWindow {
    pub week: IsoWeek,
    monday: NaiveDate,
    /// Jours de semaine ouvrés de la semaine courante.
    pub w1: Vec<NaiveDate>,
    /// Samedi, dimanche et fériés de la semaine courante.
    pub weekend: Vec<NaiveDate>,
    /// Jours de semaine ouvrés de la semaine suivante.
    pub w2: Vec<NaiveDate>,
    /// Stretches du groupe B de la fenêtre précédente déjà servis sur son week-end.
    pub served_previous: BTreeSet<StretchId>,
}

impl WeekWindow {
    /// Première fenêtre du bloc.
    pub fn first(calendar: &Calendar) -> Self {
        let start = calendar.start();
        let monday = start - Duration::days(i64::from(start.weekday().num_days_from_monday()));
        Self::at(calendar, monday, BTreeSet::new())
    }

    fn at(calendar: &Calendar, monday: NaiveDate, served_previous: BTreeSet<StretchId>) -> Self {
        let in_block = |offset: i64| {
            let d = monday + Duration::days(offset);
            calendar.contains(d).then_some(d)
        };
        let w1 = (0..5)
            .filter_map(in_block)
            .filter(|d| !calendar.is_holiday(*d))
            .collect();
        let weekend = (0..7)
            .filter_map(in_block)
            .filter(|d| calendar.is_weekend_or_holiday(*d))
            .collect();
        let w2 = (7..12)
            .filter_map(in_block)
            .filter(|d| !calendar.is_holiday(*d))
            .collect();
        Self {
            week: IsoWeek::of(monday),
            monday,
            w1,
            weekend,
            w2,
            served_previous,
        }
    }

    /// Fenêtre suivante, ou `None` après la fin du bloc.
    pub fn next(&self, calendar: &Calendar, served: BTreeSet<StretchId>) -> Option<Self> {
        let monday = self.monday + Duration::days(7);
        (monday <= calendar.end()).then(|| Self::at(calendar, monday, served))
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.w1.iter().chain(self.weekend.iter()).copied()
    }

    pub fn classify(&self, stretch: &Stretch) -> Option<WindowGroup> {
        if stretch.is_standalone() {
            return self
                .weekend
                .iter()
                .any(|d| stretch.contains(*d))
                .then_some(WindowGroup::C);
        }
        if self.w1.iter().any(|d| stretch.contains(*d)) {
            return Some(WindowGroup::A);
        }
        let start = stretch.start();
        if self.weekend.contains(&start) || self.w2.contains(&start) {
            return Some(WindowGroup::B);
        }
        None
    }

    /// Stretches du groupe B dont le worker tient une garde sur le week-end
    /// de cette fenêtre, à l'intérieur de ce stretch.
    pub fn served_on_weekend(
        &self,
        stretches: &StretchIndex,
        ledger: &Ledger,
    ) -> BTreeSet<StretchId> {
        stretches
            .stretches()
            .iter()
            .filter(|s| self.classify(s) == Some(WindowGroup::B))
            .filter(|s| {
                ledger.state(&s.worker).is_some_and(|st| {
                    st.duties
                        .iter()
                        .any(|d| self.weekend.contains(&d.date) && s.contains(d.date))
                })
            })
            .map(|s| s.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkerId;
    use crate::scheduler::stretch::StretchKind;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn stretch(from: NaiveDate, len: i64, kind: StretchKind) -> Stretch {
        Stretch {
            id: StretchId(0),
            worker: WorkerId::new("w"),
            dates: (0..len).map(|i| from + Duration::days(i)).collect(),
            kind,
            moonlighting: false,
            chunks: Vec::new(),
        }
    }

    #[test]
    fn window_periods_respect_block_and_holidays() {
        // bloc du mercredi 4 au dimanche 22 mars, lundi 9 férié
        let cal = Calendar::new(d(3, 4), d(3, 22), &[d(3, 9)]);
        let w = WeekWindow::first(&cal);
        assert_eq!(w.monday(), d(3, 2));
        assert_eq!(w.w1, vec![d(3, 4), d(3, 5), d(3, 6)]);
        assert_eq!(w.weekend, vec![d(3, 7), d(3, 8)]);
        assert_eq!(w.w2.first(), Some(&d(3, 10)));

        let next = w.next(&cal, BTreeSet::new()).unwrap();
        assert_eq!(next.weekend, vec![d(3, 9), d(3, 14), d(3, 15)]);
        let last = next.next(&cal, BTreeSet::new()).unwrap();
        assert!(last.w2.is_empty());
        assert!(last.next(&cal, BTreeSet::new()).is_none());
    }

    #[test]
    fn groups_follow_stretch_position() {
        let cal = Calendar::new(d(3, 2), d(3, 29), &[]);
        let w = WeekWindow::first(&cal);
        // lundi → vendredi
        assert_eq!(w.classify(&stretch(d(3, 2), 5, StretchKind::Real)), Some(WindowGroup::A));
        // jeudi → mardi suivant : touche W1
        assert_eq!(w.classify(&stretch(d(3, 5), 6, StretchKind::Real)), Some(WindowGroup::A));
        // samedi → vendredi suivant
        assert_eq!(w.classify(&stretch(d(3, 7), 7, StretchKind::Real)), Some(WindowGroup::B));
        // mardi suivant → jeudi suivant
        assert_eq!(w.classify(&stretch(d(3, 10), 3, StretchKind::Real)), Some(WindowGroup::B));
        assert_eq!(
            w.classify(&stretch(d(3, 7), 2, StretchKind::StandaloneWeekend)),
            Some(WindowGroup::C)
        );
        assert_eq!(w.classify(&stretch(d(3, 16), 5, StretchKind::Real)), None);
    }
}
