//! Headline counters shown above the charts.

use std::collections::HashSet;

use serde::Serialize;

use crate::filter::FilteredView;
use crate::labels::categories::{AttendanceBehavior, GpaBand};
use crate::store::{Field, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCards {
    pub total_students: usize,
    /// Distinct non-empty majors in the view.
    pub total_majors: usize,
    /// Share attending most or all classes, whole percent.
    pub high_attendance_pct: u64,
    /// Share with a GPA of 70 or above, whole percent.
    pub high_gpa_pct: u64,
}

impl SummaryCards {
    /// Compute the cards for a view. An empty view yields all zeros.
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let total = view.len();
        let majors: HashSet<&str> = view
            .iter()
            .map(|r| r.get(Field::Major))
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            total_students: total,
            total_majors: majors.len(),
            high_attendance_pct: percent(count_where(view, attends_regularly), total),
            high_gpa_pct: percent(count_where(view, has_high_gpa), total),
        }
    }
}

/// `part / total` as a whole percentage, halves rounded up. 0 when `total`
/// is 0.
pub fn percent(part: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (part as u64, total as u64);
    (part * 200 + total) / (total * 2)
}

pub fn count_where(view: &FilteredView<'_>, pred: impl Fn(&Record) -> bool) -> usize {
    view.iter().filter(|r| pred(r)).count()
}

pub fn attends_regularly(record: &Record) -> bool {
    AttendanceBehavior::from_answer(record.get(Field::AttendanceBehavior))
        .is_some_and(AttendanceBehavior::is_regular)
}

pub fn has_high_gpa(record: &Record) -> bool {
    GpaBand::from_answer(record.get(Field::GpaRange)).is_some_and(GpaBand::is_high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 8), 13); // 12.5
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 5), 100);
        assert_eq!(percent(3, 0), 0);
    }

    #[test]
    fn cards_for_view() {
        let records = vec![
            Record::default()
                .with(Field::Major, "CS")
                .with(Field::AttendanceBehavior, "I attend most classes")
                .with(Field::GpaRange, "80 - 89"),
            Record::default()
                .with(Field::Major, "Physics")
                .with(Field::AttendanceBehavior, "I attend few classes")
                .with(Field::GpaRange, "60 - 69"),
            Record::default()
                .with(Field::Major, "CS")
                .with(Field::AttendanceBehavior, "I attend all or almost all classes")
                .with(Field::GpaRange, "Below 60"),
            Record::default().with(Field::Major, ""),
        ];
        let view: FilteredView<'_> = records.iter().collect();
        let cards = SummaryCards::compute(&view);
        assert_eq!(cards.total_students, 4);
        assert_eq!(cards.total_majors, 2);
        assert_eq!(cards.high_attendance_pct, 50);
        assert_eq!(cards.high_gpa_pct, 25);
    }

    #[test]
    fn empty_view_is_all_zero() {
        let records: Vec<Record> = Vec::new();
        let view: FilteredView<'_> = records.iter().collect();
        assert_eq!(SummaryCards::compute(&view), SummaryCards::default());
    }
}
