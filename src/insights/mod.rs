//! Insight generator.
//!
//! A fixed battery of templated sentences over the filtered view. Each
//! insight is derived independently; one that has nothing to report is
//! left out rather than rendered with a placeholder number.

use serde::Serialize;

use crate::aggregate::summary::{attends_regularly, count_where, has_high_gpa, percent};
use crate::aggregate::{count_field, count_split, in_scale_order, scale_average};
use crate::filter::FilteredView;
use crate::labels::categories::Effectiveness;
use crate::labels::{self, COMPENSATION_METHODS, NO_COMPENSATION};
use crate::store::Field;

pub const EMPTY_VIEW_TITLE: &str = "No Matching Students";
pub const EMPTY_VIEW_TEXT: &str =
    "No students match the current filters. Adjust or reset the filters to see insights.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub title: String,
    pub text: String,
}

impl Insight {
    fn new(title: &str, text: String) -> Self {
        Self {
            title: title.to_string(),
            text,
        }
    }
}

/// Generate the insight battery for a view.
///
/// An empty view yields exactly one placeholder insight and performs no
/// division.
pub fn generate(view: &FilteredView<'_>) -> Vec<Insight> {
    if view.is_empty() {
        return vec![Insight::new(EMPTY_VIEW_TITLE, EMPTY_VIEW_TEXT.to_string())];
    }

    [
        most_popular_major(view),
        attendance_impact(view),
        student_attitude(view),
        preferred_compensation(view),
        alternative_methods(view),
        preferred_learning_method(view),
        optional_attendance(view),
        attendance_rate(view),
        gender_distribution(view),
        academic_performance(view),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn most_popular_major(view: &FilteredView<'_>) -> Option<Insight> {
    let counts = count_field(view, Field::Major);
    let (major, n) = counts.top()?;
    Some(Insight::new(
        "Most Popular Major",
        format!("{major} has the highest enrollment with {n} students."),
    ))
}

fn attendance_impact(view: &FilteredView<'_>) -> Option<Insight> {
    let positive = count_where(view, |r| {
        let answer = r.get(Field::AttendanceGpaRelationship).to_lowercase();
        answer.contains("more frequently") && answer.contains("higher")
    });
    let pct = percent(positive, view.len());
    Some(Insight::new(
        "Attendance Impact",
        format!(
            "{pct}% of students report that attending classes more frequently leads to higher academic performance."
        ),
    ))
}

fn student_attitude(view: &FilteredView<'_>) -> Option<Insight> {
    let avg = scale_average(&count_field(view, Field::Attitude))?;
    let feeling = if avg >= 4.0 {
        "very positive"
    } else if avg >= 3.0 {
        "positive"
    } else {
        "neutral"
    };
    let shown = round_tenth(avg);
    Some(Insight::new(
        "Student Attitude",
        format!(
            "Average attitude score is {shown:.1} out of 5, indicating {feeling} feelings toward attending classes."
        ),
    ))
}

fn preferred_compensation(view: &FilteredView<'_>) -> Option<Insight> {
    let counts = count_split(view, Field::CompensationMethods, Some(NO_COMPENSATION));
    let (method, n) = counts.top()?;
    let method = lowercase_first(labels::remap(COMPENSATION_METHODS, method));
    Some(Insight::new(
        "Preferred Compensation Method",
        format!("Most students compensate for missed classes by {method} ({n} students)."),
    ))
}

fn alternative_methods(view: &FilteredView<'_>) -> Option<Insight> {
    let counts = count_field(view, Field::Effectiveness);
    let less = counts.get(Effectiveness::Less.answer());
    let more = counts.get(Effectiveness::More.answer());
    Some(Insight::new(
        "Alternative Methods Perception",
        format!(
            "{less} students find alternatives less effective than attending classes, while {more} find them more effective."
        ),
    ))
}

fn preferred_learning_method(view: &FilteredView<'_>) -> Option<Insight> {
    let counts = count_field(view, Field::LearningMethod);
    let (method, n) = counts.top()?;
    Some(Insight::new(
        "Preferred Learning Method",
        format!("{n} students find \"{method}\" to be the most effective learning approach."),
    ))
}

fn optional_attendance(view: &FilteredView<'_>) -> Option<Insight> {
    let levels = in_scale_order(&count_field(view, Field::OptionalFrequency));
    let sum_where = |pred: fn(u8) -> bool| -> u64 {
        levels
            .iter()
            .filter(|(level, _)| pred(level.value()))
            .map(|(_, n)| n)
            .sum()
    };
    let high = sum_where(|v| v >= 4);
    let low = sum_where(|v| v <= 2);
    Some(Insight::new(
        "Optional Class Attendance",
        format!("{high} students frequently attend optional classes, while {low} rarely attend them."),
    ))
}

fn attendance_rate(view: &FilteredView<'_>) -> Option<Insight> {
    let pct = percent(count_where(view, attends_regularly), view.len());
    Some(Insight::new(
        "Attendance Rate",
        format!("{pct}% of students attend most or all of their classes regularly."),
    ))
}

fn gender_distribution(view: &FilteredView<'_>) -> Option<Insight> {
    let counts = count_field(view, Field::Gender);
    if counts.is_empty() {
        return None;
    }
    let tally = counts
        .iter()
        .map(|(gender, n)| format!("{gender}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    Some(Insight::new(
        "Gender Distribution",
        format!("{tally} students in the dataset."),
    ))
}

fn academic_performance(view: &FilteredView<'_>) -> Option<Insight> {
    let pct = percent(count_where(view, has_high_gpa), view.len());
    Some(Insight::new(
        "Academic Performance",
        format!(
            "{pct}% of students maintain a GPA of 70 or above, indicating strong overall academic performance."
        ),
    ))
}

/// One decimal, halves rounded up.
fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;

    fn student(major: &str, gender: &str) -> Record {
        Record::default()
            .with(Field::Major, major)
            .with(Field::Gender, gender)
    }

    fn find<'a>(insights: &'a [Insight], title: &str) -> Option<&'a Insight> {
        insights.iter().find(|i| i.title == title)
    }

    #[test]
    fn empty_view_yields_single_placeholder() {
        let records: Vec<Record> = Vec::new();
        let view: FilteredView<'_> = records.iter().collect();
        let insights = generate(&view);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, EMPTY_VIEW_TITLE);
        assert_eq!(insights[0].text, EMPTY_VIEW_TEXT);
    }

    #[test]
    fn battery_order_and_templates() {
        let records = vec![
            student("CS", "Male")
                .with(Field::Attitude, "5")
                .with(Field::AttendanceBehavior, "I attend most classes")
                .with(Field::GpaRange, "80 - 89")
                .with(Field::LearningMethod, "Independent self-study")
                .with(Field::CompensationMethods, "Watch educational videos (e.g., YouTube); Consult classmates' notes")
                .with(Field::Effectiveness, "Less effective")
                .with(Field::OptionalFrequency, "4"),
            student("CS", "Female")
                .with(Field::Attitude, "3")
                .with(Field::AttendanceBehavior, "I attend few classes")
                .with(Field::GpaRange, "60 - 69")
                .with(Field::CompensationMethods, "Watch educational videos (e.g., YouTube)")
                .with(Field::Effectiveness, "More effective")
                .with(Field::OptionalFrequency, "1")
                .with(
                    Field::AttendanceGpaRelationship,
                    "When I attend classes more frequently, my academic performance tends to be higher",
                ),
            student("Physics", "Male")
                .with(Field::CompensationMethods, NO_COMPENSATION)
                .with(Field::OptionalFrequency, "2"),
        ];
        let view: FilteredView<'_> = records.iter().collect();
        let insights = generate(&view);

        let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Most Popular Major",
                "Attendance Impact",
                "Student Attitude",
                "Preferred Compensation Method",
                "Alternative Methods Perception",
                "Preferred Learning Method",
                "Optional Class Attendance",
                "Attendance Rate",
                "Gender Distribution",
                "Academic Performance",
            ]
        );
        assert_eq!(
            insights[0].text,
            "CS has the highest enrollment with 2 students."
        );
        assert_eq!(
            insights[1].text,
            "33% of students report that attending classes more frequently leads to higher academic performance."
        );
        assert_eq!(
            insights[2].text,
            "Average attitude score is 4.0 out of 5, indicating very positive feelings toward attending classes."
        );
        assert_eq!(
            insights[3].text,
            "Most students compensate for missed classes by watch videos (2 students)."
        );
        assert_eq!(
            insights[4].text,
            "1 students find alternatives less effective than attending classes, while 1 find them more effective."
        );
        assert_eq!(
            insights[5].text,
            "1 students find \"Independent self-study\" to be the most effective learning approach."
        );
        assert_eq!(
            insights[6].text,
            "1 students frequently attend optional classes, while 2 rarely attend them."
        );
        assert_eq!(
            insights[7].text,
            "33% of students attend most or all of their classes regularly."
        );
        assert_eq!(
            insights[8].text,
            "Male: 2, Female: 1 students in the dataset."
        );
        assert_eq!(
            insights[9].text,
            "33% of students maintain a GPA of 70 or above, indicating strong overall academic performance."
        );
    }

    #[test]
    fn optional_insights_are_omitted_without_answers() {
        let records = vec![student("CS", "")];
        let view: FilteredView<'_> = records.iter().collect();
        let insights = generate(&view);
        assert!(find(&insights, "Student Attitude").is_none());
        assert!(find(&insights, "Preferred Compensation Method").is_none());
        assert!(find(&insights, "Preferred Learning Method").is_none());
        assert!(find(&insights, "Gender Distribution").is_none());
        assert!(find(&insights, "Attendance Rate").is_some());
    }

    #[test]
    fn only_no_compensation_answers_omit_insight() {
        let records = vec![student("CS", "Male").with(Field::CompensationMethods, NO_COMPENSATION)];
        let view: FilteredView<'_> = records.iter().collect();
        assert!(find(&generate(&view), "Preferred Compensation Method").is_none());
    }

    #[test]
    fn attitude_feeling_thresholds() {
        let records = vec![
            student("CS", "Male").with(Field::Attitude, "2"),
            student("CS", "Male").with(Field::Attitude, "3"),
        ];
        let view: FilteredView<'_> = records.iter().collect();
        let insights = generate(&view);
        let attitude = find(&insights, "Student Attitude").unwrap();
        assert!(attitude.text.contains("2.5 out of 5"));
        assert!(attitude.text.contains("neutral feelings"));
    }

    #[test]
    fn attitude_average_rounds_half_up() {
        let records: Vec<Record> = ["3", "3", "3", "4"]
            .into_iter()
            .map(|level| student("CS", "Male").with(Field::Attitude, level))
            .collect();
        let view: FilteredView<'_> = records.iter().collect();
        let insights = generate(&view);
        let attitude = find(&insights, "Student Attitude").unwrap();
        assert!(attitude.text.contains("3.3 out of 5"), "{}", attitude.text);
        assert!(attitude.text.contains("positive feelings"));
    }
}
