//! Label normalization.
//!
//! Survey exports are noisy: the same question appears under keys that
//! differ only in whitespace, and answers are long free text that does not
//! fit on a chart axis. This module provides:
//!
//! - **Key lookup**: resolve a logical field against its whitespace variants
//! - **Shortening / wrapping**: fit long labels into a width budget
//! - **Remapping**: fixed long-answer → display-label tables
//! - **Typed categories**: closed answer sets with canonical order and color

pub mod categories;
pub mod palette;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

// ---------------------------------------------------------------------------
// Key lookup
// ---------------------------------------------------------------------------

/// Collapse runs of whitespace and trim, so `" GPA  range "` → `"GPA range"`.
pub fn collapse_whitespace(key: &str) -> String {
    WHITESPACE_RE.replace_all(key.trim(), " ").into_owned()
}

/// Resolve a logical field in a raw record.
///
/// Tries the canonical key, then each declared alias, then any key whose
/// collapsed form equals the canonical key's. Returns the first value that
/// is present (even if empty), or `""` when none is.
pub fn lookup<'a>(raw: &'a BTreeMap<String, String>, canonical: &str, aliases: &[&str]) -> &'a str {
    if let Some(value) = raw.get(canonical) {
        return value;
    }
    for alias in aliases {
        if let Some(value) = raw.get(*alias) {
            return value;
        }
    }
    let wanted = collapse_whitespace(canonical);
    raw.iter()
        .find(|(key, _)| collapse_whitespace(key) == wanted)
        .map_or("", |(_, value)| value.as_str())
}

// ---------------------------------------------------------------------------
// Shortening and wrapping
// ---------------------------------------------------------------------------

/// Truncate to `max_chars` characters and append `...` when longer.
pub fn shorten(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

/// Greedily pack whitespace-separated words into lines.
///
/// A label that already fits in `width` characters comes back as a single
/// line. Otherwise words are joined while the joined line stays under
/// `width`; a word longer than `width` gets a line of its own.
pub fn wrap(label: &str, width: usize) -> Vec<String> {
    if label.chars().count() <= width {
        return vec![label.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in label.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len < width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ---------------------------------------------------------------------------
// Remapping
// ---------------------------------------------------------------------------

/// A fixed survey-answer → display-label table.
pub type LabelTable = &'static [(&'static str, &'static str)];

/// Display label for `answer`, or `answer` itself when unmapped.
pub fn remap<'a>(table: LabelTable, answer: &'a str) -> &'a str {
    table
        .iter()
        .find(|(long, _)| *long == answer)
        .map_or(answer, |&(_, short)| short)
}

pub const ATTENDING_REASONS: LabelTable = &[
    ("Access to explanations not available in course materials", "Extra explanations"),
    ("Attendance is mandatory according to faculty regulations", "Mandatory attendance"),
    ("Class participation contributes to academic evaluation", "Participation counts"),
    ("Opportunities for discussion and peer interaction", "Discussion & peer interaction"),
    ("To improve understanding of course content", "Improve understanding"),
    ("The instructor\u{2019}s teaching approach enhances learning", "Effective teaching"),
];

pub const SKIPPING_REASONS: LabelTable = &[
    ("Course materials are sufficiently available online", "Online materials sufficient"),
    ("Internship, training, or practical obligations", "Internship/training"),
    ("Long commuting distance or transportation challenges", "Commuting issues"),
    ("Low motivation or engagement with the course", "Low motivation"),
    ("Perceived limitations in teaching quality or delivery", "Teaching limitations"),
    ("Work-related commitments", "Work commitments"),
];

pub const ATTENDANCE_GPA_RELATIONSHIP: LabelTable = &[
    (
        "When I attend classes more frequently, my academic performance tends to be higher",
        "More attend -> higher GPA",
    ),
    (
        "My level of class attendance does not appear to affect my academic performance",
        "Attendance does not affect GPA",
    ),
    (
        "When I attend classes less frequently, my academic performance tends to be higher",
        "Less attend -> higher GPA",
    ),
    (
        "The relationship varies depending on the course",
        "Effect depends on course",
    ),
    (
        "I am unable to determine a clear relationship based on my experience",
        "Cannot determine from experience",
    ),
];

pub const LEARNING_METHODS: LabelTable = &[
    ("In-person classroom instruction", "In-person classes"),
    (
        "Online learning resources (videos, platforms, AI tools, etc.)",
        "Online resources",
    ),
    ("Independent self-study", "Self-study"),
    (
        "A combination of online learning and independent self-study",
        "Online + self-study",
    ),
    (
        "A combination of in-person classes and other learning methods",
        "In-person + other methods",
    ),
];

pub const INFLUENCING_FACTORS: LabelTable = &[
    (
        "Practical application of course content (e.g., examples, case studies, problem-solving)",
        "Practical application",
    ),
    ("Quality and clarity of instruction during lectures", "Instruction quality"),
    (
        "Opportunities for in-class discussion to better understand theoretical concepts",
        "Class discussion",
    ),
    ("Ability to choose class schedules and/or instructors", "Schedules/instructor choice"),
    ("Relevance of lectures to examinations and assessments", "Exam relevance"),
    (
        "None of these factors would influence my decision to attend classes",
        "No influence",
    ),
    ("all", "Others"),
    (
        "How much the lecturer is serious and passionate about the material and delivering it",
        "Others",
    ),
];

pub const COMPENSATION_METHODS: LabelTable = &[
    ("Review lecture slides or PDF materials", "Review slides/PDFs"),
    ("Watch educational videos (e.g., YouTube)", "Watch videos"),
    ("Consult classmates' notes", "Consult classmates' notes"),
    ("Use AI-based tools for learning support (e.g., ChatGPT)", "Use AI tools"),
    ("Watch recorded lectures, if available", "Watch recorded lectures"),
    ("Rely on explanations provided by classmates or peers", "Peer explanations"),
    ("I usually do not compensate for missed classes", "No catch-up"),
];

/// Answer meaning "I don't catch up", excluded from compensation tallies.
pub const NO_COMPENSATION: &str = "I usually do not compensate for missed classes";

/// Canonical order of a label table's answers (the table order).
pub fn canonical_answers(table: LabelTable) -> Vec<&'static str> {
    table.iter().map(|&(long, _)| long).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lookup_prefers_canonical_key() {
        let record = raw(&[("GPA range", "70 - 79"), (" GPA range", "Below 60")]);
        assert_eq!(lookup(&record, "GPA range", &[" GPA range"]), "70 - 79");
    }

    #[test]
    fn lookup_falls_back_to_alias() {
        let record = raw(&[(" GPA range", "80 - 89")]);
        assert_eq!(lookup(&record, "GPA range", &[" GPA range"]), "80 - 89");
    }

    #[test]
    fn lookup_matches_collapsed_whitespace() {
        let record = raw(&[("Factors  influencing attendance ", "all")]);
        assert_eq!(lookup(&record, "Factors influencing attendance", &[]), "all");
    }

    #[test]
    fn lookup_returns_present_empty_value() {
        let record = raw(&[("GPA range", ""), (" GPA range", "80 - 89")]);
        assert_eq!(lookup(&record, "GPA range", &[" GPA range"]), "");
    }

    #[test]
    fn lookup_missing_is_empty() {
        let record = raw(&[("Major", "CS")]);
        assert_eq!(lookup(&record, "GPA range", &[" GPA range"]), "");
    }

    #[test]
    fn shorten_truncates_with_ellipsis() {
        assert_eq!(shorten("abcdefghij", 5), "abcde...");
        assert_eq!(shorten("abc", 5), "abc");
        assert_eq!(shorten("abcde", 5), "abcde");
        assert_eq!(shorten("", 5), "");
    }

    #[test]
    fn shorten_counts_chars_not_bytes() {
        assert_eq!(shorten("instructor\u{2019}s", 11), "instructor\u{2019}...");
    }

    #[test]
    fn wrap_splits_when_nothing_combines() {
        assert_eq!(wrap("one two three", 7), vec!["one", "two", "three"]);
    }

    #[test]
    fn wrap_keeps_fitting_label_whole() {
        assert_eq!(wrap("short label", 25), vec!["short label"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn wrap_packs_words_greedily() {
        let lines = wrap("I attend all or almost all classes", 25);
        assert_eq!(lines, vec!["I attend all or almost", "all classes"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 25));
    }

    #[test]
    fn wrap_gives_long_words_their_own_line() {
        assert_eq!(wrap("a extraordinarily b", 5), vec!["a", "extraordinarily", "b"]);
    }

    #[test]
    fn remap_known_and_unknown() {
        assert_eq!(
            remap(SKIPPING_REASONS, "Work-related commitments"),
            "Work commitments"
        );
        assert_eq!(remap(SKIPPING_REASONS, "Something else"), "Something else");
    }

    #[test]
    fn remap_curly_apostrophe_answer() {
        assert_eq!(
            remap(
                ATTENDING_REASONS,
                "The instructor\u{2019}s teaching approach enhances learning"
            ),
            "Effective teaching"
        );
    }

    #[test]
    fn collapse_whitespace_normalizes_keys() {
        assert_eq!(collapse_whitespace("  GPA \t range "), "GPA range");
    }
}
