//! Closed answer sets of the survey, as typed categories.
//!
//! Each category knows its canonical (ordinal) order, the literal survey
//! answer it stands for, and, where charts need one, its semantic color.
//! Parsing is exact on the trimmed answer; anything else is an unexpected
//! value and is dropped by fixed-order aggregations.

use super::palette::{self, Color};

// ---------------------------------------------------------------------------
// Class attendance behavior
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttendanceBehavior {
    AllOrAlmostAll,
    Most,
    AboutHalf,
    Few,
    RarelyOrNever,
}

impl AttendanceBehavior {
    /// Highest attendance first.
    pub const ORDER: [AttendanceBehavior; 5] = [
        Self::AllOrAlmostAll,
        Self::Most,
        Self::AboutHalf,
        Self::Few,
        Self::RarelyOrNever,
    ];

    pub fn answer(self) -> &'static str {
        match self {
            Self::AllOrAlmostAll => "I attend all or almost all classes",
            Self::Most => "I attend most classes",
            Self::AboutHalf => "I attend about half of my classes",
            Self::Few => "I attend few classes",
            Self::RarelyOrNever => "I rarely or never attend classes",
        }
    }

    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        Self::ORDER.into_iter().find(|b| b.answer() == answer)
    }

    /// Red for the lowest attendance through purple for the highest.
    pub fn color(self) -> Color {
        match self {
            Self::RarelyOrNever => palette::RED,
            Self::Few => palette::ORANGE,
            Self::AboutHalf => palette::YELLOW,
            Self::Most => palette::BLUE,
            Self::AllOrAlmostAll => palette::PURPLE,
        }
    }

    /// Attends most or all classes.
    pub fn is_regular(self) -> bool {
        matches!(self, Self::AllOrAlmostAll | Self::Most)
    }

    /// Semantic color for a raw answer, neutral when the answer is unknown.
    pub fn color_of(answer: &str) -> Color {
        Self::from_answer(answer).map_or(palette::NEUTRAL, Self::color)
    }
}

// ---------------------------------------------------------------------------
// GPA range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpaBand {
    Below60,
    From60To69,
    From70To79,
    From80To89,
    From90To100,
}

impl GpaBand {
    /// Lowest band first.
    pub const ORDER: [GpaBand; 5] = [
        Self::Below60,
        Self::From60To69,
        Self::From70To79,
        Self::From80To89,
        Self::From90To100,
    ];

    pub fn answer(self) -> &'static str {
        match self {
            Self::Below60 => "Below 60",
            Self::From60To69 => "60 - 69",
            Self::From70To79 => "70 - 79",
            Self::From80To89 => "80 - 89",
            Self::From90To100 => "90 - 100",
        }
    }

    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        Self::ORDER.into_iter().find(|b| b.answer() == answer)
    }

    /// GPA of 70 or above.
    pub fn is_high(self) -> bool {
        self >= Self::From70To79
    }

    pub fn answers() -> [&'static str; 5] {
        Self::ORDER.map(Self::answer)
    }
}

// ---------------------------------------------------------------------------
// Year of study
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StudyYear {
    First,
    Second,
    Third,
    Master1,
}

impl StudyYear {
    pub const ORDER: [StudyYear; 4] = [Self::First, Self::Second, Self::Third, Self::Master1];

    pub fn answer(self) -> &'static str {
        match self {
            Self::First => "First Year",
            Self::Second => "Second Year",
            Self::Third => "Third Year",
            Self::Master1 => "Master 1 (M1)",
        }
    }

    pub fn answers() -> [&'static str; 4] {
        Self::ORDER.map(Self::answer)
    }
}

// ---------------------------------------------------------------------------
// Effectiveness of alternative methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effectiveness {
    More,
    Equally,
    Less,
}

impl Effectiveness {
    pub const ORDER: [Effectiveness; 3] = [Self::More, Self::Equally, Self::Less];

    pub fn answer(self) -> &'static str {
        match self {
            Self::More => "More effective",
            Self::Equally => "Equally effective",
            Self::Less => "Less effective",
        }
    }
}

// ---------------------------------------------------------------------------
// Likert-style 1–5 scale
// ---------------------------------------------------------------------------

/// A level on the survey's 1–5 scales (attitude, optional attendance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScaleLevel(u8);

impl ScaleLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// Parse `"4"` or `"4.0"`; anything outside 1–5 is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<u8>() {
            return Self::new(n);
        }
        let f = raw.parse::<f64>().ok()?;
        if f.fract() != 0.0 || !(1.0..=5.0).contains(&f) {
            return None;
        }
        Self::new(f as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn attitude_label(self) -> &'static str {
        match self.0 {
            1 => "Very negative",
            2 => "Negative",
            3 => "Neutral",
            4 => "Positive",
            _ => "Very positive",
        }
    }

    pub fn frequency_label(self) -> &'static str {
        match self.0 {
            1 => "Never",
            2 => "Rarely",
            3 => "Sometimes",
            4 => "Often",
            _ => "Very frequently",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
