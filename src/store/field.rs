use crate::labels::collapse_whitespace;

/// A known survey question.
///
/// The alias table is the single place that knows which literal column
/// names stand for the same question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Major,
    Gender,
    Year,
    GpaRange,
    AttendanceBehavior,
    AttendanceGpaRelationship,
    LearningMethod,
    OptionalFrequency,
    Attitude,
    Effectiveness,
    ReasonsAttending,
    ReasonsSkipping,
    FactorsInfluencing,
    CompensationMethods,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Major,
        Field::Gender,
        Field::Year,
        Field::GpaRange,
        Field::AttendanceBehavior,
        Field::AttendanceGpaRelationship,
        Field::LearningMethod,
        Field::OptionalFrequency,
        Field::Attitude,
        Field::Effectiveness,
        Field::ReasonsAttending,
        Field::ReasonsSkipping,
        Field::FactorsInfluencing,
        Field::CompensationMethods,
    ];

    /// Canonical column name.
    pub fn key(self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Gender => "Gender",
            Self::Year => "Current year of study",
            Self::GpaRange => "GPA range",
            Self::AttendanceBehavior => "Class attendance behavior",
            Self::AttendanceGpaRelationship => "Relationship between class attendance and GPA",
            Self::LearningMethod => "Effective learning methods for academic performance",
            Self::OptionalFrequency => "Frequency of optional attendance",
            Self::Attitude => "Attitude toward attending classes",
            Self::Effectiveness => {
                "Effectiveness of alternative methods compared to attending classes"
            }
            Self::ReasonsAttending => "Reasons for attending classes?",
            Self::ReasonsSkipping => "Reasons for skipping classes",
            Self::FactorsInfluencing => "Factors influencing attendance",
            Self::CompensationMethods => "Ways of compensation for the missed content?",
        }
    }

    /// Literal variants seen in exports, tried in order after the canonical key.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::GpaRange => &[" GPA range"],
            Self::AttendanceGpaRelationship => &["Relationship between class attendance and GPA "],
            Self::FactorsInfluencing => &["Factors  influencing attendance"],
            _ => &[],
        }
    }

    /// Whether a raw column name denotes this field.
    pub fn matches_key(self, raw_key: &str) -> bool {
        raw_key == self.key()
            || self.aliases().contains(&raw_key)
            || collapse_whitespace(raw_key) == self.key()
    }

    /// The field a raw column name denotes, if any.
    pub fn for_key(raw_key: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.matches_key(raw_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_keys_are_already_collapsed() {
        for field in Field::ALL {
            assert_eq!(collapse_whitespace(field.key()), field.key());
        }
    }

    #[test]
    fn aliases_map_back_to_their_field() {
        for field in Field::ALL {
            for alias in field.aliases() {
                assert_eq!(Field::for_key(alias), Some(field));
            }
        }
        assert_eq!(Field::for_key("Timestamp"), None);
    }
}
