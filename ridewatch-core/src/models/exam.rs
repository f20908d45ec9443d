//! Examination types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Exam Type
// ============================================================================

/// The examination a slot can be booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    /// Theory test.
    Kunskapsprov,
    /// Driving test.
    Korprov,
}

impl ExamType {
    /// Returns all examination types.
    pub fn all() -> &'static [ExamType] {
        &[ExamType::Kunskapsprov, ExamType::Korprov]
    }

    /// Returns the booking service's examination type id.
    pub fn service_id(&self) -> u32 {
        match self {
            Self::Kunskapsprov => 3,
            Self::Korprov => 12,
        }
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Kunskapsprov => "Kunskapsprov",
            Self::Korprov => "Körprov",
        }
    }

    /// Returns the stable key used in storage and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kunskapsprov => "kunskapsprov",
            Self::Korprov => "korprov",
        }
    }

    /// Looks up an examination type by the booking service id.
    pub fn from_service_id(id: u32) -> Option<Self> {
        Self::all().iter().copied().find(|e| e.service_id() == id)
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ExamType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kunskapsprov" | "theory" | "3" => Ok(Self::Kunskapsprov),
            "korprov" | "körprov" | "driving" | "12" => Ok(Self::Korprov),
            other => Err(CoreError::UnknownExamType(other.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Kunskapsprov".parse::<ExamType>().unwrap(), ExamType::Kunskapsprov);
        assert_eq!("theory".parse::<ExamType>().unwrap(), ExamType::Kunskapsprov);
        assert_eq!("Körprov".parse::<ExamType>().unwrap(), ExamType::Korprov);
        assert_eq!("korprov".parse::<ExamType>().unwrap(), ExamType::Korprov);
        assert_eq!("12".parse::<ExamType>().unwrap(), ExamType::Korprov);
        assert!("motorcycle".parse::<ExamType>().is_err());
    }

    #[test]
    fn test_service_id_roundtrip() {
        for exam in ExamType::all() {
            assert_eq!(ExamType::from_service_id(exam.service_id()), Some(*exam));
        }
        assert_eq!(ExamType::from_service_id(99), None);
    }

    #[test]
    fn test_as_str_parses_back() {
        for exam in ExamType::all() {
            assert_eq!(exam.as_str().parse::<ExamType>().unwrap(), *exam);
        }
    }
}
