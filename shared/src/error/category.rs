//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 1xxx: Member errors
/// - 2xxx: Donation errors
/// - 3xxx: Event / registration errors
/// - 4xxx: Communication errors
/// - 5xxx: Automation errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Member errors (1xxx)
    Member,
    /// Donation errors (2xxx)
    Donation,
    /// Event and registration errors (3xxx)
    Event,
    /// Communication errors (4xxx)
    Communication,
    /// Automation errors (5xxx)
    Automation,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Member,
            2000..3000 => Self::Donation,
            3000..4000 => Self::Event,
            4000..5000 => Self::Communication,
            5000..6000 => Self::Automation,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Member => "member",
            Self::Donation => "donation",
            Self::Event => "event",
            Self::Communication => "communication",
            Self::Automation => "automation",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
