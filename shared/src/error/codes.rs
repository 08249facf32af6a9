//! Unified error codes for Guild Ledger
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Member errors
//! - 2xxx: Donation errors
//! - 3xxx: Event / registration errors
//! - 4xxx: Communication errors
//! - 5xxx: Automation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Member ====================
    /// Member not found
    MemberNotFound = 1001,
    /// Another member already uses this email
    MemberEmailExists = 1002,

    // ==================== 2xxx: Donation ====================
    /// Donation not found
    DonationNotFound = 2001,
    /// Donation amount must be positive
    InvalidAmount = 2002,
    /// Processing fee is negative or exceeds the amount
    InvalidProcessingFee = 2003,
    /// Receipt number collision
    ReceiptNumberExists = 2004,

    // ==================== 3xxx: Event ====================
    /// Event not found
    EventNotFound = 3001,
    /// Event is not open for registration
    EventNotOpen = 3002,
    /// Registration deadline has passed
    RegistrationClosed = 3003,
    /// Event has no free confirmed slot
    EventAtCapacity = 3004,
    /// Capacity is not a positive number
    InvalidCapacity = 3005,
    /// Registration not found
    RegistrationNotFound = 3101,
    /// Member already registered for this event
    AlreadyRegistered = 3102,
    /// Registration status change not allowed
    InvalidStatusTransition = 3103,

    // ==================== 4xxx: Communication ====================
    /// Communication not found
    CommunicationNotFound = 4001,
    /// Communication was already sent
    CommunicationAlreadySent = 4002,
    /// Unknown recipient segment
    UnknownSegment = 4003,
    /// Communication has no recipients
    NoRecipients = 4004,
    /// Recipient not found
    RecipientNotFound = 4005,

    // ==================== 5xxx: Automation ====================
    /// Automation not found
    AutomationNotFound = 5001,
    /// Automation is disabled
    AutomationInactive = 5002,
    /// Unknown trigger type
    UnknownTrigger = 5003,
    /// Trigger data is missing a required id
    MissingTriggerData = 5004,
    /// Automation action failed
    AutomationExecutionFailed = 5005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberEmailExists => "A member with this email already exists",

            // Donation
            ErrorCode::DonationNotFound => "Donation not found",
            ErrorCode::InvalidAmount => "Amount must be greater than zero",
            ErrorCode::InvalidProcessingFee => {
                "Processing fee must be between zero and the donation amount"
            }
            ErrorCode::ReceiptNumberExists => "Receipt number already exists",

            // Event
            ErrorCode::EventNotFound => "Event not found",
            ErrorCode::EventNotOpen => "Event is not open for registration",
            ErrorCode::RegistrationClosed => "Registration deadline has passed",
            ErrorCode::EventAtCapacity => "Event is at capacity",
            ErrorCode::InvalidCapacity => "Capacity must be greater than zero",
            ErrorCode::RegistrationNotFound => "Registration not found",
            ErrorCode::AlreadyRegistered => "Member is already registered for this event",
            ErrorCode::InvalidStatusTransition => "Registration status change is not allowed",

            // Communication
            ErrorCode::CommunicationNotFound => "Communication not found",
            ErrorCode::CommunicationAlreadySent => "Communication has already been sent",
            ErrorCode::UnknownSegment => "Unknown recipient segment",
            ErrorCode::NoRecipients => "Communication has no recipients",
            ErrorCode::RecipientNotFound => "Recipient not found",

            // Automation
            ErrorCode::AutomationNotFound => "Automation not found",
            ErrorCode::AutomationInactive => "Automation is not active",
            ErrorCode::UnknownTrigger => "Unknown trigger type",
            ErrorCode::MissingTriggerData => "Trigger data is missing a required id",
            ErrorCode::AutomationExecutionFailed => "Automation execution failed",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Member
            1001 => Ok(ErrorCode::MemberNotFound),
            1002 => Ok(ErrorCode::MemberEmailExists),

            // Donation
            2001 => Ok(ErrorCode::DonationNotFound),
            2002 => Ok(ErrorCode::InvalidAmount),
            2003 => Ok(ErrorCode::InvalidProcessingFee),
            2004 => Ok(ErrorCode::ReceiptNumberExists),

            // Event
            3001 => Ok(ErrorCode::EventNotFound),
            3002 => Ok(ErrorCode::EventNotOpen),
            3003 => Ok(ErrorCode::RegistrationClosed),
            3004 => Ok(ErrorCode::EventAtCapacity),
            3005 => Ok(ErrorCode::InvalidCapacity),
            3101 => Ok(ErrorCode::RegistrationNotFound),
            3102 => Ok(ErrorCode::AlreadyRegistered),
            3103 => Ok(ErrorCode::InvalidStatusTransition),

            // Communication
            4001 => Ok(ErrorCode::CommunicationNotFound),
            4002 => Ok(ErrorCode::CommunicationAlreadySent),
            4003 => Ok(ErrorCode::UnknownSegment),
            4004 => Ok(ErrorCode::NoRecipients),
            4005 => Ok(ErrorCode::RecipientNotFound),

            // Automation
            5001 => Ok(ErrorCode::AutomationNotFound),
            5002 => Ok(ErrorCode::AutomationInactive),
            5003 => Ok(ErrorCode::UnknownTrigger),
            5004 => Ok(ErrorCode::MissingTriggerData),
            5005 => Ok(ErrorCode::AutomationExecutionFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
