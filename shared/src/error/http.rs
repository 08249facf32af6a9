//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    ///
    /// State conflicts (capacity, deadline, duplicate registration, sent
    /// communication) are client errors and map to 400 like validation.
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::MemberNotFound
            | Self::DonationNotFound
            | Self::EventNotFound
            | Self::RegistrationNotFound
            | Self::CommunicationNotFound
            | Self::RecipientNotFound
            | Self::AutomationNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists | Self::MemberEmailExists | Self::ReceiptNumberExists => {
                StatusCode::CONFLICT
            }

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::AutomationExecutionFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/state-conflict errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
