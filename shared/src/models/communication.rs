//! Visitor-to-business communications and their review lifecycle

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{ValidationError, ValidationResult};

/// How the visitor reached out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunicationType {
    Call,
    Message,
}

impl CommunicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationType::Call => "CALL",
            CommunicationType::Message => "MESSAGE",
        }
    }
}

impl std::str::FromStr for CommunicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CALL" => Ok(CommunicationType::Call),
            "MESSAGE" => Ok(CommunicationType::Message),
            other => Err(format!("unknown communication type: {}", other)),
        }
    }
}

/// Review lifecycle of a communication
///
/// `Pending` until an administrator sends the visitor a review request,
/// `Sended` while the request is open, `Reviewed` once the visitor has left
/// a review. Status only moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunicationStatus {
    Pending,
    Sended,
    Reviewed,
}

/// A status change the lifecycle does not allow
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("review request has not been sent for this communication yet")]
    NotYetReviewable,
    #[error("this communication has already been reviewed")]
    AlreadyReviewed,
    #[error("review request was already sent for this communication")]
    AlreadySent,
}

impl CommunicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationStatus::Pending => "PENDING",
            CommunicationStatus::Sended => "SENDED",
            CommunicationStatus::Reviewed => "REVIEWED",
        }
    }

    /// Move to `target`, which must be the next status in the lifecycle
    pub fn transition(self, target: CommunicationStatus) -> Result<Self, TransitionError> {
        match target {
            CommunicationStatus::Sended => self.mark_sent(),
            CommunicationStatus::Reviewed => self.mark_reviewed(),
            CommunicationStatus::Pending if self == CommunicationStatus::Reviewed => {
                Err(TransitionError::AlreadyReviewed)
            }
            CommunicationStatus::Pending => Err(TransitionError::AlreadySent),
        }
    }

    /// PENDING -> SENDED
    pub fn mark_sent(self) -> Result<Self, TransitionError> {
        match self {
            CommunicationStatus::Pending => Ok(CommunicationStatus::Sended),
            CommunicationStatus::Sended => Err(TransitionError::AlreadySent),
            CommunicationStatus::Reviewed => Err(TransitionError::AlreadyReviewed),
        }
    }

    /// SENDED -> REVIEWED
    pub fn mark_reviewed(self) -> Result<Self, TransitionError> {
        match self {
            CommunicationStatus::Pending => Err(TransitionError::NotYetReviewable),
            CommunicationStatus::Sended => Ok(CommunicationStatus::Reviewed),
            CommunicationStatus::Reviewed => Err(TransitionError::AlreadyReviewed),
        }
    }
}

impl std::str::FromStr for CommunicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(CommunicationStatus::Pending),
            "SENDED" => Ok(CommunicationStatus::Sended),
            "REVIEWED" => Ok(CommunicationStatus::Reviewed),
            other => Err(format!("unknown communication status: {}", other)),
        }
    }
}

/// Input for logging a contact with a business
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunicationInput {
    pub business_id: Uuid,
    #[serde(rename = "type")]
    pub kind: CommunicationType,
    #[validate(length(max = 2000, message = "Message is too long"))]
    pub message: Option<String>,
}

impl CreateCommunicationInput {
    /// Trimmed message, checked against the communication type
    ///
    /// A MESSAGE needs a body; a CALL may carry an optional note.
    pub fn message(&self) -> ValidationResult<Option<String>> {
        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if self.kind == CommunicationType::Message && message.is_none() {
            return Err(ValidationError::new("message", "Message is required"));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CommunicationStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert_eq!(Pending.mark_sent(), Ok(Sended));
        assert_eq!(Sended.mark_reviewed(), Ok(Reviewed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert_eq!(Pending.mark_reviewed(), Err(TransitionError::NotYetReviewable));
        assert_eq!(Reviewed.mark_reviewed(), Err(TransitionError::AlreadyReviewed));
        assert_eq!(Sended.mark_sent(), Err(TransitionError::AlreadySent));
        assert_eq!(Reviewed.mark_sent(), Err(TransitionError::AlreadyReviewed));
    }

    #[test]
    fn test_transition_never_goes_back() {
        assert_eq!(Pending.transition(Sended), Ok(Sended));
        assert!(Pending.transition(Pending).is_err());
        assert!(Sended.transition(Pending).is_err());
        assert_eq!(Reviewed.transition(Pending), Err(TransitionError::AlreadyReviewed));
    }

    #[test]
    fn test_status_only_moves_forward() {
        for status in [Pending, Sended, Reviewed] {
            if let Ok(next) = status.mark_sent() {
                assert!(next > status);
            }
            if let Ok(next) = status.mark_reviewed() {
                assert!(next > status);
            }
        }
    }

    #[test]
    fn test_status_strings() {
        for status in [Pending, Sended, Reviewed] {
            assert_eq!(status.as_str().parse::<CommunicationStatus>().unwrap(), status);
        }
        assert_eq!(serde_json::to_string(&Sended).unwrap(), "\"SENDED\"");
    }

    #[test]
    fn test_message_required_for_message_type() {
        let input: CreateCommunicationInput = serde_json::from_value(serde_json::json!({
            "businessId": Uuid::new_v4(),
            "type": "MESSAGE",
            "message": "   "
        }))
        .unwrap();
        assert!(input.message().is_err());
    }

    #[test]
    fn test_call_without_message() {
        let input: CreateCommunicationInput = serde_json::from_value(serde_json::json!({
            "businessId": Uuid::new_v4(),
            "type": "CALL"
        }))
        .unwrap();
        assert_eq!(input.message(), Ok(None));
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        let parsed = serde_json::from_value::<CreateCommunicationInput>(serde_json::json!({
            "businessId": Uuid::new_v4(),
            "type": "EMAIL"
        }));
        assert!(parsed.is_err());
    }
}
