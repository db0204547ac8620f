use crate::ids::MemberId;
use crate::scoring::Rank;

/// Rejections raised by commands and panel interactions.
/// None of these change state; all are reported back to the invoking member.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    // Validation
    #[error("amount must not be negative: {0}")]
    NegativeAmount(i64),

    // Authorization
    #[error("caller lacks the privileged role")]
    PermissionDenied,

    // Session rules
    #[error("member {0} already responded in this session")]
    DuplicateSelection(MemberId),
    #[error("rank {0} already taken in this session")]
    OutcomeTaken(Rank),
    #[error("session expired")]
    SessionExpired,

    // Persistence after startup
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl CommandError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NegativeAmount(_) => "validation",
            Self::PermissionDenied => "permission_denied",
            Self::DuplicateSelection(_) => "duplicate_selection",
            Self::OutcomeTaken(_) => "outcome_taken",
            Self::SessionExpired => "session_expired",
            Self::Persistence(_) => "persistence",
        }
    }

    /// Text shown to the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::NegativeAmount(_) => "Negative numbers are not allowed 😅".to_string(),
            Self::PermissionDenied => "Only the leader role may use this command.".to_string(),
            Self::DuplicateSelection(_) => "You already made a selection for this run.".to_string(),
            Self::OutcomeTaken(rank) => format!("Place {rank} is already taken."),
            Self::SessionExpired => {
                "This run is closed. Please use the buttons of the latest run.".to_string()
            }
            Self::Persistence(_) => {
                "The change was applied but could not be saved. Please tell a leader.".to_string()
            }
        }
    }
}
