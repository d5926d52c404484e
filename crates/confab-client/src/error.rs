//! Client error taxonomy.
//!
//! Errors surfaced from the collaboration client are propagated to scenarios
//! unchanged; the harness performs no retries. Everything here is terminal
//! for the scenario in which it occurs.

use thiserror::Error;

use crate::types::CallState;

/// Errors surfaced from collaboration client calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Operation requires an authenticated session.
    #[error("not logged on")]
    NotLoggedOn,

    /// Referenced conversation does not exist.
    #[error("conversation {0:#x} not found")]
    ConversationNotFound(u128),

    /// Referenced call does not exist.
    #[error("call {0:#x} not found")]
    CallNotFound(u128),

    /// Referenced label does not exist.
    #[error("label {0:#x} not found")]
    LabelNotFound(u128),

    /// Caller is not a participant of the call or conversation.
    #[error("user {0} is not a participant")]
    NotParticipant(u64),

    /// Operation not valid in the call's current state.
    #[error("invalid call state: cannot {operation} while {state:?}")]
    InvalidState {
        /// State the call was in.
        state: CallState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Opaque failure from the underlying transport.
    #[error("transport error: {0}")]
    Transport(String),
}
