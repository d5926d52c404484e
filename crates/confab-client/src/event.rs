//! Client events.
//!
//! The asynchronous notifications the collaboration client emits to
//! subscribers. Scenarios match on these via
//! [`confab_core::expect_events`]; [`EventKind`] is the subscription key.

use confab_core::TypedEvent;

use crate::types::{Call, ConvId, Label, LabelId};

/// Why a `CallStatus` event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatusReason {
    /// The call's lifecycle state changed.
    CallStateChanged,
    /// A participant joined the call.
    ParticipantJoined,
    /// A participant's flags (e.g. muted) changed.
    ParticipantUpdated,
}

/// Per-observer conversation bookkeeping change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataChanged {
    /// Conversation whose bookkeeping changed.
    pub conv_id: ConvId,
    /// Label ids now assigned to the conversation.
    pub label_ids: Vec<LabelId>,
}

/// Events emitted by the collaboration client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A call changed: state transition, join, or participant update.
    CallStatus {
        /// Snapshot of the call after the change.
        call: Call,
        /// What triggered the event.
        reason: CallStatusReason,
    },

    /// Labels were created.
    LabelsAdded {
        /// The created labels.
        labels: Vec<Label>,
    },

    /// A label's value was changed.
    LabelEdited {
        /// The label after the edit.
        label: Label,
    },

    /// Labels were deleted.
    LabelsRemoved {
        /// Ids of the deleted labels.
        label_ids: Vec<LabelId>,
    },

    /// Label assignments on a conversation changed.
    ConversationUserDataChanged {
        /// The new assignment state.
        data: UserDataChanged,
    },
}

/// Subscription key for [`ClientEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `CallStatus` events.
    CallStatus,
    /// `LabelsAdded` events.
    LabelsAdded,
    /// `LabelEdited` events.
    LabelEdited,
    /// `LabelsRemoved` events.
    LabelsRemoved,
    /// `ConversationUserDataChanged` events.
    ConversationUserDataChanged,
}

impl TypedEvent for ClientEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            ClientEvent::CallStatus { .. } => EventKind::CallStatus,
            ClientEvent::LabelsAdded { .. } => EventKind::LabelsAdded,
            ClientEvent::LabelEdited { .. } => EventKind::LabelEdited,
            ClientEvent::LabelsRemoved { .. } => EventKind::LabelsRemoved,
            ClientEvent::ConversationUserDataChanged { .. } => {
                EventKind::ConversationUserDataChanged
            },
        }
    }
}

impl ClientEvent {
    /// The call snapshot, if this is a `CallStatus` event.
    pub fn call(&self) -> Option<&Call> {
        match self {
            ClientEvent::CallStatus { call, .. } => Some(call),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CallState;

    fn call(state: CallState) -> Call {
        Call { call_id: 1, conv_id: 2, state, participants: Vec::new(), locally_muted: false }
    }

    #[test]
    fn kinds_discriminate_variants() {
        let event = ClientEvent::CallStatus {
            call: call(CallState::Initiated),
            reason: CallStatusReason::CallStateChanged,
        };
        assert_eq!(event.kind(), EventKind::CallStatus);

        let event = ClientEvent::LabelsRemoved { label_ids: vec![1, 2] };
        assert_eq!(event.kind(), EventKind::LabelsRemoved);
    }

    #[test]
    fn call_accessor_only_on_call_status() {
        let event = ClientEvent::CallStatus {
            call: call(CallState::Waiting),
            reason: CallStatusReason::CallStateChanged,
        };
        assert_eq!(event.call().map(|c| c.state), Some(CallState::Waiting));

        let event = ClientEvent::LabelsAdded { labels: Vec::new() };
        assert!(event.call().is_none());
    }
}
