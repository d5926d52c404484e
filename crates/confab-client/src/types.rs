//! Data model for calls, conversations, and labels.
//!
//! Records mirror what the collaboration service returns from its query
//! calls. Scenarios refetch these after acting and assert on specific fields;
//! nothing here is interpreted by the harness itself.

/// Conversation identifier (128-bit UUID).
pub type ConvId = u128;

/// Call identifier (128-bit UUID).
pub type CallId = u128;

/// Label identifier (128-bit UUID).
pub type LabelId = u128;

/// Stable user identifier.
pub type UserId = u64;

/// Lifecycle states of a call, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Call object exists but signaling has not started.
    Idle,
    /// Outgoing call/conference started locally.
    Initiated,
    /// Signaling delivered to the far end.
    Delivered,
    /// Conference is up, waiting for participants to join.
    Waiting,
    /// At least one remote participant is connected.
    Active,
    /// Call has ended.
    Terminated,
}

/// Media requested when starting or joining a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaOptions {
    /// Request an audio track.
    pub audio: bool,
    /// Request a video track.
    pub video: bool,
}

impl MediaOptions {
    /// Audio-only media, the common conference configuration.
    pub fn audio_only() -> Self {
        Self { audio: true, video: false }
    }
}

/// Descriptor of the local audio/video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaStream {
    /// Local audio track present.
    pub audio: bool,
    /// Local video track present.
    pub video: bool,
}

/// One participant in a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The participant's user id.
    pub user_id: UserId,
    /// Whether the participant's audio is muted for the conference.
    pub muted: bool,
}

/// A call as seen by one observer.
///
/// `locally_muted` is a per-observer view: two participants of the same call
/// can disagree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Call identifier.
    pub call_id: CallId,
    /// Conversation this call belongs to.
    pub conv_id: ConvId,
    /// Current call state.
    pub state: CallState,
    /// Connected participants.
    pub participants: Vec<Participant>,
    /// Whether the observer muted their own microphone.
    pub locally_muted: bool,
}

impl Call {
    /// Find a participant by user id.
    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

/// Per-observer conversation bookkeeping (label assignments).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    /// Labels the observer assigned to this conversation.
    pub label_ids: Vec<LabelId>,
}

/// A conversation as seen by one observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Conversation identifier.
    pub conv_id: ConvId,
    /// Conversation topic.
    pub topic: String,
    /// Member user ids.
    pub participants: Vec<UserId>,
    /// The observer's own bookkeeping.
    pub user_data: UserData,
}

/// A conversation label owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Label identifier.
    pub label_id: LabelId,
    /// Display value.
    pub value: String,
}

/// Edit request for an existing label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEdit {
    /// Label to edit.
    pub label_id: LabelId,
    /// New display value.
    pub value: String,
}

/// Field a filter condition matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    /// Match conversations carrying one of the given label ids.
    LabelId,
}

/// One condition of a conversation filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    /// Field to match.
    pub filter_target: FilterTarget,
    /// Values accepted for that field.
    pub expected_value: Vec<LabelId>,
}

/// Conjunction of filter conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConnector {
    /// Conditions, all of which must hold.
    pub conditions: Vec<FilterCondition>,
}

/// What a filter query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveAction {
    /// Return the matching conversations.
    Conversations,
}

/// A conversation filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFilter {
    /// Filter conditions.
    pub filter_connector: FilterConnector,
    /// Result shape.
    pub retrieve_action: RetrieveAction,
}

impl ConversationFilter {
    /// Filter for conversations carrying `label_id`.
    pub fn by_label(label_id: LabelId) -> Self {
        Self {
            filter_connector: FilterConnector {
                conditions: vec![FilterCondition {
                    filter_target: FilterTarget::LabelId,
                    expected_value: vec![label_id],
                }],
            },
            retrieve_action: RetrieveAction::Conversations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_lookup() {
        let call = Call {
            call_id: 1,
            conv_id: 2,
            state: CallState::Active,
            participants: vec![
                Participant { user_id: 10, muted: false },
                Participant { user_id: 11, muted: true },
            ],
            locally_muted: false,
        };

        assert!(call.participant(11).is_some_and(|p| p.muted));
        assert!(call.participant(12).is_none());
    }

    #[test]
    fn label_filter_shape() {
        let filter = ConversationFilter::by_label(42);
        assert_eq!(filter.filter_connector.conditions.len(), 1);
        assert_eq!(filter.filter_connector.conditions[0].expected_value, vec![42]);
    }
}
