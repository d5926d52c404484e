//! The collaboration client call surface.
//!
//! This is the boundary scenarios and peer actors depend on. The real
//! service's signaling and labeling backends sit behind it; the harness ships
//! a deterministic in-process implementation for test runs.

use async_trait::async_trait;
use confab_core::EventSource;

use crate::{
    config::Credentials,
    error::ClientError,
    event::ClientEvent,
    types::{
        Call, CallId, ConvId, Conversation, ConversationFilter, Label, LabelEdit, LabelId,
        MediaOptions, MediaStream, UserId,
    },
};

/// Remote call surface of the collaboration client.
///
/// Every operation suspends on the (possibly simulated) service and surfaces
/// failures as [`ClientError`], propagated unchanged. Events triggered by
/// these operations arrive asynchronously on [`CollabClient::events`].
#[async_trait]
pub trait CollabClient: Send + Sync {
    /// The client's event emission interface.
    fn events(&self) -> &dyn EventSource<ClientEvent>;

    /// Authenticate and open a session.
    async fn logon(&self, credentials: &Credentials) -> Result<UserId, ClientError>;

    /// Close the session.
    async fn logout(&self) -> Result<(), ClientError>;

    /// The authenticated user.
    async fn get_logged_on_user(&self) -> Result<UserId, ClientError>;

    /// Create a group conversation with the given members.
    async fn create_group_conversation(
        &self,
        participants: &[UserId],
        topic: &str,
    ) -> Result<Conversation, ClientError>;

    /// Start a conference call on a conversation.
    async fn start_conference(
        &self,
        conv_id: ConvId,
        media: MediaOptions,
    ) -> Result<Call, ClientError>;

    /// Fetch the current state of a call.
    async fn find_call(&self, call_id: CallId) -> Result<Call, ClientError>;

    /// Join an ongoing conference.
    async fn join_conference(&self, call_id: CallId, media: MediaOptions)
    -> Result<(), ClientError>;

    /// Mute another participant for the whole conference.
    async fn mute_participant(&self, call_id: CallId, user_id: UserId)
    -> Result<(), ClientError>;

    /// Mute the local microphone on a call.
    async fn mute(&self, call_id: CallId) -> Result<(), ClientError>;

    /// Unmute the local microphone on a call.
    async fn unmute(&self, call_id: CallId) -> Result<(), ClientError>;

    /// Mute our own participant at the conference (RTC session) level.
    async fn mute_rtc_session(&self, call_id: CallId) -> Result<(), ClientError>;

    /// Descriptor of the local media stream.
    async fn get_local_audio_video_stream(&self) -> Result<MediaStream, ClientError>;

    /// Create labels with the given values.
    async fn add_labels(&self, values: &[String]) -> Result<Vec<Label>, ClientError>;

    /// Change an existing label's value.
    async fn edit_label(&self, edit: LabelEdit) -> Result<Label, ClientError>;

    /// Assign labels to a conversation. Returns the assigned ids.
    async fn assign_labels(
        &self,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError>;

    /// Unassign labels from a conversation. Returns the ids still assigned.
    async fn unassign_labels(
        &self,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError>;

    /// Delete labels. Returns the ids actually removed.
    async fn remove_labels(&self, label_ids: &[LabelId]) -> Result<Vec<LabelId>, ClientError>;

    /// All labels owned by the authenticated user.
    async fn get_all_labels(&self) -> Result<Vec<Label>, ClientError>;

    /// Fetch a conversation by id.
    async fn get_conversation_by_id(&self, conv_id: ConvId) -> Result<Conversation, ClientError>;

    /// Conversations matching a filter query.
    async fn get_conversations_by_filter(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, ClientError>;

    /// Conversations carrying the given label.
    async fn get_conversations_by_label(
        &self,
        label_id: LabelId,
    ) -> Result<Vec<Conversation>, ClientError>;
}
