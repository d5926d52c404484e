//! Simulated collaboration client.
//!
//! Implements the full [`CollabClient`] surface against a [`SimWorld`]. Each
//! client owns one event bus; the world delivers that client's notifications
//! to it. State checks and mutations happen synchronously under the world
//! lock, event delivery happens after the caller yields.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use confab_client::{
    Call, CallId, ClientError, ClientEvent, CollabClient, ConvId, Conversation,
    ConversationFilter, Credentials, FilterTarget, Label, LabelEdit, LabelId, MediaOptions,
    MediaStream, UserId,
};
use confab_core::{EventBus, EventSource};

use super::world::SimWorld;

/// A simulated client bound to one [`SimWorld`].
pub struct SimClient {
    world: SimWorld,
    bus: EventBus<ClientEvent>,
    user: Mutex<Option<UserId>>,
}

impl SimClient {
    /// Create a client for `world`. No session is open until
    /// [`CollabClient::logon`].
    pub fn new(world: &SimWorld) -> Self {
        Self { world: world.clone(), bus: EventBus::new(), user: Mutex::new(None) }
    }

    /// The client's event bus, for expectation waits.
    pub fn bus(&self) -> &EventBus<ClientEvent> {
        &self.bus
    }

    fn current_user(&self) -> Result<UserId, ClientError> {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or(ClientError::NotLoggedOn)
    }
}

impl std::fmt::Debug for SimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimClient")
            .field("user", &self.user.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CollabClient for SimClient {
    fn events(&self) -> &dyn EventSource<ClientEvent> {
        &self.bus
    }

    async fn logon(&self, credentials: &Credentials) -> Result<UserId, ClientError> {
        let user_id = self.world.logon(credentials, self.bus.clone())?;
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = Some(user_id);
        Ok(user_id)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let user_id = self.current_user()?;
        self.world.logout(user_id)?;
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    async fn get_logged_on_user(&self) -> Result<UserId, ClientError> {
        self.current_user()
    }

    async fn create_group_conversation(
        &self,
        participants: &[UserId],
        topic: &str,
    ) -> Result<Conversation, ClientError> {
        let user_id = self.current_user()?;
        self.world.create_group_conversation(user_id, participants, topic)
    }

    async fn start_conference(
        &self,
        conv_id: ConvId,
        media: MediaOptions,
    ) -> Result<Call, ClientError> {
        let user_id = self.current_user()?;
        self.world.start_conference(user_id, conv_id, media)
    }

    async fn find_call(&self, call_id: CallId) -> Result<Call, ClientError> {
        let user_id = self.current_user()?;
        self.world.find_call(user_id, call_id)
    }

    async fn join_conference(
        &self,
        call_id: CallId,
        media: MediaOptions,
    ) -> Result<(), ClientError> {
        let user_id = self.current_user()?;
        self.world.join_conference(user_id, call_id, media)
    }

    async fn mute_participant(
        &self,
        call_id: CallId,
        user_id: UserId,
    ) -> Result<(), ClientError> {
        let actor = self.current_user()?;
        self.world.mute_participant(actor, call_id, user_id)
    }

    async fn mute(&self, call_id: CallId) -> Result<(), ClientError> {
        let user_id = self.current_user()?;
        self.world.mute(user_id, call_id)
    }

    async fn unmute(&self, call_id: CallId) -> Result<(), ClientError> {
        let user_id = self.current_user()?;
        self.world.unmute(user_id, call_id)
    }

    async fn mute_rtc_session(&self, call_id: CallId) -> Result<(), ClientError> {
        let user_id = self.current_user()?;
        self.world.mute_rtc_session(user_id, call_id)
    }

    async fn get_local_audio_video_stream(&self) -> Result<MediaStream, ClientError> {
        let user_id = self.current_user()?;
        self.world.local_stream(user_id)
    }

    async fn add_labels(&self, values: &[String]) -> Result<Vec<Label>, ClientError> {
        let user_id = self.current_user()?;
        self.world.add_labels(user_id, values)
    }

    async fn edit_label(&self, edit: LabelEdit) -> Result<Label, ClientError> {
        let user_id = self.current_user()?;
        self.world.edit_label(user_id, edit)
    }

    async fn assign_labels(
        &self,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError> {
        let user_id = self.current_user()?;
        self.world.assign_labels(user_id, conv_id, label_ids)
    }

    async fn unassign_labels(
        &self,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError> {
        let user_id = self.current_user()?;
        self.world.unassign_labels(user_id, conv_id, label_ids)
    }

    async fn remove_labels(&self, label_ids: &[LabelId]) -> Result<Vec<LabelId>, ClientError> {
        let user_id = self.current_user()?;
        self.world.remove_labels(user_id, label_ids)
    }

    async fn get_all_labels(&self) -> Result<Vec<Label>, ClientError> {
        let user_id = self.current_user()?;
        Ok(self.world.all_labels(user_id))
    }

    async fn get_conversation_by_id(&self, conv_id: ConvId) -> Result<Conversation, ClientError> {
        let user_id = self.current_user()?;
        self.world.conversation_by_id(user_id, conv_id)
    }

    async fn get_conversations_by_filter(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, ClientError> {
        let user_id = self.current_user()?;
        let mut label_ids: Vec<LabelId> = Vec::new();
        for condition in &filter.filter_connector.conditions {
            match condition.filter_target {
                FilterTarget::LabelId => label_ids.extend(&condition.expected_value),
            }
        }
        Ok(self.world.conversations_with_labels(user_id, &label_ids))
    }

    async fn get_conversations_by_label(
        &self,
        label_id: LabelId,
    ) -> Result<Vec<Conversation>, ClientError> {
        let user_id = self.current_user()?;
        Ok(self.world.conversations_with_labels(user_id, &[label_id]))
    }
}
