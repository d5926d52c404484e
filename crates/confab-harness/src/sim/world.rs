//! Shared state of the simulated collaboration backend.
//!
//! One [`SimWorld`] stands in for the service: it owns conversations, calls,
//! and per-user label stores, and routes events to the sessions of logged-on
//! users. Ids come from a seeded RNG so runs are reproducible.
//!
//! # Event delivery
//!
//! Mutations queue (session, event) pairs on an outbox drained by a single
//! dispatcher task. Nothing is delivered until the acting task yields, which
//! models a remote service: a scenario that performs an action and then
//! registers expectations in the same task turn still observes every event.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use confab_client::{
    Call, CallId, CallState, CallStatusReason, ClientError, ClientEvent, ConvId, Conversation,
    Credentials, Label, LabelEdit, LabelId, MediaOptions, MediaStream, Participant, UserData,
    UserDataChanged, UserId,
};
use confab_core::EventBus;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;

/// Default world seed.
const DEFAULT_SEED: u64 = 0x00C0_FFEE;

struct Delivery {
    bus: EventBus<ClientEvent>,
    event: ClientEvent,
}

struct SessionRecord {
    bus: EventBus<ClientEvent>,
    media: MediaOptions,
}

struct ConversationRecord {
    topic: String,
    participants: Vec<UserId>,
    user_data: HashMap<UserId, UserData>,
}

struct CallRecord {
    conv_id: ConvId,
    state: CallState,
    participants: Vec<Participant>,
    locally_muted: HashSet<UserId>,
}

impl CallRecord {
    /// Snapshot of the call as `observer` sees it.
    fn view(&self, call_id: CallId, observer: UserId) -> Call {
        Call {
            call_id,
            conv_id: self.conv_id,
            state: self.state,
            participants: self.participants.clone(),
            locally_muted: self.locally_muted.contains(&observer),
        }
    }
}

struct WorldState {
    rng: ChaCha8Rng,
    next_user: UserId,
    sessions: HashMap<UserId, SessionRecord>,
    conversations: HashMap<ConvId, ConversationRecord>,
    calls: HashMap<CallId, CallRecord>,
    labels: HashMap<UserId, Vec<Label>>,
}

impl WorldState {
    fn fresh_id(&mut self) -> u128 {
        (u128::from(self.rng.next_u64()) << 64) | u128::from(self.rng.next_u64())
    }

    fn conversation(&self, conv_id: ConvId) -> Result<&ConversationRecord, ClientError> {
        self.conversations.get(&conv_id).ok_or(ClientError::ConversationNotFound(conv_id))
    }

    fn call_mut(&mut self, call_id: CallId) -> Result<&mut CallRecord, ClientError> {
        self.calls.get_mut(&call_id).ok_or(ClientError::CallNotFound(call_id))
    }

    fn conversation_view(&self, conv_id: ConvId, observer: UserId) -> Option<Conversation> {
        self.conversations.get(&conv_id).map(|record| Conversation {
            conv_id,
            topic: record.topic.clone(),
            participants: record.participants.clone(),
            user_data: record.user_data.get(&observer).cloned().unwrap_or_default(),
        })
    }
}

/// The simulated collaboration backend.
///
/// Cloning yields another handle to the same world. Must be created inside a
/// tokio runtime; the event dispatcher task starts at construction and exits
/// when the last handle is dropped.
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<WorldState>>,
    outbox: mpsc::UnboundedSender<Delivery>,
}

impl std::fmt::Debug for SimWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimWorld").finish_non_exhaustive()
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Create a world with the default seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Create a world with an explicit RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        let (outbox, mut inbox) = mpsc::unbounded_channel::<Delivery>();
        tokio::spawn(async move {
            while let Some(delivery) = inbox.recv().await {
                delivery.bus.emit(&delivery.event);
            }
        });

        Self {
            state: Arc::new(Mutex::new(WorldState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                next_user: 1,
                sessions: HashMap::new(),
                conversations: HashMap::new(),
                calls: HashMap::new(),
                labels: HashMap::new(),
            })),
            outbox,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue(&self, state: &WorldState, user_id: UserId, event: ClientEvent) {
        if let Some(session) = state.sessions.get(&user_id) {
            // A full outbox is impossible (unbounded); a closed one means the
            // runtime is shutting down and the delivery is moot.
            let _ = self.outbox.send(Delivery { bus: session.bus.clone(), event });
        }
    }

    /// Queue a call snapshot event for every logged-on conversation member.
    fn queue_call_status(
        &self,
        state: &WorldState,
        call_id: CallId,
        reason: CallStatusReason,
        members: &[UserId],
    ) {
        let Some(record) = state.calls.get(&call_id) else { return };
        for &member in members {
            let event =
                ClientEvent::CallStatus { call: record.view(call_id, member), reason };
            self.queue(state, member, event);
        }
    }

    // ---- session lifecycle -------------------------------------------------

    pub(crate) fn logon(
        &self,
        credentials: &Credentials,
        bus: EventBus<ClientEvent>,
    ) -> Result<UserId, ClientError> {
        if credentials.token.is_empty() {
            return Err(ClientError::Transport("empty access token".into()));
        }

        let mut state = self.lock();
        let user_id = state.next_user;
        state.next_user += 1;
        state.sessions.insert(user_id, SessionRecord { bus, media: MediaOptions::default() });
        tracing::debug!(user_id, email = %credentials.email, "session opened");
        Ok(user_id)
    }

    pub(crate) fn logout(&self, user_id: UserId) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.sessions.remove(&user_id).ok_or(ClientError::NotLoggedOn)?;
        tracing::debug!(user_id, "session closed");
        Ok(())
    }

    // ---- conversations and calls ------------------------------------------

    pub(crate) fn create_group_conversation(
        &self,
        creator: UserId,
        participants: &[UserId],
        topic: &str,
    ) -> Result<Conversation, ClientError> {
        let mut state = self.lock();
        let conv_id = state.fresh_id();

        let mut members = vec![creator];
        for &user in participants {
            if !members.contains(&user) {
                members.push(user);
            }
        }

        state.conversations.insert(
            conv_id,
            ConversationRecord {
                topic: topic.to_owned(),
                participants: members,
                user_data: HashMap::new(),
            },
        );
        tracing::debug!(conv_id, topic, "conversation created");

        state
            .conversation_view(conv_id, creator)
            .ok_or(ClientError::ConversationNotFound(conv_id))
    }

    pub(crate) fn start_conference(
        &self,
        user_id: UserId,
        conv_id: ConvId,
        media: MediaOptions,
    ) -> Result<Call, ClientError> {
        let mut state = self.lock();
        let members = {
            let conversation = state.conversation(conv_id)?;
            if !conversation.participants.contains(&user_id) {
                return Err(ClientError::NotParticipant(user_id));
            }
            conversation.participants.clone()
        };

        let call_id = state.fresh_id();
        state.calls.insert(
            call_id,
            CallRecord {
                conv_id,
                state: CallState::Initiated,
                participants: vec![Participant { user_id, muted: false }],
                locally_muted: HashSet::new(),
            },
        );
        if let Some(session) = state.sessions.get_mut(&user_id) {
            session.media = media;
        }
        tracing::debug!(call_id, conv_id, "conference started");

        // The service reports Initiated, then immediately transitions to
        // Waiting once the conference bridge is up. Both snapshots are
        // delivered, in that order.
        self.queue_call_status(&state, call_id, CallStatusReason::CallStateChanged, &members);
        if let Some(record) = state.calls.get_mut(&call_id) {
            record.state = CallState::Waiting;
        }
        self.queue_call_status(&state, call_id, CallStatusReason::CallStateChanged, &members);

        let record = state.calls.get(&call_id).ok_or(ClientError::CallNotFound(call_id))?;
        Ok(record.view(call_id, user_id))
    }

    pub(crate) fn join_conference(
        &self,
        user_id: UserId,
        call_id: CallId,
        media: MediaOptions,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        let (members, went_active) = {
            let record = state.call_mut(call_id)?;
            if !matches!(record.state, CallState::Waiting | CallState::Active) {
                return Err(ClientError::InvalidState {
                    state: record.state,
                    operation: "join conference",
                });
            }

            let conv_id = record.conv_id;
            let members = state.conversation(conv_id)?.participants.clone();
            if !members.contains(&user_id) {
                return Err(ClientError::NotParticipant(user_id));
            }

            let record = state.call_mut(call_id)?;
            if record.participants.iter().all(|p| p.user_id != user_id) {
                record.participants.push(Participant { user_id, muted: false });
            }
            let went_active = record.state != CallState::Active;
            record.state = CallState::Active;
            (members, went_active)
        };
        if let Some(session) = state.sessions.get_mut(&user_id) {
            session.media = media;
        }
        tracing::debug!(call_id, user_id, went_active, "participant joined");

        if went_active {
            self.queue_call_status(&state, call_id, CallStatusReason::CallStateChanged, &members);
        }
        self.queue_call_status(&state, call_id, CallStatusReason::ParticipantJoined, &members);
        Ok(())
    }

    pub(crate) fn find_call(&self, user_id: UserId, call_id: CallId) -> Result<Call, ClientError> {
        let state = self.lock();
        let record = state.calls.get(&call_id).ok_or(ClientError::CallNotFound(call_id))?;
        Ok(record.view(call_id, user_id))
    }

    pub(crate) fn mute_participant(
        &self,
        actor: UserId,
        call_id: CallId,
        target: UserId,
    ) -> Result<(), ClientError> {
        self.update_call(call_id, actor, "mute participant", |record| {
            let participant = record
                .participants
                .iter_mut()
                .find(|p| p.user_id == target)
                .ok_or(ClientError::NotParticipant(target))?;
            participant.muted = true;
            Ok(())
        })
    }

    pub(crate) fn mute(&self, user_id: UserId, call_id: CallId) -> Result<(), ClientError> {
        self.update_call(call_id, user_id, "mute", |record| {
            record.locally_muted.insert(user_id);
            Ok(())
        })
    }

    pub(crate) fn unmute(&self, user_id: UserId, call_id: CallId) -> Result<(), ClientError> {
        self.update_call(call_id, user_id, "unmute", |record| {
            record.locally_muted.remove(&user_id);
            Ok(())
        })
    }

    pub(crate) fn mute_rtc_session(
        &self,
        user_id: UserId,
        call_id: CallId,
    ) -> Result<(), ClientError> {
        self.update_call(call_id, user_id, "mute rtc session", |record| {
            let participant = record
                .participants
                .iter_mut()
                .find(|p| p.user_id == user_id)
                .ok_or(ClientError::NotParticipant(user_id))?;
            participant.muted = true;
            Ok(())
        })
    }

    /// Apply a mute-style mutation and broadcast a `ParticipantUpdated`
    /// snapshot to the conversation.
    fn update_call(
        &self,
        call_id: CallId,
        actor: UserId,
        operation: &'static str,
        mutate: impl FnOnce(&mut CallRecord) -> Result<(), ClientError>,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        let members = {
            let record = state.call_mut(call_id)?;
            if record.state == CallState::Terminated {
                return Err(ClientError::InvalidState { state: record.state, operation });
            }
            if record.participants.iter().all(|p| p.user_id != actor) {
                return Err(ClientError::NotParticipant(actor));
            }
            let conv_id = record.conv_id;
            mutate(record)?;
            state.conversation(conv_id)?.participants.clone()
        };
        tracing::debug!(call_id, actor, operation, "call updated");

        self.queue_call_status(&state, call_id, CallStatusReason::ParticipantUpdated, &members);
        Ok(())
    }

    pub(crate) fn local_stream(&self, user_id: UserId) -> Result<MediaStream, ClientError> {
        let state = self.lock();
        let session = state.sessions.get(&user_id).ok_or(ClientError::NotLoggedOn)?;
        Ok(MediaStream { audio: session.media.audio, video: session.media.video })
    }

    // ---- labels ------------------------------------------------------------

    pub(crate) fn add_labels(
        &self,
        user_id: UserId,
        values: &[String],
    ) -> Result<Vec<Label>, ClientError> {
        let mut state = self.lock();
        let mut added = Vec::with_capacity(values.len());
        for value in values {
            let label = Label { label_id: state.fresh_id(), value: value.clone() };
            added.push(label.clone());
            state.labels.entry(user_id).or_default().push(label);
        }
        tracing::debug!(user_id, count = added.len(), "labels added");

        self.queue(&state, user_id, ClientEvent::LabelsAdded { labels: added.clone() });
        Ok(added)
    }

    pub(crate) fn edit_label(
        &self,
        user_id: UserId,
        edit: LabelEdit,
    ) -> Result<Label, ClientError> {
        let mut state = self.lock();
        let label = state
            .labels
            .get_mut(&user_id)
            .and_then(|labels| labels.iter_mut().find(|l| l.label_id == edit.label_id))
            .ok_or(ClientError::LabelNotFound(edit.label_id))?;
        label.value = edit.value;
        let label = label.clone();
        tracing::debug!(user_id, label_id = label.label_id, "label edited");

        self.queue(&state, user_id, ClientEvent::LabelEdited { label: label.clone() });
        Ok(label)
    }

    pub(crate) fn remove_labels(
        &self,
        user_id: UserId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError> {
        let mut state = self.lock();
        let mut removed = Vec::new();
        if let Some(labels) = state.labels.get_mut(&user_id) {
            labels.retain(|label| {
                if label_ids.contains(&label.label_id) {
                    removed.push(label.label_id);
                    false
                } else {
                    true
                }
            });
        }
        // Deleted labels disappear from every conversation assignment too.
        for conversation in state.conversations.values_mut() {
            if let Some(user_data) = conversation.user_data.get_mut(&user_id) {
                user_data.label_ids.retain(|id| !removed.contains(id));
            }
        }
        tracing::debug!(user_id, count = removed.len(), "labels removed");

        self.queue(&state, user_id, ClientEvent::LabelsRemoved { label_ids: removed.clone() });
        Ok(removed)
    }

    pub(crate) fn all_labels(&self, user_id: UserId) -> Vec<Label> {
        self.lock().labels.get(&user_id).cloned().unwrap_or_default()
    }

    pub(crate) fn assign_labels(
        &self,
        user_id: UserId,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError> {
        self.update_assignments(user_id, conv_id, label_ids, true)
    }

    pub(crate) fn unassign_labels(
        &self,
        user_id: UserId,
        conv_id: ConvId,
        label_ids: &[LabelId],
    ) -> Result<Vec<LabelId>, ClientError> {
        self.update_assignments(user_id, conv_id, label_ids, false)
    }

    /// Returns the conversation's assignment list after the change.
    fn update_assignments(
        &self,
        user_id: UserId,
        conv_id: ConvId,
        label_ids: &[LabelId],
        assign: bool,
    ) -> Result<Vec<LabelId>, ClientError> {
        let mut state = self.lock();
        let owned = state.labels.get(&user_id).cloned().unwrap_or_default();
        for &label_id in label_ids {
            if owned.iter().all(|l| l.label_id != label_id) {
                return Err(ClientError::LabelNotFound(label_id));
            }
        }

        let record =
            state.conversations.get_mut(&conv_id).ok_or(ClientError::ConversationNotFound(conv_id))?;
        if !record.participants.contains(&user_id) {
            return Err(ClientError::NotParticipant(user_id));
        }

        let user_data = record.user_data.entry(user_id).or_default();
        if assign {
            for &label_id in label_ids {
                if !user_data.label_ids.contains(&label_id) {
                    user_data.label_ids.push(label_id);
                }
            }
        } else {
            user_data.label_ids.retain(|id| !label_ids.contains(id));
        }
        let current = user_data.label_ids.clone();
        tracing::debug!(user_id, conv_id, assign, assigned = current.len(), "assignments updated");

        self.queue(
            &state,
            user_id,
            ClientEvent::ConversationUserDataChanged {
                data: UserDataChanged { conv_id, label_ids: current.clone() },
            },
        );
        Ok(current)
    }

    // ---- queries -----------------------------------------------------------

    pub(crate) fn conversation_by_id(
        &self,
        user_id: UserId,
        conv_id: ConvId,
    ) -> Result<Conversation, ClientError> {
        self.lock()
            .conversation_view(conv_id, user_id)
            .ok_or(ClientError::ConversationNotFound(conv_id))
    }

    pub(crate) fn conversations_with_labels(
        &self,
        user_id: UserId,
        label_ids: &[LabelId],
    ) -> Vec<Conversation> {
        let state = self.lock();
        let mut matches: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|(_, record)| {
                record.participants.contains(&user_id)
                    && record.user_data.get(&user_id).is_some_and(|data| {
                        label_ids.iter().any(|id| data.label_ids.contains(id))
                    })
            })
            .filter_map(|(&conv_id, _)| state.conversation_view(conv_id, user_id))
            .collect();
        matches.sort_by_key(|c| c.conv_id);
        matches
    }
}
