//! Peer actors.
//!
//! A peer actor is a secondary simulated client used to produce the
//! side-effect events (join, mute) that the primary client observes.
//! Scenarios drive it through a single generic invocation entry point,
//! [`PeerActor::exec`], which forwards to an underlying client of the same
//! shape as the primary one.

use confab_client::{
    Call, CallId, ClientError, CollabClient, Credentials, MediaOptions, MediaStream, UserId,
};

use crate::sim::{SimClient, SimWorld};

/// A command forwarded to a peer's underlying client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCommand {
    /// Join an ongoing conference.
    JoinConference {
        /// Call to join.
        call_id: CallId,
        /// Media to join with.
        media: MediaOptions,
    },

    /// Mute another participant for the whole conference.
    MuteParticipant {
        /// Call the participant is on.
        call_id: CallId,
        /// Participant to mute.
        user_id: UserId,
    },

    /// Mute the peer's local microphone.
    Mute {
        /// Target call.
        call_id: CallId,
    },

    /// Unmute the peer's local microphone.
    Unmute {
        /// Target call.
        call_id: CallId,
    },

    /// Fetch the call as the peer sees it.
    FindCall {
        /// Target call.
        call_id: CallId,
    },

    /// Fetch the peer's local media stream descriptor.
    GetLocalAudioVideoStream,
}

/// Result of a peer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply {
    /// Command completed with no payload.
    Done,
    /// A call snapshot.
    Call(Call),
    /// A local media stream descriptor.
    Stream(MediaStream),
}

impl PeerReply {
    /// The call snapshot, if the command returned one.
    pub fn into_call(self) -> Option<Call> {
        match self {
            PeerReply::Call(call) => Some(call),
            _ => None,
        }
    }

    /// The stream descriptor, if the command returned one.
    pub fn into_stream(self) -> Option<MediaStream> {
        match self {
            PeerReply::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Secondary simulated client driven through [`PeerActor::exec`].
#[derive(Debug)]
pub struct PeerActor {
    client: SimClient,
    user_id: UserId,
}

impl PeerActor {
    /// Create a peer: a fresh client with its own open session.
    pub async fn create(world: &SimWorld) -> Result<Self, ClientError> {
        let client = SimClient::new(world);
        let credentials = Credentials { email: "peer@sim.local".into(), token: "sim".into() };
        let user_id = client.logon(&credentials).await?;
        tracing::debug!(user_id, "peer actor created");
        Ok(Self { client, user_id })
    }

    /// The peer's user id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Forward one command to the underlying client.
    pub async fn exec(&self, command: PeerCommand) -> Result<PeerReply, ClientError> {
        tracing::debug!(user_id = self.user_id, ?command, "peer exec");
        match command {
            PeerCommand::JoinConference { call_id, media } => {
                self.client.join_conference(call_id, media).await?;
                Ok(PeerReply::Done)
            },
            PeerCommand::MuteParticipant { call_id, user_id } => {
                self.client.mute_participant(call_id, user_id).await?;
                Ok(PeerReply::Done)
            },
            PeerCommand::Mute { call_id } => {
                self.client.mute(call_id).await?;
                Ok(PeerReply::Done)
            },
            PeerCommand::Unmute { call_id } => {
                self.client.unmute(call_id).await?;
                Ok(PeerReply::Done)
            },
            PeerCommand::FindCall { call_id } => {
                Ok(PeerReply::Call(self.client.find_call(call_id).await?))
            },
            PeerCommand::GetLocalAudioVideoStream => {
                Ok(PeerReply::Stream(self.client.get_local_audio_video_stream().await?))
            },
        }
    }

    /// Close the peer's session.
    pub async fn destroy(self) -> Result<(), ClientError> {
        tracing::debug!(user_id = self.user_id, "peer actor destroyed");
        self.client.logout().await
    }
}
