//! Confab client boundary
//!
//! The public surface of the external collaboration client, as consumed by
//! scenario tests: conversation and conference call control, conversation
//! labeling, and the asynchronous event emission interface.
//!
//! Nothing here implements signaling or a labeling backend; this crate
//! defines the shapes scenarios depend on. The [`CollabClient`] trait is the
//! remote call surface, and [`ClientEvent`] (a [`confab_core::TypedEvent`])
//! is what the client's event source emits.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod config;
mod error;
mod event;
mod types;

pub use api::CollabClient;
pub use config::{ClientConfig, Credentials};
pub use error::ClientError;
pub use event::{CallStatusReason, ClientEvent, EventKind, UserDataChanged};
pub use types::{
    Call, CallId, CallState, ConvId, Conversation, ConversationFilter, FilterCondition,
    FilterConnector, FilterTarget, Label, LabelEdit, LabelId, MediaOptions, MediaStream,
    Participant, RetrieveAction, UserData, UserId,
};
