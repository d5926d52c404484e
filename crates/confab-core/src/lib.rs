//! Confab core
//!
//! Ordered asynchronous event matching against an event-emitting collaborator.
//!
//! # Architecture
//!
//! A scenario registers an ordered [`ExpectationList`] against an
//! [`EventSource`], then triggers actions that make the source emit events.
//! [`expect_events`] consumes the emissions and advances a cursor through the
//! list: an event advances the cursor only when its kind matches the active
//! expectation's kind and the expectation's predicate accepts it. Everything
//! else is ignored, which tolerates duplicate and unrelated traffic from the
//! collaborator.
//!
//! # Components
//!
//! - [`TypedEvent`]: events discriminated by a copyable kind
//! - [`EventSource`]: the subscription boundary (`on` / `off` /
//!   `remove_all_listeners`)
//! - [`EventBus`]: a shared in-process listener registry implementing
//!   [`EventSource`]
//! - [`Expectation`] / [`ExpectationList`]: ordered (kind, predicate) pairs
//! - [`expect_events`] / [`expect_events_within`]: the waiter

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod expect;
mod source;

pub use error::ExpectError;
pub use expect::{
    DEFAULT_EXPECT_TIMEOUT, Expectation, ExpectationList, expect_events, expect_events_within,
};
pub use source::{EventBus, EventHandler, EventSource, ListenerId, TypedEvent};
