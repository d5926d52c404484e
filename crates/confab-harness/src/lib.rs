//! Confab harness
//!
//! Deterministic simulation harness for driving the Confab client surface
//! end to end: a simulated collaboration backend, peer actors for producing
//! side-effect events, and the sequencing helpers scenarios are built from.
//!
//! Scenario suites live under `tests/` and all follow the same shape:
//! act (client or peer calls), await events (ordered expectation lists via
//! [`confab_core::expect_events`]), settle or poll, then assert on refetched
//! state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod context;
mod error;
mod peer;
mod settle;
mod sim;

pub mod logging;

pub use context::ScenarioContext;
pub use error::{HarnessError, ensure};
pub use peer::{PeerActor, PeerCommand, PeerReply};
pub use settle::{poll_until, settle};
pub use sim::{SimClient, SimWorld};
