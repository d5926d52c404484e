//! Harness error taxonomy.
//!
//! Three terminal failure classes per scenario: an event expectation timing
//! out, a remote call failing, and a post-wait state check not matching. No
//! recovery is attempted for any of them.

use confab_client::{ClientError, EventKind};
use confab_core::ExpectError;
use thiserror::Error;

/// Errors that abort a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// An event expectation was not satisfied in time.
    #[error("event expectation failed: {0}")]
    Expect(#[from] ExpectError<EventKind>),

    /// A client call failed; surfaced unchanged.
    #[error("client call failed: {0}")]
    Client(#[from] ClientError),

    /// A refetched state check did not match the expected value.
    #[error("assertion failed: {context}")]
    Assertion {
        /// What was being checked.
        context: String,
    },
}

/// Fail the scenario with [`HarnessError::Assertion`] unless `condition`
/// holds.
pub fn ensure(condition: bool, context: impl Into<String>) -> Result<(), HarnessError> {
    if condition { Ok(()) } else { Err(HarnessError::Assertion { context: context.into() }) }
}
