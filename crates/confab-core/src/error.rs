//! Matcher error types.
//!
//! A timeout names the expectation that was still outstanding so a failing
//! scenario reports which step of the sequence never arrived, not just that
//! "something" timed out.

use std::{fmt, time::Duration};

use thiserror::Error;

/// Errors produced by [`expect_events`](crate::expect_events).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectError<K: fmt::Debug> {
    /// The expectation list was empty. A wait with nothing to wait for is a
    /// scenario bug, not a vacuous success.
    #[error("expectation list is empty")]
    EmptyExpectationList,

    /// The deadline elapsed before every expectation was satisfied.
    #[error("timed out after {timeout:?} waiting for expectation {index} ({kind:?})")]
    Timeout {
        /// Cursor position of the unsatisfied expectation.
        index: usize,
        /// Event kind that expectation was waiting for.
        kind: K,
        /// The full wait budget that elapsed.
        timeout: Duration,
    },
}

impl<K: fmt::Debug> ExpectError<K> {
    /// Returns true if this error is the deadline elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reports_outstanding_expectation() {
        let err: ExpectError<&str> =
            ExpectError::Timeout { index: 1, kind: "callStatus", timeout: Duration::from_secs(10) };

        assert!(err.is_timeout());
        let rendered = err.to_string();
        assert!(rendered.contains("expectation 1"));
        assert!(rendered.contains("callStatus"));
    }

    #[test]
    fn empty_list_is_not_a_timeout() {
        let err: ExpectError<&str> = ExpectError::EmptyExpectationList;
        assert!(!err.is_timeout());
    }
}
