//! Ordered expectation matching with timeouts.
//!
//! The waiter subscribes once per distinct event kind referenced by the list,
//! funnels emissions through a channel, and advances a cursor through the
//! expectations. Expectations are satisfied strictly in list order; arrival
//! order of other traffic is unconstrained and ignored.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{Instant, timeout},
};

use crate::{
    ExpectError,
    source::{EventSource, ListenerId, TypedEvent},
};

/// Default wait budget when the caller does not supply one.
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_millis(10_000);

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// One (kind, predicate) pair an event must satisfy to be considered a match.
///
/// Immutable once built; a wait never re-evaluates earlier expectations.
pub struct Expectation<E: TypedEvent> {
    kind: E::Kind,
    predicate: Predicate<E>,
}

impl<E: TypedEvent> Expectation<E> {
    /// Build an expectation for `kind` whose payload satisfies `predicate`.
    pub fn new<F>(kind: E::Kind, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self { kind, predicate: Box::new(predicate) }
    }

    /// The event kind this expectation waits for.
    pub fn kind(&self) -> E::Kind {
        self.kind
    }

    fn matches(&self, event: &E) -> bool {
        event.kind() == self.kind && (self.predicate)(event)
    }
}

impl<E: TypedEvent> std::fmt::Debug for Expectation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Ordered sequence of expectations.
///
/// Position defines required satisfaction order: at most one expectation (the
/// one at the cursor) is active at any time.
#[derive(Debug, Default)]
pub struct ExpectationList<E: TypedEvent> {
    items: Vec<Expectation<E>>,
}

impl<E: TypedEvent> ExpectationList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an expectation, consuming and returning the list.
    #[must_use]
    pub fn then<F>(mut self, kind: E::Kind, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.items.push(Expectation::new(kind, predicate));
        self
    }

    /// Number of expectations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no expectations were added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct kinds referenced anywhere in the list, in first-seen order.
    fn distinct_kinds(&self) -> Vec<E::Kind> {
        let mut kinds: Vec<E::Kind> = Vec::new();
        for item in &self.items {
            if !kinds.contains(&item.kind) {
                kinds.push(item.kind);
            }
        }
        kinds
    }
}

impl<E: TypedEvent> From<Vec<Expectation<E>>> for ExpectationList<E> {
    fn from(items: Vec<Expectation<E>>) -> Self {
        Self { items }
    }
}

/// Wait for `list` against `source` with the default budget.
///
/// See [`expect_events_within`].
pub async fn expect_events<E, S>(
    source: &S,
    list: ExpectationList<E>,
) -> Result<Vec<E>, ExpectError<E::Kind>>
where
    E: TypedEvent,
    S: EventSource<E> + ?Sized,
{
    expect_events_within(source, list, DEFAULT_EXPECT_TIMEOUT).await
}

/// Wait until every expectation in `list` is satisfied in order, or `budget`
/// elapses.
///
/// Subscribes exactly once per distinct kind referenced by the list and
/// releases every subscription before returning, on success and on failure.
/// Events whose kind or payload does not match the active expectation are
/// ignored. On timeout the error names the outstanding expectation.
///
/// If the source drops this wait's listeners mid-flight (scenario teardown
/// calling `remove_all_listeners`), the wait is not resolved early: it runs
/// out its remaining budget and reports the same timeout it would for silent
/// traffic.
pub async fn expect_events_within<E, S>(
    source: &S,
    list: ExpectationList<E>,
    budget: Duration,
) -> Result<Vec<E>, ExpectError<E::Kind>>
where
    E: TypedEvent,
    S: EventSource<E> + ?Sized,
{
    if list.is_empty() {
        return Err(ExpectError::EmptyExpectationList);
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<E>();
    let mut listeners: Vec<ListenerId> = Vec::new();
    for kind in list.distinct_kinds() {
        let tx = tx.clone();
        listeners.push(source.on(
            kind,
            Arc::new(move |event: &E| {
                // Receiver gone means the wait already finished; late
                // emissions are dropped on the floor.
                let _ = tx.send(event.clone());
            }),
        ));
    }
    // Only handler clones keep the channel open now. `recv` returning `None`
    // therefore means every listener was torn down under us.
    drop(tx);

    tracing::debug!(expectations = list.len(), subscriptions = listeners.len(), ?budget, "wait started");

    let deadline = Instant::now() + budget;
    let mut matched: Vec<E> = Vec::with_capacity(list.len());

    let outcome = loop {
        let Some(active) = list.items.get(matched.len()) else {
            break Ok(());
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break Err(timed_out(matched.len(), active.kind(), budget));
        }

        match timeout(remaining, rx.recv()).await {
            Ok(Some(event)) => {
                if active.matches(&event) {
                    tracing::trace!(kind = ?event.kind(), cursor = matched.len(), "expectation satisfied");
                    matched.push(event);
                } else {
                    tracing::trace!(kind = ?event.kind(), cursor = matched.len(), "event ignored");
                }
            },
            Ok(None) => {
                // Listeners were removed out from under us. Preserve the
                // observable timeout-based failure instead of failing fast.
                tokio::time::sleep_until(deadline).await;
                break Err(timed_out(matched.len(), active.kind(), budget));
            },
            Err(_) => break Err(timed_out(matched.len(), active.kind(), budget)),
        }
    };

    for listener in listeners {
        source.off(listener);
    }

    match outcome {
        Ok(()) => {
            tracing::debug!(matched = matched.len(), "wait resolved");
            Ok(matched)
        },
        Err(err) => {
            tracing::debug!(%err, "wait failed");
            Err(err)
        },
    }
}

fn timed_out<K: std::fmt::Debug>(index: usize, kind: K, budget: Duration) -> ExpectError<K> {
    ExpectError::Timeout { index, kind, timeout: budget }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::EventBus;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestEvent {
        Status(u32),
        Note(&'static str),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Status,
        Note,
    }

    impl TypedEvent for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                TestEvent::Status(_) => TestKind::Status,
                TestEvent::Note(_) => TestKind::Note,
            }
        }
    }

    #[tokio::test]
    async fn empty_list_fails_fast() {
        let bus = EventBus::<TestEvent>::new();
        let result = expect_events(&bus, ExpectationList::new()).await;
        assert_eq!(result, Err(ExpectError::EmptyExpectationList));
    }

    #[tokio::test]
    async fn duplicate_kinds_subscribe_once() {
        let bus = EventBus::<TestEvent>::new();
        let list = ExpectationList::new()
            .then(TestKind::Status, |e| matches!(e, TestEvent::Status(1)))
            .then(TestKind::Status, |e| matches!(e, TestEvent::Status(2)));

        let emitter = bus.clone();
        let wait = tokio::spawn(async move {
            expect_events_within(&bus, list, Duration::from_secs(1)).await
        });

        // Give the waiter a beat to subscribe, then verify the single
        // subscription for the one distinct kind.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(emitter.listener_count(), 1);

        emitter.emit(&TestEvent::Status(1));
        emitter.emit(&TestEvent::Status(2));

        let matched = wait.await.unwrap().unwrap();
        assert_eq!(matched, vec![TestEvent::Status(1), TestEvent::Status(2)]);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[tokio::test]
    async fn timeout_names_outstanding_expectation() {
        let bus = EventBus::<TestEvent>::new();
        let list = ExpectationList::new()
            .then(TestKind::Status, |e| matches!(e, TestEvent::Status(1)))
            .then(TestKind::Note, |_| true);

        let emitter = bus.clone();
        let wait = tokio::spawn(async move {
            expect_events_within(&bus, list, Duration::from_millis(100)).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        emitter.emit(&TestEvent::Status(1));

        let err = wait.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            ExpectError::Timeout {
                index: 1,
                kind: TestKind::Note,
                timeout: Duration::from_millis(100)
            }
        );
        // No dangling listeners after failure.
        assert_eq!(emitter.listener_count(), 0);
    }

    #[tokio::test]
    async fn wrong_payload_does_not_advance_cursor() {
        let bus = EventBus::<TestEvent>::new();
        let list =
            ExpectationList::new().then(TestKind::Status, |e| matches!(e, TestEvent::Status(2)));

        let emitter = bus.clone();
        let wait = tokio::spawn(async move {
            expect_events_within(&bus, list, Duration::from_millis(100)).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        emitter.emit(&TestEvent::Status(1));
        emitter.emit(&TestEvent::Note("noise"));

        let err = wait.await.unwrap().unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn teardown_leaves_wait_to_time_out() {
        let bus = EventBus::<TestEvent>::new();
        let list = ExpectationList::new().then(TestKind::Status, |_| true);

        let emitter = bus.clone();
        let started = Instant::now();
        let wait = tokio::spawn(async move {
            expect_events_within(&bus, list, Duration::from_millis(150)).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        emitter.remove_all_listeners();

        let err = wait.await.unwrap().unwrap_err();
        assert!(err.is_timeout());
        // The wait ran out its budget rather than failing the moment its
        // listeners disappeared.
        assert!(started.elapsed() >= Duration::from_millis(150));
    }
}
