//! Scenario context.
//!
//! Explicit per-suite state threaded through scenario functions, replacing
//! the global conversation/label fixtures a looser harness would reach for.
//! The top-level test owns it; teardown runs through [`ScenarioContext::teardown`].

use std::collections::HashMap;

use confab_client::{ClientConfig, CollabClient, Conversation, Label, LabelId};

use crate::{
    error::HarnessError,
    sim::{SimClient, SimWorld},
};

/// State shared by the scenarios of one suite.
#[derive(Debug)]
pub struct ScenarioContext {
    /// The simulated backend.
    pub world: SimWorld,
    /// The primary client under test.
    pub client: SimClient,
    /// Connection settings; suites take credentials and the expect/settle
    /// budgets from here rather than pinning their own.
    pub config: ClientConfig,
    /// Conversation the suite operates on, once created.
    pub conversation: Option<Conversation>,
    /// Labels added so far, by id.
    pub added_labels: HashMap<LabelId, Label>,
}

impl ScenarioContext {
    /// Create a context with a fresh primary client on `world`.
    pub fn new(world: SimWorld, config: ClientConfig) -> Self {
        let client = SimClient::new(&world);
        Self { world, client, config, conversation: None, added_labels: HashMap::new() }
    }

    /// The suite's conversation; an assertion failure if none was created.
    pub fn conversation(&self) -> Result<&Conversation, HarnessError> {
        self.conversation
            .as_ref()
            .ok_or_else(|| HarnessError::Assertion { context: "no conversation created".into() })
    }

    /// Per-scenario housekeeping: drop every listener on the primary client.
    ///
    /// In-flight waits are not cancelled; they run out their deadline.
    pub fn teardown(&self) {
        self.client.events().remove_all_listeners();
    }
}
