//! Conversation label scenarios: create, edit, assign, query, unassign,
//! remove, with the matching events observed at every step.

#![allow(clippy::expect_used)]

use confab_client::{
    ClientConfig, ClientError, ClientEvent, CollabClient, ConversationFilter, EventKind, LabelEdit,
};
use confab_core::{ExpectationList, expect_events_within};
use confab_harness::{HarnessError, ScenarioContext, SimWorld, ensure, logging, settle};

/// Connection settings for sim runs, with budgets tightened for an
/// in-process backend.
fn sim_config() -> Result<ClientConfig, ClientError> {
    ClientConfig::from_toml_str(
        r#"
        domain = "sim.local"
        expect_timeout_ms = 2000
        settle_delay_ms = 100

        [credentials]
        email = "bot1@sim.local"
        token = "sim"
        "#,
    )
}

async fn logged_on_context() -> Result<ScenarioContext, HarnessError> {
    logging::init();
    let ctx = ScenarioContext::new(SimWorld::new(), sim_config()?);
    ctx.client.logon(&ctx.config.credentials).await?;
    Ok(ctx)
}

#[tokio::test]
async fn label_lifecycle() -> Result<(), HarnessError> {
    let mut ctx = logged_on_context().await?;

    // Add two labels and observe the creation event carrying both values.
    let values = ["sdk-test-red".to_string(), "sdk-test-blue".to_string()];
    let expected_values = values.clone();
    let (added, observed) = tokio::join!(
        ctx.client.add_labels(&values),
        expect_events_within(
            ctx.client.bus(),
            ExpectationList::new().then(EventKind::LabelsAdded, move |event| {
                matches!(
                    event,
                    ClientEvent::LabelsAdded { labels }
                        if labels.len() == 2
                            && labels.iter().all(|l| expected_values.contains(&l.value))
                )
            }),
            ctx.config.expect_timeout(),
        ),
    );
    let added = added?;
    observed?;
    for label in &added {
        ctx.added_labels.insert(label.label_id, label.clone());
    }

    let listing = ctx.client.get_all_labels().await?;
    ensure(added.iter().all(|l| listing.contains(l)), "added labels appear in the listing")?;

    // Edit the first label's value.
    let edited_id = added[0].label_id;
    let edit = LabelEdit { label_id: edited_id, value: "sdk-test-crimson".into() };
    let (edited, observed) = tokio::join!(
        ctx.client.edit_label(edit),
        expect_events_within(
            ctx.client.bus(),
            ExpectationList::new().then(EventKind::LabelEdited, move |event| {
                matches!(
                    event,
                    ClientEvent::LabelEdited { label }
                        if label.label_id == edited_id && label.value == "sdk-test-crimson"
                )
            }),
            ctx.config.expect_timeout(),
        ),
    );
    let edited = edited?;
    observed?;
    ensure(edited.value == "sdk-test-crimson", "edit returns the updated label")?;
    let listing = ctx.client.get_all_labels().await?;
    ensure(
        listing.iter().any(|l| l.label_id == edited_id && l.value == "sdk-test-crimson"),
        "edited value appears in the listing",
    )?;

    // Assign both labels to a fresh conversation.
    let conversation =
        ctx.client.create_group_conversation(&[], "SDK Test: Labels").await?;
    let conv_id = conversation.conv_id;
    ctx.conversation = Some(conversation);

    let label_ids: Vec<u128> = added.iter().map(|l| l.label_id).collect();
    let expected_ids = label_ids.clone();
    let (assigned, observed) = tokio::join!(
        ctx.client.assign_labels(conv_id, &label_ids),
        expect_events_within(
            ctx.client.bus(),
            ExpectationList::new().then(EventKind::ConversationUserDataChanged, move |event| {
                matches!(
                    event,
                    ClientEvent::ConversationUserDataChanged { data }
                        if data.conv_id == conv_id
                            && expected_ids.iter().all(|id| data.label_ids.contains(id))
                )
            }),
            ctx.config.expect_timeout(),
        ),
    );
    let assigned = assigned?;
    observed?;
    ensure(assigned.len() == 2, "both labels assigned")?;

    let refetched = ctx.client.get_conversation_by_id(conv_id).await?;
    ensure(
        label_ids.iter().all(|id| refetched.user_data.label_ids.contains(id)),
        "assignments visible on the refetched conversation",
    )?;

    // Both query paths find the labeled conversation.
    settle(ctx.config.settle_delay()).await;
    let by_filter =
        ctx.client.get_conversations_by_filter(&ConversationFilter::by_label(edited_id)).await?;
    ensure(
        by_filter.iter().any(|c| c.conv_id == conv_id),
        "filter query returns the labeled conversation",
    )?;
    let by_label = ctx.client.get_conversations_by_label(label_ids[1]).await?;
    ensure(
        by_label.iter().any(|c| c.conv_id == conv_id),
        "label query returns the labeled conversation",
    )?;

    // Unassign the first label; the event reports the remaining assignment.
    let unassigned_id = label_ids[0];
    let remaining_id = label_ids[1];
    let unassign_ids = [unassigned_id];
    let (unassigned, observed) = tokio::join!(
        ctx.client.unassign_labels(conv_id, &unassign_ids),
        expect_events_within(
            ctx.client.bus(),
            ExpectationList::new().then(EventKind::ConversationUserDataChanged, move |event| {
                matches!(
                    event,
                    ClientEvent::ConversationUserDataChanged { data }
                        if data.conv_id == conv_id
                            && !data.label_ids.contains(&unassigned_id)
                            && data.label_ids.contains(&remaining_id)
                )
            }),
            ctx.config.expect_timeout(),
        ),
    );
    observed?;
    ensure(unassigned? == vec![remaining_id], "one assignment remains")?;

    // Remove both labels; the removal also clears the leftover assignment.
    let expected_removed = label_ids.clone();
    let (removed, observed) = tokio::join!(
        ctx.client.remove_labels(&label_ids),
        expect_events_within(
            ctx.client.bus(),
            ExpectationList::new().then(EventKind::LabelsRemoved, move |event| {
                matches!(
                    event,
                    ClientEvent::LabelsRemoved { label_ids }
                        if expected_removed.iter().all(|id| label_ids.contains(id))
                )
            }),
            ctx.config.expect_timeout(),
        ),
    );
    let removed = removed?;
    observed?;
    ensure(removed.len() == 2, "both labels removed")?;

    let listing = ctx.client.get_all_labels().await?;
    ensure(
        listing.iter().all(|l| !label_ids.contains(&l.label_id)),
        "removed labels are gone from the listing",
    )?;
    let refetched = ctx.client.get_conversation_by_id(conv_id).await?;
    ensure(refetched.user_data.label_ids.is_empty(), "removal cleared the assignment")?;

    ctx.teardown();
    Ok(())
}

#[tokio::test]
async fn assign_rejects_unknown_label() -> Result<(), HarnessError> {
    let ctx = logged_on_context().await?;
    let conversation = ctx.client.create_group_conversation(&[], "SDK Test: Labels").await?;

    let err = ctx
        .client
        .assign_labels(conversation.conv_id, &[0xDEAD_BEEF])
        .await
        .expect_err("assigning a label that was never created must fail");
    assert!(matches!(err, ClientError::LabelNotFound(0xDEAD_BEEF)));

    ctx.teardown();
    Ok(())
}

#[tokio::test]
async fn filter_only_matches_labeled_conversations() -> Result<(), HarnessError> {
    let ctx = logged_on_context().await?;

    let labeled = ctx.client.create_group_conversation(&[], "SDK Test: Labeled").await?;
    let unlabeled = ctx.client.create_group_conversation(&[], "SDK Test: Unlabeled").await?;
    let labels = ctx.client.add_labels(&["sdk-test-only".to_string()]).await?;
    ctx.client.assign_labels(labeled.conv_id, &[labels[0].label_id]).await?;

    let matches =
        ctx.client.get_conversations_by_filter(&ConversationFilter::by_label(labels[0].label_id)).await?;
    ensure(matches.len() == 1, "exactly one conversation carries the label")?;
    ensure(matches[0].conv_id == labeled.conv_id, "the labeled conversation matches")?;
    ensure(
        matches.iter().all(|c| c.conv_id != unlabeled.conv_id),
        "the unlabeled conversation does not match",
    )?;

    ctx.teardown();
    Ok(())
}

#[tokio::test]
async fn label_operations_require_a_session() -> Result<(), HarnessError> {
    logging::init();
    let ctx = ScenarioContext::new(SimWorld::new(), sim_config()?);

    let err = ctx.client.get_all_labels().await.expect_err("no session is open");
    assert!(matches!(err, ClientError::NotLoggedOn));
    Ok(())
}
