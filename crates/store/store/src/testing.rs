//! Conformance tests for store backends.
//!
//! Call these from a backend's test module with fresh store instances, the
//! same way the memory backend does.

use escalon_core::{Condition, ConversationId};

use crate::error::StoreError;
use crate::rules::RuleStore;
use crate::store::MessageStore;

/// Run the full rule-store conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_rule_store_conformance_tests(store: &dyn RuleStore) -> Result<(), StoreError> {
    test_empty_snapshot(store).await?;
    test_create_assigns_id(store).await?;
    test_snapshot_preserves_order(store).await?;
    test_create_validates_input(store).await?;
    Ok(())
}

async fn test_empty_snapshot(store: &dyn RuleStore) -> Result<(), StoreError> {
    let rules = store.get_all_rules().await?;
    assert!(rules.is_empty(), "fresh store should have no rules");
    Ok(())
}

async fn test_create_assigns_id(store: &dyn RuleStore) -> Result<(), StoreError> {
    let rule = store
        .create_rule("distress", vec![Condition::new("help", ">=", 2)], "page")
        .await?;
    assert!(!rule.id.is_empty(), "created rule must carry an id");
    assert_eq!(rule.name, "distress");
    Ok(())
}

async fn test_snapshot_preserves_order(store: &dyn RuleStore) -> Result<(), StoreError> {
    let first = store
        .create_rule("first", vec![Condition::new("a", ">", 0)], "log")
        .await?;
    let second = store
        .create_rule("second", vec![Condition::new("b", ">", 0)], "log")
        .await?;

    let rules = store.get_all_rules().await?;
    let pos_first = rules
        .iter()
        .position(|r| r.id == first.id)
        .expect("first rule present");
    let pos_second = rules
        .iter()
        .position(|r| r.id == second.id)
        .expect("second rule present");
    assert!(
        pos_first < pos_second,
        "snapshot must preserve creation order"
    );
    Ok(())
}

async fn test_create_validates_input(store: &dyn RuleStore) -> Result<(), StoreError> {
    let result = store.create_rule("no-conditions", Vec::new(), "log").await;
    assert!(
        matches!(result, Err(StoreError::InvalidRule(_))),
        "zero-condition rules must be rejected at creation"
    );
    Ok(())
}

/// Run the full message-store conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_message_store_conformance_tests(
    store: &dyn MessageStore,
) -> Result<(), StoreError> {
    test_counts_for_unknown_conversation(store).await?;
    test_counts_aggregate_history(store).await?;
    test_conversations_are_isolated(store).await?;
    Ok(())
}

async fn test_counts_for_unknown_conversation(store: &dyn MessageStore) -> Result<(), StoreError> {
    let counts = store
        .get_word_counts(&ConversationId::new("never-seen"))
        .await?;
    assert!(counts.is_empty(), "unknown conversation has empty counts");
    Ok(())
}

async fn test_counts_aggregate_history(store: &dyn MessageStore) -> Result<(), StoreError> {
    let conv = ConversationId::new("conv-agg");
    store.save_message(&conv, "Help, help!", 1).await?;
    store.save_message(&conv, "please HELP", 2).await?;

    let counts = store.get_word_counts(&conv).await?;
    assert_eq!(counts.count("help"), 3);
    assert_eq!(counts.count("please"), 1);
    Ok(())
}

async fn test_conversations_are_isolated(store: &dyn MessageStore) -> Result<(), StoreError> {
    let a = ConversationId::new("conv-a");
    let b = ConversationId::new("conv-b");
    store.save_message(&a, "alpha", 1).await?;
    store.save_message(&b, "beta", 1).await?;

    let counts_a = store.get_word_counts(&a).await?;
    assert_eq!(counts_a.count("alpha"), 1);
    assert_eq!(counts_a.count("beta"), 0);
    Ok(())
}
