//! Block Orchestrator scenarios: lifecycle, concurrency, options, campaign
//! context and saving

use std::sync::Arc;

use crate::core::campaign::{ActiveCampaign, Campaign, NO_CAMPAIGN};
use crate::core::generation::{
    BlockStatus, FlowKind, GenerateOutcome, GenerationError, OptionValue, SaveOutcome,
    ViolationKind,
};
use crate::core::library::{InMemoryLibrary, LibraryError};
use crate::core::llm::{ModelReply, ProviderError};
use crate::tests::mocks::{
    model_reply, no_campaign, orchestrator, GatedProvider, MockLibrary, MockProvider,
    ScriptedProvider,
};

fn library() -> Arc<InMemoryLibrary> {
    Arc::new(InMemoryLibrary::new())
}

fn stormreach() -> Campaign {
    Campaign::new("c1", "Stormreach")
        .with_description("A drowned city.")
        .with_character("Ilsa", "Find her sister")
        .with_character("Brom", "Pay a debt")
}

// ============================================================================
// Lifecycle and concurrency
// ============================================================================

#[tokio::test]
async fn test_generate_while_in_flight_is_ignored() {
    let provider = GatedProvider::new();
    let gate = provider.gate();
    let block = Arc::new(orchestrator("prophecy", provider.clone(), no_campaign(), library()));

    let first = tokio::spawn({
        let block = block.clone();
        async move { block.generate().await }
    });
    provider.wait_for_calls(1).await;

    assert_eq!(block.snapshot().await.status, BlockStatus::Generating);
    assert!(matches!(block.generate().await, GenerateOutcome::Ignored));

    gate.send(Ok(model_reply(FlowKind::Prophecy))).unwrap();
    assert!(matches!(first.await.unwrap(), GenerateOutcome::Ready(_)));
    assert_eq!(provider.calls(), 1);
    assert_eq!(block.snapshot().await.status, BlockStatus::Ready);
}

#[tokio::test]
async fn test_completion_after_close_is_discarded() {
    let provider = GatedProvider::new();
    let gate = provider.gate();
    let block = Arc::new(orchestrator("prophecy", provider.clone(), no_campaign(), library()));

    let pending = tokio::spawn({
        let block = block.clone();
        async move { block.generate().await }
    });
    provider.wait_for_calls(1).await;

    block.close().await;
    gate.send(Ok(model_reply(FlowKind::Prophecy))).unwrap();

    assert!(matches!(pending.await.unwrap(), GenerateOutcome::Discarded));
    let snapshot = block.snapshot().await;
    assert!(snapshot.result.is_none());
    assert_ne!(snapshot.status, BlockStatus::Ready);
}

#[tokio::test]
async fn test_regenerate_replaces_result() {
    let provider = ScriptedProvider::new();
    provider.push(Ok(model_reply(FlowKind::Prophecy)));
    provider.push(Ok(ModelReply::text(
        r#"{"prophecy": "The ninth bell rings.", "meanings": ["x", "y", "z"]}"#,
    )));
    let block = orchestrator("prophecy", provider.clone(), no_campaign(), library());

    block.generate().await;
    let second = match block.generate().await {
        GenerateOutcome::Ready(result) => result,
        other => panic!("unexpected outcome {:?}", other),
    };

    let html = block.snapshot().await.result.unwrap().html();
    assert_eq!(html, second.html());
    assert!(html.contains("The ninth bell rings."));
    assert!(!html.contains("When the moon drowns"));
}

#[tokio::test]
async fn test_failure_then_success_clears_error() {
    let provider = ScriptedProvider::with_replies(vec![
        Err(ProviderError::RateLimited { retry_after_secs: 2 }),
        Ok(model_reply(FlowKind::Prophecy)),
    ]);
    let block = orchestrator("prophecy", provider, no_campaign(), library());

    match block.generate().await {
        GenerateOutcome::Failed(err) => {
            assert!(err.is_recoverable());
            assert!(err.user_message().contains("busy"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let failed = block.snapshot().await;
    assert_eq!(failed.status, BlockStatus::Failed);
    assert!(failed.error.is_some());

    assert!(matches!(block.generate().await, GenerateOutcome::Ready(_)));
    let ready = block.snapshot().await;
    assert_eq!(ready.status, BlockStatus::Ready);
    assert!(ready.error.is_none());
}

#[tokio::test]
async fn test_provider_error_after_ready_clears_result() {
    let provider = ScriptedProvider::with_replies(vec![
        Ok(model_reply(FlowKind::Prophecy)),
        Err(ProviderError::Api {
            status: 500,
            message: "internal".to_string(),
        }),
    ]);
    let block = orchestrator("prophecy", provider, no_campaign(), library());

    assert!(matches!(block.generate().await, GenerateOutcome::Ready(_)));
    assert!(block.snapshot().await.result.is_some());

    assert!(matches!(
        block.generate().await,
        GenerateOutcome::Failed(GenerationError::Provider { .. })
    ));
    let snapshot = block.snapshot().await;
    assert_eq!(snapshot.status, BlockStatus::Failed);
    assert!(snapshot.result.is_none());
    assert!(matches!(snapshot.error, Some(GenerationError::Provider { .. })));
}

#[tokio::test]
async fn test_plot_hook_missing_clues_fails_malformed() {
    let provider = ScriptedProvider::with_replies(vec![Ok(ModelReply::text(
        r#"{"hook": "A courier collapses at your feet."}"#,
    ))]);
    let campaigns = Arc::new(ActiveCampaign::with_active(stormreach()));
    let block = orchestrator("plot-hook", provider, campaigns, library());

    match block.generate().await {
        GenerateOutcome::Failed(GenerationError::MalformedOutput { flow, reason }) => {
            assert_eq!(flow, "plot-hook");
            assert!(reason.contains("clues"), "reason was {reason}");
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let snapshot = block.snapshot().await;
    assert_eq!(snapshot.status, BlockStatus::Failed);
    assert!(snapshot.result.is_none());
    assert!(matches!(
        snapshot.error,
        Some(GenerationError::MalformedOutput { .. })
    ));
}

// ============================================================================
// Options
// ============================================================================

#[tokio::test]
async fn test_empty_custom_value_fails_without_model_call() {
    let mut provider = MockProvider::new();
    provider.expect_id().return_const("mock");
    provider.expect_invoke().never();
    let block = orchestrator("random-contents", Arc::new(provider), no_campaign(), library());

    block
        .update_option("container", OptionValue::custom("   "))
        .await
        .unwrap();

    match block.generate().await {
        GenerateOutcome::Failed(GenerationError::InvalidInput { violation, .. }) => {
            assert_eq!(violation.field, "container");
            assert_eq!(violation.kind, ViolationKind::EmptyCustomValue);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let err = block.snapshot().await.error.unwrap();
    assert!(err.user_message().contains("custom value"));
}

#[tokio::test]
async fn test_custom_value_reaches_prompt() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::RandomContents))]);
    let block = orchestrator("random-contents", provider.clone(), no_campaign(), library());

    block
        .update_option("container", OptionValue::custom("a hollow log"))
        .await
        .unwrap();
    block.update_refinement("near a troll bridge").await;
    block.generate().await;

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("Container: a hollow log"));
    assert!(prompt.contains("Context: near a troll bridge"));
    assert!(!prompt.contains("Custom"));
}

#[tokio::test]
async fn test_fixed_secret_count() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::SecretsAndClues))]);
    let block = orchestrator("secret-clue", provider.clone(), no_campaign(), library());
    block.generate().await;
    assert!(provider.requests()[0].prompt.contains("Generate a list of 5 secrets"));
}

// ============================================================================
// Campaign context
// ============================================================================

#[tokio::test]
async fn test_no_active_campaign_never_injects_sentinel() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::Npc))]);
    let block = orchestrator("npc", provider.clone(), no_campaign(), library());

    block.update_refinement("a nervous ferryman").await;
    assert!(matches!(block.generate().await, GenerateOutcome::Ready(_)));

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("a nervous ferryman"));
    assert!(!prompt.contains(NO_CAMPAIGN));
}

#[tokio::test]
async fn test_puzzle_uses_campaign_context_without_refinement() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::Puzzle))]);
    let campaigns = Arc::new(ActiveCampaign::with_active(stormreach()));
    let block = orchestrator("puzzle", provider.clone(), campaigns, library());

    block
        .update_option("complexity", OptionValue::fixed("Challenging"))
        .await
        .unwrap();
    assert!(matches!(block.generate().await, GenerateOutcome::Ready(_)));

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("Campaign Name: Stormreach"));
    assert!(prompt.contains("Complexity: Challenging"));
    assert!(!prompt.contains(NO_CAMPAIGN));

    let snapshot = block.snapshot().await;
    assert_eq!(snapshot.status, BlockStatus::Ready);
    assert!(snapshot.result.is_some());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_roster_fills_player_characters() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::StrongStart))]);
    let campaigns = Arc::new(ActiveCampaign::with_active(stormreach()));
    let block = orchestrator("strong-start", provider.clone(), campaigns, library());

    block.generate().await;

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("Campaign Name: Stormreach"));
    assert!(prompt.contains("Ilsa, Brom"));
}

#[tokio::test]
async fn test_campaign_edits_visible_on_next_generate() {
    let provider = ScriptedProvider::with_replies(vec![
        Ok(model_reply(FlowKind::Npc)),
        Ok(model_reply(FlowKind::Npc)),
    ]);
    let campaigns = Arc::new(ActiveCampaign::with_active(stormreach()));
    let block = orchestrator("npc", provider.clone(), campaigns.clone(), library());

    block.generate().await;
    campaigns
        .upsert(stormreach().with_description("The tide has turned."))
        .await;
    block.generate().await;

    let requests = provider.requests();
    assert!(requests[0].prompt.contains("A drowned city."));
    assert!(requests[1].prompt.contains("The tide has turned."));
}

// ============================================================================
// Saving
// ============================================================================

#[tokio::test]
async fn test_save_outside_ready_is_nothing_to_save() {
    let mut sink = MockLibrary::new();
    sink.expect_save().never();
    let provider = ScriptedProvider::new();
    let block = orchestrator("prophecy", provider, no_campaign(), Arc::new(sink));

    assert_eq!(block.save().await.unwrap(), SaveOutcome::NothingToSave);
}

#[tokio::test]
async fn test_save_uses_campaign_from_generation_time() {
    let mut sink = MockLibrary::new();
    sink.expect_save()
        .withf(|campaign_id, flow_id, raw| {
            campaign_id.as_deref() == Some("c1")
                && flow_id == "prophecy"
                && raw["prophecy"] == "When the moon drowns..."
        })
        .times(1)
        .returning(|_, _, _| Ok("item-1".to_string()));

    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::Prophecy))]);
    let campaigns = Arc::new(ActiveCampaign::with_active(stormreach()));
    let block = orchestrator("prophecy", provider, campaigns.clone(), Arc::new(sink));

    block.generate().await;

    campaigns.upsert(Campaign::new("c2", "Ashfall")).await;
    campaigns.set_active("c2").await.unwrap();

    assert_eq!(
        block.save().await.unwrap(),
        SaveOutcome::Saved {
            item_id: "item-1".to_string()
        }
    );
}

#[tokio::test]
async fn test_save_failure_keeps_result() {
    let mut sink = MockLibrary::new();
    sink.expect_save()
        .returning(|_, _, _| Err(LibraryError::Io("disk full".to_string())));

    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::Prophecy))]);
    let block = orchestrator("prophecy", provider, no_campaign(), Arc::new(sink));
    block.generate().await;

    let err = block.save().await.unwrap_err();
    assert!(matches!(err, GenerationError::SaveFailed(_)));

    let snapshot = block.snapshot().await;
    assert_eq!(snapshot.status, BlockStatus::Ready);
    assert!(snapshot.result.is_some());
}

#[tokio::test]
async fn test_save_to_in_memory_library() {
    let provider = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::Prophecy))]);
    let sink = library();
    let block = orchestrator("prophecy", provider, no_campaign(), sink.clone());
    block.generate().await;

    let outcome = block.save().await.unwrap();
    let items = sink.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            item_id: items[0].id.clone()
        }
    );
    assert_eq!(items[0].campaign_id, None);
    assert_eq!(items[0].flow_id, "prophecy");
}
