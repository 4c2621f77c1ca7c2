//! Interactive Augmentation under concurrent triggers

use serde_json::json;
use std::sync::Arc;

use crate::core::generation::{
    AnchorStatus, BlockStatus, FlowKind, GenerateOutcome, GenerationError, PatchPlacement,
    TriggerOutcome,
};
use crate::core::library::InMemoryLibrary;
use crate::core::llm::{ModelReply, ProviderError};
use crate::tests::mocks::{model_reply, no_campaign, orchestrator, GatedProvider, ScriptedProvider};

fn passage(text: &str) -> Result<ModelReply, ProviderError> {
    Ok(ModelReply::text(json!({ "passage": text }).to_string()))
}

#[tokio::test]
async fn test_bookshelf_expands_through_block() {
    let provider = ScriptedProvider::with_replies(vec![
        Ok(model_reply(FlowKind::BookshelfContents)),
        passage("The ink ran red."),
    ]);
    let block = orchestrator(
        "bookshelf-contents",
        provider.clone(),
        no_campaign(),
        Arc::new(InMemoryLibrary::new()),
    );

    assert!(block.interactive().await.unwrap().is_none());
    assert!(matches!(block.generate().await, GenerateOutcome::Ready(_)));

    let live = block.interactive().await.unwrap().unwrap();
    assert_eq!(live.anchor_keys().await.len(), 4);

    let outcome = live.trigger("Tides & Tallies").await.unwrap();
    assert_eq!(outcome, TriggerOutcome::Patched(PatchPlacement::InPlace));
    assert!(provider.requests()[1].prompt.contains("\"Tides & Tallies\""));

    let fragment = live.document().await.fragment("Tides & Tallies").cloned().unwrap();
    assert_eq!(fragment.patch.as_deref(), Some("<p><em>The ink ran red.</em></p>"));

    // The block's own result is not touched by the live view
    let snapshot = block.snapshot().await;
    assert_eq!(snapshot.status, BlockStatus::Ready);
    assert!(!snapshot.result.unwrap().html().contains("The ink ran red."));
}

#[tokio::test]
async fn test_anchors_load_independently_and_patch_by_key() {
    let shelf = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::BookshelfContents))]);
    let block = orchestrator("bookshelf-contents", shelf, no_campaign(), Arc::new(InMemoryLibrary::new()));
    block.generate().await;
    let rendered = block.snapshot().await.result.unwrap().rendered;

    let provider = GatedProvider::new();
    let first_gate = provider.gate();
    let second_gate = provider.gate();
    let live = Arc::new(
        crate::core::generation::augment(
            rendered,
            "bookshelf-contents",
            crate::tests::mocks::executor(provider.clone()),
        )
        .unwrap()
        .unwrap(),
    );

    let ashen = tokio::spawn({
        let live = live.clone();
        async move { live.trigger("The Ashen Codex").await }
    });
    provider.wait_for_calls(1).await;
    let fen = tokio::spawn({
        let live = live.clone();
        async move { live.trigger("Songs of the Fen").await }
    });
    provider.wait_for_calls(2).await;

    assert_eq!(live.status("The Ashen Codex").await, AnchorStatus::Loading);
    assert_eq!(live.status("Songs of the Fen").await, AnchorStatus::Loading);

    // A repeat trigger on a loading anchor is ignored and issues no request
    assert_eq!(
        live.trigger("The Ashen Codex").await.unwrap(),
        TriggerOutcome::Ignored
    );
    assert_eq!(provider.calls(), 2);

    // Complete in reverse order
    second_gate.send(passage("Frogs sang of it.")).unwrap();
    fen.await.unwrap().unwrap();
    first_gate.send(passage("Ash fell like snow.")).unwrap();
    ashen.await.unwrap().unwrap();

    let doc = live.document().await;
    assert_eq!(
        doc.fragment("The Ashen Codex").unwrap().patch.as_deref(),
        Some("<p><em>Ash fell like snow.</em></p>")
    );
    assert_eq!(
        doc.fragment("Songs of the Fen").unwrap().patch.as_deref(),
        Some("<p><em>Frogs sang of it.</em></p>")
    );
    assert!(doc.fragment("Tides & Tallies").unwrap().patch.is_none());
}

#[tokio::test]
async fn test_failed_anchor_can_be_retried() {
    let shelf = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::BookshelfContents))]);
    let block = orchestrator("bookshelf-contents", shelf, no_campaign(), Arc::new(InMemoryLibrary::new()));
    block.generate().await;
    let rendered = block.snapshot().await.result.unwrap().rendered;

    let provider = ScriptedProvider::with_replies(vec![
        Err(ProviderError::Api {
            status: 500,
            message: "boom".to_string(),
        }),
        passage("Second time lucky."),
    ]);
    let live = crate::core::generation::augment(
        rendered,
        "bookshelf-contents",
        crate::tests::mocks::executor(provider),
    )
    .unwrap()
    .unwrap();

    let err = live.trigger("On Lesser Wyrms").await.unwrap_err();
    match err {
        GenerationError::AugmentationFailed { key, source } => {
            assert_eq!(key, "On Lesser Wyrms");
            assert!(matches!(*source, GenerationError::Provider { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(live.status("On Lesser Wyrms").await, AnchorStatus::Idle);

    live.trigger("On Lesser Wyrms").await.unwrap();
    assert_eq!(live.status("On Lesser Wyrms").await, AnchorStatus::Patched);
    assert!(live.html().await.contains("Second time lucky."));
}

#[tokio::test]
async fn test_failed_retrigger_keeps_earlier_patch() {
    let shelf = ScriptedProvider::with_replies(vec![Ok(model_reply(FlowKind::BookshelfContents))]);
    let block = orchestrator("bookshelf-contents", shelf, no_campaign(), Arc::new(InMemoryLibrary::new()));
    block.generate().await;
    let rendered = block.snapshot().await.result.unwrap().rendered;

    let provider = ScriptedProvider::with_replies(vec![
        passage("Scales like coins."),
        Err(ProviderError::Api {
            status: 500,
            message: "boom".to_string(),
        }),
    ]);
    let live = crate::core::generation::augment(
        rendered,
        "bookshelf-contents",
        crate::tests::mocks::executor(provider),
    )
    .unwrap()
    .unwrap();

    live.trigger("On Lesser Wyrms").await.unwrap();
    assert_eq!(live.status("On Lesser Wyrms").await, AnchorStatus::Patched);

    let err = live.trigger("On Lesser Wyrms").await.unwrap_err();
    assert!(matches!(err, GenerationError::AugmentationFailed { .. }));
    assert_eq!(live.status("On Lesser Wyrms").await, AnchorStatus::Patched);
    assert!(live.html().await.contains("Scales like coins."));
}
