//! E2E tests for error paths and degraded backends.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{PhraseBook, ScriptedGenerator, TestHarness};

/// A failing generator backend surfaces as 502 with the backend's message.
#[tokio::test]
async fn e2e_generator_failure_is_bad_gateway() {
    let generator = ScriptedGenerator::new();
    generator.fail(500, "CUDA out of memory");
    let h = TestHarness::new(generator).await;

    let (status, json) = h.generate_sentence("turn on the light").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], 502);
    assert!(json["error"].as_str().unwrap().contains("CUDA out of memory"));
}

/// Output with no recognizable scenario yields an empty, successful response.
#[tokio::test]
async fn e2e_unparseable_output_yields_no_scenarios() {
    let generator = ScriptedGenerator::new();
    generator.reply("Sorry, I can only help with devices in your farm.");
    let h = TestHarness::new(generator).await;

    let (status, json) = h.generate_sentence("bake a pizza").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["code"].as_array().unwrap().is_empty());
    assert_eq!(json["log"]["translated_sentence"], "bake a pizza");
}

/// A translator outage falls back to the original sentence.
#[tokio::test]
async fn e2e_translation_failure_uses_original_sentence() {
    let generator = ScriptedGenerator::new();
    generator.reply("```\ncron = \"\"\nperiod = -1\n(#Light #greenhouse2).switch_on()\n```");
    let h = TestHarness::with_translator(PhraseBook::new([]), generator.clone()).await;

    let (status, json) = h.generate_sentence("2번 온실 불 켜줘").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["log"]["translated_sentence"], "2번 온실 불 켜줘");
    assert_eq!(json["code"].as_array().unwrap().len(), 1);
    assert!(generator.last_prompt().user.contains("\"2번 온실 불 켜줘\""));
}

/// Invalid timestamps are rejected before any backend is called.
#[tokio::test]
async fn e2e_invalid_current_time_rejected() {
    let generator = ScriptedGenerator::new();
    let h = TestHarness::new(generator.clone()).await;

    for bad in ["", "tomorrow morning", "2025-13-01T08:00:00", "2025-06-01"] {
        let (status, json) = h
            .generate(json!({"sentence": "turn on the light", "current_time": bad}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad:?}");
        assert_eq!(json["status"], 400);
    }
    assert!(generator.prompts().is_empty());
}

/// A blank sentence is rejected.
#[tokio::test]
async fn e2e_blank_sentence_rejected() {
    let h = TestHarness::new(ScriptedGenerator::new()).await;

    let (status, _) = h
        .generate(json!({"sentence": "   ", "current_time": "2025-06-01T08:00:00"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// An unknown site has no remembered devices.
#[tokio::test]
async fn e2e_unknown_site_not_found() {
    let h = TestHarness::new(ScriptedGenerator::new()).await;

    let (status, json) = h.get("/api/v1/sites/ghost-farm").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ghost-farm"));
}

/// An empty request on a site never seen before still answers, with only
/// the always-offered classes.
#[tokio::test]
async fn e2e_new_site_without_devices() {
    let generator = ScriptedGenerator::new();
    generator.reply("```\ncron = \"\"\nperiod = -1\n(#Light).switch_on()\n```");
    let h = TestHarness::new(generator).await;

    let (status, json) = h
        .generate(json!({
            "sentence": "turn on the light",
            "current_time": "2025-06-01T08:00:00",
            "site_id": "empty-farm",
        }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["code"].as_array().unwrap().is_empty());
    let mapped = json["log"]["mapped_devices"].as_array().unwrap();
    assert!(mapped.contains(&json!("Clock")));
    assert!(!mapped.contains(&json!("Light")));
}
