//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p bedtime-core --test api_integration -- --ignored --nocapture`
//!
//! They are marked #[ignore] so CI stays free of API costs and network flakiness.

use bedtime_core::pipeline::generate_story;
use bedtime_core::session::assess_story_quality;
use bedtime_core::{Genre, ModelGateway, StoryMemory};
use claude::Claude;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if API key is available
fn has_api_key() -> bool {
    std::env::var(claude::API_KEY_VAR).is_ok_and(|key| !key.trim().is_empty())
}

#[tokio::test]
#[ignore]
async fn test_generate_story_and_episode() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let gateway = ModelGateway::new(Claude::from_env().expect("Failed to create client"));
    let mut memory = StoryMemory::new();

    let request = "A brave little mouse who wants to become a knight";
    let story = generate_story(&gateway, request, &mut memory, false)
        .await
        .expect("credential rejected")
        .expect("story generation failed");

    println!("=== Story ({}) ===\n{story}\n", memory.genre);
    assert_eq!(memory.genre, Genre::Adventure);
    assert!(story.len() > 200, "story suspiciously short");
    println!("Characters:\n{}\n", memory.character_summary());

    memory.add_story(&story, memory.genre, request, 0);
    let accepted = assess_story_quality(&gateway, &story, &memory)
        .await
        .expect("credential rejected");
    println!("Episode potential: {accepted}");

    let episode = generate_story(&gateway, "The mouse meets a friendly dragon", &mut memory, true)
        .await
        .expect("credential rejected")
        .expect("episode generation failed");

    println!("=== Episode ===\n{episode}");
    assert_eq!(memory.genre, Genre::Adventure);
    assert!(!episode.is_empty());
}
