//! Story generation pipeline.
//!
//! One story is three sequential model calls: a draft, a critique of the
//! draft, and a refinement that applies the critique. Later steps degrade
//! to the best text already in hand; only a failed draft loses the turn.

use crate::characters::extract_characters;
use crate::gateway::{CallParams, CompletionBackend, GatewayError, ModelGateway};
use crate::genre::{detect_genre, genre_prompt, Genre};
use crate::memory::StoryMemory;
use std::fmt;

/// How much of the previous story is quoted back in an episode prompt.
const PREVIOUS_CONTEXT_CHARS: usize = 500;

/// The last `n` characters of `text`, on a char boundary.
fn tail_chars(text: &str, n: usize) -> &str {
    match text.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((idx, _)) if n > 0 => &text[idx..],
        _ if n == 0 => "",
        _ => text,
    }
}

/// A user-visible milestone in [`generate_story_with_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Started,
    /// Emitted for new stories only, before the draft call.
    GenreDetected(Genre),
    Evaluating,
    Refining,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Started => f.write_str("Creating your story..."),
            Stage::GenreDetected(genre) => write!(f, "Detected genre: {}", genre.display_name()),
            Stage::Evaluating => f.write_str("Evaluating story quality..."),
            Stage::Refining => f.write_str("Refining the story..."),
        }
    }
}

/// Build the draft prompt for a request.
///
/// Episodes with a previous story quote its ending and the known characters;
/// everything else gets the plain genre prompt.
pub fn story_prompt(request: &str, memory: &StoryMemory, is_episode: bool) -> String {
    if !is_episode || memory.current_story.is_empty() {
        return genre_prompt(memory.genre, request, false);
    }

    let mut character_info = String::new();
    if !memory.characters().is_empty() {
        character_info.push_str("\n\nESTABLISHED CHARACTERS:\n");
        character_info.push_str(&memory.character_summary());
    }

    format!(
        "{base}\n\nPREVIOUS STORY CONTEXT:\n{previous}...{character_info}\n\n\
         Continue the adventure with these established characters and world.",
        base = genre_prompt(memory.genre, request, true),
        previous = tail_chars(&memory.current_story, PREVIOUS_CONTEXT_CHARS),
    )
}

/// Prompt asking the model to critique a draft.
pub fn evaluation_prompt(genre: Genre, draft: &str) -> String {
    format!(
        "Evaluate this {genre} story for children ages 5-10:\n\
         \n\
         {draft}\n\
         \n\
         Focus on:\n\
         1. Genre adherence (does it feel like a good {genre} story?)\n\
         2. Age-appropriateness and engagement\n\
         3. Character development and consistency\n\
         4. Story structure and pacing\n\
         5. Educational value and positive messages\n\
         \n\
         Provide specific suggestions for improvement. Rate overall quality 1-5."
    )
}

/// Prompt asking the model to rewrite a draft using its critique.
pub fn refinement_prompt(genre: Genre, evaluation: &str, draft: &str) -> String {
    format!(
        "Based on this evaluation for a {genre} story:\n\
         \n\
         {evaluation}\n\
         \n\
         Improve this story while maintaining its {genre} elements:\n\
         \n\
         {draft}\n\
         \n\
         IMPORTANT: Provide ONLY the improved story text."
    )
}

/// Generate a story for `request` without progress reporting.
///
/// See [`generate_story_with_progress`].
pub async fn generate_story<B: CompletionBackend>(
    gateway: &ModelGateway<B>,
    request: &str,
    memory: &mut StoryMemory,
    is_episode: bool,
) -> Result<Option<String>, GatewayError> {
    generate_story_with_progress(gateway, request, memory, is_episode, |_| {}).await
}

/// Generate a story for `request`, calling `progress` at each [`Stage`].
///
/// New stories detect and store their genre first; episodes reuse the genre
/// in `memory`. Returns `Ok(None)` only when the draft call fails. If the
/// critique fails the draft is returned as-is; if the refinement fails the
/// draft is used in its place. Characters are extracted for new stories
/// that made it through refinement; episodes keep the existing cast.
pub async fn generate_story_with_progress<B, F>(
    gateway: &ModelGateway<B>,
    request: &str,
    memory: &mut StoryMemory,
    is_episode: bool,
    mut progress: F,
) -> Result<Option<String>, GatewayError>
where
    B: CompletionBackend,
    F: FnMut(Stage),
{
    progress(Stage::Started);
    if !is_episode {
        memory.genre = detect_genre(request);
        tracing::info!(genre = %memory.genre, "detected genre");
        progress(Stage::GenreDetected(memory.genre));
    }
    let genre = memory.genre;

    let prompt = story_prompt(request, memory, is_episode);
    let Some(draft) = gateway.call_model(&prompt, CallParams::DRAFT).await? else {
        tracing::warn!("draft generation failed");
        return Ok(None);
    };
    tracing::info!(chars = draft.len(), "draft generated");

    progress(Stage::Evaluating);
    let Some(evaluation) = gateway
        .call_model(&evaluation_prompt(genre, &draft), CallParams::EVALUATION)
        .await?
    else {
        tracing::warn!("evaluation failed; returning unrefined draft");
        return Ok(Some(draft));
    };

    progress(Stage::Refining);
    let story = match gateway
        .call_model(
            &refinement_prompt(genre, &evaluation, &draft),
            CallParams::REFINEMENT,
        )
        .await?
    {
        Some(refined) => {
            tracing::info!(chars = refined.len(), "story refined");
            refined
        }
        None => {
            tracing::warn!("refinement failed; falling back to draft");
            draft
        }
    };

    if !is_episode {
        extract_characters(gateway, &story, memory).await?;
    }

    Ok(Some(story))
}
