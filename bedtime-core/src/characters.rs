//! Character records and best-effort extraction from story text.
//!
//! Extraction asks the model for one line per character in the form
//!
//! ```text
//! NAME: description | personality: trait1, trait2 | relationships: name-relation
//! ```
//!
//! and parses whatever comes back line by line. Lines that do not fit are
//! skipped; extraction never fails a turn.
//!
//! Relationships are requested but not parsed yet, so
//! [`Character::relationships`] stays empty for extracted characters.

use crate::gateway::{CallParams, CompletionBackend, GatewayError, ModelGateway};
use crate::memory::StoryMemory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A character known to the current story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Unique key within a session.
    pub name: String,
    pub description: String,
    /// Personality traits in the order the model gave them.
    pub personality: Vec<String>,
    /// Other character name to relationship label.
    pub relationships: BTreeMap<String, String>,
}

impl Character {
    /// Create a character with no traits or relationships.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            personality: Vec::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Add personality traits.
    pub fn with_personality<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.personality = traits.into_iter().map(Into::into).collect();
        self
    }

    /// One-line summary used in episode prompts.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{}: {}", self.name, self.description);
        if !self.personality.is_empty() {
            line.push_str(&format!(" (personality: {})", self.personality.join(", ")));
        }
        line
    }
}

/// Build the extraction prompt for a finished story.
pub fn extraction_prompt(story: &str) -> String {
    format!(
        "Analyze this story and extract the main characters with their details:\n\
         \n\
         {story}\n\
         \n\
         For each main character, provide:\n\
         - Name\n\
         - Brief description (appearance, role)\n\
         - 2-3 personality traits\n\
         - Relationships to other characters\n\
         \n\
         Format as: CHARACTER_NAME: description | personality: trait1, trait2, trait3 | relationships: name-relationship\n\
         \n\
         Example: Alice: young girl with curly hair, main protagonist | personality: curious, brave, kind | relationships: Bob-best friend"
    )
}

/// Parse one summary line. Returns `None` for lines that do not fit.
pub fn parse_character_line(line: &str) -> Option<Character> {
    if !line.contains(':') || !line.contains('|') {
        return None;
    }

    let mut segments = line.split('|');
    let (name, description) = segments.next()?.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut character = Character::new(name, description.trim());

    // The last personality segment wins if the model repeats it.
    for segment in line.split('|') {
        if !segment.to_lowercase().contains("personality:") {
            continue;
        }
        let traits = segment.split(':').nth(1).unwrap_or_default();
        character.personality = traits
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
    }

    Some(character)
}

/// Parse a full extraction response, skipping malformed lines.
pub fn parse_characters(response: &str) -> Vec<Character> {
    response
        .lines()
        .filter_map(|line| {
            let parsed = parse_character_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                tracing::trace!(line, "skipping unparseable character line");
            }
            parsed
        })
        .collect()
}

/// Extract characters from `story` into `memory`.
///
/// Issues one model call. A failed call or an unparseable reply records
/// nothing; existing characters with the same name are overwritten.
pub async fn extract_characters<B: CompletionBackend>(
    gateway: &ModelGateway<B>,
    story: &str,
    memory: &mut StoryMemory,
) -> Result<(), GatewayError> {
    let Some(response) = gateway
        .call_model(&extraction_prompt(story), CallParams::EXTRACTION)
        .await?
    else {
        tracing::warn!("character extraction call failed; keeping existing characters");
        return Ok(());
    };

    let characters = parse_characters(&response);
    tracing::info!(count = characters.len(), "extracted characters");
    for character in characters {
        memory.upsert_character(character);
    }

    Ok(())
}
