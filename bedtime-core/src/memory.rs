//! Session-scoped story memory.
//!
//! Holds everything the storyteller remembers between turns of one
//! interactive session: the latest story, its genre, known characters,
//! an append-only history, and the user's genre preferences.

use crate::characters::Character;
use crate::genre::Genre;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One finished turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub story: String,
    pub genre: Genre,
    pub request: String,
    /// User rating 1-5, or 0 when skipped.
    pub quality_score: u8,
    /// Characters known when the story was recorded.
    pub character_names: Vec<String>,
}

/// Count of highly rated stories per genre, in first-recorded order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenrePreferences {
    counts: Vec<(Genre, u32)>,
}

impl GenrePreferences {
    /// Record one highly rated story in `genre`.
    pub fn record(&mut self, genre: Genre) {
        match self.counts.iter_mut().find(|(g, _)| *g == genre) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((genre, 1)),
        }
    }

    /// Count recorded for `genre`.
    pub fn count(&self, genre: Genre) -> u32 {
        self.counts
            .iter()
            .find(|(g, _)| *g == genre)
            .map_or(0, |(_, count)| *count)
    }

    /// The most preferred genre; on a tie, the one recorded first.
    pub fn favorite(&self) -> Option<Genre> {
        let mut best: Option<(Genre, u32)> = None;
        for &(genre, count) in &self.counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((genre, count)),
            }
        }
        best.map(|(genre, _)| genre)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Mutable state for one storytelling session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryMemory {
    /// Text of the most recent story.
    pub current_story: String,
    /// Genre of the current story line; episodes reuse it.
    pub genre: Genre,
    characters: BTreeMap<String, Character>,
    /// Free-form world facts. Reserved; nothing populates it yet.
    pub world_details: BTreeMap<String, String>,
    history: Vec<StoryRecord>,
    preferences: GenrePreferences,
}

impl StoryMemory {
    /// Create a new empty story memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished story and make it the current one.
    pub fn add_story(
        &mut self,
        story: impl Into<String>,
        genre: Genre,
        request: impl Into<String>,
        quality_score: u8,
    ) {
        let story = story.into();
        self.history.push(StoryRecord {
            story: story.clone(),
            genre,
            request: request.into(),
            quality_score,
            character_names: self.characters.keys().cloned().collect(),
        });
        self.current_story = story;
        self.genre = genre;
    }

    /// All recorded stories, oldest first.
    pub fn history(&self) -> &[StoryRecord] {
        &self.history
    }

    // =========================================================================
    // Characters
    // =========================================================================

    /// Insert a character, replacing any with the same name.
    pub fn upsert_character(&mut self, character: Character) {
        self.characters.insert(character.name.clone(), character);
    }

    /// Look up a character by exact name.
    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.get(name)
    }

    pub fn characters(&self) -> &BTreeMap<String, Character> {
        &self.characters
    }

    /// Forget all characters (a new story line is starting).
    pub fn clear_characters(&mut self) {
        if !self.characters.is_empty() {
            tracing::debug!(count = self.characters.len(), "clearing character memory");
        }
        self.characters.clear();
    }

    /// Render known characters for an episode prompt, one per line.
    pub fn character_summary(&self) -> String {
        self.characters
            .values()
            .map(Character::summary_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// Note that the user rated a `genre` story highly.
    pub fn record_preference(&mut self, genre: Genre) {
        self.preferences.record(genre);
    }

    pub fn preferences(&self) -> &GenrePreferences {
        &self.preferences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_creation() {
        let memory = StoryMemory::new();
        assert!(memory.current_story.is_empty());
        assert!(memory.characters().is_empty());
        assert!(memory.history().is_empty());
        assert!(memory.world_details.is_empty());
        assert!(memory.preferences().is_empty());
    }

    #[test]
    fn test_add_story_appends_and_sets_current() {
        let mut memory = StoryMemory::new();
        memory.upsert_character(Character::new("Alice", "a girl"));
        memory.add_story("First story", Genre::FairyTale, "a princess", 4);
        memory.add_story("Second story", Genre::FairyTale, "the next day", 0);

        assert_eq!(memory.current_story, "Second story");
        assert_eq!(memory.genre, Genre::FairyTale);
        assert_eq!(memory.history().len(), 2);

        let first = &memory.history()[0];
        assert_eq!(first.story, "First story");
        assert_eq!(first.request, "a princess");
        assert_eq!(first.quality_score, 4);
        assert_eq!(first.character_names, vec!["Alice"]);
    }

    #[test]
    fn test_history_survives_character_reset() {
        let mut memory = StoryMemory::new();
        memory.upsert_character(Character::new("Alice", "a girl"));
        memory.add_story("Story", Genre::Adventure, "request", 3);
        memory.clear_characters();

        assert!(memory.characters().is_empty());
        assert_eq!(memory.history()[0].character_names, vec!["Alice"]);
    }

    #[test]
    fn test_character_summary() {
        let mut memory = StoryMemory::new();
        memory.upsert_character(Character::new("Bob", "a cat").with_personality(["lazy"]));
        memory.upsert_character(Character::new("Alice", "a girl"));

        assert_eq!(
            memory.character_summary(),
            "Alice: a girl\nBob: a cat (personality: lazy)"
        );
    }

    #[test]
    fn test_favorite_genre() {
        let mut prefs = GenrePreferences::default();
        assert_eq!(prefs.favorite(), None);

        prefs.record(Genre::Fantasy);
        prefs.record(Genre::Friendship);
        prefs.record(Genre::Friendship);
        assert_eq!(prefs.favorite(), Some(Genre::Friendship));
        assert_eq!(prefs.count(Genre::Friendship), 2);
        assert_eq!(prefs.count(Genre::Adventure), 0);
    }

    #[test]
    fn test_favorite_tie_goes_to_first_recorded() {
        let mut prefs = GenrePreferences::default();
        prefs.record(Genre::Fantasy);
        prefs.record(Genre::Adventure);
        assert_eq!(prefs.favorite(), Some(Genre::Fantasy));
    }
}
