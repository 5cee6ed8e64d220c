//! Genre detection and genre-specific prompt construction.
//!
//! Genres are detected with a simple keyword score over the lower-cased
//! request. Each genre carries a template of narrative elements, tone,
//! structure and vocabulary that is spliced into the story prompt; that
//! prompt is the only thing steering the model toward the genre.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of story genres.
///
/// Variant order is the definition order used to break scoring ties, so
/// `Adventure` wins any tie it takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    #[default]
    Adventure,
    FairyTale,
    Educational,
    Friendship,
    Fantasy,
}

/// Prompt ingredients for one genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreTemplate {
    /// Narrative elements the story must include.
    pub elements: &'static [&'static str],
    pub tone: &'static str,
    pub structure: &'static str,
    pub vocabulary: &'static str,
}

const ADVENTURE: GenreTemplate = GenreTemplate {
    elements: &[
        "brave protagonist",
        "exciting quest",
        "obstacles to overcome",
        "discovery",
    ],
    tone: "exciting and energetic",
    structure: "journey with challenges and triumph",
    vocabulary: "action words, vivid descriptions of places and events",
};

const FAIRY_TALE: GenreTemplate = GenreTemplate {
    elements: &[
        "magical elements",
        "clear good vs evil",
        "transformation",
        "happy ending",
    ],
    tone: "whimsical and magical",
    structure: "once upon a time format with magical resolution",
    vocabulary: "magical, enchanted, sparkling, mysterious",
};

const EDUCATIONAL: GenreTemplate = GenreTemplate {
    elements: &[
        "learning opportunity",
        "problem-solving",
        "factual information",
        "practical lessons",
    ],
    tone: "encouraging and informative",
    structure: "problem-discovery-learning-application",
    vocabulary: "clear explanations, age-appropriate facts",
};

const FRIENDSHIP: GenreTemplate = GenreTemplate {
    elements: &[
        "character relationships",
        "cooperation",
        "empathy",
        "shared experiences",
    ],
    tone: "warm and heartfelt",
    structure: "relationship challenge and resolution",
    vocabulary: "emotions, caring, helping, understanding",
};

const FANTASY: GenreTemplate = GenreTemplate {
    elements: &[
        "magical creatures",
        "fantastical settings",
        "special powers",
        "wonder",
    ],
    tone: "mysterious and wondrous",
    structure: "magical world with extraordinary events",
    vocabulary: "mystical, enchanted, powerful, extraordinary",
};

impl Genre {
    /// All genres in definition order.
    pub const ALL: [Genre; 5] = [
        Genre::Adventure,
        Genre::FairyTale,
        Genre::Educational,
        Genre::Friendship,
        Genre::Fantasy,
    ];

    /// The snake_case tag used in prompts and records.
    pub fn tag(&self) -> &'static str {
        match self {
            Genre::Adventure => "adventure",
            Genre::FairyTale => "fairy_tale",
            Genre::Educational => "educational",
            Genre::Friendship => "friendship",
            Genre::Fantasy => "fantasy",
        }
    }

    /// Human-facing name ("Fairy Tale").
    pub fn display_name(&self) -> &'static str {
        match self {
            Genre::Adventure => "Adventure",
            Genre::FairyTale => "Fairy Tale",
            Genre::Educational => "Educational",
            Genre::Friendship => "Friendship",
            Genre::Fantasy => "Fantasy",
        }
    }

    /// Parse a genre tag. Returns `None` for tags outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Genre> {
        Genre::ALL
            .into_iter()
            .find(|g| g.tag().eq_ignore_ascii_case(tag.trim()))
    }

    /// Parse a genre tag, falling back to `Adventure` for unknown tags.
    pub fn from_tag_or_default(tag: &str) -> Genre {
        Genre::from_tag(tag).unwrap_or_default()
    }

    /// Keywords that vote for this genre during detection.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Genre::Adventure => &["adventure", "quest", "journey", "explore", "brave", "hero"],
            Genre::FairyTale => &[
                "princess", "prince", "magic", "fairy", "castle", "witch", "dragon",
            ],
            Genre::Educational => &[
                "learn",
                "teach",
                "school",
                "facts",
                "science",
                "math",
                "educational",
            ],
            Genre::Friendship => &["friend", "friendship", "together", "help", "kind", "caring"],
            Genre::Fantasy => &[
                "magical",
                "wizard",
                "unicorn",
                "fantasy",
                "mystical",
                "enchanted",
            ],
        }
    }

    /// The prompt template for this genre.
    pub fn template(&self) -> &'static GenreTemplate {
        match self {
            Genre::Adventure => &ADVENTURE,
            Genre::FairyTale => &FAIRY_TALE,
            Genre::Educational => &EDUCATIONAL,
            Genre::Friendship => &FRIENDSHIP,
            Genre::Fantasy => &FANTASY,
        }
    }

    /// Count how many of this genre's keywords occur in `lowered`.
    ///
    /// Plain substring matching: "magical" also counts as "magic".
    fn score(&self, lowered: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when parsing an unknown genre tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown genre tag: {0}")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::from_tag(s).ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

/// Classify a story request into a genre.
///
/// The genre with the most matching keywords wins; ties go to the genre
/// defined first. A request with no keyword matches is an adventure.
pub fn detect_genre(request: &str) -> Genre {
    let lowered = request.to_lowercase();

    let mut best = Genre::Adventure;
    let mut best_score = 0;
    for genre in Genre::ALL {
        let score = genre.score(&lowered);
        if score > best_score {
            best = genre;
            best_score = score;
        }
    }

    best
}

/// Build the genre-specific story prompt.
pub fn genre_prompt(genre: Genre, request: &str, is_episode: bool) -> String {
    render_prompt(genre.tag(), genre.template(), request, is_episode)
}

/// Build the story prompt from a raw genre tag.
///
/// An unknown tag keeps its own name in the prompt but borrows the adventure
/// template for the requirements.
pub fn genre_prompt_for_tag(tag: &str, request: &str, is_episode: bool) -> String {
    match Genre::from_tag(tag) {
        Some(genre) => genre_prompt(genre, request, is_episode),
        None => render_prompt(tag, Genre::Adventure.template(), request, is_episode),
    }
}

fn render_prompt(
    tag: &str,
    template: &GenreTemplate,
    request: &str,
    is_episode: bool,
) -> String {
    let mut prompt = format!(
        "Create an engaging {tag} story for children ages 5-10 based on: '{request}'\n\
         \n\
         GENRE-SPECIFIC REQUIREMENTS for {upper}:\n\
         - Include these elements: {elements}\n\
         - Maintain a {tone} tone throughout\n\
         - Follow this structure: {structure}\n\
         - Use {vocabulary} in your language choices\n\
         \n\
         GENERAL REQUIREMENTS:\n\
         - Be appropriate for children ages 5-10 (no scary or inappropriate content)\n\
         - Be approximately 200-400 words long\n\
         - Include descriptive language and dialogue\n\
         - Teach a gentle lesson or moral\n\
         - Have a clear beginning, middle, and satisfying end",
        upper = tag.to_uppercase(),
        elements = template.elements.join(", "),
        tone = template.tone,
        structure = template.structure,
        vocabulary = template.vocabulary,
    );

    if is_episode {
        prompt.push_str(&format!(
            "\n- This is a continuation episode, maintain consistency with established {tag} elements from previous story"
        ));
    }

    prompt.push_str("\n\nPlease write the complete story now:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_single_genre_requests() {
        assert_eq!(detect_genre("A quest to explore the mountains"), Genre::Adventure);
        assert_eq!(detect_genre("A princess who lives in a castle"), Genre::FairyTale);
        assert_eq!(detect_genre("Learn math at school"), Genre::Educational);
        assert_eq!(detect_genre("Two friends who help each other"), Genre::Friendship);
        assert_eq!(detect_genre("A unicorn and a wizard"), Genre::Fantasy);
    }

    #[test]
    fn test_every_unambiguous_keyword_detects_its_genre() {
        for genre in Genre::ALL {
            for keyword in genre.keywords() {
                // Skip keywords that embed another genre's keyword ("magical" holds "magic").
                let ambiguous = Genre::ALL
                    .iter()
                    .filter(|other| **other != genre)
                    .any(|other| other.keywords().iter().any(|k| keyword.contains(k)));
                if ambiguous {
                    continue;
                }
                assert_eq!(
                    detect_genre(&format!("a story about {keyword}")),
                    genre,
                    "keyword {keyword:?}"
                );
            }
        }
    }

    #[test]
    fn test_keyword_free_request_defaults_to_adventure() {
        assert_eq!(detect_genre(""), Genre::Adventure);
        assert_eq!(detect_genre("A little mouse and a cup of tea"), Genre::Adventure);
    }

    #[test]
    fn test_ties_go_to_first_defined_genre() {
        // One adventure keyword, one fantasy keyword.
        assert_eq!(detect_genre("A brave wizard"), Genre::Adventure);
        // "magical" scores for both fairy_tale ("magic") and fantasy.
        assert_eq!(detect_genre("A magical forest"), Genre::FairyTale);
    }

    #[test]
    fn test_detection_is_case_insensitive_substring() {
        assert_eq!(detect_genre("THE UNICORN"), Genre::Fantasy);
        // "friendships" still contains "friend" and "friendship".
        assert_eq!(detect_genre("friendships"), Genre::Friendship);
    }

    #[test]
    fn test_mouse_knight_is_adventure() {
        assert_eq!(
            detect_genre("A brave little mouse who wants to become a knight"),
            Genre::Adventure
        );
    }

    #[test]
    fn test_prompt_contains_template_verbatim() {
        for genre in Genre::ALL {
            let prompt = genre_prompt(genre, "a dragon who bakes bread", false);
            let template = genre.template();
            assert!(prompt.contains(&template.elements.join(", ")));
            assert!(prompt.contains(template.tone));
            assert!(prompt.contains(template.structure));
            assert!(prompt.contains(template.vocabulary));
            assert!(prompt.contains("'a dragon who bakes bread'"));
            assert!(prompt.contains(&genre.tag().to_uppercase()));
            assert!(!prompt.contains("continuation episode"));
            assert!(prompt.ends_with("Please write the complete story now:"));
        }
    }

    #[test]
    fn test_episode_prompt_adds_continuity_line() {
        let prompt = genre_prompt(Genre::FairyTale, "the next day", true);
        assert!(prompt.contains(
            "This is a continuation episode, maintain consistency with established fairy_tale elements"
        ));
    }

    #[test]
    fn test_unknown_tag_falls_back_to_adventure() {
        assert_eq!(Genre::from_tag("space_opera"), None);
        assert_eq!(Genre::from_tag_or_default("space_opera"), Genre::Adventure);
        assert!("space_opera".parse::<Genre>().is_err());
        assert_eq!("fairy_tale".parse::<Genre>(), Ok(Genre::FairyTale));
    }

    #[test]
    fn test_unknown_tag_keeps_its_name_with_adventure_template() {
        let prompt = genre_prompt_for_tag("space_opera", "robots", true);
        let adventure = Genre::Adventure.template();

        assert!(prompt.starts_with("Create an engaging space_opera story for children ages 5-10 based on: 'robots'"));
        assert!(prompt.contains("GENRE-SPECIFIC REQUIREMENTS for SPACE_OPERA:"));
        assert!(prompt.contains(&adventure.elements.join(", ")));
        assert!(prompt.contains(adventure.tone));
        assert!(prompt.contains("established space_opera elements"));
        assert!(!prompt.contains("adventure story"));
    }

    #[test]
    fn test_known_tag_matches_genre_prompt() {
        assert_eq!(
            genre_prompt_for_tag("fairy_tale", "a frog", false),
            genre_prompt(Genre::FairyTale, "a frog", false)
        );
    }

    #[test]
    fn test_genre_serializes_as_tag() {
        let json = serde_json::to_string(&Genre::FairyTale).unwrap();
        assert_eq!(json, "\"fairy_tale\"");
        assert_eq!(Genre::FairyTale.to_string(), "fairy_tale");
        assert_eq!(Genre::FairyTale.display_name(), "Fairy Tale");
    }
}
