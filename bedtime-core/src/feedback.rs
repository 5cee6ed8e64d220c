//! User feedback on a finished story and the revision it can trigger.

use crate::console::Console;
use crate::gateway::{CallParams, CompletionBackend, GatewayError, ModelGateway};

/// A user's reaction to one story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    /// 1-5, or 0 when skipped or invalid.
    pub rating: u8,
    /// Free text; only asked for on ratings 1-2 and 4-5.
    pub text: String,
}

impl Feedback {
    pub fn new(rating: u8, text: impl Into<String>) -> Self {
        Self {
            rating,
            text: text.into(),
        }
    }

    /// Low rating with something to act on.
    pub fn wants_revision(&self) -> bool {
        (1..=2).contains(&self.rating) && !self.text.is_empty()
    }

    /// Rating high enough to count toward genre preferences.
    pub fn is_positive(&self) -> bool {
        self.rating >= 4
    }
}

/// Parse a rating answer. Anything but a single digit 1-5 is a skip (0).
pub fn parse_rating(input: &str) -> u8 {
    match input.trim().parse::<u8>() {
        Ok(rating @ 1..=5) if input.trim().chars().all(|c| c.is_ascii_digit()) => rating,
        _ => 0,
    }
}

/// Ask the user to rate the story and, for clear likes or dislikes, say why.
///
/// Closed input counts as skipping.
pub fn collect_feedback<C: Console + ?Sized>(console: &mut C) -> Feedback {
    console.show("\nQuick feedback (optional):");
    let rating = console
        .read_line("Rate the story (1-5, or press Enter to skip):")
        .map_or(0, |answer| parse_rating(&answer));

    let question = match rating {
        1 | 2 => "What could make it better?",
        4 | 5 => "What did you like most?",
        _ => return Feedback::new(rating, ""),
    };
    let text = console
        .read_line(question)
        .map(|answer| answer.trim().to_string())
        .unwrap_or_default();

    Feedback::new(rating, text)
}

/// Prompt asking for a rewrite that addresses the user's complaint.
pub fn revision_prompt(story: &str, feedback: &Feedback, request: &str) -> String {
    format!(
        "The user provided this feedback about the story: \"{text}\"\n\
         They rated it {rating}/5.\n\
         \n\
         Original request: {request}\n\
         Current story:\n\
         {story}\n\
         \n\
         Please revise the story to address their feedback while maintaining the core story elements. \
         Make specific improvements based on their comments.\n\
         \n\
         IMPORTANT: Provide ONLY the revised story text, no explanations.",
        text = feedback.text,
        rating = feedback.rating,
    )
}

/// Revise `story` according to `feedback`.
///
/// Returns the story unchanged without calling the model when there is no
/// feedback text or the rating is 4 or more. A failed call also returns the
/// story unchanged.
pub async fn revise_story_with_feedback<B: CompletionBackend>(
    gateway: &ModelGateway<B>,
    story: &str,
    feedback: &Feedback,
    request: &str,
) -> Result<String, GatewayError> {
    if feedback.text.is_empty() || feedback.rating >= 4 {
        return Ok(story.to_string());
    }

    let revised = gateway
        .call_model(
            &revision_prompt(story, feedback, request),
            CallParams::REVISION,
        )
        .await?;

    Ok(match revised {
        Some(revised) => revised,
        None => {
            tracing::warn!("revision failed; keeping the original story");
            story.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockReply, ScriptedConsole};

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("1"), 1);
        assert_eq!(parse_rating(" 5 "), 5);
        for skipped in ["", "0", "6", "abc", "-1", "+3", "3.5", "42"] {
            assert_eq!(parse_rating(skipped), 0, "input {skipped:?}");
        }
    }

    #[test]
    fn test_low_rating_asks_what_to_improve() {
        let mut console = ScriptedConsole::new(["2", "make it funnier"]);
        let feedback = collect_feedback(&mut console);

        assert_eq!(feedback, Feedback::new(2, "make it funnier"));
        assert_eq!(console.prompts()[1], "What could make it better?");
        assert!(feedback.wants_revision());
    }

    #[test]
    fn test_high_rating_asks_what_was_liked() {
        let mut console = ScriptedConsole::new(["5", "the dragon"]);
        let feedback = collect_feedback(&mut console);

        assert_eq!(feedback, Feedback::new(5, "the dragon"));
        assert_eq!(console.prompts()[1], "What did you like most?");
        assert!(feedback.is_positive());
        assert!(!feedback.wants_revision());
    }

    #[test]
    fn test_middle_or_skipped_rating_collects_no_text() {
        for answer in ["3", "", "great"] {
            let mut console = ScriptedConsole::new([answer, "unused"]);
            let feedback = collect_feedback(&mut console);
            assert!(feedback.text.is_empty());
            assert_eq!(console.prompts().len(), 1);
            assert_eq!(console.remaining_inputs(), 1);
        }
    }

    #[test]
    fn test_closed_input_is_a_skip() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        assert_eq!(collect_feedback(&mut console), Feedback::default());
    }

    #[tokio::test]
    async fn test_revision_no_op_without_text_or_high_rating() {
        let gateway = ModelGateway::new(MockBackend::new(Vec::new()));

        let without_text = (0..=5).map(|rating| Feedback::new(rating, ""));
        let high_with_text = (4..=5).map(|rating| Feedback::new(rating, "loved it"));
        for feedback in without_text.chain(high_with_text) {
            let story = revise_story_with_feedback(&gateway, "STORY", &feedback, "req")
                .await
                .unwrap();
            assert_eq!(story, "STORY", "{feedback:?}");
        }
        assert!(gateway.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_revision_uses_model_output() {
        let gateway = ModelGateway::new(MockBackend::new(vec![MockReply::text("REVISED")]));
        let feedback = Feedback::new(1, "too scary");

        let story = revise_story_with_feedback(&gateway, "STORY", &feedback, "a ghost")
            .await
            .unwrap();

        assert_eq!(story, "REVISED");
        let calls = gateway.backend().calls();
        assert_eq!(calls[0].params, CallParams::REVISION);
        assert!(calls[0].prompt.contains("\"too scary\""));
        assert!(calls[0].prompt.contains("They rated it 1/5."));
        assert!(calls[0].prompt.contains("Original request: a ghost"));
        assert!(calls[0].prompt.contains("STORY"));
    }

    #[tokio::test]
    async fn test_revision_failure_keeps_story() {
        let gateway = ModelGateway::new(MockBackend::new(vec![MockReply::Fail]));
        let story = revise_story_with_feedback(&gateway, "STORY", &Feedback::new(2, "meh"), "req")
            .await
            .unwrap();
        assert_eq!(story, "STORY");
    }
}
