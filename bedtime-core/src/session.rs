//! Session controller: the turn loop of one interactive storytelling session.
//!
//! Control flow is split in two. [`transition`] is a pure function over
//! [`SessionState`] and [`SessionEvent`]; [`Session`] runs one turn at a time
//! against the console and the model, reports what happened as an event, and
//! lets `transition` decide where to go next.

use crate::console::Console;
use crate::feedback::{collect_feedback, revise_story_with_feedback};
use crate::gateway::{CallParams, CompletionBackend, GatewayError, ModelGateway};
use crate::genre::Genre;
use crate::memory::StoryMemory;
use crate::pipeline::generate_story_with_progress;
use std::ops::ControlFlow;
use thiserror::Error;

/// Words that end the session at any request prompt (case-insensitive).
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

const SEPARATOR_WIDTH: usize = 50;

/// Errors that end a running session abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Where the session is between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No story has been told yet.
    #[default]
    AwaitingFirstRequest,
    /// At least one story exists; the next turn may continue it.
    AwaitingNextAction,
    Done,
}

/// Outcome of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StoryGenerated,
    GenerationFailed,
    EmptyRequest,
    QuitRequested,
    InputClosed,
}

/// Compute the next state. `Done` absorbs every event.
pub fn transition(current: SessionState, event: SessionEvent) -> SessionState {
    use SessionEvent::*;
    use SessionState::*;

    match (current, event) {
        (Done, _) => Done,
        (_, QuitRequested | InputClosed) => Done,
        (AwaitingFirstRequest, StoryGenerated) => AwaitingNextAction,
        (AwaitingFirstRequest, GenerationFailed | EmptyRequest) => AwaitingFirstRequest,
        (AwaitingNextAction, StoryGenerated | GenerationFailed | EmptyRequest) => AwaitingNextAction,
    }
}

/// Choice offered by the next-action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    ContinueEpisode,
    NewStory,
    Quit,
}

impl NextAction {
    /// Parse a menu answer; only "1", "2" and "3" are accepted.
    pub fn from_choice(input: &str) -> Option<NextAction> {
        match input.trim() {
            "1" => Some(NextAction::ContinueEpisode),
            "2" => Some(NextAction::NewStory),
            "3" => Some(NextAction::Quit),
            _ => None,
        }
    }
}

/// Whether a request is one of the [`QUIT_WORDS`].
pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    QUIT_WORDS.iter().any(|word| input.eq_ignore_ascii_case(word))
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stories_told: usize,
    pub favorite_genre: Option<Genre>,
}

// =============================================================================
// Episode assessment
// =============================================================================

/// Prompt asking whether a story can carry another episode.
pub fn assessment_prompt(genre: Genre, story: &str) -> String {
    format!(
        "Assess this {genre} story for episode potential:\n\
         \n\
         {story}\n\
         \n\
         Consider:\n\
         - Character development and likability for {genre} stories\n\
         - World-building potential in the {genre} genre\n\
         - Story engagement level\n\
         - Whether characters/setting could support more {genre} adventures\n\
         \n\
         Respond with only \"YES\" if this has good episode potential, or \"NO\" if it doesn't."
    )
}

/// A reply accepts the episode if it contains "YES" in any case.
pub fn episode_accepted(reply: Option<&str>) -> bool {
    reply.is_some_and(|reply| reply.to_uppercase().contains("YES"))
}

/// Ask the model whether `story` supports a continuation.
///
/// A failed call counts as "no".
pub async fn assess_story_quality<B: CompletionBackend>(
    gateway: &ModelGateway<B>,
    story: &str,
    memory: &StoryMemory,
) -> Result<bool, GatewayError> {
    let reply = gateway
        .call_model(&assessment_prompt(memory.genre, story), CallParams::ASSESSMENT)
        .await?;
    let accepted = episode_accepted(reply.as_deref());
    tracing::info!(accepted, "episode potential assessed");
    Ok(accepted)
}

// =============================================================================
// Session
// =============================================================================

/// One interactive storytelling session.
pub struct Session<B, C> {
    gateway: ModelGateway<B>,
    console: C,
    memory: StoryMemory,
    state: SessionState,
    stories_told: usize,
}

impl<B: CompletionBackend, C: Console> Session<B, C> {
    /// Create a session with empty memory.
    pub fn new(gateway: ModelGateway<B>, console: C) -> Self {
        Self {
            gateway,
            console,
            memory: StoryMemory::new(),
            state: SessionState::default(),
            stories_told: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn memory(&self) -> &StoryMemory {
        &self.memory
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn gateway(&self) -> &ModelGateway<B> {
        &self.gateway
    }

    pub fn stories_told(&self) -> usize {
        self.stories_told
    }

    /// Run turns until the user quits or input closes.
    ///
    /// Only a missing credential ends the loop early; every other failure is
    /// reported to the user and the session carries on.
    pub async fn run(&mut self) -> Result<SessionSummary, SessionError> {
        while self.state != SessionState::Done {
            let event = self.turn().await?;
            let next = transition(self.state, event);
            tracing::debug!(from = ?self.state, ?event, to = ?next, "session transition");
            self.state = next;
        }

        self.farewell();
        Ok(self.summary())
    }

    /// Current totals.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            stories_told: self.stories_told,
            favorite_genre: self.memory.preferences().favorite(),
        }
    }

    async fn turn(&mut self) -> Result<SessionEvent, SessionError> {
        let (request, is_episode) = match self.state {
            SessionState::AwaitingFirstRequest => {
                match self.read_request("What kind of story would you like to hear? (or 'quit' to exit):") {
                    ControlFlow::Continue(request) => (request, false),
                    ControlFlow::Break(event) => return Ok(event),
                }
            }
            SessionState::AwaitingNextAction => match self.next_request().await? {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(event) => return Ok(event),
            },
            SessionState::Done => return Ok(SessionEvent::QuitRequested),
        };

        self.tell_story(&request, is_episode).await
    }

    /// Decide between episode, new story and quit, then read the request.
    async fn next_request(&mut self) -> Result<ControlFlow<SessionEvent, (String, bool)>, SessionError> {
        let accepted =
            assess_story_quality(&self.gateway, &self.memory.current_story, &self.memory).await?;

        let (prompt, is_episode) = if !accepted {
            self.memory.clear_characters();
            (
                "\nWhat kind of story would you like to hear next? (or 'quit' to exit):".to_string(),
                false,
            )
        } else {
            match self.choose_next_action() {
                None => return Ok(ControlFlow::Break(SessionEvent::InputClosed)),
                Some(NextAction::Quit) => return Ok(ControlFlow::Break(SessionEvent::QuitRequested)),
                Some(NextAction::ContinueEpisode) => (
                    format!(
                        "\nWhat should happen in the next {} episode?",
                        genre_phrase(self.memory.genre)
                    ),
                    true,
                ),
                Some(NextAction::NewStory) => {
                    self.memory.clear_characters();
                    ("\nWhat kind of new story would you like to hear?".to_string(), false)
                }
            }
        };

        Ok(match self.read_request(&prompt) {
            ControlFlow::Continue(request) => ControlFlow::Continue((request, is_episode)),
            ControlFlow::Break(event) => ControlFlow::Break(event),
        })
    }

    /// Show the menu until a valid choice is made. `None` if input closes.
    fn choose_next_action(&mut self) -> Option<NextAction> {
        let genre = self.memory.genre;
        self.console.show(&format!(
            "\nWhat would you like to do next? (Current genre: {})",
            genre.display_name()
        ));
        self.console.show(&format!(
            "  1. Continue with a {} episode featuring the same characters",
            genre_phrase(genre)
        ));
        self.console.show("  2. Create a completely new story");
        self.console.show("  3. Quit");

        loop {
            let answer = self.console.read_line("Enter your choice (1, 2, or 3):")?;
            match NextAction::from_choice(&answer) {
                Some(action) => return Some(action),
                None => self.console.show("Please enter 1, 2, or 3."),
            }
        }
    }

    /// Read a story request, turning quits and blanks into events.
    fn read_request(&mut self, prompt: &str) -> ControlFlow<SessionEvent, String> {
        let Some(input) = self.console.read_line(prompt) else {
            return ControlFlow::Break(SessionEvent::InputClosed);
        };
        let request = input.trim();

        if is_quit(request) {
            return ControlFlow::Break(SessionEvent::QuitRequested);
        }
        if request.is_empty() {
            self.console.show("Please tell me what kind of story you'd like!");
            return ControlFlow::Break(SessionEvent::EmptyRequest);
        }
        ControlFlow::Continue(request.to_string())
    }

    /// Generate, show, collect feedback, maybe revise, and record one story.
    async fn tell_story(&mut self, request: &str, is_episode: bool) -> Result<SessionEvent, SessionError> {
        let kind = if is_episode { "episode" } else { "story" };

        self.console.show("");
        let console = &mut self.console;
        let story = generate_story_with_progress(
            &self.gateway,
            request,
            &mut self.memory,
            is_episode,
            |stage| console.show(&stage.to_string()),
        )
        .await?;

        let Some(mut story) = story else {
            self.console
                .show(&format!("Sorry, I had trouble creating your {kind}. Please try again!"));
            self.console.show("");
            return Ok(SessionEvent::GenerationFailed);
        };

        self.console.show(&format!("Here's your {kind}:\n"));
        self.show_framed(&story);

        let feedback = collect_feedback(&mut self.console);
        if feedback.wants_revision() {
            self.console.show("\nLet me improve that for you...");
            let revised =
                revise_story_with_feedback(&self.gateway, &story, &feedback, request).await?;
            if revised != story {
                self.console.show("Here's the improved version:\n");
                self.show_framed(&revised);
                story = revised;
            }
        }

        let genre = self.memory.genre;
        self.memory.add_story(story, genre, request, feedback.rating);
        self.stories_told += 1;
        if feedback.is_positive() {
            self.memory.record_preference(genre);
        }
        tracing::info!(
            stories_told = self.stories_told,
            rating = feedback.rating,
            %genre,
            "story recorded"
        );

        self.console.show("");
        Ok(SessionEvent::StoryGenerated)
    }

    fn show_framed(&mut self, text: &str) {
        let separator = "─".repeat(SEPARATOR_WIDTH);
        self.console.show(&separator);
        self.console.show(text);
        self.console.show(&separator);
    }

    fn farewell(&mut self) {
        let summary = self.summary();
        if summary.stories_told > 0 {
            let noun = if summary.stories_told == 1 { "story" } else { "stories" };
            self.console.show(&format!(
                "\nThanks for listening to {} {noun}!",
                summary.stories_told
            ));
            if let Some(genre) = summary.favorite_genre {
                self.console.show(&format!(
                    "I noticed you really enjoyed {} stories!",
                    genre_phrase(genre)
                ));
            }
        }
        self.console.show("Sweet dreams! Goodbye!");
    }
}

/// Genre as it reads mid-sentence ("fairy tale").
fn genre_phrase(genre: Genre) -> String {
    genre.display_name().to_lowercase()
}
