//! Testing utilities for the storyteller.
//!
//! This module provides deterministic doubles for tests that must not touch
//! the network or a terminal:
//! - `MockBackend` replays scripted model replies and records every call
//! - `ScriptedConsole` feeds queued user input and captures output

use crate::console::Console;
use crate::gateway::{CallParams, CompletionBackend};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A scripted reply from the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this completion text.
    Text(String),
    /// Fail the call the way a network error would.
    Fail,
    /// Fail the call as if no API key were configured.
    MissingCredential,
}

impl MockReply {
    /// Create a text reply.
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }
}

/// One call observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub params: CallParams,
}

/// A backend that returns scripted replies in order.
///
/// Once the script runs out every further call fails, so a test that makes
/// more calls than it planned for sees the failure path instead of hanging.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    /// Create a backend with scripted replies.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a reply to the end of the script.
    pub fn queue_reply(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

// A poisoned lock only means another test thread panicked; the data is fine.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn generate(&self, prompt: &str, params: CallParams) -> Result<String, claude::Error> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            params,
        });

        match lock(&self.replies).pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail) => Err(claude::Error::Network("scripted failure".to_string())),
            Some(MockReply::MissingCredential) => Err(claude::Error::NoApiKey),
            None => Err(claude::Error::Network(
                "mock backend has no more scripted replies".to_string(),
            )),
        }
    }
}

/// A console that reads from a queue and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    prompts: Vec<String>,
    output: Vec<String>,
}

impl ScriptedConsole {
    /// Create a console that will answer prompts with `inputs` in order.
    /// When the inputs run out, reads report closed input.
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Prompts that were asked, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Text that was shown, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Prompts and output interleaved as one string.
    pub fn transcript(&self) -> String {
        // Prompts are recorded into output too, so this is just a join.
        self.output.join("\n")
    }

    /// Whether any shown line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }

    /// Number of queued inputs not yet read.
    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.output.push(prompt.to_string());
        self.inputs.pop_front()
    }

    fn show(&mut self, text: &str) {
        self.output.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_replays_in_order() {
        let backend = MockBackend::new(vec![MockReply::text("one"), MockReply::Fail]);

        assert_eq!(
            backend.generate("a", CallParams::DRAFT).await.unwrap(),
            "one"
        );
        assert!(backend.generate("b", CallParams::EVALUATION).await.is_err());
        assert!(backend.generate("c", CallParams::DRAFT).await.is_err());

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].prompt, "b");
        assert_eq!(calls[1].params, CallParams::EVALUATION);
    }

    #[tokio::test]
    async fn test_mock_backend_missing_credential() {
        let backend = MockBackend::new(vec![MockReply::MissingCredential]);
        let result = backend.generate("a", CallParams::DRAFT).await;
        assert!(matches!(result, Err(claude::Error::NoApiKey)));
    }

    #[tokio::test]
    async fn test_queue_reply() {
        let backend = MockBackend::new(Vec::new());
        backend.queue_reply(MockReply::text("late"));
        assert_eq!(backend.remaining(), 1);
        assert_eq!(backend.generate("a", CallParams::DRAFT).await.unwrap(), "late");
        assert_eq!(backend.remaining(), 0);
    }

    #[test]
    fn test_scripted_console() {
        let mut console = ScriptedConsole::new(["first"]);

        assert_eq!(console.read_line("Name?").as_deref(), Some("first"));
        console.show("Hello");
        assert_eq!(console.read_line("Again?"), None);

        assert_eq!(console.prompts(), ["Name?", "Again?"]);
        assert!(console.saw("Hello"));
        assert_eq!(console.transcript(), "Name?\nHello\nAgain?");
    }
}
