//! Children's story generation engine with a Claude storyteller.
//!
//! This crate provides:
//! - Keyword genre detection and genre-specific prompts
//! - A draft / critique / refine story pipeline
//! - Character extraction and memory for continuation episodes
//! - User feedback with feedback-driven revision
//! - An interactive session loop over any [`Console`]
//!
//! # Quick Start
//!
//! ```ignore
//! use bedtime_core::{ModelGateway, Session, StdConsole};
//! use claude::Claude;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = ModelGateway::new(Claude::from_env()?);
//!     let mut session = Session::new(gateway, StdConsole::new());
//!
//!     let summary = session.run().await?;
//!     println!("Told {} stories", summary.stories_told);
//!     Ok(())
//! }
//! ```

pub mod characters;
pub mod console;
pub mod feedback;
pub mod gateway;
pub mod genre;
pub mod memory;
pub mod pipeline;
pub mod session;
pub mod testing;

// Primary public API
pub use characters::Character;
pub use console::{Console, StdConsole};
pub use feedback::Feedback;
pub use gateway::{CallParams, CompletionBackend, GatewayError, ModelGateway};
pub use genre::{detect_genre, Genre};
pub use memory::{StoryMemory, StoryRecord};
pub use pipeline::{generate_story, generate_story_with_progress, Stage};
pub use session::{Session, SessionError, SessionState, SessionSummary};
pub use testing::{MockBackend, MockReply, ScriptedConsole};
