//! Chat orchestration for Fairweather.
//!
//! Wires forecast resolution into a streaming model conversation: the
//! rendered forecast becomes the system prompt, replies stream over a
//! bounded channel, and chat-service failures degrade to canned advisories
//! while the forecast itself stays available.

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use client::{ChatClient, ChatMessage, ChatRole, ChunkStream};
pub use error::{ChatError, CHAT_OFFLINE_ADVISORY};
pub use orchestrator::{AssistantRequest, ChatEvent, StreamHandle, TurnOutcome, WeatherAssistant};
pub use prompt::{system_prompt, TaskKind};
pub use session::{ChatTurn, SessionStore};
