//! Turn orchestration: forecast resolution, prompt assembly, streaming.
//!
//! Every turn re-resolves the forecast, rebuilds the system prompt, and
//! replays the non-advisory conversation. Failures anywhere in the pipeline
//! degrade to advisory turns; the transcript survives everything.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use fairweather_core::config::{ChatConfig, Config};
use fairweather_forecast::{
    render, ForecastResolver, GeocodeClient, GeocodeError, Location, UnitsPreference, WeatherQuery,
};

use crate::client::{ChatClient, ChatMessage, ChatRole};
use crate::error::ChatError;
use crate::prompt::{system_prompt, TaskKind};
use crate::session::{ChatTurn, SessionStore};

/// Channel depth for streamed chunks. Deep enough to absorb bursts, shallow
/// enough that a stalled consumer backpressures generation.
const CHUNK_CHANNEL_DEPTH: usize = 32;

/// Events delivered to the consumer of a streaming turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A fragment of assistant text.
    Chunk(String),
    /// Stream finished; the full reply as persisted.
    Done(String),
    /// Stream failed; the advisory as persisted.
    Failed(String),
}

/// Receiver half of one streaming turn.
pub struct StreamHandle {
    events: mpsc::Receiver<ChatEvent>,
    cancel: CancellationToken,
}

impl StreamHandle {
    /// Next event, or `None` once the turn is over.
    pub async fn next(&mut self) -> Option<ChatEvent> {
        self.events.recv().await
    }

    /// Stop generation. Text already produced stays in the transcript.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// What a turn produced: a live stream, or an immediate advisory.
pub enum TurnOutcome {
    Streaming(StreamHandle),
    Advisory(String),
}

/// One weather request routed through the assistant.
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub query: WeatherQuery,
    pub task: TaskKind,
    /// Explicit user text. Tasks carry an implied question when absent.
    pub user_text: Option<String>,
    /// Overrides the configured default model.
    pub model: Option<String>,
}

/// The assembled pipeline: geocoding, forecast resolution, and chat.
pub struct WeatherAssistant {
    geocoder: GeocodeClient,
    resolver: ForecastResolver,
    chat: ChatClient,
    sessions: Arc<SessionStore>,
    chat_config: ChatConfig,
}

impl WeatherAssistant {
    /// Build the full pipeline from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            geocoder: GeocodeClient::new(&config.geocoding)?,
            resolver: ForecastResolver::new(&config.weather)?,
            chat: ChatClient::new(&config.chat)?,
            sessions: Arc::new(SessionStore::new()),
            chat_config: config.chat.clone(),
        })
    }

    pub fn create_session(&self) -> Uuid {
        self.sessions.create()
    }

    pub fn reset_session(&self, session: Uuid) {
        self.sessions.reset(session);
    }

    /// Transcript for display, advisories included.
    pub fn transcript(&self, session: Uuid) -> Vec<ChatTurn> {
        self.sessions.history(session)
    }

    /// Models the chat service offers.
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        self.chat.list_models().await
    }

    /// Resolve free-text location input without starting a turn.
    pub async fn resolve_location(&self, input: &str) -> Result<Location, GeocodeError> {
        self.geocoder.geocode(input).await
    }

    /// Run one turn from raw location text.
    ///
    /// Units fall back to the location's country when the caller does not
    /// choose.
    pub async fn respond_to_text(
        &self,
        session: Uuid,
        location_text: &str,
        units: Option<UnitsPreference>,
        date: NaiveDate,
        task: TaskKind,
        user_text: Option<String>,
    ) -> TurnOutcome {
        let location = match self.geocoder.geocode(location_text).await {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!("Geocoding failed for {}: {}", location_text, e);
                return self.advisory_turn(session, e.user_message());
            }
        };
        let units = units.unwrap_or_else(|| location.suggested_units());
        let request = AssistantRequest {
            query: WeatherQuery { location, units, date },
            task,
            user_text,
            model: None,
        };
        self.respond(session, request).await
    }

    /// Run one turn for an already-geocoded query.
    #[instrument(skip(self, request), level = "info")]
    pub async fn respond(&self, session: Uuid, request: AssistantRequest) -> TurnOutcome {
        let forecast = match self.resolver.resolve(&request.query).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!("Forecast resolution failed: {}", e);
                return self.advisory_turn(session, e.user_message());
            }
        };
        let forecast_text = match render(&forecast, &request.query) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Forecast rendering failed: {}", e);
                return self.advisory_turn(session, e.user_message());
            }
        };
        self.stream_turn(session, request, forecast_text).await
    }

    /// Persist an advisory turn and hand the same text to the caller.
    fn advisory_turn(&self, session: Uuid, message: &str) -> TurnOutcome {
        self.sessions.append(
            session,
            ChatTurn {
                role: ChatRole::Assistant,
                content: message.to_string(),
                advisory: true,
            },
        );
        TurnOutcome::Advisory(message.to_string())
    }

    async fn stream_turn(
        &self,
        session: Uuid,
        request: AssistantRequest,
        forecast_text: String,
    ) -> TurnOutcome {
        let user_text = request
            .user_text
            .unwrap_or_else(|| default_user_text(request.task).to_string());

        // Fresh system prompt, replayed conversation, then the new question.
        let mut messages = vec![ChatMessage {
            role: ChatRole::System,
            content: system_prompt(&forecast_text, request.task),
        }];
        messages.extend(self.sessions.conversation(session));
        messages.push(ChatMessage {
            role: ChatRole::User,
            content: user_text.clone(),
        });
        self.sessions.append(
            session,
            ChatTurn {
                role: ChatRole::User,
                content: user_text,
                advisory: false,
            },
        );

        let model = request
            .model
            .unwrap_or_else(|| self.chat_config.default_model.clone());
        let temperature = request.task.temperature(&self.chat_config);

        let mut stream = match self.chat.stream_chat(&model, &messages, temperature).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Chat service refused the turn: {}", e);
                return self.advisory_turn(session, e.user_message());
            }
        };

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_DEPTH);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let sessions = Arc::clone(&self.sessions);

        tokio::spawn(async move {
            let mut reply = String::new();
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Chat stream cancelled by consumer");
                        persist_reply(&sessions, session, reply);
                        return;
                    }
                    content = stream.next_content() => match content {
                        Ok(Some(chunk)) => {
                            reply.push_str(&chunk);
                            if tx.send(ChatEvent::Chunk(chunk)).await.is_err() {
                                // Consumer hung up; keep what was generated.
                                persist_reply(&sessions, session, reply);
                                return;
                            }
                        }
                        Ok(None) => {
                            persist_reply(&sessions, session, reply.clone());
                            let _ = tx.send(ChatEvent::Done(reply)).await;
                            return;
                        }
                        Err(e) => {
                            tracing::warn!("Chat stream failed: {}", e);
                            persist_reply(&sessions, session, reply);
                            let advisory = e.user_message().to_string();
                            sessions.append(
                                session,
                                ChatTurn {
                                    role: ChatRole::Assistant,
                                    content: advisory.clone(),
                                    advisory: true,
                                },
                            );
                            let _ = tx.send(ChatEvent::Failed(advisory)).await;
                            return;
                        }
                    }
                }
            }
        });

        TurnOutcome::Streaming(StreamHandle { events: rx, cancel })
    }
}

/// Record whatever assistant text a turn produced, if any.
fn persist_reply(sessions: &SessionStore, session: Uuid, reply: String) {
    if reply.is_empty() {
        return;
    }
    sessions.append(
        session,
        ChatTurn {
            role: ChatRole::Assistant,
            content: reply,
            advisory: false,
        },
    );
}

fn default_user_text(task: TaskKind) -> &'static str {
    match task {
        TaskKind::Clothing => "What should I wear for this weather?",
        TaskKind::Story => "Tell me a story about this weather.",
        TaskKind::FollowUp => "Tell me more about this forecast.",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn every_task_has_an_implied_question() {
        assert!(default_user_text(TaskKind::Clothing).ends_with('?'));
        assert!(!default_user_text(TaskKind::Story).is_empty());
        assert!(!default_user_text(TaskKind::FollowUp).is_empty());
    }
}
