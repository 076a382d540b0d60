//! Conversation history, one transcript per session.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::client::{ChatMessage, ChatRole};

/// One transcript entry.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    /// Canned service notices. Advisories stay visible in the transcript
    /// but are never replayed to the model.
    pub advisory: bool,
}

/// In-memory store of session transcripts.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Vec<ChatTurn>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().insert(id, Vec::new());
        tracing::debug!("Created chat session {}", id);
        id
    }

    /// Append a turn. Unknown session ids start a fresh transcript.
    pub fn append(&self, session: Uuid, turn: ChatTurn) {
        self.sessions.lock().entry(session).or_default().push(turn);
    }

    /// Full transcript, advisories included.
    pub fn history(&self, session: Uuid) -> Vec<ChatTurn> {
        self.sessions.lock().get(&session).cloned().unwrap_or_default()
    }

    /// The replayable conversation: every non-advisory turn as an upstream
    /// message, oldest first.
    pub fn conversation(&self, session: Uuid) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .get(&session)
            .map(|turns| {
                turns
                    .iter()
                    .filter(|turn| !turn.advisory)
                    .map(|turn| ChatMessage {
                        role: turn.role,
                        content: turn.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clear a session's transcript without forgetting the session.
    pub fn reset(&self, session: Uuid) {
        if let Some(turns) = self.sessions.lock().get_mut(&session) {
            turns.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn turn(role: ChatRole, content: &str, advisory: bool) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
            advisory,
        }
    }

    #[test]
    fn appended_turns_come_back_in_order() {
        let store = SessionStore::new();
        let session = store.create();
        store.append(session, turn(ChatRole::User, "hi", false));
        store.append(session, turn(ChatRole::Assistant, "hello", false));

        let history = store.history(session);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].content, "hello");
    }

    #[test]
    fn conversation_excludes_advisories() {
        let store = SessionStore::new();
        let session = store.create();
        store.append(session, turn(ChatRole::User, "hi", false));
        store.append(session, turn(ChatRole::Assistant, "[assistant offline] down", true));
        store.append(session, turn(ChatRole::User, "still there?", false));

        let conversation = store.conversation(session);
        assert_eq!(conversation.len(), 2);
        assert!(conversation.iter().all(|m| !m.content.contains("[assistant offline]")));

        // The transcript still shows the advisory.
        assert_eq!(store.history(session).len(), 3);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        store.append(a, turn(ChatRole::User, "for a", false));

        assert_eq!(store.history(a).len(), 1);
        assert!(store.history(b).is_empty());
    }

    #[test]
    fn reset_clears_but_keeps_the_session() {
        let store = SessionStore::new();
        let session = store.create();
        store.append(session, turn(ChatRole::User, "hi", false));
        store.reset(session);

        assert!(store.history(session).is_empty());
        store.append(session, turn(ChatRole::User, "again", false));
        assert_eq!(store.history(session).len(), 1);
    }
}
