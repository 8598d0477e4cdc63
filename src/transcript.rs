//! The chat transcript: an append-only log of messages plus one transient
//! placeholder per request still in flight.

use crate::api::{QueryError, QueryResponse};
use crate::source::Source;

pub const GREETING: &str = "Hello! How can I help you today?";
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
}

/// A chat message. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub sources: Vec<Source>,
    /// Terminal message of a failed request
    pub failed: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            sources: Vec::new(),
            failed: false,
        }
    }

    pub fn bot(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: ChatRole::Bot,
            text: text.into(),
            sources,
            failed: false,
        }
    }

    /// Terminal bot message for a finished request.
    pub fn from_outcome(outcome: Result<QueryResponse, QueryError>) -> Self {
        match outcome {
            Ok(response) => {
                let (answer, sources) = response.into_parts();
                Self::bot(answer, sources)
            }
            Err(err) => Self {
                failed: true,
                ..Self::bot(format!("Error: {}", err), Vec::new())
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(ChatMessage),
    /// "Thinking..." shown while request `RequestId` is pending
    Placeholder(RequestId),
}

/// A submitted question waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: RequestId,
    pub question: String,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript opened with the bot's greeting.
    pub fn with_greeting() -> Self {
        let mut transcript = Self::new();
        transcript.push(ChatMessage::bot(GREETING, Vec::new()));
        transcript
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(message) => Some(message),
            Entry::Placeholder(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Placeholder(_)))
            .count()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(Entry::Message(message));
    }

    /// Record a new question: the user message followed by a placeholder.
    /// Returns `None` for blank input, leaving the transcript untouched.
    pub fn begin(&mut self, raw_input: &str) -> Option<Submission> {
        let question = raw_input.trim();
        if question.is_empty() {
            return None;
        }

        let id = RequestId(self.next_id);
        self.next_id += 1;

        self.push(ChatMessage::user(question));
        self.entries.push(Entry::Placeholder(id));

        Some(Submission {
            id,
            question: question.to_string(),
        })
    }

    /// Settle request `id`: drop its placeholder, then append the terminal
    /// bot message at the end of the log.
    pub fn resolve(&mut self, id: RequestId, outcome: Result<QueryResponse, QueryError>) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| *entry == Entry::Placeholder(id))
        {
            self.entries.remove(index);
        }

        self.push(ChatMessage::from_outcome(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn answer(body: serde_json::Value) -> Result<QueryResponse, QueryError> {
        Ok(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.begin(""), None);
        assert_eq!(transcript.begin("   \t\n"), None);
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_begin_appends_user_message_and_placeholder() {
        let mut transcript = Transcript::new();
        let submission = transcript.begin("  What is the capital?  ").unwrap();

        assert_eq!(submission.question, "What is the capital?");
        assert_eq!(
            transcript.entries(),
            &[
                Entry::Message(ChatMessage::user("What is the capital?")),
                Entry::Placeholder(submission.id),
            ]
        );
    }

    #[test]
    fn test_resolve_replaces_placeholder_with_answer() {
        let mut transcript = Transcript::new();
        let submission = transcript.begin("capital of France?").unwrap();

        transcript.resolve(
            submission.id,
            answer(json!({
                "answer": "Paris",
                "sources": [{"document_name": "geo.txt", "chunk_id": 1, "snippet": "Paris is the capital..."}]
            })),
        );

        assert_eq!(transcript.pending_count(), 0);
        let messages: Vec<_> = transcript.messages().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Bot);
        assert_eq!(messages[1].text, "Paris");
        assert_eq!(messages[1].sources.len(), 1);
        assert!(!messages[1].failed);
    }

    #[test]
    fn test_resolve_error_renders_message() {
        let mut transcript = Transcript::new();
        let submission = transcript.begin("anything").unwrap();

        transcript.resolve(
            submission.id,
            Err(QueryError::Http {
                status: StatusCode::NOT_FOUND,
                detail: Some("index not found".to_string()),
            }),
        );

        let last = transcript.messages().last().unwrap();
        assert_eq!(last.text, "Error: HTTP error! status: 404, message: index not found");
        assert!(last.sources.is_empty());
        assert!(last.failed);
        assert_eq!(transcript.pending_count(), 0);
    }

    #[test]
    fn test_overlapping_requests_settle_in_arrival_order() {
        let mut transcript = Transcript::new();
        let first = transcript.begin("first").unwrap();
        let second = transcript.begin("second").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(transcript.pending_count(), 2);

        transcript.resolve(second.id, answer(json!({"answer": "two"})));
        assert_eq!(transcript.pending_count(), 1);
        assert!(transcript.entries().contains(&Entry::Placeholder(first.id)));

        transcript.resolve(first.id, answer(json!({"answer": "one"})));
        assert_eq!(transcript.pending_count(), 0);

        let texts: Vec<_> = transcript.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "two", "one"]);
    }

    #[test]
    fn test_missing_answer_uses_fallback() {
        let mut transcript = Transcript::new();
        let submission = transcript.begin("hello").unwrap();
        transcript.resolve(submission.id, answer(json!({})));

        let last = transcript.messages().last().unwrap();
        assert_eq!(last.text, crate::api::NO_ANSWER);
        assert!(last.sources.is_empty());
    }

    #[test]
    fn test_greeting_starts_transcript() {
        let transcript = Transcript::with_greeting();
        let messages: Vec<_> = transcript.messages().collect();
        assert_eq!(messages, vec![&ChatMessage::bot(GREETING, Vec::new())]);
    }
}
