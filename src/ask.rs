//! One-shot mode: ask a single question and format the reply for stdout.

use crate::api::QueryClient;
use crate::source::render_source;
use crate::transcript::{ChatMessage, Transcript};

/// What `quickrag ask` prints, and whether it should exit non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub output: String,
    pub failed: bool,
}

/// Send `question` and format the terminal bot message. Blank questions send
/// nothing and produce empty output.
pub async fn ask(client: &QueryClient, question: &str) -> AskOutcome {
    let mut transcript = Transcript::new();
    let Some(submission) = transcript.begin(question) else {
        return AskOutcome {
            output: String::new(),
            failed: false,
        };
    };

    let result = client.query(&submission.question).await;
    if let Err(err) = &result {
        tracing::error!(error = ?err, "query failed");
    }
    transcript.resolve(submission.id, result);

    match transcript.messages().last() {
        Some(message) => AskOutcome {
            output: format_message(message),
            failed: message.failed,
        },
        None => AskOutcome {
            output: String::new(),
            failed: false,
        },
    }
}

/// Plain-text rendering of a message and its "Sources:" list.
pub fn format_message(message: &ChatMessage) -> String {
    let mut out = message.text.clone();

    if !message.sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in &message.sources {
            let display = render_source(source);
            out.push_str("\n  • ");
            out.push_str(&display.meta);
            if let Some(preview) = display.preview {
                out.push_str("\n    ");
                out.push_str(&preview);
            }
        }
    }

    out
}
