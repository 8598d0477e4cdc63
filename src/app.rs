use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::api::{QueryClient, QueryError, QueryResponse};
use crate::tui::AppEvent;
use crate::transcript::{RequestId, Transcript};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript and its viewport
    pub transcript: Transcript,
    pub scroll: u16,
    pub max_scroll: u16,   // updated during render
    pub follow_tail: bool, // keep the newest content in view
    pub chat_height: u16,

    // Spinner frame for pending placeholders
    pub animation_frame: u8,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    pub client: QueryClient,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: QueryClient, transcript: Transcript, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input: String::new(),
            cursor: 0,
            transcript,
            scroll: 0,
            max_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            animation_frame: 0,
            chat_area: None,
            client,
            events,
        }
    }

    /// Send the current input as a question. Blank input is ignored and left
    /// in place; otherwise the input is cleared and a query task is spawned
    /// whose result comes back as [`AppEvent::QueryFinished`].
    pub fn submit_query(&mut self) -> Option<RequestId> {
        let submission = self.transcript.begin(&self.input)?;

        self.input.clear();
        self.cursor = 0;
        self.follow_tail = true;

        tracing::info!(id = ?submission.id, question = %submission.question, "submitting query");

        let client = self.client.clone();
        let events = self.events.clone();
        let id = submission.id;
        tokio::spawn(async move {
            let result = client.query(&submission.question).await;
            if let Err(err) = &result {
                tracing::error!(id = ?id, error = ?err, "query failed");
            }
            // Receiver gone means the UI has shut down
            let _ = events.send(AppEvent::QueryFinished { id, result });
        });

        Some(id)
    }

    pub fn finish_query(&mut self, id: RequestId, result: Result<QueryResponse, QueryError>) {
        match &result {
            Ok(response) => tracing::info!(
                id = ?id,
                sources = response.sources.as_ref().map_or(0, Vec::len),
                "query answered"
            ),
            Err(err) => tracing::debug!(id = ?id, %err, "rendering query error"),
        }

        self.transcript.resolve(id, result);
        self.follow_tail = true;
    }

    pub fn is_waiting(&self) -> bool {
        self.transcript.pending_count() > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.min(self.max_scroll).saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
        self.follow_tail = self.scroll >= self.max_scroll;
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up(self.chat_height.max(2) / 2);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down(self.chat_height.max(2) / 2);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll;
        self.follow_tail = true;
    }

    /// Record the transcript height measured by the renderer and pin the
    /// viewport to the newest content when following.
    pub fn update_viewport(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_height = visible_height;
        self.max_scroll = total_lines.saturating_sub(visible_height);
        if self.follow_tail || self.scroll > self.max_scroll {
            self.scroll = self.max_scroll;
        }
    }
}
