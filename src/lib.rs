pub mod api;
pub mod ask;
pub mod app;
pub mod config;
pub mod handler;
pub mod logging;
pub mod source;
pub mod transcript;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{QueryClient, QueryError, QueryResponse};
pub use config::Config;
pub use source::{render_source, Source, SourceDisplay, SourceRef};
pub use transcript::{ChatMessage, ChatRole, Transcript};
