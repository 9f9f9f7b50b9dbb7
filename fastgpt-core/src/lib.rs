//! FastGPT Client Core Library
//!
//! Typed client for FastGPT chat applications: SSE answers are decoded into
//! per-tag events, and answers to interactive prompts are validated and
//! encoded as follow-up turns.
//!
//! ```no_run
//! use fastgpt_core::{ChatService, FastGptConfig, TurnOptions};
//! use futures::StreamExt;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FastGptConfig::new("https://fastgpt.example.com", "fastgpt-xxxx");
//! let service = ChatService::from_config(config)?;
//!
//! let chat_id = ChatService::generate_chat_id();
//! let mut events = service
//!     .chat_stream_text("", "Hello", TurnOptions::new().with_chat_id(chat_id))
//!     .await?;
//! while let Some(event) = events.next().await {
//!     if let Some(text) = event?.answer_text() {
//!         print!("{}", text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod interactive;
pub mod protocol;
pub mod sse;
pub mod transport;

pub use chat::{ChatService, TurnOptions};
pub use config::{load_from_json, load_from_path, load_from_yaml, FastGptConfig, SecretString};
pub use error::{ChatError, ChatResult};
pub use interactive::{build_request, InteractiveAnswer, InteractiveError, InteractiveErrorKind};
pub use sse::{ChatEvent, ChatEventStream, DecodeError, DecodePolicy, EventPayload};
pub use transport::{ByteStream, ChatTransport, HttpTransport, TransportError};

/// Re-exported so callers can cancel turns without depending on tokio-util
pub use tokio_util::sync::CancellationToken;

/// Returns the version of the FastGPT Client Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
        assert!(!version().is_empty());
    }
}
