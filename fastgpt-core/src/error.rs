//! Umbrella error for chat operations

use crate::interactive::InteractiveError;
use crate::sse::DecodeError;
use crate::transport::TransportError;
use thiserror::Error;

/// Error returned by [`ChatService`](crate::chat::ChatService) calls and
/// yielded by event streams
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// One record could not be decoded; later records are unaffected
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Malformed event stream: {message}")]
    MalformedStream { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Interactive(#[from] InteractiveError),
}

impl ChatError {
    /// Whether the stream that produced this error can still yield records
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChatError::Decode(_))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
