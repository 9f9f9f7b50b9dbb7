//! SSE record framing over a raw byte stream

use crate::error::ChatError;
use crate::transport::{ByteStream, TransportError};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{future, Stream, StreamExt};
use std::pin::Pin;

/// Tag assigned by the SSE rules to a record without an `event:` line
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched SSE record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseRecord {
    /// Value of the `event:` line, [`DEFAULT_EVENT`] when absent
    pub event: String,
    /// `data:` lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
}

impl SseRecord {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }
}

impl From<Event> for SseRecord {
    fn from(event: Event) -> Self {
        let tag = if event.event.is_empty() {
            DEFAULT_EVENT.to_string()
        } else {
            event.event
        };
        Self {
            event: tag,
            data: event.data,
            id: Some(event.id).filter(|id| !id.is_empty()),
        }
    }
}

pub type RecordStream = Pin<Box<dyn Stream<Item = Result<SseRecord, ChatError>> + Send>>;

fn map_stream_error(err: EventStreamError<TransportError>) -> ChatError {
    match err {
        EventStreamError::Transport(e) => ChatError::Transport(e),
        EventStreamError::Utf8(e) => ChatError::MalformedStream {
            message: format!("invalid UTF-8: {}", e),
        },
        EventStreamError::Parser(e) => ChatError::MalformedStream {
            message: format!("invalid SSE framing: {}", e),
        },
    }
}

/// Frame `bytes` into records in arrival order
///
/// The stream ends after the first error it yields.
pub fn records(bytes: ByteStream) -> RecordStream {
    let stream = bytes
        .eventsource()
        .map(|item| item.map(SseRecord::from).map_err(map_stream_error))
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });
    Box::pin(stream)
}
