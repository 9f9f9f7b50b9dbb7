//! Pull-based stream of decoded chat events

use super::decoder::{self, ChatEvent};
use super::envelope::{self, RecordStream};
use crate::error::ChatError;
use crate::transport::ByteStream;
use futures::{stream, Stream, StreamExt};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Stream returned by the streaming chat calls
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send>>;

/// What to do with a record whose payload does not match its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Yield `Err(ChatError::Decode)` for the record and continue
    #[default]
    Surface,
    /// Log the record at warn level and continue
    Skip,
    /// Yield the error and end the stream
    Abort,
}

struct DecodeState {
    records: RecordStream,
    policy: DecodePolicy,
    cancel: CancellationToken,
    finished: bool,
}

enum Step {
    Cancelled,
    Next(Option<Result<envelope::SseRecord, ChatError>>),
}

/// Decode an SSE byte stream into [`ChatEvent`]s
///
/// Nothing is read until the stream is polled. Cancelling `cancel` yields
/// [`ChatError::Cancelled`] once and ends the stream; dropping the stream
/// releases the response body.
pub fn decode_stream(
    bytes: ByteStream,
    policy: DecodePolicy,
    cancel: CancellationToken,
) -> ChatEventStream {
    decode_records(envelope::records(bytes), policy, cancel)
}

/// Decode an already framed record stream
pub fn decode_records(
    records: RecordStream,
    policy: DecodePolicy,
    cancel: CancellationToken,
) -> ChatEventStream {
    let state = DecodeState {
        records,
        policy,
        cancel,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            let step = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => Step::Cancelled,
                next = state.records.next() => Step::Next(next),
            };

            let record = match step {
                Step::Cancelled => {
                    debug!("Event stream cancelled");
                    state.finished = true;
                    return Some((Err(ChatError::Cancelled), state));
                }
                Step::Next(None) => return None,
                Step::Next(Some(Err(e))) => {
                    warn!("Event stream failed: {}", e);
                    state.finished = true;
                    return Some((Err(e), state));
                }
                Step::Next(Some(Ok(record))) => record,
            };

            match decoder::decode(record) {
                Ok(event) => return Some((Ok(event), state)),
                Err(e) => match state.policy {
                    DecodePolicy::Surface => return Some((Err(ChatError::Decode(e)), state)),
                    DecodePolicy::Skip => {
                        warn!("Skipping undecodable event: {}", e);
                        continue;
                    }
                    DecodePolicy::Abort => {
                        warn!("Aborting event stream: {}", e);
                        state.finished = true;
                        return Some((Err(ChatError::Decode(e)), state));
                    }
                },
            }
        }
    }))
}
