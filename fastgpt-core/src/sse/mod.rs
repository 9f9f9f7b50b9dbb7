//! Server-sent event handling
//!
//! Bytes are framed into [`SseRecord`]s by [`envelope`], each record is
//! mapped to a typed [`ChatEvent`] by [`decoder`], and [`stream`] ties the
//! two together into a cancellable [`ChatEventStream`].

pub mod decoder;
pub mod envelope;
pub mod stream;

pub use decoder::{decode, tags, ChatEvent, DecodeError, EventPayload, DONE};
pub use envelope::{records, RecordStream, SseRecord, DEFAULT_EVENT};
pub use stream::{decode_records, decode_stream, ChatEventStream, DecodePolicy};
