//! Incremental Server-Sent-Events decoding for both direct backends.
//!
//! One line framer ([`SseDecoder`]) does the buffering and UTF-8 handling;
//! a small [`SseDialect`] strategy decides what a parsed `data:` payload means
//! for a given backend.

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use specforge_logging::log_stream_chunk;
use specforge_models::{AnthropicStreamEvent, BackendKind, StreamChunk};

use crate::client::TextStream;
use crate::error::CompletionError;

/// What a single SSE line contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A piece of generated text
    Delta(String),
    /// The stream completed successfully
    Done,
    /// The backend reported a failure in-band
    Error(String),
}

/// Per-backend interpretation of `data:` payloads
pub trait SseDialect: Send + 'static {
    type Frame: DeserializeOwned;

    /// Literal payload that ends the stream without being parsed
    fn is_done_sentinel(&self, _data: &str) -> bool {
        false
    }

    /// Text carried by a frame, if any
    fn delta_text(&self, frame: &Self::Frame) -> Option<String>;

    /// Whether the frame itself signals the end of the stream
    fn is_terminal(&self, frame: &Self::Frame) -> bool;

    /// Error reported by the frame, if it is an error frame
    fn error_message(&self, _frame: &Self::Frame) -> Option<String> {
        None
    }
}

/// `data: {"choices":[{"delta":{"content":"..."}}]}` frames ended by `data: [DONE]`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiDialect;

impl SseDialect for OpenAiDialect {
    type Frame = StreamChunk;

    fn is_done_sentinel(&self, data: &str) -> bool {
        data == "[DONE]"
    }

    fn delta_text(&self, frame: &StreamChunk) -> Option<String> {
        frame
            .choices
            .first()
            .and_then(|choice| choice.delta.as_ref())
            .and_then(|delta| delta.content.clone())
    }

    fn is_terminal(&self, _frame: &StreamChunk) -> bool {
        false
    }
}

/// `type`-discriminated frames ended by a `message_stop` event
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicDialect;

impl SseDialect for AnthropicDialect {
    type Frame = AnthropicStreamEvent;

    fn delta_text(&self, frame: &AnthropicStreamEvent) -> Option<String> {
        match frame {
            AnthropicStreamEvent::ContentBlockDelta { delta } => {
                delta.get("text").and_then(Value::as_str).map(str::to_string)
            }
            // Initial text of a block is rare but legal
            AnthropicStreamEvent::ContentBlockStart { content_block } => content_block
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    fn is_terminal(&self, frame: &AnthropicStreamEvent) -> bool {
        matches!(frame, AnthropicStreamEvent::MessageStop)
    }

    fn error_message(&self, frame: &AnthropicStreamEvent) -> Option<String> {
        match frame {
            AnthropicStreamEvent::Error { error } => Some(
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            ),
            _ => None,
        }
    }
}

/// UTF-8 decoder that holds back a multi-byte sequence split across chunks.
///
/// Invalid sequences become U+FFFD instead of stalling the stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + len..];
                        }
                        None => {
                            // Incomplete trailing sequence: wait for more bytes
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back at end of input
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// Rolling line framer for one stream
pub struct SseDecoder<D: SseDialect> {
    dialect: D,
    utf8: Utf8Decoder,
    buffer: String,
    finished: bool,
    frames_seen: usize,
    verbose: bool,
}

impl<D: SseDialect> SseDecoder<D> {
    pub fn new(dialect: D) -> Self {
        Self {
            dialect,
            utf8: Utf8Decoder::default(),
            buffer: String::new(),
            finished: false,
            frames_seen: 0,
            verbose: false,
        }
    }

    /// Trace every raw payload
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// True once a terminator or error was seen; later input is ignored
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one chunk of bytes and return the events of every line it completed
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let text = self.utf8.decode(bytes);
        self.buffer.push_str(&text);

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            self.process_line(&line, &mut events);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }

        events
    }

    /// Signal end of input.
    ///
    /// A trailing unterminated line is still processed, and a stream that
    /// ends without a terminator completes successfully.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            self.process_line(&rest, &mut events);
        }

        if !self.finished {
            self.finished = true;
            events.push(SseEvent::Done);
        }
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        let line = line.trim();
        // Event names, ids, comments and keep-alive blanks carry nothing we use
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data.is_empty() {
            return;
        }

        self.frames_seen += 1;
        log_stream_chunk(self.frames_seen, data, self.verbose);

        if self.dialect.is_done_sentinel(data) {
            self.finished = true;
            events.push(SseEvent::Done);
            return;
        }

        let frame: D::Frame = match serde_json::from_str(data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, frame = self.frames_seen, "skipping malformed SSE frame");
                return;
            }
        };

        if let Some(message) = self.dialect.error_message(&frame) {
            self.finished = true;
            events.push(SseEvent::Error(message));
            return;
        }

        if let Some(text) = self.dialect.delta_text(&frame) {
            if !text.is_empty() {
                events.push(SseEvent::Delta(text));
            }
        }

        if self.dialect.is_terminal(&frame) {
            self.finished = true;
            events.push(SseEvent::Done);
        }
    }
}

/// Turn a response byte stream into a stream of text deltas.
///
/// Deltas are yielded as soon as their line is complete. The stream ends
/// after the dialect's terminator, after an in-band error, after a transport
/// error, or when the body ends.
pub fn decode_text_stream<S, B, D>(
    bytes: S,
    dialect: D,
    backend: BackendKind,
    verbose: bool,
) -> TextStream
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    D: SseDialect,
{
    Box::pin(async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new(dialect).with_verbose(verbose);

        loop {
            let events = match bytes.next().await {
                Some(Ok(chunk)) => decoder.feed(chunk.as_ref()),
                Some(Err(e)) => {
                    yield Err(CompletionError::transport(backend, e));
                    return;
                }
                None => decoder.finish(),
            };

            for event in events {
                match event {
                    SseEvent::Delta(text) => yield Ok(text),
                    SseEvent::Done => return,
                    SseEvent::Error(message) => {
                        yield Err(CompletionError::Stream { backend, message });
                        return;
                    }
                }
            }

            if decoder.is_finished() {
                return;
            }
        }
    })
}
