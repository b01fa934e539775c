//! Multi-stream chunk accumulator.
//!
//! Reassembles fragments per stream ID. Independent producers may call
//! [`MessageAccumulator::add_chunk`] concurrently; each stream has its own
//! lock so streams never contend on content. Finalize and cleanup take the
//! map's write lock, which waits for every in-flight append, so a stream is
//! never finalized while one of its own appends is half done.

use crate::model::{Message, MessageChunk, MessageSource, Role, StreamError, StreamId, ToolCall};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// In-progress state of one stream.
#[derive(Debug, Clone)]
struct StreamBuffer {
    content: String,
    chunk_count: usize,
    start_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
    model: Option<String>,
    role: Role,
    is_complete: bool,
    tool_calls: Vec<ToolCall>,
}

impl StreamBuffer {
    fn open(chunk: &MessageChunk) -> Self {
        Self {
            content: String::new(),
            chunk_count: 0,
            start_time: chunk.timestamp,
            last_update: chunk.timestamp,
            model: chunk.model.clone(),
            role: chunk.role.unwrap_or(Role::Assistant),
            is_complete: false,
            tool_calls: Vec::new(),
        }
    }

    fn append(&mut self, chunk: MessageChunk) {
        self.content.push_str(&chunk.content);
        self.chunk_count += 1;
        self.last_update = chunk.timestamp;
        if self.model.is_none() {
            self.model = chunk.model;
        }
        if !chunk.tool_calls.is_empty() {
            self.tool_calls = chunk.tool_calls;
        }
        if chunk.done {
            self.is_complete = true;
        }
    }

    fn to_message(&self, stream_id: &StreamId) -> Message {
        let mut message = Message::new(self.role, self.content.clone())
            .with_tool_calls(self.tool_calls.clone())
            .with_source(MessageSource::Final);
        message.timestamp = self.last_update;
        message.stream_id = Some(stream_id.clone());
        message
    }

    fn stats(&self, stream_id: &StreamId) -> StreamStats {
        StreamStats {
            stream_id: stream_id.clone(),
            chunk_count: self.chunk_count,
            content_length: self.content.len(),
            start_time: self.start_time,
            last_update: self.last_update,
            duration: self.last_update - self.start_time,
            is_complete: self.is_complete,
            model: self.model.clone(),
        }
    }
}

/// Progress snapshot of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStats {
    /// Stream described by these stats.
    pub stream_id: StreamId,
    /// Number of content fragments appended.
    pub chunk_count: usize,
    /// Buffered content length in bytes.
    pub content_length: usize,
    /// Timestamp of the first fragment.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the latest fragment.
    pub last_update: DateTime<Utc>,
    /// Time between first and latest fragment.
    pub duration: chrono::Duration,
    /// Whether the final fragment has arrived.
    pub is_complete: bool,
    /// Model reported by the stream, if any.
    pub model: Option<String>,
}

/// Retired stream IDs remembered to reject late chunks.
pub const RETIRED_STREAM_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Streams {
    active: HashMap<StreamId, Mutex<StreamBuffer>>,
    /// Recently finalized or cleaned-up streams; further chunks for them are
    /// rejected. Only the newest [`RETIRED_STREAM_CAPACITY`] are kept.
    retired: HashSet<StreamId>,
    retired_order: VecDeque<StreamId>,
}

impl Streams {
    fn retire(&mut self, stream_id: &StreamId) {
        if !self.retired.insert(stream_id.clone()) {
            return;
        }
        self.retired_order.push_back(stream_id.clone());
        while self.retired_order.len() > RETIRED_STREAM_CAPACITY {
            if let Some(oldest) = self.retired_order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }
}

/// Thread-safe per-stream buffers.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    streams: RwLock<Streams>,
}

impl MessageAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to its stream, opening the stream on first sight.
    ///
    /// Error fragments only refresh the stream's last-update time. A `done`
    /// fragment marks the stream complete but keeps its buffer.
    ///
    /// # Errors
    ///
    /// `StreamError::NotFound` if the stream was already finalized or
    /// cleaned up, or if an error fragment names a stream that is not open.
    pub fn add_chunk(&self, chunk: MessageChunk) -> Result<(), StreamError> {
        {
            let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
            if streams.retired.contains(&chunk.stream_id) {
                warn!(stream_id = %chunk.stream_id, "Chunk for retired stream ignored");
                return Err(StreamError::NotFound(chunk.stream_id));
            }
            if let Some(buffer) = streams.active.get(&chunk.stream_id) {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                if chunk.is_error() {
                    buffer.last_update = chunk.timestamp;
                } else {
                    buffer.append(chunk);
                }
                return Ok(());
            }
        }

        // First fragment of a new stream.
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        if streams.retired.contains(&chunk.stream_id) {
            return Err(StreamError::NotFound(chunk.stream_id));
        }
        if chunk.is_error() {
            return match streams.active.get_mut(&chunk.stream_id) {
                Some(buffer) => {
                    buffer
                        .get_mut()
                        .unwrap_or_else(PoisonError::into_inner)
                        .last_update = chunk.timestamp;
                    Ok(())
                }
                None => Err(StreamError::NotFound(chunk.stream_id)),
            };
        }
        let stream_id = chunk.stream_id.clone();
        let buffer = streams
            .active
            .entry(stream_id.clone())
            .or_insert_with(|| {
                debug!(stream_id = %stream_id, "Stream opened");
                Mutex::new(StreamBuffer::open(&chunk))
            });
        buffer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .append(chunk);
        Ok(())
    }

    /// Build the message for a stream and retire it.
    ///
    /// # Errors
    ///
    /// `StreamError::NotFound` if the stream is unknown or already retired.
    pub fn finalize_message(&self, stream_id: &StreamId) -> Result<Message, StreamError> {
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        let buffer = streams
            .active
            .remove(stream_id)
            .ok_or_else(|| StreamError::NotFound(stream_id.clone()))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        streams.retire(stream_id);
        debug!(
            stream_id = %stream_id,
            chunks = buffer.chunk_count,
            complete = buffer.is_complete,
            "Stream finalized"
        );
        Ok(buffer.to_message(stream_id))
    }

    /// Discard all state for a stream without producing a message.
    ///
    /// # Errors
    ///
    /// `StreamError::NotFound` if the stream is unknown or already retired.
    pub fn cleanup_stream(&self, stream_id: &StreamId) -> Result<(), StreamError> {
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        streams
            .active
            .remove(stream_id)
            .ok_or_else(|| StreamError::NotFound(stream_id.clone()))?;
        streams.retire(stream_id);
        debug!(stream_id = %stream_id, "Stream cleaned up");
        Ok(())
    }

    fn with_buffer<T>(&self, stream_id: &StreamId, f: impl FnOnce(&StreamBuffer) -> T) -> Option<T> {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        let buffer = streams.active.get(stream_id)?;
        let buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&buffer))
    }

    /// Content buffered so far for an open stream.
    pub fn current_content(&self, stream_id: &StreamId) -> Option<String> {
        self.with_buffer(stream_id, |b| b.content.clone())
    }

    /// Whether the stream's final fragment has arrived.
    pub fn is_complete(&self, stream_id: &StreamId) -> bool {
        self.with_buffer(stream_id, |b| b.is_complete)
            .unwrap_or(false)
    }

    /// The message for a completed stream, without retiring it.
    pub fn complete_message(&self, stream_id: &StreamId) -> Option<Message> {
        self.with_buffer(stream_id, |b| b.is_complete.then(|| b.to_message(stream_id)))
            .flatten()
    }

    /// Open streams, sorted by ID.
    pub fn active_streams(&self) -> Vec<StreamId> {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<StreamId> = streams.active.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Progress snapshot for an open stream.
    pub fn stream_stats(&self, stream_id: &StreamId) -> Option<StreamStats> {
        self.with_buffer(stream_id, |b| b.stats(stream_id))
    }
}

/// Words per minute over a stream's lifetime; zero for instantaneous streams.
pub fn words_per_minute(stats: &StreamStats, content: &str) -> f64 {
    let millis = stats.duration.num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    let words = content.split_whitespace().count() as f64;
    words / (millis as f64 / 60_000.0)
}

/// Trim trailing spaces and tabs left by streamed output.
pub fn sanitize_stream_content(content: &str) -> &str {
    content.trim_end_matches([' ', '\t'])
}

#[cfg(test)]
#[path = "accumulator_tests.rs"]
mod tests;
