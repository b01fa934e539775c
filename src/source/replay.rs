//! Transcript replay on a worker thread.
//!
//! The worker parses JSONL records and sends [`StreamEvent`]s through a
//! channel. It is the only producer the UI loop talks to; cancellation is
//! an atomic flag checked between records.

use crate::model::{Message, MessageChunk, StreamId, ToolCall};
use crate::state::StreamEvent;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayRecord {
    /// Conversation snapshot.
    History {
        /// Messages in order.
        messages: Vec<Message>,
    },
    /// User message.
    UserInput {
        /// Text typed by the user.
        content: String,
    },
    /// Streamed fragment.
    Chunk {
        /// Stream the fragment belongs to.
        stream_id: StreamId,
        /// Fragment text.
        #[serde(default)]
        content: String,
        /// Last fragment of the stream.
        #[serde(default)]
        done: bool,
        /// Producing model.
        #[serde(default)]
        model: Option<String>,
        /// Backend failure carried by the fragment.
        #[serde(default)]
        error: Option<String>,
        /// Tool calls announced so far.
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    /// Stream failure.
    StreamFailed {
        /// Failed stream.
        stream_id: StreamId,
        /// Reason.
        error: String,
    },
    /// Stream cancellation.
    StreamCancelled {
        /// Cancelled stream.
        stream_id: StreamId,
    },
    /// Tool launch.
    ToolStarted {
        /// Tool run.
        call_id: String,
        /// Backend tool name.
        tool_name: String,
    },
    /// Tool progress.
    ToolProgress {
        /// Tool run.
        call_id: String,
        /// Progress note.
        progress: String,
    },
    /// Tool success.
    ToolFinished {
        /// Tool run.
        call_id: String,
        /// Output.
        #[serde(default)]
        output: String,
    },
    /// Tool failure.
    ToolFailed {
        /// Tool run.
        call_id: String,
        /// Reason.
        #[serde(default)]
        error: String,
    },
}

/// Parse one transcript line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns the JSON error for malformed records.
pub fn parse_record(line: &str) -> Result<Option<ReplayRecord>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Turns records into events, numbering chunks per stream.
#[derive(Debug, Default)]
struct EventBuilder {
    chunk_indices: HashMap<StreamId, usize>,
}

impl EventBuilder {
    fn build(&mut self, record: ReplayRecord) -> StreamEvent {
        match record {
            ReplayRecord::History { messages } => StreamEvent::History(messages),
            ReplayRecord::UserInput { content } => StreamEvent::UserInput(content),
            ReplayRecord::Chunk {
                stream_id,
                content,
                done,
                model,
                error,
                tool_calls,
            } => {
                let index = self.chunk_indices.entry(stream_id.clone()).or_insert(0);
                let mut chunk = MessageChunk::new(stream_id, *index, content, done)
                    .with_tool_calls(tool_calls);
                *index += 1;
                chunk.model = model;
                chunk.error = error;
                StreamEvent::Chunk(chunk)
            }
            ReplayRecord::StreamFailed { stream_id, error } => {
                StreamEvent::StreamFailed { stream_id, error }
            }
            ReplayRecord::StreamCancelled { stream_id } => StreamEvent::StreamCancelled(stream_id),
            ReplayRecord::ToolStarted { call_id, tool_name } => {
                StreamEvent::ToolStarted { call_id, tool_name }
            }
            ReplayRecord::ToolProgress { call_id, progress } => {
                StreamEvent::ToolProgress { call_id, progress }
            }
            ReplayRecord::ToolFinished { call_id, output } => {
                StreamEvent::ToolFinished { call_id, output }
            }
            ReplayRecord::ToolFailed { call_id, error } => StreamEvent::ToolFailed { call_id, error },
        }
    }
}

/// What a finished replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events delivered to the channel.
    pub sent: usize,
    /// Lines that failed to parse.
    pub malformed: usize,
    /// Whether the replay stopped because it was cancelled.
    pub cancelled: bool,
}

/// Owner side of a running replay.
///
/// Dropping the handle signals cancellation.
#[derive(Debug)]
pub struct ReplayHandle {
    receiver: Receiver<StreamEvent>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<ReplaySummary>>,
}

impl ReplayHandle {
    /// Next pending event without blocking.
    pub fn try_recv(&self) -> Result<StreamEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Ask the worker to stop after the current record.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Wait for the worker to exit. `None` if it panicked.
    pub fn join(mut self) -> Option<ReplaySummary> {
        self.worker.take()?.join().ok()
    }
}

impl Drop for ReplayHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Replay `reader` on a worker thread, pausing `delay` after each event.
///
/// # Errors
///
/// Fails only if the thread cannot be spawned.
pub fn spawn_replay<R>(reader: R, delay: Duration) -> std::io::Result<ReplayHandle>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let worker = thread::Builder::new()
        .name("chatweave-replay".to_string())
        .spawn(move || {
            let mut summary = ReplaySummary::default();
            let mut builder = EventBuilder::default();

            for (line_no, line) in reader.lines().enumerate() {
                if flag.load(Ordering::Relaxed) {
                    summary.cancelled = true;
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "Transcript read failed");
                        break;
                    }
                };
                match parse_record(&line) {
                    Ok(Some(record)) => {
                        if sender.send(builder.build(record)).is_err() {
                            debug!("Event receiver dropped, stopping replay");
                            break;
                        }
                        summary.sent += 1;
                        if !delay.is_zero() {
                            thread::sleep(delay);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(line = line_no + 1, error = %err, "Malformed transcript record");
                        summary.malformed += 1;
                    }
                }
            }

            info!(
                sent = summary.sent,
                malformed = summary.malformed,
                cancelled = summary.cancelled,
                "Replay finished"
            );
            summary
        })?;

    Ok(ReplayHandle {
        receiver,
        cancel,
        worker: Some(worker),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use std::io::Cursor;

    fn sid(raw: &str) -> StreamId {
        StreamId::new(raw).unwrap()
    }

    fn drain(handle: ReplayHandle) -> (Vec<StreamEvent>, ReplaySummary) {
        let mut events = Vec::new();
        let receiver_done = loop {
            match handle.receiver.recv_timeout(Duration::from_secs(5)) {
                Ok(event) => events.push(event),
                Err(_) => break true,
            }
        };
        assert!(receiver_done);
        let summary = handle.join().unwrap();
        (events, summary)
    }

    #[test]
    fn parses_every_record_type() {
        let lines = [
            r#"{"type":"history","messages":[{"role":"user","content":"hi"}]}"#,
            r#"{"type":"user_input","content":"hello"}"#,
            r#"{"type":"chunk","stream_id":"s1","content":"<think>"}"#,
            r#"{"type":"stream_failed","stream_id":"s1","error":"boom"}"#,
            r#"{"type":"stream_cancelled","stream_id":"s2"}"#,
            r#"{"type":"tool_started","call_id":"c1","tool_name":"execute_bash"}"#,
            r#"{"type":"tool_progress","call_id":"c1","progress":"half"}"#,
            r#"{"type":"tool_finished","call_id":"c1","output":"ok"}"#,
            r#"{"type":"tool_failed","call_id":"c2"}"#,
        ];
        for line in lines {
            assert!(parse_record(line).unwrap().is_some(), "failed on {line}");
        }
    }

    #[test]
    fn history_messages_get_defaults() {
        let record =
            parse_record(r#"{"type":"history","messages":[{"role":"tool_progress"}]}"#).unwrap();
        match record {
            Some(ReplayRecord::History { messages }) => {
                assert_eq!(messages[0].role, Role::ToolProgress);
                assert!(messages[0].content.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_skipped_and_garbage_rejected() {
        assert_eq!(parse_record("   ").unwrap(), None);
        assert!(parse_record("{not json").is_err());
        assert!(parse_record(r#"{"type":"chunk","stream_id":""}"#).is_err());
        assert!(parse_record(r#"{"type":"unknown"}"#).is_err());
    }

    #[test]
    fn chunks_are_numbered_per_stream() {
        let mut builder = EventBuilder::default();
        let chunk = |stream: &str| ReplayRecord::Chunk {
            stream_id: sid(stream),
            content: String::new(),
            done: false,
            model: None,
            error: None,
            tool_calls: Vec::new(),
        };
        let ids: Vec<String> = [chunk("a"), chunk("b"), chunk("a")]
            .into_iter()
            .map(|record| match builder.build(record) {
                StreamEvent::Chunk(chunk) => chunk.id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["a-0", "b-0", "a-1"]);
    }

    #[test]
    fn worker_sends_events_in_order_and_counts_malformed_lines() {
        let transcript = concat!(
            "{\"type\":\"user_input\",\"content\":\"q\"}\n",
            "garbage\n",
            "\n",
            "{\"type\":\"chunk\",\"stream_id\":\"s1\",\"content\":\"a\",\"done\":true}\n",
        );
        let handle = spawn_replay(Cursor::new(transcript), Duration::ZERO).unwrap();
        let (events, summary) = drain(handle);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::UserInput("q".to_string()));
        assert!(matches!(&events[1], StreamEvent::Chunk(c) if c.done && c.content == "a"));
        assert_eq!(
            summary,
            ReplaySummary {
                sent: 2,
                malformed: 1,
                cancelled: false
            }
        );
    }

    #[test]
    fn cancel_stops_the_worker() {
        let line = "{\"type\":\"user_input\",\"content\":\"x\"}\n";
        let transcript = line.repeat(200);
        let handle = spawn_replay(Cursor::new(transcript), Duration::from_millis(20)).unwrap();

        let first = handle.receiver.recv_timeout(Duration::from_secs(5));
        assert!(first.is_ok());
        handle.cancel();
        assert!(handle.is_cancelled());

        let summary = handle.join().unwrap();
        assert!(summary.cancelled);
        assert!(summary.sent < 200);
    }
}
