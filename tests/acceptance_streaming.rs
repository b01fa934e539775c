//! Acceptance tests: replaying transcripts into the conversation state.
//!
//! Each scenario feeds a JSONL transcript through the replay worker and
//! checks the node tree the user would see.

use chatweave::model::{NodeId, Role};
use chatweave::source::spawn_replay;
use chatweave::state::ChatState;
use chatweave::view_state::{line_to_string, NodeKind, ToolStatus};
use std::io::Cursor;
use std::sync::mpsc::TryRecvError;
use std::time::{Duration, Instant};

// ===== Test Helpers =====

/// Replay a whole transcript and return the resulting state.
fn replay(transcript: &str, show_thinking: bool) -> ChatState {
    let handle = spawn_replay(Cursor::new(transcript.to_string()), Duration::ZERO)
        .expect("replay worker should start");
    let mut chat = ChatState::new(show_thinking);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match handle.try_recv() {
            Ok(event) => chat.handle_event(event),
            Err(TryRecvError::Empty) => {
                assert!(Instant::now() < deadline, "replay did not finish");
                std::thread::sleep(Duration::from_millis(2));
            }
            Err(TryRecvError::Disconnected) => break,
        }
    }
    chat
}

fn contents(chat: &ChatState) -> Vec<String> {
    chat.tree()
        .nodes()
        .iter()
        .map(|n| n.message().content.clone())
        .collect()
}

// ===== Scenario 1: Interleaved Streams =====

#[test]
fn interleaved_streams_settle_in_completion_order() {
    // GIVEN: two answers streamed at the same time
    let transcript = r#"
{"type":"user_input","content":"compare"}
{"type":"chunk","stream_id":"a","content":"<think>pl"}
{"type":"chunk","stream_id":"b","content":"Second "}
{"type":"chunk","stream_id":"a","content":"an</think>First answer"}
{"type":"chunk","stream_id":"b","content":"answer","done":true}
{"type":"chunk","stream_id":"a","content":"","done":true}
"#;

    // WHEN: the transcript is replayed
    let chat = replay(transcript, true);

    // THEN: each stream becomes one settled node, in completion order
    assert_eq!(chat.open_stream_count(), 0);
    assert!(!chat.tree().has_streaming_message());
    assert_eq!(
        contents(&chat),
        vec!["compare", "Second answer", "First answer"]
    );

    // AND: reasoning split across fragments is recovered
    let first = &chat.tree().nodes()[2];
    match first.kind() {
        NodeKind::Thinking(parts) => {
            assert_eq!(parts.thinking, "plan");
            assert_eq!(parts.response, "First answer");
        }
        other => panic!("expected a thinking node, got {other:?}"),
    }
}

// ===== Scenario 2: Failure Mid-Stream =====

#[test]
fn failed_stream_is_replaced_by_error_node() {
    // GIVEN: a stream that fails after its first fragment
    let transcript = r#"
{"type":"chunk","stream_id":"s","content":"partial"}
{"type":"stream_failed","stream_id":"s","error":"connection reset"}
"#;

    // WHEN: replayed
    let chat = replay(transcript, true);

    // THEN: the partial text is gone and an error node explains why
    assert_eq!(contents(&chat), vec!["Error: connection reset"]);
    assert_eq!(chat.tree().nodes()[0].message().role, Role::Error);
    assert!(chat.accumulator().active_streams().is_empty());
}

#[test]
fn error_fragment_fails_its_stream() {
    let transcript = r#"
{"type":"chunk","stream_id":"s","content":"partial"}
{"type":"chunk","stream_id":"s","error":"rate limited"}
"#;

    let chat = replay(transcript, true);

    assert_eq!(contents(&chat), vec!["Error: rate limited"]);
}

// ===== Scenario 3: Cancellation =====

#[test]
fn cancelled_stream_leaves_no_trace() {
    let transcript = r#"
{"type":"user_input","content":"stop"}
{"type":"chunk","stream_id":"s","content":"never mind"}
{"type":"stream_cancelled","stream_id":"s"}
"#;

    let chat = replay(transcript, true);

    assert_eq!(contents(&chat), vec!["stop"]);
    assert_eq!(chat.open_stream_count(), 0);
}

// ===== Scenario 4: Tool Lifecycle =====

#[test]
fn tool_run_reports_progress_then_result() {
    // GIVEN: a shell command that reports progress and finishes
    let transcript = r#"
{"type":"tool_started","call_id":"c1","tool_name":"execute_bash"}
{"type":"tool_progress","call_id":"c1","progress":"compiling"}
{"type":"tool_finished","call_id":"c1","output":"build ok"}
{"type":"tool_started","call_id":"c2","tool_name":"read_file"}
{"type":"tool_failed","call_id":"c2","error":"permission denied"}
"#;

    // WHEN: replayed
    let chat = replay(transcript, true);

    // THEN: both runs end in their final status
    let nodes = chat.tree().nodes();
    assert_eq!(nodes.len(), 2);
    match nodes[0].kind() {
        NodeKind::ToolExecution(exec) => {
            assert_eq!(exec.status, ToolStatus::Completed);
            assert_eq!(exec.display_name, "Shell");
            assert_eq!(exec.result, "build ok");
        }
        other => panic!("expected tool execution, got {other:?}"),
    }
    assert_eq!(nodes[0].message().content, "✓ Shell");
    assert_eq!(nodes[1].message().content, "✗ ReadFile (failed)");
}

// ===== Scenario 5: Resilience =====

#[test]
fn malformed_lines_do_not_stop_the_replay() {
    let transcript = r#"
{"type":"user_input","content":"one"}
this is not json
{"type":"mystery"}
{"type":"user_input","content":"two"}
"#;

    let chat = replay(transcript, true);

    assert_eq!(contents(&chat), vec!["one", "two"]);
}

#[test]
fn history_snapshot_keeps_open_stream() {
    // GIVEN: a stream still open when a history snapshot arrives
    let transcript = r#"
{"type":"chunk","stream_id":"s","content":"typing"}
{"type":"history","messages":[{"role":"user","content":"earlier"},{"role":"assistant","content":"reply"}]}
"#;

    // WHEN: replayed
    let chat = replay(transcript, true);

    // THEN: the snapshot replaces settled nodes and the stream stays visible
    assert_eq!(contents(&chat), vec!["earlier", "reply", "typing"]);
    let last: NodeId = chat.tree().nodes()[2].id();
    assert!(last.is_streaming());
    assert_eq!(chat.open_stream_count(), 1);
}

// ===== Scenario 6: Reasoning Visibility =====

#[test]
fn hidden_reasoning_stays_off_screen_while_streaming() {
    let transcript = r#"
{"type":"chunk","stream_id":"s","content":"<think>secret plan</think>vis"}
{"type":"chunk","stream_id":"s","content":"ible"}
"#;

    let mut chat = replay(transcript, false);

    assert_eq!(contents(&chat), vec!["visible"]);
    let id = chat.tree().nodes()[0].id();
    let lines: Vec<String> = chat
        .tree_mut()
        .render_node(id, 40)
        .expect("placeholder renders")
        .iter()
        .map(line_to_string)
        .collect();
    assert_eq!(lines, vec!["visible"]);
}
