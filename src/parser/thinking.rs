//! Whole-message thinking extraction.
//!
//! Settled messages are run through a fresh [`ChunkParser`] so block
//! detection matches the streaming classification exactly. A block left
//! open at the end of the message counts as thinking.

use super::{ChunkParser, Segment, SegmentFormat};
use crate::model::{Message, ThinkingBlock};

/// A message's content split into reasoning and answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedThinking {
    /// Trimmed, non-empty thinking blocks joined by a blank line.
    pub thinking: String,
    /// Trimmed content with every thinking block removed.
    pub response: String,
    /// Whether any non-empty thinking block was found.
    pub has_thinking: bool,
}

fn segments_of(content: &str) -> Vec<Segment> {
    let mut parser = ChunkParser::new();
    let mut segments = parser.parse_chunk(content);
    segments.extend(parser.finalize());
    segments
}

/// Split `content` into thinking and response text.
pub fn parse_message_thinking(content: &str) -> ParsedThinking {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;
    let mut response = String::new();

    for segment in segments_of(content) {
        if segment.is_tag() {
            let closes = segment.content.starts_with("</");
            match (current.is_some(), closes) {
                (false, false) => current = Some(String::new()),
                (true, true) => blocks.extend(current.take()),
                // A stray close tag closes nothing; it is dropped like any tag.
                (false, true) | (true, false) => {}
            }
            continue;
        }
        match (segment.format, current.as_mut()) {
            (SegmentFormat::Thinking, Some(block)) => block.push_str(&segment.content),
            _ => response.push_str(&segment.content),
        }
    }
    blocks.extend(current);

    let thinking = blocks
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    ParsedThinking {
        has_thinking: !thinking.is_empty(),
        thinking,
        response: response.trim().to_string(),
    }
}

/// Content with thinking blocks removed and blank-line runs collapsed.
pub fn remove_thinking_blocks(content: &str) -> String {
    collapse_blank_runs(&parse_message_thinking(content).response)
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}

/// Move inline thinking out of `message.content` into its thinking field.
///
/// Messages that already carry separated thinking only get their
/// visibility updated.
pub fn apply_thinking(mut message: Message, show_thinking: bool) -> Message {
    if let Some(thinking) = message.thinking.as_mut() {
        thinking.visible = show_thinking;
        return message;
    }

    let parsed = parse_message_thinking(&message.content);
    if parsed.has_thinking {
        message.content = parsed.response;
        message.thinking = Some(ThinkingBlock {
            content: parsed.thinking,
            visible: show_thinking,
        });
    } else if parsed.response != message.content.trim() {
        // Empty blocks or stray close tags: drop the tags as streaming does.
        message.content = parsed.response;
    }
    message
}
