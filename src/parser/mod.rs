//! Streaming parser that separates reasoning from answer text.
//!
//! Model output arrives in fragments that may split anywhere, including in
//! the middle of a `<think>` tag. [`ChunkParser`] classifies each fragment
//! into [`Segment`]s, holding back a trailing partial tag until the next
//! fragment (or [`ChunkParser::finalize`]) resolves it.
//!
//! Recognized tags, matched case-insensitively:
//! `<think>`, `<thinking>`, `</think>`, `</thinking>`.

pub mod thinking;

pub use thinking::{apply_thinking, parse_message_thinking, remove_thinking_blocks, ParsedThinking};

use ratatui::style::{Color, Modifier, Style};

const OPEN_TAGS: [&str; 2] = ["<think>", "<thinking>"];
const CLOSE_TAGS: [&str; 2] = ["</think>", "</thinking>"];

/// Classification of a segment's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentFormat {
    /// Answer text, or a structural tag.
    Plain,
    /// Text inside a thinking block.
    Thinking,
}

impl SegmentFormat {
    /// Display style for text of this format.
    pub fn style(self) -> Style {
        match self {
            SegmentFormat::Plain => Style::default(),
            SegmentFormat::Thinking => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

/// A classified run of text produced by one parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text exactly as received.
    pub content: String,
    /// Plain or thinking.
    pub format: SegmentFormat,
    /// Display style.
    pub style: Style,
    /// Set on structural tag segments, which are not displayed.
    pub hidden: bool,
}

impl Segment {
    fn text(content: &str, format: SegmentFormat) -> Self {
        Self {
            content: content.to_string(),
            format,
            style: format.style(),
            hidden: false,
        }
    }

    fn tag(content: &str) -> Self {
        Self {
            content: content.to_string(),
            format: SegmentFormat::Plain,
            style: Style::default().add_modifier(Modifier::DIM),
            hidden: true,
        }
    }

    /// Whether this segment is a recognized tag.
    pub fn is_tag(&self) -> bool {
        self.hidden
    }
}

/// Outcome of matching the text at a `<` against the recognized tags.
enum TagMatch {
    /// A complete tag of the given byte length; `true` when it opens a block.
    Full { len: usize, opens: bool },
    /// The remaining input is a strict prefix of some tag.
    Partial,
    /// Cannot become a tag.
    None,
}

fn match_tag(rest: &[u8]) -> TagMatch {
    let mut partial = false;
    for (tags, opens) in [(&OPEN_TAGS, true), (&CLOSE_TAGS, false)] {
        for tag in tags.iter().map(|t| t.as_bytes()) {
            if rest.len() >= tag.len() {
                if rest[..tag.len()].eq_ignore_ascii_case(tag) {
                    return TagMatch::Full {
                        len: tag.len(),
                        opens,
                    };
                }
            } else if tag[..rest.len()].eq_ignore_ascii_case(rest) {
                partial = true;
            }
        }
    }
    if partial {
        TagMatch::Partial
    } else {
        TagMatch::None
    }
}

/// Incremental scanner for one stream.
///
/// Not shared between streams; create one per stream and [`reset`] it when
/// reusing it for a fresh stream.
///
/// Concatenating the content of every emitted segment plus
/// [`pending`](Self::pending) always reproduces the input exactly.
///
/// [`reset`]: ChunkParser::reset
#[derive(Debug, Clone, Default)]
pub struct ChunkParser {
    buffer: String,
    inside_thinking: bool,
}

impl ChunkParser {
    /// Create a parser outside any thinking block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the parser is currently inside a thinking block.
    pub fn is_inside_thinking(&self) -> bool {
        self.inside_thinking
    }

    /// Text held back because it may still complete a tag.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn current_format(&self) -> SegmentFormat {
        if self.inside_thinking {
            SegmentFormat::Thinking
        } else {
            SegmentFormat::Plain
        }
    }

    fn push_text(&self, segments: &mut Vec<Segment>, text: &str) {
        if !text.is_empty() {
            segments.push(Segment::text(text, self.current_format()));
        }
    }

    /// Classify a fragment.
    pub fn parse_chunk(&mut self, fragment: &str) -> Vec<Segment> {
        let mut input = std::mem::take(&mut self.buffer);
        input.push_str(fragment);

        let mut segments = Vec::new();
        let bytes = input.as_bytes();
        let mut emitted = 0;
        let mut cursor = 0;

        while let Some(offset) = input[cursor..].find('<') {
            let start = cursor + offset;
            match match_tag(&bytes[start..]) {
                TagMatch::Full { len, opens } => {
                    self.push_text(&mut segments, &input[emitted..start]);
                    segments.push(Segment::tag(&input[start..start + len]));
                    self.inside_thinking = opens;
                    cursor = start + len;
                    emitted = cursor;
                }
                TagMatch::Partial => {
                    self.push_text(&mut segments, &input[emitted..start]);
                    self.buffer = input[start..].to_string();
                    return segments;
                }
                TagMatch::None => cursor = start + 1,
            }
        }

        self.push_text(&mut segments, &input[emitted..]);
        segments
    }

    /// Flush held-back text as ordinary content in the current mode.
    pub fn finalize(&mut self) -> Vec<Segment> {
        let pending = std::mem::take(&mut self.buffer);
        let mut segments = Vec::new();
        self.push_text(&mut segments, &pending);
        segments
    }

    /// Drop held-back text and leave any thinking block.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.inside_thinking = false;
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
