//! Incremental rendering of a streaming reply.
//!
//! While a reply grows by strict appends, only the last logical line (the
//! text after the final `\n`) can change its wrapping, so everything before
//! it is kept and only the tail is re-wrapped. Any other change falls back
//! to a full render. The output always equals `wrap_text` of the whole
//! content with the given style.

use super::wrap::wrap_line_into;
use ratatui::style::Style;
use ratatui::text::Line;

/// How the last render was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDelta {
    /// Everything was re-wrapped.
    Full,
    /// Lines before `first_dirty_line` were kept from the previous render.
    Append {
        /// Index of the first line that may differ from the previous render.
        first_dirty_line: usize,
    },
}

/// Delta renderer for one streaming reply.
#[derive(Debug, Clone, Default)]
pub struct IncrementalRenderer {
    content: String,
    width: usize,
    style: Style,
    lines: Vec<Line<'static>>,
    /// Lines produced by logical lines that ended in `\n`.
    committed_lines: usize,
    /// Byte offset just past the last `\n` of `content`.
    committed_bytes: usize,
}

impl IncrementalRenderer {
    /// Create a renderer with no prior output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `content` at `width`, reusing prior work on strict appends.
    pub fn render(
        &mut self,
        content: &str,
        width: usize,
        style: Style,
    ) -> (&[Line<'static>], RenderDelta) {
        let appendable = !self.content.is_empty()
            && content.starts_with(self.content.as_str())
            && width == self.width
            && style == self.style;

        let delta = if appendable {
            let first_dirty_line = self.committed_lines;
            self.lines.truncate(first_dirty_line);
            RenderDelta::Append { first_dirty_line }
        } else {
            self.reset();
            self.width = width;
            self.style = style;
            RenderDelta::Full
        };

        if width > 0 && !content.is_empty() {
            self.wrap_tail(content);
        }
        self.content.clear();
        self.content.push_str(content);
        (self.lines.as_slice(), delta)
    }

    /// Lines of the last render.
    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Forget all prior output. The next render is full.
    pub fn reset(&mut self) {
        self.content.clear();
        self.lines.clear();
        self.committed_lines = 0;
        self.committed_bytes = 0;
    }

    fn wrap_tail(&mut self, content: &str) {
        let tail = &content[self.committed_bytes..];
        let mut wrapped = Vec::new();
        let mut pieces = tail.split('\n').peekable();
        let mut offset = self.committed_bytes;

        while let Some(piece) = pieces.next() {
            wrap_line_into(piece, self.width, &mut wrapped);
            if pieces.peek().is_some() {
                offset += piece.len() + 1;
                self.committed_bytes = offset;
                self.committed_lines = self.lines.len() + wrapped.len();
            }
        }
        self.lines
            .extend(wrapped.into_iter().map(|l| Line::styled(l, self.style)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::{line_to_string, wrap_text};
    use ratatui::style::Color;

    fn full(content: &str, width: usize) -> Vec<String> {
        wrap_text(content, width)
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_to_string).collect()
    }

    #[test]
    fn first_render_is_full() {
        let mut renderer = IncrementalRenderer::new();
        let (lines, delta) = renderer.render("hello", 10, Style::default());
        assert_eq!(delta, RenderDelta::Full);
        assert_eq!(texts(lines), vec!["hello"]);
    }

    #[test]
    fn append_reuses_committed_lines() {
        let mut renderer = IncrementalRenderer::new();
        renderer.render("line one\nline two\npar", 20, Style::default());
        let (lines, delta) =
            renderer.render("line one\nline two\npartial", 20, Style::default());
        assert_eq!(delta, RenderDelta::Append { first_dirty_line: 2 });
        assert_eq!(texts(lines), full("line one\nline two\npartial", 20));
    }

    #[test]
    fn append_matches_full_render_when_wrapping_shifts() {
        let mut renderer = IncrementalRenderer::new();
        let mut content = String::new();
        for word in "the quick brown fox jumps over the lazy dog".split(' ') {
            content.push_str(word);
            content.push(' ');
            let (lines, _) = renderer.render(&content, 9, Style::default());
            assert_eq!(texts(lines), full(&content, 9));
        }
    }

    #[test]
    fn newline_at_end_commits_line() {
        let mut renderer = IncrementalRenderer::new();
        renderer.render("abc\n", 10, Style::default());
        let (lines, delta) = renderer.render("abc\ndef", 10, Style::default());
        assert_eq!(delta, RenderDelta::Append { first_dirty_line: 1 });
        assert_eq!(texts(lines), vec!["abc", "def"]);
    }

    #[test]
    fn edit_forces_full_render() {
        let mut renderer = IncrementalRenderer::new();
        renderer.render("hello world", 20, Style::default());
        let (lines, delta) = renderer.render("hello there", 20, Style::default());
        assert_eq!(delta, RenderDelta::Full);
        assert_eq!(texts(lines), vec!["hello there"]);
    }

    #[test]
    fn width_or_style_change_forces_full_render() {
        let mut renderer = IncrementalRenderer::new();
        renderer.render("hello world", 20, Style::default());
        let (_, delta) = renderer.render("hello world!", 5, Style::default());
        assert_eq!(delta, RenderDelta::Full);

        let red = Style::default().fg(Color::Red);
        let (lines, delta) = renderer.render("hello world!!", 5, red);
        assert_eq!(delta, RenderDelta::Full);
        assert!(lines.iter().all(|l| l.style == red));
    }

    #[test]
    fn reset_forces_full_render() {
        let mut renderer = IncrementalRenderer::new();
        renderer.render("abc", 10, Style::default());
        renderer.reset();
        assert!(renderer.lines().is_empty());
        let (_, delta) = renderer.render("abcd", 10, Style::default());
        assert_eq!(delta, RenderDelta::Full);
    }

    #[test]
    fn empty_content_renders_nothing() {
        let mut renderer = IncrementalRenderer::new();
        let (lines, delta) = renderer.render("", 10, Style::default());
        assert!(lines.is_empty());
        assert_eq!(delta, RenderDelta::Full);
    }
}
