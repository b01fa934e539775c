//! Word wrapping by display width.
//!
//! Each logical line (split on `\n`) wraps independently, so the wrapped
//! form of `a\nb` is always `wrap(a)` followed by `wrap(b)`. The
//! incremental renderer relies on this.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap `text` to `width` display columns.
///
/// Empty text or zero width yields no lines. An empty logical line yields
/// one empty line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for logical in text.split('\n') {
        wrap_line_into(logical, width, &mut lines);
    }
    lines
}

/// Wrap one logical line (must not contain `\n`) and append the result.
pub(crate) fn wrap_line_into(line: &str, width: usize, out: &mut Vec<String>) {
    if line.is_empty() {
        out.push(String::new());
        return;
    }

    let mut rest = line;
    while !rest.is_empty() {
        if rest.width() <= width {
            out.push(rest.to_string());
            return;
        }

        // Byte offset just past the widest prefix that fits; at least one char.
        let mut fit = 0;
        let mut used = 0;
        for (idx, ch) in rest.char_indices() {
            let w = ch.width().unwrap_or(0);
            if used + w > width && fit > 0 {
                break;
            }
            used += w;
            fit = idx + ch.len_utf8();
        }

        // Break at the last space inside the fitting prefix, unless it is the
        // very first character.
        let split = match rest[..fit].rfind(' ') {
            Some(pos) if pos > 0 => pos,
            _ => fit,
        };
        out.push(rest[..split].to_string());
        rest = rest[split..].trim_start_matches(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_or_zero_width_yields_nothing() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("hello", 0).is_empty());
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("hello", 10), vec!["hello"]);
    }

    #[test]
    fn breaks_at_last_space_within_width() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn hard_breaks_long_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn newlines_start_new_lines_and_keep_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("a\n", 10), vec!["a", ""]);
    }

    #[test]
    fn wide_characters_count_two_columns() {
        assert_eq!(wrap_text("世界世界", 4), vec!["世界", "世界"]);
    }

    #[test]
    fn char_wider_than_width_still_progresses() {
        assert_eq!(wrap_text("世a", 1), vec!["世", "a"]);
    }

    #[test]
    fn trailing_spaces_after_break_are_dropped() {
        assert_eq!(wrap_text("abc   ", 3), vec!["abc"]);
    }

    #[test]
    fn leading_space_is_not_a_break_point() {
        assert_eq!(wrap_text(" abcdef", 3), vec![" ab", "cde", "f"]);
    }

    #[test]
    fn logical_lines_wrap_independently() {
        let a = "alpha beta gamma";
        let b = "delta epsilon";
        let mut expected = wrap_text(a, 7);
        expected.extend(wrap_text(b, 7));
        assert_eq!(wrap_text(&format!("{a}\n{b}"), 7), expected);
    }
}
