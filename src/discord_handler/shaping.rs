//! Message shape decisions: code block or title, splitting and clipping.
//!
//! Lengths are measured in `char`s, which is how Discord counts its message
//! limits.

use std::borrow::Cow;

/// Hard limit Discord applies to the `content` field of a message.
pub const DISCORD_CONTENT_LIMIT: usize = 2000;
/// Default clip length, leaving room for fences and emoji under the limit.
pub const DEFAULT_MAX_CONTENT_LEN: usize = 1900;

const ELLIPSIS: &str = "...";

/// Decide whether `message` needs a monospace code block.
///
/// Multi-line text always does. Single lines only when they are longer than
/// `wrap_threshold`.
pub fn should_format_as_code_block(message: &str, wrap_threshold: usize) -> bool {
    message.contains('\n') || char_len(message) > wrap_threshold
}

/// Split `message` on every occurrence of `break_char`.
///
/// Without a break token the message is returned whole. Empty fragments
/// between consecutive tokens are kept.
pub fn split_by_break_character<'a>(message: &'a str, break_char: Option<&str>) -> Vec<&'a str> {
    match break_char {
        Some(token) if !token.is_empty() => message.split(token).collect(),
        _ => vec![message],
    }
}

/// Make sure `content` fits in a Discord message.
///
/// Content of at most `max_len - 5` chars is returned untouched. Longer
/// content keeps its last `max_len` chars behind a leading `...` when
/// `clip_to_end` is set, or its first `max_len` chars followed by `...`.
pub fn clip_content(content: &str, max_len: usize, clip_to_end: bool) -> Cow<'_, str> {
    let len = char_len(content);
    if len <= max_len.saturating_sub(5) {
        return Cow::Borrowed(content);
    }
    if clip_to_end {
        let start = byte_offset(content, len.saturating_sub(max_len));
        Cow::Owned(format!("{ELLIPSIS}{}", &content[start..]))
    } else {
        let end = byte_offset(content, max_len);
        Cow::Owned(format!("{}{ELLIPSIS}", &content[..end]))
    }
}

/// Length in chars of the longest `\n`-separated line.
pub fn max_line_length(message: &str) -> usize {
    message.split('\n').map(char_len).max().unwrap_or(0)
}

/// Split off the first line. The remainder is empty for single-line text.
pub fn split_first_line(message: &str) -> (&str, &str) {
    message.split_once('\n').unwrap_or((message, ""))
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `n`th char, or the end of the string.
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Short info message", 60, false)]
    #[case("exactly ten", 11, false)]
    #[case("exactly ten", 10, true)]
    #[case("two\nlines", 60, true)]
    #[case("\n", 60, true)]
    #[case("", 60, false)]
    fn classifies_messages(#[case] message: &str, #[case] threshold: usize, #[case] code: bool) {
        assert_eq!(should_format_as_code_block(message, threshold), code);
    }

    #[test]
    fn classification_counts_chars_not_bytes() {
        let message = "€".repeat(10);
        assert!(!should_format_as_code_block(&message, 10));
        assert!(should_format_as_code_block(&message, 9));
    }

    #[rstest]
    #[case("A…B…C", Some("…"), vec!["A", "B", "C"])]
    #[case("A", None, vec!["A"])]
    #[case("A…B", None, vec!["A…B"])]
    #[case("A……B", Some("…"), vec!["A", "", "B"])]
    #[case("…A…", Some("…"), vec!["", "A", ""])]
    #[case("Message 1 … Message 2", Some("…"), vec!["Message 1 ", " Message 2"])]
    fn splits_on_break_character(
        #[case] message: &str,
        #[case] break_char: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(split_by_break_character(message, break_char), expected);
    }

    #[test]
    fn clip_keeps_tail_by_default() {
        let content: String = ('a'..='z').cycle().take(30).collect();
        let clipped = clip_content(&content, 20, true);
        assert_eq!(clipped, format!("...{}", &content[10..]));
    }

    #[test]
    fn clip_to_start_keeps_head() {
        let content = "x".repeat(30);
        let clipped = clip_content(&content, 20, false);
        assert_eq!(clipped, format!("{}...", "x".repeat(20)));
    }

    #[test]
    fn clip_applies_five_char_margin() {
        // 1896 chars exceeds 1900 - 5, so even though it is shorter than
        // max_len it is marked as clipped.
        let content = "y".repeat(1896);
        let clipped = clip_content(&content, DEFAULT_MAX_CONTENT_LEN, true);
        assert_eq!(clipped, format!("...{content}"));

        let fits = "y".repeat(1895);
        assert!(matches!(
            clip_content(&fits, DEFAULT_MAX_CONTENT_LEN, true),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn clip_respects_multibyte_boundaries() {
        let content = "é".repeat(40);
        let clipped = clip_content(&content, 20, true);
        assert_eq!(clipped, format!("...{}", "é".repeat(20)));
    }

    #[test]
    fn line_helpers() {
        assert_eq!(max_line_length("ab\nabcd\n"), 4);
        assert_eq!(max_line_length(""), 0);
        assert_eq!(split_first_line("title\nrest\nmore"), ("title", "rest\nmore"));
        assert_eq!(split_first_line("only"), ("only", ""));
    }

    proptest! {
        #[test]
        fn single_short_lines_are_not_code(message in "[^\n]{0,60}") {
            prop_assert!(!should_format_as_code_block(&message, 60));
        }

        #[test]
        fn single_long_lines_are_code(message in "[^\n]{61,200}") {
            prop_assert!(should_format_as_code_block(&message, 60));
        }

        #[test]
        fn multi_line_is_always_code(
            head in "[^\n]{0,20}",
            tail in "[^\n]{0,20}",
            threshold in 0usize..500,
        ) {
            let message = format!("{head}\n{tail}");
            prop_assert!(should_format_as_code_block(&message, threshold));
        }

        #[test]
        fn clip_to_end_keeps_final_chars(content in ".{0,120}", max_len in 6usize..60) {
            let clipped = clip_content(&content, max_len, true);
            let len = char_len(&content);
            if len <= max_len - 5 {
                prop_assert_eq!(clipped.as_ref(), content.as_str());
            } else {
                let tail: String = content.chars().skip(len.saturating_sub(max_len)).collect();
                prop_assert!(clipped.starts_with(ELLIPSIS));
                prop_assert!(clipped.ends_with(tail.as_str()));
                prop_assert_eq!(char_len(&clipped), char_len(&tail) + 3);
            }
        }
    }
}
