//! Plain-text helpers over chapter and document bodies
//!
//! All offsets handed out or accepted here are byte offsets into the original
//! string and always fall on `char` boundaries.

/// Marker appended to text that was cut short
pub const ELLIPSIS: char = '…';

/// Split text into paragraphs: non-blank lines, trimmed
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Longest prefix of `text` holding at most `max_chars` characters
///
/// The flag reports whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => (&text[..index], true),
        None => (text, false),
    }
}

/// Like [`truncate_chars`], appending [`ELLIPSIS`] when cut
pub fn clip(text: &str, max_chars: usize) -> String {
    let (head, truncated) = truncate_chars(text, max_chars);
    let mut clipped = head.to_owned();
    if truncated {
        clipped.push(ELLIPSIS);
    }
    clipped
}

/// Excerpt around the match at `start..end` with up to `context_chars`
/// characters on each side
///
/// Line breaks are flattened to spaces; cut ends are marked with [`ELLIPSIS`].
pub fn snippet(text: &str, start: usize, end: usize, context_chars: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(context_chars)
        .last()
        .map_or(start, |(index, _)| index);
    let to = text[end..]
        .char_indices()
        .nth(context_chars)
        .map_or(text.len(), |(index, _)| end + index);

    let mut excerpt = String::with_capacity(to - from + 8);
    if from > 0 {
        excerpt.push(ELLIPSIS);
    }
    excerpt.extend(text[from..to].chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
    if to < text.len() {
        excerpt.push(ELLIPSIS);
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_skip_blank_lines() {
        let text = "First line.\n\n   \n  Second line.  \nThird.";
        assert_eq!(paragraphs(text), ["First line.", "Second line.", "Third."]);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let (head, cut) = truncate_chars("héllo wörld", 4);
        assert_eq!(head, "héll");
        assert!(cut);

        let (head, cut) = truncate_chars("short", 10);
        assert_eq!(head, "short");
        assert!(!cut);
    }

    #[test]
    fn clip_marks_cut_text() {
        assert_eq!(clip("abcdef", 3), "abc…");
        assert_eq!(clip("abc", 3), "abc");
    }

    #[test]
    fn snippet_includes_context_on_both_sides() {
        let text = "The lighthouse keeper watched the storm roll in.";
        let start = text.find("storm").unwrap();
        let excerpt = snippet(text, start, start + "storm".len(), 8);
        assert_eq!(excerpt, "…hed the storm roll in…");
    }

    #[test]
    fn snippet_without_cuts_has_no_ellipsis() {
        let text = "a storm\ncame";
        let start = text.find("storm").unwrap();
        assert_eq!(snippet(text, start, start + 5, 50), "a storm came");
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one two\n\nthree  "), 3);
    }
}
