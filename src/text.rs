//! Text helpers for post bodies.
//!
//! Titles are taken from a leading Markdown H1, and listing excerpts are cut
//! to two 80-character lines on word boundaries.

/// Maximum characters per excerpt line.
const LINE_LENGTH: usize = 80;

/// Inputs at least this long get an ellipsis.
const TWO_LINES: usize = 160;

/// Where long inputs are cut before wrapping, leaving room for "...".
const EXCERPT_CUT: usize = 158;

/// Split a post into `(title, body)`.
///
/// When the text starts with `"# "` and contains a newline, the first line
/// (without the marker) is the title and the rest, with leading whitespace
/// removed, is the body. Otherwise the title is empty and the body is the
/// whole text.
pub fn extract_title(content: &str) -> (String, String) {
    if let Some(rest) = content.strip_prefix("# ") {
        if let Some(eol) = rest.find('\n') {
            let title = rest[..eol].trim_end_matches('\r');
            let body = rest[eol..].trim_start_matches([' ', '\t', '\n', '\r']);
            return (title.to_string(), body.to_string());
        }
    }
    (String::new(), content.to_string())
}

/// Build a preview of at most two lines of 80 characters.
///
/// Counts code points, never bytes, so multi-byte text is never split inside
/// a character.
pub fn excerpt(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= LINE_LENGTH {
        return input.to_string();
    }

    let (source, ellipsis) = if chars.len() < TWO_LINES {
        (&chars[..], "")
    } else {
        (&chars[..EXCERPT_CUT], "...")
    };

    let (first, idx) = trim_to_length(source, LINE_LENGTH);
    let idx = idx.unwrap_or(first.chars().count());
    let (second, _) = trim_to_length(&source[idx..], LINE_LENGTH);

    format!("{}\n{}{}", first, second, ellipsis)
}

/// Trim `chars` to at most `limit` code points, preferring the last space at
/// or before `limit`.
///
/// Returns the kept text and the index of the space it broke on. With no
/// space to break on, the text is cut hard at `limit` and no index is
/// returned.
fn trim_to_length(chars: &[char], limit: usize) -> (String, Option<usize>) {
    if chars.len() <= limit {
        return (chars.iter().collect(), None);
    }

    match (1..=limit).rev().find(|&i| chars[i] == ' ') {
        Some(space) => (chars[..space].iter().collect(), Some(space)),
        None => (chars[..limit].iter().collect(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(s: &str, limit: usize) -> (String, Option<usize>) {
        let chars: Vec<char> = s.chars().collect();
        trim_to_length(&chars, limit)
    }

    #[test]
    fn test_extract_title_with_heading() {
        let (title, body) = extract_title("# T\nBody");
        assert_eq!(title, "T");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_extract_title_trims_leading_blank_lines() {
        let (title, body) = extract_title("# My post\n\n\n  Hello\nworld");
        assert_eq!(title, "My post");
        assert_eq!(body, "Hello\nworld");
    }

    #[test]
    fn test_extract_title_without_heading() {
        let input = "Just some text\n# not a title";
        let (title, body) = extract_title(input);
        assert!(title.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_extract_title_heading_without_newline() {
        let (title, body) = extract_title("# Only a heading");
        assert!(title.is_empty());
        assert_eq!(body, "# Only a heading");
    }

    #[test]
    fn test_extract_title_crlf() {
        let (title, body) = extract_title("# Windows\r\nBody");
        assert_eq!(title, "Windows");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_trim_to_length() {
        assert_eq!(
            trim("This is a string, let's truncate it.", 12),
            ("This is a".to_string(), Some(9))
        );
        assert_eq!(
            trim("Some other string.", 18),
            ("Some other string.".to_string(), None)
        );
        assert_eq!(trim("I'm short!", 20), ("I'm short!".to_string(), None));
    }

    #[test]
    fn test_trim_to_length_multibyte() {
        assert_eq!(
            trim("這是一個較長的廣東話。 有許多特性可以確保足夠長的輸出。", 14),
            ("這是一個較長的廣東話。".to_string(), Some(11))
        );
        assert_eq!(
            trim("這是一個簡短的廣東話。", 11),
            ("這是一個簡短的廣東話。".to_string(), None)
        );
        assert_eq!(
            trim("我也很矮！ 有空間。", 20),
            ("我也很矮！ 有空間。".to_string(), None)
        );
    }

    #[test]
    fn test_trim_to_length_without_space_cuts_hard() {
        assert_eq!(trim("abcdefghij", 4), ("abcd".to_string(), None));
    }

    #[test]
    fn test_excerpt_short_input_unchanged() {
        let input = "This is much less than 80 chars";
        assert_eq!(excerpt(input), input);

        let exact = "This will be only 80 chars. Maybe all the way to column 88, that will do it. ---";
        assert_eq!(excerpt(exact), exact);
    }

    #[test]
    fn test_excerpt_two_lines() {
        let input = "This will be more than one line but shorter than two. It should break at the 80th or less character. Let's check it out.";
        assert_eq!(
            excerpt(input),
            "This will be more than one line but shorter than two. It should break at the\n 80th or less character. Let's check it out."
        );
    }

    #[test]
    fn test_excerpt_long_input_gets_ellipsis() {
        let input = "This should be the exact length for two lines. There should ideally be no trailing periods to indicate further text. However trimToLength breaks on word bounds.";
        assert_eq!(
            excerpt(input),
            "This should be the exact length for two lines. There should ideally be no\n trailing periods to indicate further text. However trimToLength breaks on word..."
        );

        let lorem = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Quisque volutpat sagittis aliquet. Ut eu rutrum nisl. Proin molestie ante in dui vulputate dictum. Proin ac bibendum eros. Nulla porta congue tellus, sed vehicula sem bibendum eu. Donec vehicula erat viverra fermentum mattis. Integer volutpat.";
        assert_eq!(
            excerpt(lorem),
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Quisque volutpat\n sagittis aliquet. Ut eu rutrum nisl. Proin molestie ante in dui vulputate..."
        );
    }

    #[test]
    fn test_excerpt_line_shape() {
        let medium = "word ".repeat(25);
        let out = excerpt(medium.trim_end());
        assert_eq!(out.matches('\n').count(), 1);
        assert!(!out.ends_with("..."));
        assert!(out.lines().all(|l| l.chars().count() <= 80));

        let long = "word ".repeat(60);
        let out = excerpt(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn test_excerpt_multibyte_is_char_safe() {
        let input = "字".repeat(200);
        let out = excerpt(&input);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), 80);
        assert!(out.ends_with("..."));
    }
}
