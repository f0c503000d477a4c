//! Class attribute tokens
//!
//! The class attribute is treated as the sequence produced by splitting on
//! runs of whitespace, without trimming first. That makes `""` one empty
//! token and `" hello"` the tokens `["", "hello"]`, which is what existing
//! callers observe, so it is kept exactly.
//!
//! Separators are the characters a `\s` regex class matches: Unicode
//! `White_Space` minus U+0085 (NEL), plus U+FEFF (BOM).
//!
//! The `with_*` helpers return `None` when the attribute would not change,
//! letting callers skip the write entirely.

fn is_separator(c: char) -> bool {
    match c {
        '\u{85}' => false,
        '\u{feff}' => true,
        c => c.is_whitespace(),
    }
}

/// Split on whitespace runs. Leading/trailing runs yield an empty token.
pub fn tokens(class_name: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_whitespace = false;

    for (i, c) in class_name.char_indices() {
        if is_separator(c) {
            if !in_whitespace {
                out.push(&class_name[start..i]);
                in_whitespace = true;
            }
        } else if in_whitespace {
            start = i;
            in_whitespace = false;
        }
    }

    if in_whitespace {
        out.push("");
    } else {
        out.push(&class_name[start..]);
    }
    out
}

/// Exact token match
pub fn contains(class_name: &str, token: &str) -> bool {
    tokens(class_name).contains(&token)
}

/// Append `" " + token` unless already present.
///
/// The separator is always written, so adding to an empty attribute gives
/// `" token"`.
pub fn with_added(class_name: &str, token: &str) -> Option<String> {
    if contains(class_name, token) {
        return None;
    }
    Some(format!("{} {}", class_name, token))
}

/// Drop the first matching token and rejoin the rest with single spaces
pub fn with_removed(class_name: &str, token: &str) -> Option<String> {
    let mut parts = tokens(class_name);
    let index = parts.iter().position(|&t| t == token)?;
    parts.remove(index);
    Some(parts.join(" "))
}

/// Swap the first `old` token for `new` in place and rejoin with single spaces
pub fn with_replaced(class_name: &str, old: &str, new: &str) -> Option<String> {
    let mut parts = tokens(class_name);
    let index = parts.iter().position(|&t| t == old)?;
    parts[index] = new;
    Some(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_keep_edge_empties() {
        assert_eq!(tokens(""), vec![""]);
        assert_eq!(tokens("a"), vec!["a"]);
        assert_eq!(tokens(" hello"), vec!["", "hello"]);
        assert_eq!(tokens("a  \t b "), vec!["a", "b", ""]);
        assert_eq!(tokens("  "), vec!["", ""]);
    }

    #[test]
    fn test_tokens_separator_set() {
        assert_eq!(tokens("a\u{a0}b\u{3000}c"), vec!["a", "b", "c"]);
        assert_eq!(tokens("a\u{feff}b"), vec!["a", "b"]);
        // NEL is part of the token
        assert_eq!(tokens("a\u{85}b"), vec!["a\u{85}b"]);
    }

    #[test]
    fn test_contains() {
        assert!(!contains("", "test"));
        assert!(!contains("test", "hello"));
        assert!(contains("test", "test"));
        assert!(contains(" hello world", "world"));
        assert!(!contains("hello-world", "hello"));
    }

    #[test]
    fn test_with_added() {
        assert_eq!(with_added("", "hello").as_deref(), Some(" hello"));
        assert_eq!(with_added(" hello", "world").as_deref(), Some(" hello world"));
        assert_eq!(with_added(" hello", "hello"), None);
    }

    #[test]
    fn test_with_removed() {
        assert_eq!(with_removed("world", "hello"), None);
        assert_eq!(with_removed("world", "world").as_deref(), Some(""));
        assert_eq!(with_removed("hello world", "world").as_deref(), Some("hello"));
        // Remaining tokens are rejoined, normalizing interior whitespace
        assert_eq!(with_removed("a   b\tc", "b").as_deref(), Some("a c"));
        // Only the first duplicate goes
        assert_eq!(with_removed("x y x", "x").as_deref(), Some("y x"));
    }

    #[test]
    fn test_with_replaced() {
        assert_eq!(with_replaced("world", "hello", "world"), None);
        assert_eq!(
            with_replaced("hello world", "world", "moon").as_deref(),
            Some("hello moon")
        );
        assert_eq!(
            with_replaced("a  b  c", "b", "z").as_deref(),
            Some("a z c")
        );
    }
}
