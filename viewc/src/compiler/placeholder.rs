//! Opaque token substitution.
//!
//! Rewrite passes mask parts of an expression they must not touch (string
//! literals and references that are already compiled) with
//! placeholder tokens and put the original text back when they are done.
use std::fmt;

/// The tag a placeholder token is minted for.
///
/// The tag becomes part of the token (`##STR0##`), which keeps tokens of
/// different passes visually apart when debugging a rewrite.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// A quoted string literal.
    Str,
    /// A variable reference that is already in compiled form.
    Var,
}

impl PlaceholderKind {
    fn tag(self) -> &'static str {
        match self {
            PlaceholderKind::Str => "STR",
            PlaceholderKind::Var => "VAR",
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Maps placeholder tokens to the text they stand in for.
///
/// Tokens have the form `##<TAG><index>##`.  The index is monotonic for the
/// lifetime of the manager (until [`reset`](Self::reset)), and because the
/// trailing `##` follows the index directly no token is a substring of another
/// one.  A manager belongs to one compilation call; nothing is shared between
/// calls.
#[derive(Debug, Default)]
pub struct PlaceholderManager {
    entries: Vec<(String, String)>,
    next_index: usize,
}

impl PlaceholderManager {
    /// Creates an empty manager.
    pub fn new() -> PlaceholderManager {
        PlaceholderManager::default()
    }

    /// Replaces the first occurrence of `substring` in `buffer` with a fresh
    /// token.
    ///
    /// If `substring` does not occur the buffer is returned unchanged; the
    /// index is consumed nonetheless.
    pub fn protect(&mut self, buffer: &str, substring: &str, kind: PlaceholderKind) -> String {
        let token = self.mint(kind, substring);
        match buffer.find(substring) {
            Some(idx) if !substring.is_empty() => {
                let mut rv = String::with_capacity(buffer.len() + token.len());
                rv.push_str(&buffer[..idx]);
                rv.push_str(&token);
                rv.push_str(&buffer[idx + substring.len()..]);
                rv
            }
            _ => buffer.to_string(),
        }
    }

    /// Records `original` under a fresh token and returns the token.
    ///
    /// The caller is responsible for putting the token into its buffer.
    pub fn mint(&mut self, kind: PlaceholderKind, original: &str) -> String {
        let token = format!("##{}{}##", kind, self.next_index);
        self.next_index += 1;
        self.entries.push((token.clone(), original.to_string()));
        token
    }

    /// Replaces every recorded token in `buffer` with its original text.
    pub fn restore(&self, buffer: &str) -> String {
        self.restore_since(buffer, 0)
    }

    /// Restores only the tokens minted after `mark` (see [`mark`](Self::mark)).
    ///
    /// Tokens are restored newest first.  A token minted later may stand in
    /// for text that itself contains older tokens (a masked reference whose
    /// index holds a masked string), and those older tokens have to be visible
    /// by the time their own turn comes.
    pub fn restore_since(&self, buffer: &str, mark: usize) -> String {
        let mut rv = buffer.to_string();
        for (token, original) in self.entries[mark.min(self.entries.len())..].iter().rev() {
            if rv.contains(token.as_str()) {
                rv = rv.replace(token.as_str(), original);
            }
        }
        rv
    }

    /// Returns a mark for [`restore_since`](Self::restore_since).
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Looks up the original text of a token.
    pub fn original(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, original)| original.as_str())
    }

    /// Clears all mappings and the index counter.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_index = 0;
    }

    /// Returns the number of recorded tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no token is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_protect_first_occurrence() {
        let mut pm = PlaceholderManager::new();
        let rv = pm.protect("a + b + a", "a", PlaceholderKind::Var);
        assert_eq!(rv, "##VAR0## + b + a");
        assert_eq!(pm.restore(&rv), "a + b + a");
    }

    #[test]
    fn test_missing_substring_consumes_index() {
        let mut pm = PlaceholderManager::new();
        assert_eq!(pm.protect("abc", "x", PlaceholderKind::Str), "abc");
        let rv = pm.protect("abc", "b", PlaceholderKind::Str);
        assert_eq!(rv, "a##STR1##c");
    }

    #[test]
    fn test_round_trip() {
        let buffers = [
            ("'a' ~ 'b'", "'b'"),
            ("user.name|upper", "user.name"),
            ("x", "x"),
            ("no match here", "zzz"),
        ];
        for (buffer, substring) in buffers {
            let mut pm = PlaceholderManager::new();
            let protected = pm.protect(buffer, substring, PlaceholderKind::Str);
            assert_eq!(pm.restore(&protected), buffer);
        }
    }

    #[test]
    fn test_tokens_are_not_substrings() {
        let mut pm = PlaceholderManager::new();
        let tokens: Vec<_> = (0..12)
            .map(|idx| pm.mint(PlaceholderKind::Str, &idx.to_string()))
            .collect();
        for a in &tokens {
            for b in &tokens {
                if a != b {
                    assert!(!b.contains(a.as_str()), "{a} in {b}");
                }
            }
        }
    }

    #[test]
    fn test_nested_restore() {
        let mut pm = PlaceholderManager::new();
        let s = pm.mint(PlaceholderKind::Str, "'k'");
        let v = pm.mint(PlaceholderKind::Var, &format!("$map[{s}]"));
        assert_eq!(pm.restore(&format!("{v} ?? 1")), "$map['k'] ?? 1");
    }

    #[test]
    fn test_restore_since() {
        let mut pm = PlaceholderManager::new();
        let outer = pm.mint(PlaceholderKind::Str, "'outer'");
        let mark = pm.mark();
        let inner = pm.mint(PlaceholderKind::Str, "'inner'");
        let buffer = format!("{outer} {inner}");
        assert_eq!(pm.restore_since(&buffer, mark), format!("{outer} 'inner'"));
        assert_eq!(pm.original(&outer), Some("'outer'"));
    }

    #[test]
    fn test_reset() {
        let mut pm = PlaceholderManager::new();
        pm.mint(PlaceholderKind::Var, "$x");
        pm.reset();
        assert!(pm.is_empty());
        assert_eq!(pm.mint(PlaceholderKind::Var, "$y"), "##VAR0##");
    }
}
