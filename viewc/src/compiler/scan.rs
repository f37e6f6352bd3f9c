//! Depth-aware scanning over template text and token streams.
use std::ops::Range;

use crate::compiler::lexer::find_string_end;
use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};

/// Finds the end delimiter of a region whose body starts at `from`.
///
/// Parens, brackets and braces nest and quoted strings are skipped, so a
/// `}}` inside `f('}}')` or `{a: {b: 1}}` does not end the region.  Returns
/// the offset where `close` starts.
pub fn find_region_end(source: &str, from: usize, close: &str) -> Result<usize, Error> {
    let bytes = source.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut pos = from;

    while pos < bytes.len() {
        if stack.is_empty() && bytes[pos..].starts_with(close.as_bytes()) {
            return Ok(pos);
        }
        match bytes[pos] {
            b'\'' | b'"' => match find_string_end(bytes, pos) {
                Some(end) => {
                    pos = end;
                    continue;
                }
                None => {
                    return Err(Error::new(
                        ErrorKind::UnterminatedRegion,
                        "string literal runs to the end of the template",
                    )
                    .with_offset(pos))
                }
            },
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            c @ (b')' | b']' | b'}') => match stack.pop() {
                Some(expected) if expected == c => {}
                Some(expected) => {
                    return Err(Error::new(
                        ErrorKind::UnbalancedDelimiter,
                        format!(
                            "expected `{}` but found `{}`",
                            expected as char, c as char
                        ),
                    )
                    .with_offset(pos))
                }
                None => {
                    return Err(Error::new(
                        ErrorKind::UnbalancedDelimiter,
                        format!("unexpected `{}`", c as char),
                    )
                    .with_offset(pos))
                }
            },
            _ => {}
        }
        pos += 1;
    }

    Err(Error::new(
        ErrorKind::UnterminatedRegion,
        format!("missing `{close}`"),
    )
    .with_offset(from))
}

/// Returns the index of the token closing the group opened at `open`.
pub fn find_matching(tokens: &[(Token<'_>, Span)], open: usize) -> Result<usize, Error> {
    let mut stack = Vec::new();
    for (idx, (token, span)) in tokens.iter().enumerate().skip(open) {
        if let Some(closing) = token.closing() {
            stack.push(closing);
        } else if token.is_closing() {
            match stack.pop() {
                Some(expected) if expected == *token => {
                    if stack.is_empty() {
                        return Ok(idx);
                    }
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::UnbalancedDelimiter,
                        format!("unexpected {token}"),
                    )
                    .with_offset(span.start_offset as usize))
                }
            }
        }
    }
    let offset = tokens.get(open).map_or(0, |x| x.1.start_offset as usize);
    Err(Error::new(ErrorKind::UnbalancedDelimiter, "group is never closed").with_offset(offset))
}

/// Splits a token stream at tokens matching `is_separator` that are not
/// nested in a group.  Returns the token index ranges between separators.
pub fn split_top_level<F>(tokens: &[(Token<'_>, Span)], is_separator: F) -> Vec<Range<usize>>
where
    F: Fn(&Token<'_>) -> bool,
{
    let mut rv = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, (token, _)) in tokens.iter().enumerate() {
        if token.closing().is_some() {
            depth += 1;
        } else if token.is_closing() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_separator(token) {
            rv.push(start..idx);
            start = idx + 1;
        }
    }
    rv.push(start..tokens.len());
    rv
}

/// The source text covered by a range of tokens.
pub fn text_of<'s>(source: &'s str, tokens: &[(Token<'_>, Span)], range: Range<usize>) -> &'s str {
    if range.is_empty() {
        return "";
    }
    let start = tokens[range.start].1.start_offset as usize;
    let end = tokens[range.end - 1].1.end_offset as usize;
    &source[start..end]
}

/// Builds a new string from a source by replacing ordered byte ranges.
pub struct Splicer<'s> {
    source: &'s str,
    out: String,
    pos: usize,
}

impl<'s> Splicer<'s> {
    /// Starts splicing `source`.
    pub fn new(source: &'s str) -> Splicer<'s> {
        Splicer {
            source,
            out: String::with_capacity(source.len()),
            pos: 0,
        }
    }

    /// Replaces `range` with `with`.  Ranges must come in source order.
    pub fn replace(&mut self, range: Range<usize>, with: &str) {
        debug_assert!(range.start >= self.pos);
        self.out.push_str(&self.source[self.pos..range.start]);
        self.out.push_str(with);
        self.pos = range.end;
    }

    /// Inserts `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset..offset, text);
    }

    /// Copies the rest of the source and returns the result.
    pub fn finish(mut self) -> String {
        self.out.push_str(&self.source[self.pos..]);
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize_all;

    use similar_asserts::assert_eq;

    #[test]
    fn test_region_end() {
        let s = "{{ name }} rest";
        assert_eq!(find_region_end(s, 2, "}}"), Ok(8));
        let s = "{{ f('}}') }}";
        assert_eq!(find_region_end(s, 2, "}}"), Ok(11));
        let s = "{{ [1, {a: 2}] }}";
        assert_eq!(find_region_end(s, 2, "}}"), Ok(15));
    }

    #[test]
    fn test_region_errors() {
        let err = find_region_end("{{ 'abc }} x", 2, "}}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnterminatedRegion);
        let err = find_region_end("{{ f( }} {{ x }}", 2, "}}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnbalancedDelimiter);
        let err = find_region_end("{{ name", 2, "}}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnterminatedRegion);
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn test_find_matching() {
        let tokens = tokenize_all("f(a, [b], (c)) + 1").unwrap();
        assert_eq!(find_matching(&tokens, 1), Ok(11));
        let tokens = tokenize_all("f(a]").unwrap();
        assert_eq!(
            find_matching(&tokens, 1).unwrap_err().kind(),
            ErrorKind::UnbalancedDelimiter
        );
    }

    #[test]
    fn test_split_top_level() {
        let src = "a|f(b|c)|g";
        let tokens = tokenize_all(src).unwrap();
        let parts: Vec<_> = split_top_level(&tokens, |t| *t == Token::Pipe)
            .into_iter()
            .map(|r| text_of(src, &tokens, r))
            .collect();
        assert_eq!(parts, ["a", "f(b|c)", "g"]);
    }

    #[test]
    fn test_splicer() {
        let mut s = Splicer::new("a.b + c");
        s.replace(1..2, "->");
        s.insert(3, "()");
        s.replace(6..7, "$c");
        assert_eq!(s.finish(), "a->b() + $c");
    }
}
