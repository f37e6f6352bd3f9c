use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};

/// Operators longer than one character, longest first.
const MULTI_CHAR_OPERATORS: [&str; 30] = [
    "?->", "===", "!==", "<=>", "...", "**=", "??=", "<<=", ">>=", "->", "::", "=>", "||", "&&",
    "==", "!=", "<>", "<=", ">=", "??", "?:", "++", "--", "+=", "-=", "*=", "/=", ".=", "**",
    "%=",
];

/// Tokenizes a single expression.
///
/// The tokenizer only understands as much of the expression language as the
/// rewrite passes need: identifiers, sigiled variables, string and number
/// literals, placeholders and punctuation.  Everything else becomes an
/// [`Token::Operator`] so unknown syntax passes through untouched.
pub struct Tokenizer<'s> {
    rest: &'s str,
    current_line: u32,
    current_col: u32,
    current_offset: u32,
}

#[cfg(feature = "unicode")]
fn lex_identifier(s: &str) -> usize {
    s.chars()
        .enumerate()
        .map_while(|(idx, c)| {
            let cont = if c == '_' {
                true
            } else if idx == 0 {
                unicode_ident::is_xid_start(c)
            } else {
                unicode_ident::is_xid_continue(c)
            };
            cont.then(|| c.len_utf8())
        })
        .sum::<usize>()
}

#[cfg(not(feature = "unicode"))]
fn lex_identifier(s: &str) -> usize {
    s.as_bytes()
        .iter()
        .enumerate()
        .take_while(|&(idx, &c)| {
            if c == b'_' {
                true
            } else if idx == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric()
            }
        })
        .count()
}

/// Returns the length of a placeholder token (`##TAG<n>##`) at the start of
/// `s`.
pub(crate) fn lex_placeholder(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let rest = some!(bytes.strip_prefix(b"##"));
    let tag_len = rest.iter().take_while(|c| c.is_ascii_uppercase()).count();
    let digits = rest[tag_len..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if tag_len == 0 || digits == 0 {
        return None;
    }
    let end = 2 + tag_len + digits;
    bytes[end..].starts_with(b"##").then_some(end + 2)
}

/// Finds the end of a quoted literal starting at `start`.
///
/// Returns the offset one past the closing quote.  A quote preceded by an odd
/// number of backslashes is escaped and does not terminate the literal.
pub(crate) fn find_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let delim = bytes[start];
    let mut escaped = false;
    for (idx, &c) in bytes.iter().enumerate().skip(start + 1) {
        match (escaped, c) {
            (true, _) => escaped = false,
            (_, b'\\') => escaped = true,
            (_, c) if c == delim => return Some(idx + 1),
            _ => {}
        }
    }
    None
}

impl<'s> Tokenizer<'s> {
    /// Creates a new tokenizer.
    pub fn new(input: &'s str) -> Tokenizer<'s> {
        Tokenizer {
            rest: input,
            current_line: 1,
            current_col: 0,
            current_offset: 0,
        }
    }

    /// Produces the next token from the tokenizer.
    pub fn next_token(&mut self) -> Result<Option<(Token<'s>, Span)>, Error> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Ok(None);
        }
        let old_loc = self.loc();
        let bytes = self.rest.as_bytes();

        let token = match bytes[0] {
            b'\'' | b'"' => return self.eat_string().map(Some),
            b'0'..=b'9' => {
                let len = self.number_len();
                Token::Number(self.advance(len))
            }
            b'$' => match lex_identifier(&self.rest[1..]) {
                0 => Token::Operator(self.advance(1)),
                len => Token::Variable(&self.advance(len + 1)[1..]),
            },
            b'#' => match lex_placeholder(self.rest) {
                Some(len) => Token::Placeholder(self.advance(len)),
                None => Token::Operator(self.advance(1)),
            },
            _ => match lex_identifier(self.rest) {
                0 => self.eat_operator(),
                len => Token::Ident(self.advance(len)),
            },
        };
        Ok(Some((token, self.span(old_loc))))
    }

    fn advance(&mut self, bytes: usize) -> &'s str {
        let (skipped, new_rest) = self.rest.split_at(bytes);
        for c in skipped.chars() {
            match c {
                '\n' => {
                    self.current_line += 1;
                    self.current_col = 0;
                }
                _ => self.current_col += 1,
            }
        }
        self.current_offset += bytes as u32;
        self.rest = new_rest;
        skipped
    }

    #[inline]
    fn loc(&self) -> (u32, u32, u32) {
        (self.current_line, self.current_col, self.current_offset)
    }

    #[inline]
    fn span(&self, (start_line, start_col, start_offset): (u32, u32, u32)) -> Span {
        Span {
            start_line,
            start_col,
            start_offset,
            end_line: self.current_line,
            end_col: self.current_col,
            end_offset: self.current_offset,
        }
    }

    fn skip_whitespace(&mut self) {
        let skipped = self
            .rest
            .chars()
            .map_while(|c| c.is_whitespace().then(|| c.len_utf8()))
            .sum();
        if skipped > 0 {
            self.advance(skipped);
        }
    }

    fn number_len(&self) -> usize {
        #[derive(Copy, Clone)]
        enum State {
            RadixInteger,
            Integer,
            Fraction,
            Exponent,
            ExponentSign,
        }

        let bytes = self.rest.as_bytes();
        let radix = match bytes.get(..2) {
            Some(b"0b" | b"0B") => 2,
            Some(b"0o" | b"0O") => 8,
            Some(b"0x" | b"0X") => 16,
            _ => 10,
        };
        let (mut state, mut len) = if radix == 10 {
            (State::Integer, 0)
        } else {
            (State::RadixInteger, 2)
        };

        while let Some(&c) = bytes.get(len) {
            state = match (c, state) {
                // a dot only continues a number if a digit follows, `items.0.name`
                // is an index followed by a member access.
                (b'.', State::Integer)
                    if bytes.get(len + 1).map_or(false, |c| c.is_ascii_digit()) =>
                {
                    State::Fraction
                }
                (b'E' | b'e', State::Integer | State::Fraction) => State::Exponent,
                (b'+' | b'-', State::Exponent) => State::ExponentSign,
                (b'0'..=b'9', State::Exponent) => State::ExponentSign,
                (b'0'..=b'9', state) => state,
                (b'a'..=b'f' | b'A'..=b'F', State::RadixInteger) if radix == 16 => state,
                (b'_', _) => state,
                _ => break,
            };
            len += 1;
        }
        len
    }

    fn eat_string(&mut self) -> Result<(Token<'s>, Span), Error> {
        let old_loc = self.loc();
        match find_string_end(self.rest.as_bytes(), 0) {
            Some(len) => {
                let s = self.advance(len);
                Ok((Token::Str(s), self.span(old_loc)))
            }
            None => Err(Error::new(
                ErrorKind::UnterminatedString,
                format!("string starting at `{}` is never closed", truncate(self.rest)),
            )
            .with_offset(self.current_offset as usize)),
        }
    }

    fn eat_operator(&mut self) -> Token<'s> {
        for op in MULTI_CHAR_OPERATORS {
            if self.rest.starts_with(op) {
                let op = self.advance(op.len());
                return match op {
                    "?->" => Token::NullsafeArrow,
                    "->" => Token::Arrow,
                    "::" => Token::DoubleColon,
                    "=>" => Token::FatArrow,
                    op => Token::Operator(op),
                };
            }
        }
        let c = self.rest.chars().next().map_or(1, |c| c.len_utf8());
        match self.advance(c) {
            "." => Token::Dot,
            "," => Token::Comma,
            ":" => Token::Colon,
            "?" => Token::Question,
            "|" => Token::Pipe,
            "=" => Token::Assign,
            "(" => Token::ParenOpen,
            ")" => Token::ParenClose,
            "[" => Token::BracketOpen,
            "]" => Token::BracketClose,
            "{" => Token::BraceOpen,
            "}" => Token::BraceClose,
            op => Token::Operator(op),
        }
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(16) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Utility function to quickly tokenize into an iterator.
pub fn tokenize(input: &str) -> impl Iterator<Item = Result<(Token<'_>, Span), Error>> {
    let mut tokenizer = Tokenizer::new(input);
    std::iter::from_fn(move || tokenizer.next_token().transpose())
}

/// Tokenizes a whole expression.
pub(crate) fn tokenize_all(input: &str) -> Result<Vec<(Token<'_>, Span)>, Error> {
    tokenize(input).collect()
}
