use std::fmt;

/// Represents a token in an expression.
///
/// Tokens borrow from the expression they were lexed from.  Literal tokens keep
/// their source text verbatim (strings include their quotes) so rewrite passes
/// can copy them through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A bare identifier.
    Ident(&'a str),
    /// A sigiled variable (`$name`), stored without the sigil.
    Variable(&'a str),
    /// A quoted string including its delimiters.
    Str(&'a str),
    /// A numeric literal.
    Number(&'a str),
    /// A placeholder token (`##STR0##`).
    Placeholder(&'a str),
    /// A dot operator (`.`)
    Dot,
    /// The member operator (`->`)
    Arrow,
    /// The nullsafe member operator (`?->`)
    NullsafeArrow,
    /// The static access operator (`::`)
    DoubleColon,
    /// The comma operator (`,`)
    Comma,
    /// The colon operator (`:`)
    Colon,
    /// The question mark (`?`)
    Question,
    /// The pipe symbol.
    Pipe,
    /// The assignment operator (`=`)
    Assign,
    /// The array pair operator (`=>`)
    FatArrow,
    /// Open Bracket
    BracketOpen,
    /// Close Bracket
    BracketClose,
    /// Open Parenthesis
    ParenOpen,
    /// Close Parenthesis
    ParenClose,
    /// Open Brace
    BraceOpen,
    /// Close Brace
    BraceClose,
    /// Any other operator (`||`, `==`, `+`, `??`, ...).
    Operator(&'a str),
}

impl<'a> Token<'a> {
    /// Returns the opening token's matching closing token.
    pub fn closing(&self) -> Option<Token<'static>> {
        match self {
            Token::ParenOpen => Some(Token::ParenClose),
            Token::BracketOpen => Some(Token::BracketClose),
            Token::BraceOpen => Some(Token::BraceClose),
            _ => None,
        }
    }

    /// Returns `true` for closing parens, brackets and braces.
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Token::ParenClose | Token::BracketClose | Token::BraceClose
        )
    }

    /// Returns `true` for the member operators `->`, `?->` and `::`.
    pub fn is_member_operator(&self) -> bool {
        matches!(
            self,
            Token::Arrow | Token::NullsafeArrow | Token::DoubleColon
        )
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(_) => f.write_str("identifier"),
            Token::Variable(_) => f.write_str("variable"),
            Token::Str(_) => f.write_str("string"),
            Token::Number(_) => f.write_str("number"),
            Token::Placeholder(_) => f.write_str("placeholder"),
            Token::Dot => f.write_str("`.`"),
            Token::Arrow => f.write_str("`->`"),
            Token::NullsafeArrow => f.write_str("`?->`"),
            Token::DoubleColon => f.write_str("`::`"),
            Token::Comma => f.write_str("`,`"),
            Token::Colon => f.write_str("`:`"),
            Token::Question => f.write_str("`?`"),
            Token::Pipe => f.write_str("`|`"),
            Token::Assign => f.write_str("`=`"),
            Token::FatArrow => f.write_str("`=>`"),
            Token::BracketOpen => f.write_str("`[`"),
            Token::BracketClose => f.write_str("`]`"),
            Token::ParenOpen => f.write_str("`(`"),
            Token::ParenClose => f.write_str("`)`"),
            Token::BraceOpen => f.write_str("`{`"),
            Token::BraceClose => f.write_str("`}`"),
            Token::Operator(op) => write!(f, "`{op}`"),
        }
    }
}

/// Token span information
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub start_offset: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub end_offset: u32,
}

impl Span {
    /// The byte range of the span.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_offset as usize..self.end_offset as usize
    }

    /// Returns `true` if `next` starts exactly where this span ends.
    pub fn touches(&self, next: &Span) -> bool {
        self.end_offset == next.start_offset
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " @ {}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}
