use std::borrow::Cow;
use std::fmt;

/// Represents compile errors.
///
/// Errors are produced by the region scanners and the expression rewrite
/// passes.  Whether an error aborts compilation depends on the configured
/// [`ErrorPolicy`](crate::ErrorPolicy): in strict mode the first error is
/// returned, in lenient mode the failing region is left unrewritten and the
/// error is only logged.
///
/// If debug mode is enabled a template error carries the template source which
/// is rendered as an excerpt when the error is formatted with the alternative
/// formatting (``format!("{:#}", err)``).
///
/// # Example
///
/// ```rust
/// # use viewc::{Compiler, ErrorPolicy};
/// let mut compiler = Compiler::new();
/// compiler.set_policy(ErrorPolicy::Strict);
/// match compiler.compile_template("hello.html", "Hello {{ 'name }}!") {
///     Ok(result) => println!("{}", result),
///     Err(err) => {
///         eprintln!("Could not compile template:");
///         eprintln!("  {:#}", err);
///     }
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    name: Option<String>,
    lineno: usize,
    offset: Option<usize>,
    #[cfg(feature = "debug")]
    template_source: Option<String>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("name", &self.name)
            .field("lineno", &self.lineno)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A `{{` or `{%` region (or a comment) never reached its end delimiter.
    UnterminatedRegion,
    /// A quoted literal inside an expression is not closed.
    UnterminatedString,
    /// A closing paren, bracket or brace does not match its opener.
    UnbalancedDelimiter,
    /// A member access could not be classified as property or method.
    AmbiguousMember,
    /// A nested rewrite exceeded the nesting limit.
    NonConvergent,
    /// A pipe segment is not of the form `name` or `name(args)`.
    InvalidFilter,
    /// A control tag or assignment has the wrong shape.
    InvalidSyntax,
    /// A control tag that is neither a keyword form nor a call.
    UnknownTag,
    /// The configured delimiters are not usable.
    InvalidDelimiter,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::UnterminatedRegion => "unterminated region",
            ErrorKind::UnterminatedString => "unterminated string literal",
            ErrorKind::UnbalancedDelimiter => "unbalanced delimiter",
            ErrorKind::AmbiguousMember => "ambiguous member access",
            ErrorKind::NonConvergent => "rewrite did not converge",
            ErrorKind::InvalidFilter => "invalid filter",
            ErrorKind::InvalidSyntax => "invalid syntax",
            ErrorKind::UnknownTag => "unknown control tag",
            ErrorKind::InvalidDelimiter => "invalid delimiter configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}: {}", self.kind, detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        if let Some(ref filename) = self.name {
            write!(f, " (in {}:{})", filename, self.lineno)?
        }
        if f.alternate() {
            if let Some(source) = self.template_source() {
                let lines: Vec<_> = source.lines().enumerate().collect();
                if !lines.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "{:-^1$}", " Template Source ", 74)?;
                    let idx = self.lineno.clamp(1, lines.len()) - 1;
                    let skip = idx.saturating_sub(3);
                    let pre = lines.iter().skip(skip).take(3.min(idx));
                    let post = lines.iter().skip(idx + 1).take(3);
                    for (idx, line) in pre {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                    writeln!(f, "{:>4} > {}", idx + 1, lines[idx].1)?;
                    for (idx, line) in post {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                    write!(f, "{:-^1$}", "", 74)?;
                }
            }
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            detail: Some(detail.into()),
            ..Error::from(kind)
        }
    }

    /// Records the byte offset where the error happened.
    ///
    /// Offsets are relative to the text the failing pass was looking at.  An
    /// offset that is already set is kept.
    pub(crate) fn with_offset(mut self, offset: usize) -> Error {
        self.offset.get_or_insert(offset);
        self
    }

    /// Replaces the offset.  Used when an error of a nested text is reported
    /// at the position of the enclosing region.
    pub(crate) fn at_offset(mut self, offset: usize) -> Error {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub(crate) fn set_location(&mut self, filename: &str, lineno: usize) {
        self.name = Some(filename.into());
        self.lineno = lineno;
    }

    #[cfg(feature = "debug")]
    pub(crate) fn attach_template_source(&mut self, source: &str) {
        self.template_source = Some(source.to_string());
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the template name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the line.
    pub fn line(&self) -> Option<usize> {
        self.name.as_ref().map(|_| self.lineno)
    }

    /// Returns the template source if debug information is available.
    ///
    /// The source is only embedded if debug mode is enabled on the compiler
    /// ([`Compiler::set_debug`](crate::Compiler::set_debug)).
    pub fn template_source(&self) -> Option<&str> {
        #[cfg(feature = "debug")]
        {
            self.template_source.as_deref()
        }
        #[cfg(not(feature = "debug"))]
        {
            None
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            name: None,
            lineno: 0,
            offset: None,
            #[cfg(feature = "debug")]
            template_source: None,
        }
    }
}

/// Returns the 1-based line of a byte offset.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    source.as_bytes()[..offset]
        .iter()
        .filter(|&&c| c == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut err = Error::new(ErrorKind::UnknownTag, "unknown tag `block`");
        assert_eq!(err.to_string(), "unknown control tag: unknown tag `block`");
        err.set_location("index.html", 3);
        assert_eq!(
            err.to_string(),
            "unknown control tag: unknown tag `block` (in index.html:3)"
        );
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 100), 3);
    }

    #[test]
    #[cfg(feature = "debug")]
    fn test_alternate_display() {
        let mut err = Error::from(ErrorKind::UnterminatedRegion);
        err.set_location("x.html", 2);
        err.attach_template_source("one\n{{ two\nthree");
        let rendered = format!("{err:#}");
        assert!(rendered.contains("   2 > {{ two"));
        assert!(rendered.contains("   1 | one"));
        assert!(rendered.contains("   3 | three"));
    }
}
