//! Delimiter configuration.
//!
//! Templates are scanned for three kinds of regions: interpolations
//! (`{{ ... }}`), control tags (`{% ... %}`) and comments (`{# ... #}`).  The
//! delimiters can be changed, for instance when the surrounding markup makes
//! heavy use of curly braces:
//!
//! ```
//! # use viewc::{Compiler, Syntax};
//! let mut compiler = Compiler::new();
//! compiler.set_syntax(Syntax {
//!     block_start: "<%".into(),
//!     block_end: "%>".into(),
//!     variable_start: "<%=".into(),
//!     variable_end: "%>".into(),
//!     comment_start: "<%#".into(),
//!     comment_end: "%>".into(),
//! }).unwrap();
//! ```
//!
//! The end markers can be shared, but the start markers need to be distinct.
//! If one start marker is a prefix of another (`<%` and `<%=` above) the
//! longer one wins when both match at the same position.
use std::borrow::Cow;

use crate::error::{Error, ErrorKind};

/// The delimiter configuration for the compiler.
///
/// Deserialized values are checked like the ones passed to
/// [`Compiler::set_syntax`](crate::Compiler::set_syntax).
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case", try_from = "UncheckedSyntax")
)]
pub struct Syntax {
    /// The start of a control tag. By default it is `{%`.
    pub block_start: Cow<'static, str>,
    /// The end of a control tag. By default it is `%}`.
    pub block_end: Cow<'static, str>,
    /// The start of an interpolation. By default it is `{{`.
    pub variable_start: Cow<'static, str>,
    /// The end of an interpolation. By default it is `}}`.
    pub variable_end: Cow<'static, str>,
    /// The start of a comment. By default it is `{#`.
    pub comment_start: Cow<'static, str>,
    /// The end of a comment. By default it is `#}`.
    pub comment_end: Cow<'static, str>,
}

const DEFAULT_SYNTAX: Syntax = Syntax {
    block_start: Cow::Borrowed("{%"),
    block_end: Cow::Borrowed("%}"),
    variable_start: Cow::Borrowed("{{"),
    variable_end: Cow::Borrowed("}}"),
    comment_start: Cow::Borrowed("{#"),
    comment_end: Cow::Borrowed("#}"),
};

impl Default for Syntax {
    fn default() -> Self {
        DEFAULT_SYNTAX
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct UncheckedSyntax {
    block_start: Cow<'static, str>,
    block_end: Cow<'static, str>,
    variable_start: Cow<'static, str>,
    variable_end: Cow<'static, str>,
    comment_start: Cow<'static, str>,
    comment_end: Cow<'static, str>,
}

#[cfg(feature = "serde")]
impl Default for UncheckedSyntax {
    fn default() -> Self {
        UncheckedSyntax {
            block_start: DEFAULT_SYNTAX.block_start,
            block_end: DEFAULT_SYNTAX.block_end,
            variable_start: DEFAULT_SYNTAX.variable_start,
            variable_end: DEFAULT_SYNTAX.variable_end,
            comment_start: DEFAULT_SYNTAX.comment_start,
            comment_end: DEFAULT_SYNTAX.comment_end,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedSyntax> for Syntax {
    type Error = Error;

    fn try_from(value: UncheckedSyntax) -> Result<Syntax, Error> {
        let syntax = Syntax {
            block_start: value.block_start,
            block_end: value.block_end,
            variable_start: value.variable_start,
            variable_end: value.variable_end,
            comment_start: value.comment_start,
            comment_end: value.comment_end,
        };
        syntax.check_delimiters().map(|()| syntax)
    }
}

/// Which kind of region a start marker opens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StartMarker {
    /// An interpolation region.
    Variable,
    /// A control region.
    Block,
    /// A comment.
    Comment,
}

impl Syntax {
    /// block, variable and comment start strings must be distinct and no
    /// delimiter may be empty.
    pub(crate) fn check_delimiters(&self) -> Result<(), Error> {
        let all = [
            &self.block_start,
            &self.block_end,
            &self.variable_start,
            &self.variable_end,
            &self.comment_start,
            &self.comment_end,
        ];
        if all.iter().any(|x| x.is_empty()) {
            return Err(Error::new(
                ErrorKind::InvalidDelimiter,
                "delimiters must not be empty",
            ));
        }
        if self.block_start != self.variable_start
            && self.block_start != self.comment_start
            && self.variable_start != self.comment_start
        {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::InvalidDelimiter,
                "start delimiters must be distinct",
            ))
        }
    }

    /// Returns the start and end delimiter for a region kind.
    pub fn delimiters(&self, marker: StartMarker) -> (&str, &str) {
        match marker {
            StartMarker::Variable => (&self.variable_start, &self.variable_end),
            StartMarker::Block => (&self.block_start, &self.block_end),
            StartMarker::Comment => (&self.comment_start, &self.comment_end),
        }
    }

    /// Checks whether another start marker shadows `marker` at the beginning
    /// of `rest`.
    ///
    /// This is the case if a longer start delimiter of a different kind also
    /// matches, e.g. `<%=` shadows `<%`.
    pub(crate) fn is_shadowed(&self, marker: StartMarker, rest: &str) -> bool {
        let own = self.delimiters(marker).0;
        [StartMarker::Variable, StartMarker::Block, StartMarker::Comment]
            .into_iter()
            .filter(|&other| other != marker)
            .map(|other| self.delimiters(other).0)
            .any(|other| other.len() > own.len() && rest.starts_with(other))
    }
}
