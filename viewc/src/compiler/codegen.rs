use std::fmt;

/// A fragment of generated PHP.
///
/// Every fragment is a complete `<?php ... ?>` island so it can be spliced
/// into markup at the position of the region it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Prints the value of an expression.
    Echo(&'a str),
    /// Evaluates an expression for its side effects.
    Statement(&'a str),
    If(&'a str),
    ElseIf(&'a str),
    Else,
    EndIf,
    /// Opens a loop, `key` is only set for `for k, v in ...`.
    Foreach {
        collection: &'a str,
        key: Option<&'a str>,
        value: &'a str,
    },
    EndForeach,
}

impl<'a> fmt::Display for Fragment<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Echo(code) => write!(f, "<?php echo {code}; ?>"),
            Fragment::Statement(code) => write!(f, "<?php {code}; ?>"),
            Fragment::If(cond) => write!(f, "<?php if ({cond}): ?>"),
            Fragment::ElseIf(cond) => write!(f, "<?php elseif ({cond}): ?>"),
            Fragment::Else => f.write_str("<?php else: ?>"),
            Fragment::EndIf => f.write_str("<?php endif; ?>"),
            Fragment::Foreach {
                collection,
                key: Some(key),
                value,
            } => write!(f, "<?php foreach ({collection} as ${key} => ${value}): ?>"),
            Fragment::Foreach {
                collection,
                key: None,
                value,
            } => write!(f, "<?php foreach ({collection} as ${value}): ?>"),
            Fragment::EndForeach => f.write_str("<?php endforeach; ?>"),
        }
    }
}

/// Shorthand for an [`Echo`](Fragment::Echo) fragment.
pub fn echo(code: &str) -> String {
    Fragment::Echo(code).to_string()
}

/// Shorthand for a [`Statement`](Fragment::Statement) fragment.
pub fn statement(code: &str) -> String {
    Fragment::Statement(code).to_string()
}
