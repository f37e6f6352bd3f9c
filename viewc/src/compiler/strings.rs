use crate::compiler::lexer::find_string_end;
use crate::compiler::placeholder::{PlaceholderKind, PlaceholderManager};

/// Masks quoted literals so later passes can treat `.`, `|`, `$` and bare
/// words without looking into strings.
pub struct StringProtector<'p> {
    placeholders: &'p mut PlaceholderManager,
}

impl<'p> StringProtector<'p> {
    /// Creates a protector that records into `placeholders`.
    pub fn new(placeholders: &'p mut PlaceholderManager) -> StringProtector<'p> {
        StringProtector { placeholders }
    }

    /// Replaces every complete string literal in `expr` with a placeholder.
    ///
    /// An unterminated literal is left as it is together with everything after
    /// it.  The tokenizer reports it once a later pass looks at the expression.
    pub fn protect_strings(&mut self, expr: &str) -> String {
        let bytes = expr.as_bytes();
        let mut rv = String::with_capacity(expr.len());
        let mut pos = 0;
        while let Some(start) = bytes[pos..]
            .iter()
            .position(|&c| c == b'\'' || c == b'"')
            .map(|idx| pos + idx)
        {
            let Some(end) = find_string_end(bytes, start) else {
                break;
            };
            rv.push_str(&expr[pos..start]);
            rv.push_str(
                &self
                    .placeholders
                    .mint(PlaceholderKind::Str, &expr[start..end]),
            );
            pos = end;
        }
        rv.push_str(&expr[pos..]);
        rv
    }
}

/// Shorthand for [`StringProtector::protect_strings`].
pub fn protect_strings(placeholders: &mut PlaceholderManager, expr: &str) -> String {
    StringProtector::new(placeholders).protect_strings(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_basic() {
        let mut pm = PlaceholderManager::new();
        let rv = protect_strings(&mut pm, r#"'a.b' ~ "c|d" ~ name"#);
        assert_eq!(rv, "##STR0## ~ ##STR1## ~ name");
        assert_eq!(pm.restore(&rv), r#"'a.b' ~ "c|d" ~ name"#);
    }

    #[test]
    fn test_escaped_quotes() {
        let mut pm = PlaceholderManager::new();
        let rv = protect_strings(&mut pm, r"'it\'s' ~ 'x\\' ~ y");
        assert_eq!(rv, "##STR0## ~ ##STR1## ~ y");
        assert_eq!(pm.original("##STR0##"), Some(r"'it\'s'"));
        assert_eq!(pm.original("##STR1##"), Some(r"'x\\'"));
    }

    #[test]
    fn test_nested_quote_kinds() {
        let mut pm = PlaceholderManager::new();
        let rv = protect_strings(&mut pm, r#"f("it's", 'say "hi"')"#);
        assert_eq!(rv, "f(##STR0##, ##STR1##)");
    }

    #[test]
    fn test_unterminated() {
        let mut pm = PlaceholderManager::new();
        let rv = protect_strings(&mut pm, "'ok' ~ 'broken ~ name");
        assert_eq!(rv, "##STR0## ~ 'broken ~ name");
    }
}
