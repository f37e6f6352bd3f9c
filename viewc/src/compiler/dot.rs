use crate::compiler::lexer::tokenize_all;
use crate::compiler::placeholder::PlaceholderManager;
use crate::compiler::scan::Splicer;
use crate::compiler::strings::protect_strings;
use crate::compiler::tokens::Token;
use crate::error::{Error, ErrorKind};
use crate::settings::{MemberKind, Resolution, Settings};

/// Rewrites dotted member access into `->`.
///
/// A dot is only member access if it touches both operands and the left one
/// can carry members (a name, a variable or a closing paren or bracket):
///
/// * `user.name` becomes `user->name`,
/// * `user.getName()` becomes `user->getName()`,
/// * `user.isAdmin` becomes `user->isAdmin()`,
/// * `items.0` becomes `items[0]`,
/// * `a . b` and `'x'.y` are left alone, they are concatenations.
///
/// Whether a member without parens is a method is decided by the
/// [`MemberHints`](crate::MemberHints) of the settings.
pub struct DotSyntaxTransformer<'a> {
    placeholders: &'a mut PlaceholderManager,
    settings: &'a Settings,
}

impl<'a> DotSyntaxTransformer<'a> {
    /// Creates a transformer.
    pub fn new(placeholders: &'a mut PlaceholderManager, settings: &'a Settings) -> Self {
        DotSyntaxTransformer {
            placeholders,
            settings,
        }
    }

    /// Rewrites all dotted accesses in `expr`.
    pub fn transform(&mut self, expr: &str) -> Result<String, Error> {
        let mark = self.placeholders.mark();
        let masked = protect_strings(self.placeholders, expr);
        let tokens = ok!(tokenize_all(&masked));
        let mut out = Splicer::new(&masked);

        for (idx, &(token, dot)) in tokens.iter().enumerate() {
            if token != Token::Dot || idx == 0 {
                continue;
            }
            let (prev, prev_span) = tokens[idx - 1];
            let Some(&(next, next_span)) = tokens.get(idx + 1) else {
                continue;
            };
            // a number is only an operand if it was an index itself (`items.0.name`)
            let index_before = matches!(prev, Token::Number(_))
                && idx >= 2
                && tokens[idx - 2].0 == Token::Dot
                && tokens[idx - 2].1.touches(&prev_span);
            if !prev_span.touches(&dot)
                || !dot.touches(&next_span)
                || !(index_before
                    || matches!(
                        prev,
                        Token::Ident(_)
                            | Token::Variable(_)
                            | Token::ParenClose
                            | Token::BracketClose
                    ))
            {
                continue;
            }

            match next {
                Token::Ident(name) => {
                    out.replace(dot.range(), "->");
                    let called = matches!(tokens.get(idx + 2), Some((Token::ParenOpen, _)));
                    if !called && ok!(self.resolve(name)) == MemberKind::Method {
                        out.insert(next_span.end_offset as usize, "()");
                    }
                }
                Token::Number(index) => {
                    let start = dot.start_offset as usize;
                    let end = next_span.end_offset as usize;
                    out.replace(start..end, &format!("[{}]", index.replace('.', "][")));
                }
                _ => {}
            }
        }

        let rv = out.finish();
        Ok(self.placeholders.restore_since(&rv, mark))
    }

    fn resolve(&self, name: &str) -> Result<MemberKind, Error> {
        let hints = self.settings.members();
        let resolution = hints.resolve(name);
        let kind = resolution.kind();
        if matches!(resolution, Resolution::Declared(_)) || !hints.require_declared() {
            return Ok(kind);
        }
        if self.settings.is_strict() {
            return Err(Error::new(
                ErrorKind::AmbiguousMember,
                format!("`{name}` is neither a declared method nor a declared property"),
            ));
        }
        log::warn!(
            "member `{}` is not declared, treating it as a {}",
            name,
            match kind {
                MemberKind::Method => "method",
                MemberKind::Property => "property",
            }
        );
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ErrorPolicy;

    use similar_asserts::assert_eq;

    fn transform_with(settings: &Settings, expr: &str) -> Result<String, Error> {
        let mut pm = PlaceholderManager::new();
        DotSyntaxTransformer::new(&mut pm, settings).transform(expr)
    }

    fn transform(expr: &str) -> String {
        transform_with(&Settings::default(), expr).unwrap()
    }

    #[test]
    fn test_member_access() {
        assert_eq!(transform("user.name"), "user->name");
        assert_eq!(transform("user.getName()"), "user->getName()");
        assert_eq!(transform("user.isAdmin"), "user->isAdmin()");
        assert_eq!(transform("user.island"), "user->island");
        assert_eq!(transform("$user.profile.bio"), "$user->profile->bio");
    }

    #[test]
    fn test_chains() {
        assert_eq!(transform("f().getItems"), "f()->getItems()");
        assert_eq!(transform("a[0].name"), "a[0]->name");
        assert_eq!(transform("items.0.name"), "items[0]->name");
        assert_eq!(transform("grid.1.2"), "grid[1][2]");
    }

    #[test]
    fn test_concatenation_untouched() {
        assert_eq!(transform("a . b"), "a . b");
        assert_eq!(transform("'x'.y"), "'x'.y");
        assert_eq!(transform("'user.name' ~ x.y"), "'user.name' ~ x->y");
        assert_eq!(transform("1.5 + x"), "1.5 + x");
    }

    #[test]
    fn test_declared_members() {
        let mut settings = Settings::default();
        settings.members_mut().add_method("total");
        settings.members_mut().add_property("isbn");
        assert_eq!(transform_with(&settings, "cart.total").unwrap(), "cart->total()");
        assert_eq!(transform_with(&settings, "book.isbn").unwrap(), "book->isbn");
    }

    #[test]
    fn test_require_declared() {
        let mut settings = Settings::default();
        settings.members_mut().set_require_declared(true);
        settings.members_mut().add_property("name");
        assert_eq!(transform_with(&settings, "user.name").unwrap(), "user->name");
        assert_eq!(transform_with(&settings, "user.hasRole").unwrap(), "user->hasRole()");

        settings.set_policy(ErrorPolicy::Strict);
        let err = transform_with(&settings, "user.hasRole").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousMember);
        assert_eq!(transform_with(&settings, "user.hasRole(1)").unwrap(), "user->hasRole(1)");
    }
}
