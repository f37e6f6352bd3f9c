use std::ops::Range;

use crate::compiler::keywords::{is_keyword, keyword_replacement};
use crate::compiler::lexer::tokenize_all;
use crate::compiler::placeholder::{PlaceholderKind, PlaceholderManager};
use crate::compiler::scan::{find_matching, Splicer};
use crate::compiler::strings::protect_strings;
use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};

/// How deep index and argument groups of references may nest.
const MAX_NESTING: usize = 20;

/// A `$variable` reference together with its member accesses, indices and
/// call groups.
struct Reference {
    tokens: Range<usize>,
    groups: Vec<(usize, usize)>,
}

/// Finds the extent of the reference starting at the variable token `start`.
fn scan_reference(tokens: &[(Token<'_>, Span)], start: usize) -> Result<Reference, Error> {
    let mut idx = start + 1;
    let mut groups = Vec::new();
    loop {
        match tokens.get(idx).map(|x| x.0) {
            Some(token) if token.is_member_operator() => {
                match tokens.get(idx + 1).map(|x| x.0) {
                    Some(Token::Ident(_) | Token::Variable(_)) => idx += 2,
                    _ => break,
                }
            }
            Some(Token::BracketOpen | Token::ParenOpen) => {
                let close = ok!(find_matching(tokens, idx));
                groups.push((idx, close));
                idx = close + 1;
            }
            _ => break,
        }
    }
    Ok(Reference {
        tokens: start..idx,
        groups,
    })
}

/// Masks variable references that are already in compiled form.
///
/// A reference is a sigiled variable followed by any chain of `->name`,
/// `?->name`, `::name`, `[...]` and `(...)`, so `$user->posts[0]->title` is
/// masked as a whole.
pub struct VariableProtector<'p> {
    placeholders: &'p mut PlaceholderManager,
}

impl<'p> VariableProtector<'p> {
    /// Creates a protector that records into `placeholders`.
    pub fn new(placeholders: &'p mut PlaceholderManager) -> VariableProtector<'p> {
        VariableProtector { placeholders }
    }

    /// Replaces every variable reference in `expr` with a placeholder.
    pub fn protect(&mut self, expr: &str) -> Result<String, Error> {
        self.protect_with(expr, |_, inner| Ok(inner.to_string()))
    }

    /// Like [`protect`](Self::protect) but passes the contents of every
    /// index and call group through `rewrite_group` before masking.
    pub(crate) fn protect_with<F>(
        &mut self,
        expr: &str,
        mut rewrite_group: F,
    ) -> Result<String, Error>
    where
        F: FnMut(&mut PlaceholderManager, &str) -> Result<String, Error>,
    {
        let tokens = ok!(tokenize_all(expr));
        let mut out = Splicer::new(expr);
        let mut idx = 0;

        while idx < tokens.len() {
            if !matches!(tokens[idx].0, Token::Variable(_)) {
                idx += 1;
                continue;
            }
            let reference = ok!(scan_reference(&tokens, idx));
            let start = tokens[reference.tokens.start].1.start_offset as usize;
            let end = tokens[reference.tokens.end - 1].1.end_offset as usize;

            let mut text = String::new();
            let mut cursor = start;
            for (open, close) in reference.groups {
                let inner_start = tokens[open].1.end_offset as usize;
                let inner_end = tokens[close].1.start_offset as usize;
                text.push_str(&expr[cursor..inner_start]);
                text.push_str(&ok!(rewrite_group(
                    self.placeholders,
                    &expr[inner_start..inner_end]
                )));
                cursor = inner_end;
            }
            text.push_str(&expr[cursor..end]);

            let token = self.placeholders.mint(PlaceholderKind::Var, &text);
            out.replace(start..end, &token);
            idx = reference.tokens.end;
        }

        Ok(out.finish())
    }

    /// Puts all masked references back.
    pub fn restore(&self, expr: &str) -> String {
        self.placeholders.restore(expr)
    }
}

/// Promotes bare identifiers to variables.
///
/// Strings and existing references are masked first.  What remains is a
/// single walk over the tokens in which every identifier is classified by
/// its neighbours:
///
/// * after `->`, `?->` or `::`, or directly after `]` or `)`, it is a member;
/// * after `new` or `instanceof`, or before `::`, it is a class;
/// * `not` becomes `!`, even before `(`;
/// * before `(` it is a function;
/// * after `(` or `,` and before `:` it is a named argument;
/// * other keywords stay as they are;
/// * everything else becomes `$name`.
pub struct VariableTransformer<'p> {
    placeholders: &'p mut PlaceholderManager,
}

impl<'p> VariableTransformer<'p> {
    /// Creates a transformer that records into `placeholders`.
    pub fn new(placeholders: &'p mut PlaceholderManager) -> VariableTransformer<'p> {
        VariableTransformer { placeholders }
    }

    /// Rewrites all bare identifiers in `expr` that denote variables.
    pub fn transform(&mut self, expr: &str) -> Result<String, Error> {
        transform_nested(self.placeholders, expr, 0)
    }
}

fn transform_nested(
    placeholders: &mut PlaceholderManager,
    expr: &str,
    depth: usize,
) -> Result<String, Error> {
    if depth > MAX_NESTING {
        return Err(Error::new(
            ErrorKind::NonConvergent,
            format!("references nest deeper than {MAX_NESTING} levels"),
        ));
    }
    let mark = placeholders.mark();
    let masked = protect_strings(placeholders, expr);
    let masked = ok!(VariableProtector::new(placeholders).protect_with(&masked, |pm, inner| {
        transform_nested(pm, inner, depth + 1)
    }));
    let promoted = ok!(promote_identifiers(&masked));
    Ok(placeholders.restore_since(&promoted, mark))
}

fn is_member_position(tokens: &[(Token<'_>, Span)], idx: usize) -> bool {
    let Some((prev, prev_span)) = idx.checked_sub(1).map(|x| tokens[x]) else {
        return false;
    };
    match prev {
        token if token.is_member_operator() => true,
        Token::BracketClose | Token::ParenClose => prev_span.touches(&tokens[idx].1),
        _ => false,
    }
}

fn is_class_position(tokens: &[(Token<'_>, Span)], idx: usize) -> bool {
    let after_operator = match idx.checked_sub(1).map(|x| tokens[x].0) {
        Some(Token::Ident(word)) => {
            word.eq_ignore_ascii_case("new") || word.eq_ignore_ascii_case("instanceof")
        }
        _ => false,
    };
    after_operator || matches!(tokens.get(idx + 1), Some((Token::DoubleColon, _)))
}

/// `name: value` at the start of an argument.  Argument lists are also
/// compiled on their own, so the start of the input counts too.
fn is_named_argument(tokens: &[(Token<'_>, Span)], idx: usize) -> bool {
    matches!(tokens.get(idx + 1), Some((Token::Colon, _)))
        && matches!(
            idx.checked_sub(1).map(|x| tokens[x].0),
            None | Some(Token::ParenOpen | Token::Comma)
        )
}

fn promote_identifiers(expr: &str) -> Result<String, Error> {
    let tokens = ok!(tokenize_all(expr));
    let mut out = Splicer::new(expr);

    for (idx, (token, span)) in tokens.iter().enumerate() {
        let Token::Ident(name) = *token else {
            continue;
        };
        if is_member_position(&tokens, idx) || is_class_position(&tokens, idx) {
            continue;
        }
        if let Some(replacement) = keyword_replacement(name) {
            out.replace(span.range(), replacement);
            continue;
        }
        if is_keyword(name)
            || is_named_argument(&tokens, idx)
            || matches!(tokens.get(idx + 1), Some((Token::ParenOpen, _)))
        {
            continue;
        }
        out.insert(span.start_offset as usize, "$");
    }

    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    fn transform(expr: &str) -> String {
        let mut pm = PlaceholderManager::new();
        VariableTransformer::new(&mut pm).transform(expr).unwrap()
    }

    #[test]
    fn test_protect_references() {
        let mut pm = PlaceholderManager::new();
        let mut protector = VariableProtector::new(&mut pm);
        let rv = protector
            .protect("$user->posts[0]->title ~ $x + count($y)")
            .unwrap();
        assert_eq!(rv, "##VAR0## ~ ##VAR1## + count(##VAR2##)");
        assert_eq!(
            protector.restore(&rv),
            "$user->posts[0]->title ~ $x + count($y)"
        );
    }

    #[test]
    fn test_promote_bare_names() {
        assert_eq!(transform("name"), "$name");
        assert_eq!(transform("a + b * 2"), "$a + $b * 2");
        assert_eq!(transform("user->getName()"), "$user->getName()");
        assert_eq!(transform("user?->profile->bio"), "$user?->profile->bio");
    }

    #[test]
    fn test_existing_references_untouched() {
        assert_eq!(transform("$user"), "$user");
        assert_eq!(transform("$user->name ~ title"), "$user->name ~ $title");
    }

    #[test]
    fn test_indices_are_sub_problems() {
        assert_eq!(transform("items[key]"), "$items[$key]");
        assert_eq!(transform("$map[key]"), "$map[$key]");
        assert_eq!(transform("$map['key']"), "$map['key']");
        assert_eq!(transform("$f(a, b)->c"), "$f($a, $b)->c");
    }

    #[test]
    fn test_functions_classes_keywords() {
        assert_eq!(transform("strtoupper(name)"), "strtoupper($name)");
        assert_eq!(transform("Carbon::now()"), "Carbon::now()");
        assert_eq!(transform("x instanceof User"), "$x instanceof User");
        assert_eq!(transform("new DateTime(when)"), "new DateTime($when)");
        assert_eq!(transform("is_null(x) and y"), "is_null($x) and $y");
        assert_eq!(transform("not active"), "! $active");
        assert_eq!(transform("x === null"), "$x === null");
    }

    #[test]
    fn test_not_before_group() {
        assert_eq!(transform("not (a or b)"), "! ($a or $b)");
        assert_eq!(transform("not(a)"), "!($a)");
        assert_eq!(transform("not x and not (y)"), "! $x and ! ($y)");
        assert_eq!(transform("user->not(x)"), "$user->not($x)");
    }

    #[test]
    fn test_named_arguments() {
        assert_eq!(
            transform("format(value: total, decimals: 2)"),
            "format(value: $total, decimals: 2)"
        );
        assert_eq!(transform("f(ok ? a : b)"), "f($ok ? $a : $b)");
        assert_eq!(transform("f(x, ok ? a : b)"), "f($x, $ok ? $a : $b)");
        assert_eq!(transform("$f(key: k)"), "$f(key: $k)");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            transform("ok ? user->name : guest"),
            "$ok ? $user->name : $guest"
        );
    }

    #[test]
    fn test_strings_are_opaque() {
        assert_eq!(
            transform("'name and user.title' ~ name"),
            "'name and user.title' ~ $name"
        );
    }

    #[test]
    fn test_member_after_group() {
        assert_eq!(transform("f()->g"), "f()->g");
        assert_eq!(transform("(a)->b"), "($a)->b");
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "$a[".repeat(25), "]".repeat(25));
        let mut pm = PlaceholderManager::new();
        let err = VariableTransformer::new(&mut pm).transform(&deep).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConvergent);

        let shallow = format!("{}i{}", "$a[".repeat(5), "]".repeat(5));
        assert_eq!(
            transform(&shallow),
            format!("{}$i{}", "$a[".repeat(5), "]".repeat(5))
        );
    }
}
