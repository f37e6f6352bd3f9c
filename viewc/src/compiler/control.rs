use crate::compiler::builtins::ContextFunction;
use crate::compiler::codegen::Fragment;
use crate::compiler::expression::{split_assignment, ExpressionParser};
use crate::compiler::lexer::tokenize_all;
use crate::compiler::regions::rewrite_regions;
use crate::compiler::scan::find_matching;
use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};
use crate::settings::Settings;
use crate::syntax::StartMarker;

/// Compiles the control tags (`{% ... %}`) of a template.
///
/// Supported tags:
///
/// * `for item in items`, `for key, value in items`, `endfor`
/// * `if cond`, `elseif cond` (or `else if cond`), `else`, `endif`
/// * `set name = expr`
/// * a call `name(args)` or `obj.method(args)`, compiled to a statement
///
/// Every tag is compiled on its own, nothing is tracked between tags.
pub struct ControlStructureCompiler<'s> {
    settings: &'s Settings,
    parser: ExpressionParser<'s>,
}

impl<'s> ControlStructureCompiler<'s> {
    /// Creates a compiler for the given settings.
    pub fn new(settings: &'s Settings) -> ControlStructureCompiler<'s> {
        ControlStructureCompiler {
            settings,
            parser: ExpressionParser::new(settings),
        }
    }

    /// Replaces all control tags in `source` with PHP.
    pub fn compile(&mut self, source: &str) -> Result<String, Error> {
        let settings = self.settings;
        rewrite_regions(source, settings, None, &[StartMarker::Block], |_, body| {
            self.compile_tag(body)
        })
    }

    /// Compiles the body of one control tag.
    ///
    /// Returns `None` for empty tags.
    pub fn compile_tag(&mut self, body: &str) -> Result<Option<String>, Error> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        let (keyword, rest) = split_keyword(body);

        let rv = match (keyword, rest) {
            ("endfor" | "endforeach", "") => Fragment::EndForeach.to_string(),
            ("endif", "") => Fragment::EndIf.to_string(),
            ("else", "") => Fragment::Else.to_string(),
            ("else", rest) if split_keyword(rest).0 == "if" => {
                let cond = ok!(self.condition(split_keyword(rest).1));
                Fragment::ElseIf(&cond).to_string()
            }
            ("for" | "foreach", rest) => ok!(self.compile_for(rest)),
            ("if", rest) => Fragment::If(&ok!(self.condition(rest))).to_string(),
            ("elseif", rest) => Fragment::ElseIf(&ok!(self.condition(rest))).to_string(),
            ("set", rest) => ok!(self.compile_set(rest)),
            ("endfor" | "endforeach" | "endif" | "else", _) => {
                return Err(Error::new(
                    ErrorKind::InvalidSyntax,
                    format!("unexpected text after `{keyword}`"),
                ))
            }
            _ => ok!(self.compile_call(body)),
        };
        Ok(Some(rv))
    }

    fn condition(&mut self, expr: &str) -> Result<String, Error> {
        if expr.is_empty() {
            return Err(Error::new(ErrorKind::InvalidSyntax, "missing condition"));
        }
        self.parser.parse(expr)
    }

    fn compile_for(&mut self, rest: &str) -> Result<String, Error> {
        let tokens = ok!(tokenize_all(rest));
        let in_idx = tokens.iter().position(|(token, _)| {
            matches!(token, Token::Ident(word) if word.eq_ignore_ascii_case("in"))
        });
        let Some(in_idx) = in_idx else {
            return Err(Error::new(
                ErrorKind::InvalidSyntax,
                "expected `for <target> in <collection>`",
            ));
        };

        let (key, value) = match &tokens[..in_idx] {
            [(value, _)] => (None, ok!(loop_target(value))),
            [(key, _), (Token::Comma, _), (value, _)] => {
                (Some(ok!(loop_target(key))), ok!(loop_target(value)))
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidSyntax,
                    "loop targets must be `name` or `key, value`",
                ))
            }
        };

        let collection = rest[tokens[in_idx].1.end_offset as usize..].trim();
        if collection.is_empty() {
            return Err(Error::new(ErrorKind::InvalidSyntax, "missing loop collection"));
        }
        let collection = ok!(self.parser.parse(collection));
        Ok(Fragment::Foreach {
            collection: &collection,
            key,
            value,
        }
        .to_string())
    }

    fn compile_set(&mut self, rest: &str) -> Result<String, Error> {
        match ok!(split_assignment(rest)) {
            Some((target, value)) if !value.is_empty() => {
                let value = ok!(self.parser.parse(value));
                Ok(Fragment::Statement(&format!("${target} = {value}")).to_string())
            }
            _ => Err(Error::new(
                ErrorKind::InvalidSyntax,
                "expected `set <name> = <expression>`",
            )),
        }
    }

    fn compile_call(&mut self, body: &str) -> Result<String, Error> {
        let tokens = ok!(tokenize_all(body));
        let Some(callee) = ok!(trailing_call(&tokens)) else {
            return Err(Error::new(
                ErrorKind::UnknownTag,
                format!("`{}` is neither a control keyword nor a call", body),
            ));
        };

        let compiled = ok!(self.parser.compile(body));
        let bare = callee == 0;
        if bare && compiled.context_function().map_or(false, ContextFunction::returns_markup) {
            Ok(Fragment::Echo(compiled.code()).to_string())
        } else {
            Ok(Fragment::Statement(compiled.code()).to_string())
        }
    }
}

/// Splits off the leading word of a tag.
fn split_keyword(body: &str) -> (&str, &str) {
    let len = body
        .bytes()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
        .count();
    (&body[..len], body[len..].trim())
}

fn loop_target<'a>(token: &Token<'a>) -> Result<&'a str, Error> {
    match *token {
        Token::Ident(name) | Token::Variable(name) => Ok(name),
        _ => Err(Error::new(
            ErrorKind::InvalidSyntax,
            format!("expected a loop variable, got {token}"),
        )),
    }
}

/// If the tokens form a call (`f(..)`, `a.b(..)`, `a->b(..)`) returns the
/// index of the called name.
fn trailing_call(tokens: &[(Token<'_>, Span)]) -> Result<Option<usize>, Error> {
    if !matches!(tokens.first(), Some((Token::Ident(_) | Token::Variable(_), _))) {
        return Ok(None);
    }
    let mut idx = 0;
    let mut last_open = None;
    while idx < tokens.len() {
        if tokens[idx].0.closing().is_some() {
            let close = ok!(find_matching(tokens, idx));
            if close + 1 == tokens.len() {
                last_open = Some(idx);
            }
            idx = close + 1;
        } else {
            idx += 1;
        }
    }
    let Some(open) = last_open.filter(|&x| x > 0 && tokens[x].0 == Token::ParenOpen) else {
        return Ok(None);
    };
    if !matches!(tokens[open - 1].0, Token::Ident(_)) {
        return Ok(None);
    }

    // the receiver may only be a chain of names, member access and groups
    let mut idx = 0;
    while idx < open - 1 {
        match tokens[idx].0 {
            Token::Ident(_)
            | Token::Variable(_)
            | Token::Dot
            | Token::Arrow
            | Token::NullsafeArrow => idx += 1,
            token if token.closing().is_some() => idx = ok!(find_matching(tokens, idx)) + 1,
            _ => return Ok(None),
        }
    }
    Ok(Some(open - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    fn tag(body: &str) -> Result<Option<String>, Error> {
        let settings = Settings::default();
        ControlStructureCompiler::new(&settings).compile_tag(body)
    }

    fn compiled(body: &str) -> String {
        tag(body).unwrap().unwrap()
    }

    #[test]
    fn test_loops() {
        assert_eq!(
            compiled("for item in items"),
            "<?php foreach ($items as $item): ?>"
        );
        assert_eq!(
            compiled("for key, value in user.getSettings()"),
            "<?php foreach ($user->getSettings() as $key => $value): ?>"
        );
        assert_eq!(compiled("endfor"), "<?php endforeach; ?>");
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(compiled("if user.isAdmin"), "<?php if ($user->isAdmin()): ?>");
        assert_eq!(
            compiled("elseif count(items) > 0"),
            "<?php elseif (count($items) > 0): ?>"
        );
        assert_eq!(compiled("else if x"), "<?php elseif ($x): ?>");
        assert_eq!(compiled("else"), "<?php else: ?>");
        assert_eq!(compiled("endif"), "<?php endif; ?>");
        assert_eq!(compiled("iffy(x)"), "<?php iffy($x); ?>");
    }

    #[test]
    fn test_set() {
        assert_eq!(
            compiled("set total = price|round"),
            "<?php $total = round($price); ?>"
        );
        assert_eq!(tag("set total").unwrap_err().kind(), ErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_calls() {
        assert_eq!(compiled("csrf_field()"), "<?php echo $this->csrfField(); ?>");
        assert_eq!(
            compiled("extend('layouts/main')"),
            "<?php $this->extend('layouts/main'); ?>"
        );
        assert_eq!(
            compiled("start_section('content')"),
            "<?php $this->startSection('content'); ?>"
        );
        assert_eq!(
            compiled("form.open('post', url('save'))"),
            "<?php $form->open('post', $this->url('save')); ?>"
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(tag("endif now").unwrap_err().kind(), ErrorKind::InvalidSyntax);
        assert_eq!(tag("for x items").unwrap_err().kind(), ErrorKind::InvalidSyntax);
        assert_eq!(tag("for in items").unwrap_err().kind(), ErrorKind::InvalidSyntax);
        assert_eq!(tag("if").unwrap_err().kind(), ErrorKind::InvalidSyntax);
        assert_eq!(tag("block content").unwrap_err().kind(), ErrorKind::UnknownTag);
        assert_eq!(tag("  ").unwrap(), None);
    }

    #[test]
    fn test_compile_template() {
        let settings = Settings::default();
        let rv = ControlStructureCompiler::new(&settings)
            .compile("{% for p in posts %}<li>{{ p.title }}</li>{% endfor %}")
            .unwrap();
        assert_eq!(
            rv,
            "<?php foreach ($posts as $p): ?><li>{{ p.title }}</li><?php endforeach; ?>"
        );
    }
}
