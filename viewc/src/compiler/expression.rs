use crate::compiler::builtins::{app_accessor, ContextFunction, APP_ROOT};
use crate::compiler::dot::DotSyntaxTransformer;
use crate::compiler::filters::FilterTransformer;
use crate::compiler::keywords::keyword_replacement;
use crate::compiler::lexer::tokenize_all;
use crate::compiler::placeholder::PlaceholderManager;
use crate::compiler::scan::{find_matching, Splicer};
use crate::compiler::tokens::{Span, Token};
use crate::compiler::variables::VariableTransformer;
use crate::error::Error;
use crate::settings::Settings;

/// A compiled expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr {
    code: String,
    context_function: Option<ContextFunction>,
}

impl CompiledExpr {
    fn plain(code: String) -> CompiledExpr {
        CompiledExpr {
            code,
            context_function: None,
        }
    }

    /// The generated code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Converts into the generated code.
    pub fn into_code(self) -> String {
        self.code
    }

    /// If the whole expression is a call of a context function, returns it.
    pub fn context_function(&self) -> Option<ContextFunction> {
        self.context_function
    }

    /// Returns `true` if the expression evaluates to markup.
    pub fn returns_markup(&self) -> bool {
        self.context_function.map_or(false, |x| x.returns_markup())
    }
}

/// Compiles a single expression.
///
/// The passes run in this order:
///
/// 1. expressions starting with `$` are taken as already compiled;
/// 2. `app.<name>` accessors are rewritten to accessor calls;
/// 3. filter chains are turned into nested calls;
/// 4. if the expression is one call `name(args)` the arguments are compiled
///    and the call is bound to the context for context functions;
/// 5. otherwise context function calls anywhere in the expression are bound,
///    dotted access is rewritten and bare names become variables.
///
/// The parser owns one placeholder table which is reset for every
/// expression.
pub struct ExpressionParser<'s> {
    settings: &'s Settings,
    placeholders: PlaceholderManager,
}

impl<'s> ExpressionParser<'s> {
    /// Creates a parser for the given settings.
    pub fn new(settings: &'s Settings) -> ExpressionParser<'s> {
        ExpressionParser {
            settings,
            placeholders: PlaceholderManager::new(),
        }
    }

    /// Compiles `expr` and returns the code.
    pub fn parse(&mut self, expr: &str) -> Result<String, Error> {
        self.compile(expr).map(CompiledExpr::into_code)
    }

    /// Compiles `expr`.
    pub fn compile(&mut self, expr: &str) -> Result<CompiledExpr, Error> {
        self.placeholders.reset();
        let expr = expr.trim();
        if expr.starts_with('$') {
            return Ok(CompiledExpr::plain(expr.to_string()));
        }

        let expr = ok!(rewrite_app_accessors(expr));
        let expr = ok!(FilterTransformer::new(&mut self.placeholders).transform(&expr));

        if let Some((name, args)) = ok!(leading_call(&expr)) {
            let args = ok!(self.compile_fragment(args));
            return Ok(match ContextFunction::from_name(name) {
                Some(func) => CompiledExpr {
                    code: func.call(&args),
                    context_function: Some(func),
                },
                None => CompiledExpr::plain(format!("{name}({args})")),
            });
        }

        self.compile_fragment(&expr).map(CompiledExpr::plain)
    }

    fn compile_fragment(&mut self, expr: &str) -> Result<String, Error> {
        let expr = ok!(bind_context_calls(expr));
        let expr =
            ok!(DotSyntaxTransformer::new(&mut self.placeholders, self.settings).transform(&expr));
        VariableTransformer::new(&mut self.placeholders).transform(&expr)
    }
}

/// Splits an assignment `name = value` (optionally `$name = value`) into
/// its target name and value.
pub fn split_assignment(expr: &str) -> Result<Option<(&str, &str)>, Error> {
    let tokens = ok!(tokenize_all(expr));
    Ok(match tokens.as_slice() {
        [(Token::Ident(name) | Token::Variable(name), _), (Token::Assign, assign), ..] => {
            Some((*name, expr[assign.end_offset as usize..].trim()))
        }
        _ => None,
    })
}

/// If `expr` consists of exactly one call `name(args)` returns the name and
/// the argument text.  `not (x)` is a negation, not a call.
fn leading_call(expr: &str) -> Result<Option<(&str, &str)>, Error> {
    let tokens = ok!(tokenize_all(expr));
    let (Some((Token::Ident(name), _)), Some((Token::ParenOpen, open))) =
        (tokens.first(), tokens.get(1))
    else {
        return Ok(None);
    };
    if keyword_replacement(name).is_some() {
        return Ok(None);
    }
    let close = ok!(find_matching(&tokens, 1));
    if close + 1 != tokens.len() {
        return Ok(None);
    }
    let args = &expr[open.end_offset as usize..tokens[close].1.start_offset as usize];
    Ok(Some((*name, args.trim())))
}

fn follows_member_operator(tokens: &[(Token<'_>, Span)], idx: usize) -> bool {
    idx.checked_sub(1).map_or(false, |prev| {
        tokens[prev].0.is_member_operator() || tokens[prev].0 == Token::Dot
    })
}

/// Binds calls of context functions to `$this`.
fn bind_context_calls(expr: &str) -> Result<String, Error> {
    let tokens = ok!(tokenize_all(expr));
    let mut out = Splicer::new(expr);
    for (idx, (token, span)) in tokens.iter().enumerate() {
        let Token::Ident(name) = token else {
            continue;
        };
        if !matches!(tokens.get(idx + 1), Some((Token::ParenOpen, _)))
            || follows_member_operator(&tokens, idx)
        {
            continue;
        }
        if let Some(func) = ContextFunction::from_name(name) {
            out.replace(span.range(), &format!("$this->{}", func.method()));
        }
    }
    Ok(out.finish())
}

/// Rewrites `app.<name>` for the names of the accessor allow-list.
fn rewrite_app_accessors(expr: &str) -> Result<String, Error> {
    let tokens = ok!(tokenize_all(expr));
    let mut out = Splicer::new(expr);
    for (idx, window) in tokens.windows(3).enumerate() {
        let [(Token::Ident(root), root_span), (Token::Dot, dot), (Token::Ident(prop), prop_span)] =
            window
        else {
            continue;
        };
        if *root != APP_ROOT
            || !root_span.touches(dot)
            || !dot.touches(prop_span)
            || follows_member_operator(&tokens, idx)
        {
            continue;
        }
        if let Some(accessor) = app_accessor(prop) {
            out.replace(
                root_span.start_offset as usize..prop_span.end_offset as usize,
                &accessor,
            );
        }
    }
    Ok(out.finish())
}
