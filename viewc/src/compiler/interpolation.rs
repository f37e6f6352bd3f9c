use crate::compiler::builtins::escape_call;
use crate::compiler::codegen::{echo, statement};
use crate::compiler::expression::{split_assignment, ExpressionParser};
use crate::compiler::filters::Filter;
use crate::compiler::lexer::tokenize_all;
use crate::compiler::regions::rewrite_regions;
use crate::compiler::scan::split_top_level;
use crate::compiler::tokens::Token;
use crate::error::Error;
use crate::settings::Settings;
use crate::syntax::StartMarker;

/// Compiles the interpolation regions (`{{ ... }}`) of a template.
///
/// Values are escaped unless the region asks for raw output, either with
/// `{{! expr }}` or with a trailing `|raw` filter, or already produces
/// markup.  That is the case for a trailing `|e` or `|nl2br` and for context
/// functions like `{{ csrf_field() }}`.  An assignment
/// (`{{ total = a + b }}`) becomes a statement without output.
///
/// Interpolations inside `<pre>` elements are left alone.
pub struct ExpressionCompiler<'s> {
    settings: &'s Settings,
    parser: ExpressionParser<'s>,
}

impl<'s> ExpressionCompiler<'s> {
    /// Creates a compiler for the given settings.
    pub fn new(settings: &'s Settings) -> ExpressionCompiler<'s> {
        ExpressionCompiler {
            settings,
            parser: ExpressionParser::new(settings),
        }
    }

    /// Replaces all interpolation regions in `source` with PHP.
    pub fn compile(&mut self, source: &str) -> Result<String, Error> {
        let settings = self.settings;
        rewrite_regions(source, settings, None, &[StartMarker::Variable], |_, body| {
            self.compile_region(body)
        })
    }

    /// Compiles the body of one interpolation region.
    ///
    /// Returns `None` for empty regions.
    pub fn compile_region(&mut self, body: &str) -> Result<Option<String>, Error> {
        let (raw_marker, expr) = match body.strip_prefix('!') {
            Some(rest) if !rest.starts_with('=') => (true, rest.trim()),
            _ => (false, body.trim()),
        };
        if expr.is_empty() {
            return Ok(None);
        }

        if let Some((target, value)) = ok!(split_assignment(expr)) {
            let value = ok!(self.parser.parse(value));
            return Ok(Some(statement(&format!("${target} = {value}"))));
        }

        let raw = raw_marker || ok!(last_filter(expr)).map_or(false, Filter::returns_markup);
        let compiled = ok!(self.parser.compile(expr));
        Ok(Some(if raw || compiled.returns_markup() {
            echo(compiled.code())
        } else {
            echo(&escape_call(compiled.code()))
        }))
    }
}

/// Returns the built-in filter that ends the chain of `expr`, if any.
fn last_filter(expr: &str) -> Result<Option<Filter>, Error> {
    let tokens = ok!(tokenize_all(expr));
    let segments = split_top_level(&tokens, |token| *token == Token::Pipe);
    if segments.len() < 2 {
        return Ok(None);
    }
    Ok(match segments.last().map(|last| &tokens[last.clone()]) {
        Some([(Token::Ident(name), _), ..]) => Filter::from_name(name),
        _ => None,
    })
}
