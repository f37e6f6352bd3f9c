use crate::compiler::builtins::escape_call;
use crate::compiler::keywords::is_keyword;
use crate::compiler::lexer::tokenize_all;
use crate::compiler::placeholder::PlaceholderManager;
use crate::compiler::scan::{find_matching, split_top_level, text_of};
use crate::compiler::strings::protect_strings;
use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};

/// A filter with a built-in translation.
///
/// Filters not listed here are compiled as plain function calls, so
/// `value|slugify('-')` becomes `slugify(value, '-')`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Filter {
    Upper,
    Lower,
    Capitalize,
    Title,
    Trim,
    Length,
    Escape,
    Json,
    /// Escapes the value, then converts newlines to `<br />`.
    Nl2br,
    StripTags,
    Abs,
    Round,
    NumberFormat,
    Keys,
    UrlEncode,
    /// The first character of the value.
    First,
    /// Formats a date object, `'Y-m-d'` unless a format is given.
    Date,
    /// The argument if the value is null.
    Default,
    /// Marks the value as safe.  The filter itself does nothing, the
    /// interpolation is emitted without escaping.
    Raw,
}

impl Filter {
    /// Looks up a filter by name.
    pub fn from_name(name: &str) -> Option<Filter> {
        Some(match name {
            "upper" => Filter::Upper,
            "lower" => Filter::Lower,
            "capitalize" => Filter::Capitalize,
            "title" => Filter::Title,
            "trim" => Filter::Trim,
            "length" | "count" => Filter::Length,
            "escape" | "e" => Filter::Escape,
            "json" => Filter::Json,
            "nl2br" => Filter::Nl2br,
            "striptags" => Filter::StripTags,
            "abs" => Filter::Abs,
            "round" => Filter::Round,
            "number_format" => Filter::NumberFormat,
            "keys" => Filter::Keys,
            "url_encode" => Filter::UrlEncode,
            "first" => Filter::First,
            "date" => Filter::Date,
            "default" => Filter::Default,
            "raw" => Filter::Raw,
            _ => return None,
        })
    }

    fn function(self) -> Option<&'static str> {
        Some(match self {
            Filter::Upper => "strtoupper",
            Filter::Lower => "strtolower",
            Filter::Capitalize => "ucfirst",
            Filter::Title => "ucwords",
            Filter::Trim => "trim",
            Filter::Length => "count",
            Filter::Escape => "htmlspecialchars",
            Filter::Json => "json_encode",
            Filter::StripTags => "strip_tags",
            Filter::Abs => "abs",
            Filter::Round => "round",
            Filter::NumberFormat => "number_format",
            Filter::Keys => "array_keys",
            Filter::UrlEncode => "urlencode",
            Filter::Nl2br | Filter::First | Filter::Date | Filter::Default | Filter::Raw => {
                return None
            }
        })
    }

    /// Returns `true` if the result is HTML that must not be escaped again.
    pub fn returns_markup(self) -> bool {
        matches!(self, Filter::Escape | Filter::Nl2br | Filter::Raw)
    }

    /// Applies the filter to an expression.
    pub fn apply(self, value: &str, args: Option<&str>) -> String {
        if let Some(func) = self.function() {
            return call(func, value, args);
        }
        match self {
            Filter::Nl2br => call("nl2br", &escape_call(value), args),
            Filter::First => format!("substr({value}, 0, 1)"),
            Filter::Date => {
                let format = args.unwrap_or("'Y-m-d'");
                if is_single_reference(value) {
                    format!("{value}->format({format})")
                } else {
                    format!("({value})->format({format})")
                }
            }
            Filter::Default => format!("({} ?? {})", value, args.unwrap_or("''")),
            _ => value.to_string(),
        }
    }
}

/// Checks whether `value` is one name or group followed only by member
/// accesses, indices and calls, so a method call can be appended as is.
fn is_single_reference(value: &str) -> bool {
    let Ok(tokens) = tokenize_all(value) else {
        return false;
    };
    let group_end = |open: usize| find_matching(&tokens, open).ok().map(|close| close + 1);
    let mut idx = match tokens.first().map(|x| x.0) {
        Some(Token::Ident(name)) if !is_keyword(name) => 1,
        Some(Token::Variable(_)) => 1,
        Some(Token::ParenOpen) => match group_end(0) {
            Some(end) => end,
            None => return false,
        },
        _ => return false,
    };

    while let Some(&(token, span)) = tokens.get(idx) {
        idx = match (token, tokens.get(idx + 1)) {
            (Token::Dot, Some((Token::Ident(_) | Token::Number(_), next)))
                if is_tight(&tokens[idx - 1].1, &span, next) =>
            {
                idx + 2
            }
            (token, Some((Token::Ident(_) | Token::Variable(_), _)))
                if token.is_member_operator() =>
            {
                idx + 2
            }
            (Token::BracketOpen | Token::ParenOpen, _) => match group_end(idx) {
                Some(end) => end,
                None => return false,
            },
            _ => return false,
        };
    }
    true
}

/// A dot is member access only when it touches both neighbours.
fn is_tight(prev: &Span, dot: &Span, next: &Span) -> bool {
    prev.touches(dot) && dot.touches(next)
}

fn call(func: &str, value: &str, args: Option<&str>) -> String {
    match args {
        Some(args) => format!("{func}({value}, {args})"),
        None => format!("{func}({value})"),
    }
}

/// Rewrites pipe chains into nested calls.
///
/// `title|upper|trim` becomes `trim(strtoupper(title))`: every filter wraps
/// the result of the filters left of it.  Only pipes outside of groups and
/// strings split the chain and `||` is never a pipe.
pub struct FilterTransformer<'p> {
    placeholders: &'p mut PlaceholderManager,
}

impl<'p> FilterTransformer<'p> {
    /// Creates a transformer that records into `placeholders`.
    pub fn new(placeholders: &'p mut PlaceholderManager) -> FilterTransformer<'p> {
        FilterTransformer { placeholders }
    }

    /// Rewrites the filter chain of `expr`.
    pub fn transform(&mut self, expr: &str) -> Result<String, Error> {
        let mark = self.placeholders.mark();
        let masked = protect_strings(self.placeholders, expr);
        let tokens = ok!(tokenize_all(&masked));
        let mut segments = split_top_level(&tokens, |token| *token == Token::Pipe).into_iter();

        let base = segments.next().unwrap_or_default();
        if segments.len() == 0 {
            return Ok(expr.to_string());
        }
        let mut value = text_of(&masked, &tokens, base).to_string();
        if value.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidFilter,
                "filter chain without a value",
            ));
        }

        for segment in segments {
            let (name, args) = match &tokens[segment.clone()] {
                [(Token::Ident(name), _)] => (*name, None),
                [(Token::Ident(name), _), (Token::ParenOpen, _), .., (Token::ParenClose, _)]
                    if find_matching(&tokens, segment.start + 1).ok() == Some(segment.end - 1) =>
                {
                    let args = text_of(&masked, &tokens, segment.start + 2..segment.end - 1);
                    (*name, Some(args).filter(|x| !x.is_empty()))
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidFilter,
                        format!(
                            "`{}` is not a filter",
                            self.placeholders
                                .restore_since(text_of(&masked, &tokens, segment), mark)
                        ),
                    ))
                }
            };
            value = match Filter::from_name(name) {
                Some(filter) => filter.apply(&value, args),
                None => call(name, &value, args),
            };
        }

        Ok(self.placeholders.restore_since(&value, mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    fn transform(expr: &str) -> Result<String, Error> {
        let mut pm = PlaceholderManager::new();
        FilterTransformer::new(&mut pm).transform(expr)
    }

    #[test]
    fn test_chain_order() {
        assert_eq!(transform("value|upper|trim").unwrap(), "trim(strtoupper(value))");
        assert_eq!(transform("name | lower").unwrap(), "strtolower(name)");
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(transform("a || b").unwrap(), "a || b");
        assert_eq!(transform("f(a|b)").unwrap(), "f(a|b)");
        assert_eq!(transform("'a|b'").unwrap(), "'a|b'");
    }

    #[test]
    fn test_special_filters() {
        assert_eq!(transform("items|first").unwrap(), "substr(items, 0, 1)");
        assert_eq!(transform("created|date").unwrap(), "created->format('Y-m-d')");
        assert_eq!(
            transform("created|date('d.m.Y')").unwrap(),
            "created->format('d.m.Y')"
        );
        assert_eq!(
            transform("a ?? b|date").unwrap(),
            "(a ?? b)->format('Y-m-d')"
        );
        assert_eq!(transform("body|nl2br").unwrap(), "nl2br($this->escape(body))");
        assert_eq!(transform("x|e").unwrap(), "htmlspecialchars(x)");
        assert_eq!(transform("nick|default('anon')").unwrap(), "(nick ?? 'anon')");
        assert_eq!(transform("body|raw").unwrap(), "body");
    }

    #[test]
    fn test_date_precedence() {
        for (expr, expected) in [
            ("a??b|date", "(a??b)->format('Y-m-d')"),
            ("-x|date", "(-x)->format('Y-m-d')"),
            ("a . b|date", "(a . b)->format('Y-m-d')"),
            ("new DateTime|date", "(new DateTime)->format('Y-m-d')"),
            ("'2020-01-01'|date", "('2020-01-01')->format('Y-m-d')"),
            ("post.created|date", "post.created->format('Y-m-d')"),
            ("post->created|date", "post->created->format('Y-m-d')"),
            ("items[0].at|date", "items[0].at->format('Y-m-d')"),
            ("Carbon::now()|date", "Carbon::now()->format('Y-m-d')"),
            ("x|default(y)|date", "(x ?? y)->format('Y-m-d')"),
        ] {
            assert_eq!(transform(expr).unwrap(), expected, "{expr}");
        }
    }

    #[test]
    fn test_markup_filters() {
        assert!(Filter::Escape.returns_markup());
        assert!(Filter::Nl2br.returns_markup());
        assert!(Filter::Raw.returns_markup());
        assert!(!Filter::Upper.returns_markup());
        assert_eq!(Filter::from_name("e"), Some(Filter::Escape));
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            transform("price|number_format(2, ',', '.')").unwrap(),
            "number_format(price, 2, ',', '.')"
        );
        assert_eq!(transform("x|round()").unwrap(), "round(x)");
        assert_eq!(
            transform("title|slugify('-')|upper").unwrap(),
            "strtoupper(slugify(title, '-'))"
        );
        assert_eq!(
            transform("s|replace('|', '/')").unwrap(),
            "replace(s, '|', '/')"
        );
    }

    #[test]
    fn test_invalid_filters() {
        for expr in ["x|", "x|1", "x|f(a) + 1", "|upper", "x|a.b"] {
            assert_eq!(
                transform(expr).unwrap_err().kind(),
                ErrorKind::InvalidFilter,
                "{expr}"
            );
        }
    }
}
