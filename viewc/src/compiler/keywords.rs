/// Words that are never promoted to variables.  Sorted, lowercase.
const KEYWORDS: &[&str] = &[
    "and",
    "array",
    "array_key_exists",
    "array_keys",
    "array_values",
    "as",
    "bool",
    "clone",
    "count",
    "else",
    "elseif",
    "empty",
    "endfor",
    "endforeach",
    "endif",
    "false",
    "float",
    "fn",
    "for",
    "foreach",
    "function",
    "gettype",
    "if",
    "implode",
    "in",
    "in_array",
    "instanceof",
    "int",
    "is_array",
    "is_bool",
    "is_callable",
    "is_float",
    "is_int",
    "is_null",
    "is_numeric",
    "is_object",
    "is_string",
    "isset",
    "json_encode",
    "list",
    "match",
    "new",
    "not",
    "null",
    "or",
    "parent",
    "print",
    "self",
    "sizeof",
    "static",
    "string",
    "strlen",
    "true",
    "unset",
    "xor",
];

/// Checks whether `name` is a reserved word or builtin.
///
/// The check is case-insensitive, `TRUE` and `Null` are keywords too.
pub fn is_keyword(name: &str) -> bool {
    if name.bytes().any(|c| c.is_ascii_uppercase()) {
        KEYWORDS
            .binary_search(&name.to_ascii_lowercase().as_str())
            .is_ok()
    } else {
        KEYWORDS.binary_search(&name).is_ok()
    }
}

/// Returns the PHP spelling of a keyword that has none of its own.
pub(crate) fn keyword_replacement(name: &str) -> Option<&'static str> {
    name.eq_ignore_ascii_case("not").then_some("!")
}
