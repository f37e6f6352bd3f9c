use std::collections::BTreeSet;

use crate::error::Error;
use crate::syntax::Syntax;

/// Controls what happens when a region cannot be compiled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ErrorPolicy {
    /// The first failing region aborts compilation with an error.
    Strict,
    /// A failing region is copied to the output unrewritten and a warning is
    /// logged.  The template syntax of that region stays visible in the
    /// rendered page.
    #[default]
    Lenient,
}

/// The two things a dotted name without call parens can mean.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// `a.b` is compiled to `a->b`.
    Property,
    /// `a.b` is compiled to `a->b()`.
    Method,
}

/// How a member kind was determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The member was declared through [`MemberHints`].
    Declared(MemberKind),
    /// The member was classified by its name.
    Guessed(MemberKind),
}

impl Resolution {
    /// Returns the resolved kind.
    pub fn kind(self) -> MemberKind {
        match self {
            Resolution::Declared(kind) | Resolution::Guessed(kind) => kind,
        }
    }
}

/// Accessor verbs that make an undeclared member a zero-argument method.
const METHOD_PREFIXES: &[&str] = &[
    "get", "set", "is", "has", "can", "should", "was", "will", "does", "did", "to", "as",
];

/// Declared member names of the view model.
///
/// Template authors write `user.isAdmin` and `user.name` the same way, but the
/// first one is a method and the second a property.  Names declared here are
/// resolved exactly; everything else falls back to the accessor verb rule
/// (`getName`, `is_admin` and `has` are methods, `island` is not).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case", default)
)]
pub struct MemberHints {
    methods: BTreeSet<String>,
    properties: BTreeSet<String>,
    require_declared: bool,
}

impl MemberHints {
    /// Declares a member name as a method.
    pub fn add_method<N: Into<String>>(&mut self, name: N) {
        let name = name.into();
        self.properties.remove(&name);
        self.methods.insert(name);
    }

    /// Declares a member name as a property.
    pub fn add_property<N: Into<String>>(&mut self, name: N) {
        let name = name.into();
        self.methods.remove(&name);
        self.properties.insert(name);
    }

    /// If enabled, undeclared members are reported as ambiguous.
    pub fn set_require_declared(&mut self, yes: bool) {
        self.require_declared = yes;
    }

    /// Returns `true` if undeclared members are reported.
    pub fn require_declared(&self) -> bool {
        self.require_declared
    }

    /// Resolves a member name.
    pub fn resolve(&self, name: &str) -> Resolution {
        if self.methods.contains(name) {
            Resolution::Declared(MemberKind::Method)
        } else if self.properties.contains(name) {
            Resolution::Declared(MemberKind::Property)
        } else if has_accessor_prefix(name) {
            Resolution::Guessed(MemberKind::Method)
        } else {
            Resolution::Guessed(MemberKind::Property)
        }
    }
}

/// The prefix must be the whole name or be followed by an uppercase letter,
/// a digit or an underscore.
fn has_accessor_prefix(name: &str) -> bool {
    METHOD_PREFIXES.iter().any(|prefix| {
        let Some(rest) = name.strip_prefix(prefix) else {
            return false;
        };
        match rest.chars().next() {
            None => true,
            Some(c) => c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_',
        }
    })
}

/// The compiler configuration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case", default)
)]
pub struct Settings {
    pub(crate) syntax: Syntax,
    policy: ErrorPolicy,
    members: MemberHints,
    debug: bool,
}

impl Settings {
    /// Returns the delimiter configuration.
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Replaces the delimiter configuration.
    pub fn set_syntax(&mut self, syntax: Syntax) -> Result<(), Error> {
        ok!(syntax.check_delimiters());
        self.syntax = syntax;
        Ok(())
    }

    /// Returns the error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Sets the error policy.
    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// Returns the member hints.
    pub fn members(&self) -> &MemberHints {
        &self.members
    }

    /// Returns the member hints for modification.
    pub fn members_mut(&mut self) -> &mut MemberHints {
        &mut self.members
    }

    /// Returns `true` if errors carry the template source.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Enables or disables debug mode.
    pub fn set_debug(&mut self, yes: bool) {
        self.debug = yes;
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.policy == ErrorPolicy::Strict
    }
}
