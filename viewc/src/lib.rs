//! viewc compiles HTML-embedded view templates to PHP.
//!
//! Templates mix markup with interpolations (`{{ ... }}`), control tags
//! (`{% ... %}`) and comments (`{# ... #}`).  Expressions use a compact
//! syntax with dotted member access and pipe filters which is rewritten to
//! plain PHP:
//!
//! ```jinja
//! {% for post in posts %}
//!   <h2>{{ post.title }}</h2>
//!   {% if post.isPublished %}
//!     {{ post.body|nl2br }}
//!   {% endif %}
//! {% endfor %}
//! ```
//!
//! compiles to
//!
//! ```php
//! <?php foreach ($posts as $post): ?>
//!   <h2><?php echo $this->escape($post->title); ?></h2>
//!   <?php if ($post->isPublished()): ?>
//!     <?php echo nl2br($this->escape($post->body)); ?>
//!   <?php endif; ?>
//! <?php endforeach; ?>
//! ```
//!
//! The output is meant to be included from a method of a view object: `$this`
//! provides `escape` and the [context functions](ContextFunction), variables
//! are bound by name.  The compiler does not check that variables exist or
//! what they hold.
//!
//! # Usage
//!
//! ```
//! use viewc::Compiler;
//!
//! let compiler = Compiler::new();
//! let php = compiler
//!     .compile_template("greeting.html", "Hello {{ name|capitalize }}!")
//!     .unwrap();
//! assert_eq!(php, "Hello <?php echo $this->escape(ucfirst($name)); ?>!");
//! ```
//!
//! # Expressions
//!
//! Bare names are variables unless they are keywords (`true`, `null`, `and`,
//! `isset`, ...), called functions or members.  A member without parens is a
//! property unless it starts with an accessor verb (`user.isAdmin` becomes
//! `$user->isAdmin()`) or was declared as a method with
//! [`Compiler::add_method`].
//!
//! Filters are applied left to right, `value|upper|trim` becomes
//! `trim(strtoupper($value))`.  See [`Filter`] for the built-in ones, other
//! names are compiled to function calls.
//!
//! # Errors
//!
//! By default the compiler is lenient: a region that cannot be compiled is
//! left in the output as it is and a warning is logged through the
//! [`log`](https://docs.rs/log) facade.  With [`ErrorPolicy::Strict`] the
//! first such region fails the compilation.
//!
//! # Optional Features
//!
//! - `debug`: errors can carry the template source to render an excerpt.
//!   Enabled by default.
//! - `serde`: [`Settings`] and its parts can be deserialized.
//! - `unicode`: identifiers follow the unicode XID rules instead of ASCII.
//! - `unstable_machinery`: exposes the tokenizer and code fragments.
#![allow(clippy::cognitive_complexity)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[macro_use]
mod macros;

mod compiler;
mod error;
mod settings;
mod template;

pub mod syntax;

pub use self::compiler::builtins::ContextFunction;
pub use self::compiler::control::ControlStructureCompiler;
pub use self::compiler::dot::DotSyntaxTransformer;
pub use self::compiler::expression::{CompiledExpr, ExpressionParser};
pub use self::compiler::filters::{Filter, FilterTransformer};
pub use self::compiler::interpolation::ExpressionCompiler;
pub use self::compiler::keywords::is_keyword;
pub use self::compiler::placeholder::{PlaceholderKind, PlaceholderManager};
pub use self::compiler::strings::StringProtector;
pub use self::compiler::variables::{VariableProtector, VariableTransformer};
pub use self::error::{Error, ErrorKind};
pub use self::settings::{ErrorPolicy, MemberHints, MemberKind, Resolution, Settings};
pub use self::syntax::Syntax;
pub use self::template::Compiler;

/// This module gives access to the low level machinery.
///
/// The API in this module is not stable.
#[cfg(feature = "unstable_machinery")]
#[cfg_attr(docsrs, doc(cfg(feature = "unstable_machinery")))]
pub mod machinery {
    #![allow(missing_docs)]
    pub use crate::compiler::codegen::Fragment;
    pub use crate::compiler::lexer::{tokenize, Tokenizer};
    pub use crate::compiler::scan::find_region_end;
    pub use crate::compiler::tokens::{Span, Token};
}
