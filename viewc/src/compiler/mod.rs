#![allow(missing_docs)]
//! The rewrite passes from template syntax to PHP.
pub mod builtins;
pub mod codegen;
pub mod control;
pub mod dot;
pub mod expression;
pub mod filters;
pub mod interpolation;
pub mod keywords;
pub mod lexer;
pub mod placeholder;
pub mod regions;
pub mod scan;
pub mod strings;
pub mod tokens;
pub mod variables;
