use std::env;

use anyhow::{anyhow, bail, Context, Error};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use viewc::{Compiler, ErrorPolicy, Syntax};

/// Overrides specific delimiters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyntaxElements {
    block_start: String,
    block_end: String,
    variable_start: String,
    variable_end: String,
    comment_start: String,
    comment_end: String,
}

impl Default for SyntaxElements {
    fn default() -> Self {
        let syntax = Syntax::default();
        SyntaxElements {
            block_start: syntax.block_start.into_owned(),
            block_end: syntax.block_end.into_owned(),
            variable_start: syntax.variable_start.into_owned(),
            variable_end: syntax.variable_end.into_owned(),
            comment_start: syntax.comment_start.into_owned(),
            comment_end: syntax.comment_end.into_owned(),
        }
    }
}

/// Holds in-memory config state for the execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    strict: bool,
    debug: bool,
    newline: bool,
    require_declared: bool,
    methods: Vec<String>,
    properties: Vec<String>,
    syntax: SyntaxElements,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            debug: false,
            newline: true,
            require_declared: false,
            methods: Vec::new(),
            properties: Vec::new(),
            syntax: Default::default(),
        }
    }
}

impl Config {
    pub fn update_from_matches(&mut self, matches: &ArgMatches) -> Result<(), Error> {
        if matches.get_flag("strict") {
            self.strict = true;
        }
        if matches.get_flag("debug") {
            self.debug = true;
        }
        if matches.get_flag("no-newline") {
            self.newline = false;
        }
        if matches.get_flag("require-declared") {
            self.require_declared = true;
        }
        self.methods.extend(
            matches
                .get_many::<String>("method")
                .unwrap_or_default()
                .cloned(),
        );
        self.properties.extend(
            matches
                .get_many::<String>("property")
                .unwrap_or_default()
                .cloned(),
        );
        if let Some(pairs) = matches.get_many::<String>("syntax") {
            self.update_syntax_from_pairs(pairs.map(|x| x.as_str()))?;
        }
        Ok(())
    }

    #[cfg(feature = "toml")]
    pub fn load_from_toml(p: &std::path::Path) -> Result<Config, Error> {
        let contents = std::fs::read_to_string(p)
            .with_context(|| format!("unable to read config file '{}'", p.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("invalid config file '{}'", p.display()))?;
        Ok(cfg)
    }

    pub fn update_from_env(&mut self) -> Result<(), Error> {
        if let Ok(strict) = env::var("VIEWC_STRICT") {
            self.strict = parse_env_bool(&strict, "VIEWC_STRICT")?;
        }
        if let Ok(debug) = env::var("VIEWC_DEBUG") {
            self.debug = parse_env_bool(&debug, "VIEWC_DEBUG")?;
        }
        if let Ok(newline) = env::var("VIEWC_NEWLINE") {
            self.newline = parse_env_bool(&newline, "VIEWC_NEWLINE")?;
        }
        if let Ok(require_declared) = env::var("VIEWC_REQUIRE_DECLARED") {
            self.require_declared =
                parse_env_bool(&require_declared, "VIEWC_REQUIRE_DECLARED")?;
        }
        if let Ok(methods) = env::var("VIEWC_METHODS") {
            self.methods = split_names(&methods);
        }
        if let Ok(properties) = env::var("VIEWC_PROPERTIES") {
            self.properties = split_names(&properties);
        }
        if let Ok(syntax) = env::var("VIEWC_SYNTAX") {
            self.update_syntax_from_pairs(syntax.split_whitespace())?;
        }
        Ok(())
    }

    pub fn newline(&self) -> bool {
        self.newline
    }

    /// Creates a compiler configured from this config.
    pub fn make_compiler(&self) -> Result<Compiler, Error> {
        let mut compiler = Compiler::new();
        compiler.set_policy(if self.strict {
            ErrorPolicy::Strict
        } else {
            ErrorPolicy::Lenient
        });
        compiler.set_debug(self.debug);
        compiler.set_require_declared_members(self.require_declared);
        for name in &self.methods {
            compiler.add_method(name.as_str());
        }
        for name in &self.properties {
            compiler.add_property(name.as_str());
        }
        compiler
            .set_syntax(self.make_syntax())
            .context("could not configure syntax")?;
        Ok(compiler)
    }

    fn make_syntax(&self) -> Syntax {
        let s = &self.syntax;
        Syntax {
            block_start: s.block_start.clone().into(),
            block_end: s.block_end.clone().into(),
            variable_start: s.variable_start.clone().into(),
            variable_end: s.variable_end.clone().into(),
            comment_start: s.comment_start.clone().into(),
            comment_end: s.comment_end.clone().into(),
        }
    }

    fn update_syntax_from_pairs<'a, I>(&mut self, iter: I) -> Result<(), Error>
    where
        I: Iterator<Item = &'a str>,
    {
        let s = &mut self.syntax;

        for pair in iter {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("syntax feature needs to be a key=value pair"))?;

            *match key {
                "block-start" => &mut s.block_start,
                "block-end" => &mut s.block_end,
                "variable-start" => &mut s.variable_start,
                "variable-end" => &mut s.variable_end,
                "comment-start" => &mut s.comment_start,
                "comment-end" => &mut s.comment_end,
                _ => bail!("unknown syntax feature '{}'", key),
            } = value.to_string();
        }

        Ok(())
    }
}

fn split_names(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|x| !x.is_empty())
        .map(String::from)
        .collect()
}

fn parse_env_bool(s: &str, var_name: &str) -> Result<bool, Error> {
    match s.to_lowercase().as_str() {
        "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => bail!("Invalid boolean value for {}: {}", var_name, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!(split_names("total, count  isbn"), ["total", "count", "isbn"]);
        assert!(split_names(" , ").is_empty());
    }

    #[test]
    fn test_syntax_pairs() {
        let mut config = Config::default();
        config
            .update_syntax_from_pairs(["block-start=<%", "block-end=%>"].into_iter())
            .unwrap();
        let syntax = config.make_syntax();
        assert_eq!(syntax.block_start, "<%");
        assert_eq!(syntax.block_end, "%>");
        assert_eq!(syntax.variable_start, "{{");

        let err = config
            .update_syntax_from_pairs(["line-statement-prefix=#"].into_iter())
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown syntax feature 'line-statement-prefix'");
        assert!(config
            .update_syntax_from_pairs(["block-start"].into_iter())
            .is_err());
    }

    #[test]
    fn test_env_bool() {
        assert!(parse_env_bool("Yes", "X").unwrap());
        assert!(!parse_env_bool("off", "X").unwrap());
        assert!(parse_env_bool("maybe", "X").is_err());
    }
}
