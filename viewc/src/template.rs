use crate::compiler::control::ControlStructureCompiler;
use crate::compiler::expression::ExpressionParser;
use crate::compiler::interpolation::ExpressionCompiler;
use crate::compiler::regions::rewrite_regions;
use crate::error::{line_of, Error};
use crate::settings::{ErrorPolicy, Settings};
use crate::syntax::{StartMarker, Syntax};

/// The compiler for templates.
///
/// The compiler holds the configuration (delimiters, error policy and the
/// declared members of the view model) and compiles template sources to PHP.
/// It does not hold on to any state between calls, so one compiler can be
/// shared between threads.
///
/// ```
/// # use viewc::Compiler;
/// let compiler = Compiler::new();
/// let php = compiler.compile_template("hello.html", "Hello {{ user.name }}!").unwrap();
/// assert_eq!(php, "Hello <?php echo $this->escape($user->name); ?>!");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    settings: Settings,
}

impl Compiler {
    /// Creates a compiler with the default settings.
    pub fn new() -> Compiler {
        Compiler::default()
    }

    /// Creates a compiler from existing settings.
    pub fn with_settings(settings: Settings) -> Compiler {
        Compiler { settings }
    }

    /// Returns the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sets the error policy.
    ///
    /// The default is [`ErrorPolicy::Lenient`].
    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.settings.set_policy(policy);
    }

    /// Changes the delimiters.
    ///
    /// Fails with [`ErrorKind::InvalidDelimiter`](crate::ErrorKind::InvalidDelimiter)
    /// if a delimiter is empty or two start delimiters are the same.
    pub fn set_syntax(&mut self, syntax: Syntax) -> Result<(), Error> {
        self.settings.set_syntax(syntax)
    }

    /// Enables or disables debug mode.
    ///
    /// In debug mode errors carry the template source so they can render an
    /// excerpt around the failing line.
    pub fn set_debug(&mut self, yes: bool) {
        self.settings.set_debug(yes);
    }

    /// Declares a member of the view model as a method.
    pub fn add_method<N: Into<String>>(&mut self, name: N) {
        self.settings.members_mut().add_method(name);
    }

    /// Declares a member of the view model as a property.
    pub fn add_property<N: Into<String>>(&mut self, name: N) {
        self.settings.members_mut().add_property(name);
    }

    /// If enabled, member accesses without parens must be declared.
    pub fn set_require_declared_members(&mut self, yes: bool) {
        self.settings.members_mut().set_require_declared(yes);
    }

    /// Compiles a template source to PHP.
    ///
    /// Comments are removed, control tags and interpolations are compiled in
    /// one sweep over the source.  Generated code is never scanned again.
    pub fn compile_template(&self, name: &str, source: &str) -> Result<String, Error> {
        let mut control = ControlStructureCompiler::new(&self.settings);
        let mut expressions = ExpressionCompiler::new(&self.settings);
        let rv = rewrite_regions(
            source,
            &self.settings,
            Some(name),
            &[StartMarker::Comment, StartMarker::Block, StartMarker::Variable],
            |kind, body| match kind {
                StartMarker::Comment => Ok(Some(String::new())),
                StartMarker::Block => control.compile_tag(body),
                StartMarker::Variable => expressions.compile_region(body),
            },
        );

        match rv {
            Ok(compiled) => {
                log::debug!(
                    "compiled template {} ({} bytes to {} bytes)",
                    name,
                    source.len(),
                    compiled.len()
                );
                Ok(compiled)
            }
            Err(mut err) => {
                err.set_location(name, line_of(source, err.offset().unwrap_or(0)));
                #[cfg(feature = "debug")]
                {
                    if self.settings.debug() {
                        err.attach_template_source(source);
                    }
                }
                Err(err)
            }
        }
    }

    /// Compiles a single expression.
    ///
    /// ```
    /// # use viewc::Compiler;
    /// let compiler = Compiler::new();
    /// let php = compiler.compile_expression("title|upper|trim").unwrap();
    /// assert_eq!(php, "trim(strtoupper($title))");
    /// ```
    pub fn compile_expression(&self, expr: &str) -> Result<String, Error> {
        ExpressionParser::new(&self.settings).parse(expr)
    }
}
