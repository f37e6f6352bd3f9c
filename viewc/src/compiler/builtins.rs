//! The operations of the rendering context.
//!
//! Compiled templates run as methods of a view object.  Calls to the names in
//! this module are bound to that object (`url('home')` becomes
//! `$this->url('home')`), everything else is a free function call.

macro_rules! context_functions {
    ($($variant:ident => $name:literal, $method:literal, $markup:literal;)*) => {
        /// A function that is invoked on the current rendering context.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum ContextFunction {
            $(
                #[doc = concat!("`", $name, "(...)`, compiled to `$this->", $method, "(...)`.")]
                $variant,
            )*
        }

        impl ContextFunction {
            /// All context functions.
            pub const ALL: &'static [ContextFunction] = &[$(ContextFunction::$variant,)*];

            /// Looks up a context function by its template name.
            pub fn from_name(name: &str) -> Option<ContextFunction> {
                match name {
                    $($name => Some(ContextFunction::$variant),)*
                    _ => None,
                }
            }

            /// The name templates use.
            pub fn name(self) -> &'static str {
                match self {
                    $(ContextFunction::$variant => $name,)*
                }
            }

            /// The method name on the rendering context.
            pub fn method(self) -> &'static str {
                match self {
                    $(ContextFunction::$variant => $method,)*
                }
            }

            /// Returns `true` if the method returns markup that must not be
            /// escaped again.
            pub fn returns_markup(self) -> bool {
                match self {
                    $(ContextFunction::$variant => $markup,)*
                }
            }
        }
    };
}

context_functions! {
    Url => "url", "url", false;
    Route => "route", "route", false;
    Asset => "asset", "asset", false;
    CsrfField => "csrf_field", "csrfField", true;
    CsrfToken => "csrf_token", "csrfToken", false;
    MethodField => "method_field", "methodField", true;
    Flash => "flash", "flash", false;
    Old => "old", "old", false;
    Errors => "errors", "errors", false;
    Section => "section", "section", true;
    StartSection => "start_section", "startSection", false;
    EndSection => "end_section", "endSection", false;
    Extend => "extend", "extend", false;
    Include => "include", "include", true;
    Request => "request", "request", false;
    Session => "session", "session", false;
    Auth => "auth", "auth", false;
    User => "user", "user", false;
    Config => "config", "config", false;
    Trans => "trans", "trans", false;
}

impl ContextFunction {
    /// Renders a call of this function with already compiled arguments.
    pub fn call(self, args: &str) -> String {
        format!("$this->{}({})", self.method(), args)
    }
}

/// The reserved root of the application accessors (`app.user`).
pub const APP_ROOT: &str = "app";

/// Properties of [`APP_ROOT`] that are rewritten to accessor calls.  Sorted.
pub const APP_PROPERTIES: &[&str] = &[
    "auth", "config", "debug", "env", "locale", "name", "request", "session", "url", "user",
    "version",
];

/// Returns the accessor call for `app.<property>` if `property` is known.
pub fn app_accessor(property: &str) -> Option<String> {
    APP_PROPERTIES
        .binary_search(&property)
        .ok()
        .map(|_| format!("$this->app()->{property}()"))
}

/// The escaping call wrapped around interpolated values.
pub fn escape_call(code: &str) -> String {
    format!("$this->escape({code})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_round_trip() {
        for func in ContextFunction::ALL {
            assert_eq!(ContextFunction::from_name(func.name()), Some(*func));
        }
        assert_eq!(ContextFunction::from_name("strtoupper"), None);
    }

    #[test]
    fn test_markup_functions() {
        let markup: Vec<_> = ContextFunction::ALL
            .iter()
            .filter(|x| x.returns_markup())
            .map(|x| x.name())
            .collect();
        assert_eq!(markup, ["csrf_field", "method_field", "section", "include"]);
    }

    #[test]
    fn test_call() {
        assert_eq!(
            ContextFunction::CsrfField.call(""),
            "$this->csrfField()"
        );
        assert_eq!(
            ContextFunction::Url.call("'home'"),
            "$this->url('home')"
        );
    }

    #[test]
    fn test_app_accessor() {
        let mut sorted = APP_PROPERTIES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, APP_PROPERTIES);
        assert_eq!(
            app_accessor("user").as_deref(),
            Some("$this->app()->user()")
        );
        assert_eq!(app_accessor("path"), None);
    }
}
