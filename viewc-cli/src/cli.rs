use std::path::PathBuf;

use clap::{arg, command, value_parser, ArgAction, Command};

const MEMBERS: &str = "Member Hints";

pub(super) fn make_command() -> Command {
    command!()
        .name("viewc")
        .max_term_width(120)
        .args([
            #[cfg(feature = "toml")]
            arg!(--"config-file" <PATH> "Alternative path to the config file")
                .value_parser(value_parser!(PathBuf))
                .long_help("\
                    Sets an alternative path to the config file.  By default the config file \
                    is loaded from $HOME/.viewc.toml if it exists.\n\n\
                    \
                    To see the possible config values use --print-config which will print the \
                    current state of the config.\n\n\
                    [env var: VIEWC_CONFIG_FILE]"),
            arg!(--strict "Fail on the first region that cannot be compiled")
                .long_help("\
                    Fail on the first region that cannot be compiled.\n\n\
                    \
                    By default such regions are copied to the output as they are and a \
                    warning is printed.\n\n\
                    [env var: VIEWC_STRICT]"),
            arg!(--debug "Show the template source around errors")
                .long_help("\
                    Show the template source around errors.\n\n\
                    [env var: VIEWC_DEBUG]"),
            arg!(-E --expr <EXPR> "Compile an expression instead of a template")
                .conflicts_with("template"),
            arg!(--method <NAME> "Declare a member of the view model as a method")
                .action(ArgAction::Append)
                .help_heading(MEMBERS),
            arg!(--property <NAME> "Declare a member of the view model as a property")
                .action(ArgAction::Append)
                .help_heading(MEMBERS),
            arg!(--"require-declared" "Only allow declared members without parens")
                .long_help("\
                    Only allow members that were declared with --method or --property to be \
                    accessed without parens.  Other members are an error with --strict, \
                    otherwise a warning.\n\n\
                    [env var: VIEWC_REQUIRE_DECLARED]")
                .help_heading(MEMBERS),
            arg!(--syntax <PAIR> "Changes a delimiter (key=value)")
                .long_help("\
                    Changes a delimiter.  The value is a key=value pair where the key is one of \
                    block-start, block-end, variable-start, variable-end, comment-start and \
                    comment-end.\n\n\
                    [env var: VIEWC_SYNTAX, space separated pairs]")
                .action(ArgAction::Append),
            arg!(--"no-newline" "Do not output a trailing newline"),
            arg!(-v --verbose "Print debug information to stderr"),
            arg!(-o --output <FILENAME> "Path to the output file")
                .long_help("\
                    Path to the output file.  '-' (the default) writes to stdout.  Files are \
                    written atomically, if compilation fails the original file remains.")
                .default_value("-")
                .value_parser(value_parser!(PathBuf)),
            arg!(--"print-config" "Print out the loaded config"),
            #[cfg(feature = "completions")]
            arg!(--"generate-completion" <SH> "Generate a completion script for the given shell")
                .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                .help_heading("Shell Support"),
            arg!(template: [TEMPLATE] "Path to the input template")
                .long_help("\
                    Path to the input template.  If not provided this defaults to '-' which \
                    means the template is read from stdin.")
                .default_value("-"),
        ])
        .about("viewc compiles view templates to PHP.")
        .after_help("Compiled templates are written to stdout unless --output is given.")
}
