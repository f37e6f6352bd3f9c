use std::fs;
use std::io::Write;
use std::process::Command;

use insta_cmd::{assert_cmd_snapshot, get_cargo_bin};
use tempfile::NamedTempFile;

fn cli() -> Command {
    let mut cmd = Command::new(get_cargo_bin("viewc"));
    for (key, _) in std::env::vars() {
        if key.starts_with("VIEWC_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn file_with_contents(contents: &str) -> NamedTempFile {
    file_with_contents_and_ext(contents, ".html")
}

fn file_with_contents_and_ext<X: AsRef<[u8]>>(contents: X, ext: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new()
        .prefix("viewc-testfile--")
        .suffix(ext)
        .tempfile()
        .unwrap();
    f.write_all(contents.as_ref()).unwrap();
    f
}

macro_rules! bind_common_filters {
    ($($expr:expr),*) => {
        let mut settings = insta::Settings::clone_current();
        settings.add_filter(r"viewc-testfile--[^\s:]+", "[TEMPLATE]");
        settings.add_filter(r"\bviewc\.exe\b", "viewc");
        let _guard = settings.bind_to_scope();
    };
}

#[test]
fn test_compile_file() {
    let tmpl = file_with_contents("Hello {{ user.name }}!");

    assert_cmd_snapshot!(
        cli()
            .arg(tmpl.path()),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    Hello <?php echo $this->escape($user->name); ?>!

    ----- stderr -----
    "###);
}

#[test]
fn test_no_newline() {
    let tmpl = file_with_contents("{% if user.isAdmin %}admin{% endif %}");

    assert_cmd_snapshot!(
        cli()
            .arg("--no-newline")
            .arg(tmpl.path()),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    <?php if ($user->isAdmin()): ?>admin<?php endif; ?>
    ----- stderr -----
    "###);
}

#[test]
fn test_stdin_template() {
    assert_cmd_snapshot!(
        cli()
            .arg("-")
            .pass_stdin("{% for item in items %}{{ item|upper }}{% endfor %}"),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    <?php foreach ($items as $item): ?><?php echo $this->escape(strtoupper($item)); ?><?php endforeach; ?>

    ----- stderr -----
    "###);
}

#[test]
fn test_expression() {
    assert_cmd_snapshot!(
        cli()
            .arg("-E")
            .arg("items|length"),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    count($items)

    ----- stderr -----
    "###);
}

#[test]
fn test_output_file() {
    let tmpl = file_with_contents("{{! body }}");
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("page.php");

    assert_cmd_snapshot!(
        cli()
            .arg("-o")
            .arg(&target)
            .arg(tmpl.path()),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    "###);

    assert_eq!(fs::read_to_string(&target).unwrap(), "<?php echo $body; ?>\n");
}

#[test]
fn test_failed_compile_keeps_output_file() {
    let tmpl = file_with_contents("{{ x|1 }}");
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("page.php");
    fs::write(&target, "old").unwrap();

    let status = cli()
        .arg("--strict")
        .arg("-o")
        .arg(&target)
        .arg(tmpl.path())
        .status()
        .unwrap();

    assert!(!status.success());
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
}

#[test]
fn test_lenient_warning() {
    let tmpl = file_with_contents("a {{ x|1 }} {{ y }}");

    bind_common_filters!();

    assert_cmd_snapshot!(
        cli()
            .arg(tmpl.path()),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    a {{ x|1 }} <?php echo $this->escape($y); ?>

    ----- stderr -----
    warning: [TEMPLATE]:1: invalid filter: `1` is not a filter, region left unrewritten
    "###);
}

#[test]
fn test_strict_error() {
    let tmpl = file_with_contents("<h1>\n{{ title }}\n{{ x|1 }}</h1>");

    bind_common_filters!();

    assert_cmd_snapshot!(
        cli()
            .arg("--strict")
            .arg(tmpl.path()),
        @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: invalid filter: `1` is not a filter (in [TEMPLATE]:3)
    "###);
}

#[test]
fn test_strict_error_debug() {
    let tmpl = file_with_contents("<h1>\n{{ title }}\n{{ x|1 }}</h1>");

    bind_common_filters!();

    assert_cmd_snapshot!(
        cli()
            .arg("--strict")
            .arg("--debug")
            .arg(tmpl.path()),
        @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: invalid filter: `1` is not a filter (in [TEMPLATE]:3)
    ---------------------------- Template Source -----------------------------
       1 | <h1>
       2 | {{ title }}
       3 > {{ x|1 }}</h1>
    --------------------------------------------------------------------------
    "###);
}

#[test]
fn test_member_hints() {
    assert_cmd_snapshot!(
        cli()
            .arg("--require-declared")
            .arg("--method")
            .arg("total")
            .arg("-E")
            .arg("cart.total + cart.size"),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    $cart->total() + $cart->size

    ----- stderr -----
    warning: member `size` is not declared, treating it as a property
    "###);
}

#[test]
fn test_member_hints_strict() {
    assert_cmd_snapshot!(
        cli()
            .arg("--strict")
            .arg("--require-declared")
            .arg("--property")
            .arg("total")
            .arg("-E")
            .arg("cart.total + cart.size"),
        @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: ambiguous member access: `size` is neither a declared method nor a declared property
    "###);
}

#[test]
fn test_custom_syntax() {
    let tmpl = file_with_contents("Hi <%= name %>, {{ name }}");

    assert_cmd_snapshot!(
        cli()
            .arg("--syntax")
            .arg("variable-start=<%=")
            .arg("--syntax")
            .arg("variable-end=%>")
            .arg(tmpl.path()),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    Hi <?php echo $this->escape($name); ?>, {{ name }}

    ----- stderr -----
    "###);
}

#[test]
fn test_invalid_syntax() {
    assert_cmd_snapshot!(
        cli()
            .arg("--syntax")
            .arg("block-start={{")
            .arg("-E")
            .arg("x"),
        @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: could not configure syntax

    caused by: invalid delimiter configuration: start delimiters must be distinct
    "###);
}

#[test]
fn test_env_config() {
    assert_cmd_snapshot!(
        cli()
            .env("VIEWC_STRICT", "yes")
            .arg("-")
            .pass_stdin("{{ x|1 }}"),
        @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: invalid filter: `1` is not a filter (in <stdin>:1)
    "###);
}

#[test]
#[cfg(feature = "toml")]
fn test_print_config() {
    let config = file_with_contents_and_ext("", ".toml");

    assert_cmd_snapshot!(
        cli()
            .arg("--config-file")
            .arg(config.path())
            .arg("--strict")
            .arg("--method")
            .arg("total")
            .arg("--syntax")
            .arg("comment-start=<#")
            .arg("--print-config"),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    strict = true
    debug = false
    newline = true
    require-declared = false
    methods = [
        "total",
    ]
    properties = []

    [syntax]
    block-start = "{%"
    block-end = "%}"
    variable-start = "{{"
    variable-end = "}}"
    comment-start = "<#"
    comment-end = "#}"


    ----- stderr -----
    "###);
}

#[test]
#[cfg(feature = "toml")]
fn test_load_config() {
    let config = file_with_contents_and_ext(
        r#"
    strict = true
    properties = ["hasCover"]

    [syntax]
    variable-start = "[["
    variable-end = "]]"
    "#,
        ".toml",
    );

    assert_cmd_snapshot!(
        cli()
            .arg("--config-file")
            .arg(config.path())
            .arg("-")
            .pass_stdin("[[ book.hasCover ]] {{ book.hasCover }}"),
        @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    <?php echo $this->escape($book->hasCover); ?> {{ book.hasCover }}

    ----- stderr -----
    "###);
}
