use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use clap::ArgMatches;

mod cli;
mod config;
mod logger;
mod output;

use crate::config::Config;
use crate::output::{Output, STDIN_STDOUT};

fn load_config(matches: &ArgMatches) -> Result<Config, Error> {
    #[cfg(feature = "toml")]
    let mut config = {
        let path = matches
            .get_one::<PathBuf>("config-file")
            .cloned()
            .or_else(|| std::env::var_os("VIEWC_CONFIG_FILE").map(Into::into))
            .or_else(|| {
                home::home_dir()
                    .map(|dir| dir.join(".viewc.toml"))
                    .filter(|path| path.is_file())
            });
        match path {
            Some(path) => Config::load_from_toml(&path)?,
            None => Config::default(),
        }
    };
    #[cfg(not(feature = "toml"))]
    let mut config = Config::default();

    config.update_from_env()?;
    config.update_from_matches(matches)?;
    Ok(config)
}

fn print_config(config: &Config) -> Result<(), Error> {
    #[cfg(feature = "toml")]
    {
        println!("{}", toml::to_string_pretty(config)?);
    }
    #[cfg(not(feature = "toml"))]
    {
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

/// Reads the template, returns the name used in errors and the source.
fn read_template(path: &str) -> Result<(String, String), Error> {
    if path == STDIN_STDOUT {
        let source =
            io::read_to_string(io::stdin()).context("unable to read template from stdin")?;
        Ok(("<stdin>".to_string(), source))
    } else {
        let source = fs::read_to_string(path)
            .with_context(|| format!("unable to read template '{}'", path))?;
        let name = Path::new(path)
            .file_name()
            .map_or_else(|| path.to_string(), |x| x.to_string_lossy().into_owned());
        Ok((name, source))
    }
}

#[cfg(feature = "completions")]
fn generate_completions(shell: &str) -> Result<i32, Error> {
    macro_rules! gen {
        ($shell:expr) => {
            clap_complete::generate(
                $shell,
                &mut cli::make_command(),
                "viewc",
                &mut std::io::stdout(),
            )
        };
    }

    match shell {
        "bash" => gen!(clap_complete::Shell::Bash),
        "zsh" => gen!(clap_complete::Shell::Zsh),
        "elvish" => gen!(clap_complete::Shell::Elvish),
        "fish" => gen!(clap_complete::Shell::Fish),
        "powershell" => gen!(clap_complete::Shell::PowerShell),
        _ => unreachable!(),
    };

    Ok(0)
}

fn execute() -> Result<i32, Error> {
    let matches = cli::make_command().get_matches();
    logger::init(matches.get_flag("verbose"));

    #[cfg(feature = "completions")]
    {
        if let Some(shell) = matches.get_one::<String>("generate-completion") {
            return generate_completions(shell);
        }
    }

    let config = load_config(&matches)?;
    if matches.get_flag("print-config") {
        print_config(&config)?;
        return Ok(0);
    }

    let compiler = config.make_compiler()?;
    let compiled = if let Some(expr) = matches.get_one::<String>("expr") {
        compiler.compile_expression(expr)?
    } else {
        let template = matches
            .get_one::<String>("template")
            .map_or(STDIN_STDOUT, |x| x.as_str());
        let (name, source) = read_template(template)?;
        compiler.compile_template(&name, &source)?
    };

    let mut output = match matches.get_one::<PathBuf>("output") {
        Some(path) => Output::open(path)?,
        None => Output::open(Path::new(STDIN_STDOUT))?,
    };
    if config.newline() {
        writeln!(&mut output, "{compiled}")?;
    } else {
        write!(&mut output, "{compiled}")?;
    }
    output.commit()?;
    Ok(0)
}

pub fn print_error(err: &Error) {
    eprintln!("error: {err}");
    if let Some(err) = err.downcast_ref::<viewc::Error>() {
        if err.template_source().is_some() {
            // the alternate form repeats the message, skip its first line
            let excerpt = format!("{err:#}");
            if let Some((_, excerpt)) = excerpt.split_once('\n') {
                eprintln!("{excerpt}");
            }
        }
    }
    let mut source_opt = err.source();
    while let Some(source) = source_opt {
        eprintln!();
        eprintln!("caused by: {source}");
        source_opt = source.source();
    }
}

fn main() {
    match execute() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            print_error(&err);
            std::process::exit(1);
        }
    }
}
