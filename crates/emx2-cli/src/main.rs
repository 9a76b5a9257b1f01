//! odm2emx2: REDCap ODM to Molgenis EMX2 converter.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};

use emx2_cli::logging::{LogConfig, init_logging};

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_codelist, run_convert, run_inspect};
use crate::summary::{print_codebook, print_instruments, print_json, print_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let outcome = match &cli.command {
        Command::Convert(args) => run_convert(&cli, args).and_then(|result| {
            if args.json {
                print_json(&result)
            } else {
                print_summary(&result);
                Ok(())
            }
        }),
        Command::Inspect(args) => run_inspect(&cli, args).and_then(|instruments| {
            if args.json {
                print_json(&instruments)
            } else {
                print_instruments(&instruments);
                Ok(())
            }
        }),
        Command::Codelist(args) => run_codelist(&cli, args).and_then(|result| {
            if args.json {
                print_json(&result)
            } else {
                print_codebook(&result);
                Ok(())
            }
        }),
    };
    let exit_code = match outcome {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// `--log-level` beats `-v`/`-q`, which beat `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let config = LogConfig {
        log_file: cli.log_file.clone(),
        with_ansi: match cli.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
        },
        ..LogConfig::default()
    };
    let config = match cli.log_level {
        Some(level) => config.with_level(level.into()),
        None if cli.verbosity.is_present() => {
            config.with_level(cli.verbosity.tracing_level_filter())
        }
        None => config,
    };
    config
        .with_format(cli.log_format.into())
        .with_log_data(cli.log_data)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tracing::level_filters::LevelFilter;

    use emx2_cli::logging::LogFormat;

    use super::*;

    fn config(args: &[&str]) -> LogConfig {
        let cli = Cli::try_parse_from(args.iter().copied()).expect("valid arguments");
        log_config_from_cli(&cli)
    }

    #[test]
    fn defaults_defer_to_environment() {
        let defaults = config(&["odm2emx2", "inspect", "export.xml"]);
        assert!(defaults.use_env_filter);
        assert_eq!(defaults.level_filter, LevelFilter::WARN);
        assert_eq!(defaults.format, LogFormat::Pretty);
        assert!(!defaults.log_data);
    }

    #[test]
    fn explicit_level_beats_verbosity() {
        let explicit = config(&["odm2emx2", "-v", "--log-level", "trace", "convert", "export.xml"]);
        assert!(!explicit.use_env_filter);
        assert_eq!(explicit.level_filter, LevelFilter::TRACE);

        let verbose = config(&["odm2emx2", "-vv", "codelist", "export.xml"]);
        assert_eq!(verbose.level_filter, LevelFilter::DEBUG);
    }

    #[test]
    fn log_file_disables_ansi() {
        let logged = config(&[
            "odm2emx2",
            "--log-file",
            "run.log",
            "--log-format",
            "json",
            "--log-data",
            "convert",
            "export.xml",
        ]);
        assert_eq!(logged.log_file.as_deref(), Some(Path::new("run.log")));
        assert!(!logged.with_ansi);
        assert_eq!(logged.format, LogFormat::Json);
        assert!(logged.log_data);
    }
}
