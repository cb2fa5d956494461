//! # opme-check
//!
//! Re-validates values and records where they are persisted, with the same
//! opme-core rules the entry forms run.
//!
//! ## Usage
//! ```text
//! opme-check field cpf 529.982.247-25
//! opme-check record patient --file patient.json
//! cat line.json | opme-check record invoice-line
//! opme-check format cnpj 11222333000181
//! opme-check age 1990-08-20
//! ```

mod commands;
mod config;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use opme_core::schema::{FieldKind, RecordKind};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::commands::{Context, EXIT_FAILURE};
use crate::config::{OpmeCheckConfig, OutputFormat, DEFAULT_LOG_LEVEL};

/// OPME identifier and regulatory-document validator.
#[derive(Parser, Debug)]
#[command(name = "opme-check", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overriding the configuration (json | text).
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate one value (cpf, cnpj, crm, cid10, amount, ...).
    Field {
        kind: FieldKind,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Validate a JSON record read from a file or stdin.
    Record {
        kind: RecordKind,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the display form of a value, without validating it.
    Format {
        kind: FieldKind,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print age in whole years for a birth date.
    Age { birth_date: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match OpmeCheckConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(DEFAULT_LOG_LEVEL);
            error!("{e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    init_tracing(&config.log.level);
    debug!(
        path = ?config.loaded_from,
        utc_offset_minutes = config.clock.utc_offset_minutes,
        output = %config.output.format,
        "Configuration loaded"
    );

    match run(cli, &config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli, config: &OpmeCheckConfig) -> anyhow::Result<u8> {
    let ctx = Context {
        clock: Box::new(config.clock()?),
        output: cli.output.unwrap_or(config.output.format),
    };
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Field { kind, value } => commands::run_field(&ctx, kind, &value, &mut stdout),
        Commands::Record { kind, file } => {
            let text = read_input(file.as_deref())?;
            commands::run_record(&ctx, kind, &text, &mut stdout)
        }
        Commands::Format { kind, value } => commands::run_format(&ctx, kind, &value, &mut stdout),
        Commands::Age { birth_date } => commands::run_age(&ctx, &birth_date, &mut stdout),
    }
}

/// Reads the whole record from `file`, or from stdin when no file is given.
fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Logs go to stderr so stdout carries only the outcome.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_field() {
        let cli = Cli::try_parse_from(["opme-check", "field", "cpf", "529.982.247-25"]).unwrap();
        match cli.command {
            Commands::Field { kind, value } => {
                assert_eq!(kind, FieldKind::Cpf);
                assert_eq!(value, "529.982.247-25");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_negative_amount() {
        let cli = Cli::try_parse_from(["opme-check", "field", "amount", "-100"]).unwrap();
        assert!(matches!(cli.command, Commands::Field { kind: FieldKind::Amount, .. }));
    }

    #[test]
    fn cli_parse_record_with_global_flags() {
        let cli = Cli::try_parse_from([
            "opme-check",
            "record",
            "invoice-line",
            "--file",
            "line.json",
            "--output",
            "text",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Text));
        match cli.command {
            Commands::Record { kind, file } => {
                assert_eq!(kind, RecordKind::InvoiceLine);
                assert_eq!(file, Some(PathBuf::from("line.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["opme-check", "field", "passport", "123"]).is_err());
        assert!(Cli::try_parse_from(["opme-check", "record", "invoice"]).is_err());
    }
}
