//! # Command Handlers
//!
//! Each handler runs one opme-core operation, logs the outcome and writes
//! one [`Outcome`] to `out`. The return value is the process exit code.
//!
//! ```text
//! field  ─► FieldKind::validate ─┐
//! record ─► RecordKind::validate_json ─┼─► Outcome ─► json | text ─► stdout
//! format ─► FieldKind::format ───┤
//! age    ─► validate_birth_date ─┘
//! ```

use std::io::Write;

use anyhow::{bail, Context as _};
use opme_core::clock::Clock;
use opme_core::error::{CoreError, ValidationError, ValidationFailure};
use opme_core::format::age_in_years;
use opme_core::schema::{FieldKind, RecordKind};
use opme_core::validation::rules::validate_birth_date;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::OutputFormat;

pub const EXIT_ACCEPTED: u8 = 0;
pub const EXIT_REJECTED: u8 = 1;
pub const EXIT_FAILURE: u8 = 2;

/// What every handler needs from the loaded configuration.
pub struct Context {
    pub clock: Box<dyn Clock>,
    pub output: OutputFormat,
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Accepted {
        kind: String,
        value: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        display: Option<String>,
    },
    Rejected {
        kind: String,
        errors: Vec<ValidationFailure>,
    },
}

impl Outcome {
    fn exit_code(&self) -> u8 {
        match self {
            Outcome::Accepted { .. } => EXIT_ACCEPTED,
            Outcome::Rejected { .. } => EXIT_REJECTED,
        }
    }

    fn rejected(kind: &str, err: &ValidationError) -> Self {
        Outcome::Rejected {
            kind: kind.to_string(),
            errors: vec![ValidationFailure::from(err)],
        }
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        match self {
            Outcome::Accepted {
                kind,
                value,
                display,
            } => {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                match display {
                    Some(display) if *display != value => {
                        format!("accepted {}: {} ({})", kind, value, display)
                    }
                    _ => format!("accepted {}: {}", kind, value),
                }
            }
            Outcome::Rejected { kind, errors } => {
                let mut text = format!("rejected {}:", kind);
                for failure in errors {
                    text.push_str(&format!(
                        "\n  {}: {} [{}]",
                        failure.field, failure.message, failure.code
                    ));
                }
                text
            }
        }
    }
}

fn log_failures(kind: &str, errors: &[ValidationFailure]) {
    for failure in errors {
        info!(
            kind,
            field = %failure.field,
            code = %failure.code,
            category = %failure.category,
            "Field rejected"
        );
    }
}

fn emit(ctx: &Context, outcome: &Outcome, out: &mut dyn Write) -> anyhow::Result<u8> {
    if let Outcome::Rejected { kind, errors } = outcome {
        log_failures(kind, errors);
    }
    writeln!(out, "{}", outcome.render(ctx.output)?).context("Failed to write output")?;
    Ok(outcome.exit_code())
}

// =============================================================================
// Handlers
// =============================================================================

/// `opme-check field <kind> <value>`
pub fn run_field(
    ctx: &Context,
    kind: FieldKind,
    raw: &str,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    let today = ctx.clock.today();
    debug!(kind = %kind, %today, "Validating field");

    let outcome = match kind.validate(raw, today) {
        Ok(canonical) => Outcome::Accepted {
            kind: kind.to_string(),
            display: kind.format(&canonical),
            value: serde_json::Value::String(canonical),
        },
        Err(err) => Outcome::rejected(kind.as_str(), &err),
    };

    emit(ctx, &outcome, out)
}

/// `opme-check record <kind> [--file PATH]`, with the file already read.
///
/// Text that is not JSON, or JSON of the wrong shape, is an input error
/// (exit 2), not a rejection.
pub fn run_record(
    ctx: &Context,
    kind: RecordKind,
    text: &str,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    debug!(kind = %kind, bytes = text.len(), "Validating record");

    let value: serde_json::Value =
        serde_json::from_str(text).with_context(|| format!("{} record is not valid JSON", kind))?;

    let outcome = match kind.validate_json(value, ctx.clock.as_ref()) {
        Ok(record) => Outcome::Accepted {
            kind: kind.to_string(),
            value: record,
            display: None,
        },
        Err(CoreError::InvalidRecord { errors, .. }) => Outcome::Rejected {
            kind: kind.to_string(),
            errors: errors.iter().cloned().collect(),
        },
        Err(CoreError::Validation(err)) => Outcome::rejected(kind.as_str(), &err),
        Err(err @ CoreError::MalformedRecord { .. }) => return Err(err.into()),
    };

    emit(ctx, &outcome, out)
}

/// `opme-check format <kind> <value>`
///
/// Formats without validating, the same way the form layer does.
pub fn run_format(
    ctx: &Context,
    kind: FieldKind,
    raw: &str,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    let Some(display) = kind.format(raw) else {
        bail!("{} has no display form", kind);
    };

    let outcome = Outcome::Accepted {
        kind: kind.to_string(),
        value: serde_json::Value::String(display),
        display: None,
    };
    emit(ctx, &outcome, out)
}

/// `opme-check age <birth-date>`
pub fn run_age(ctx: &Context, raw: &str, out: &mut dyn Write) -> anyhow::Result<u8> {
    let today = ctx.clock.today();
    debug!(%today, "Computing age");

    let outcome = match validate_birth_date(raw, today) {
        Ok(birth) => Outcome::Accepted {
            kind: "age".to_string(),
            value: serde_json::Value::from(age_in_years(birth, today)),
            display: None,
        },
        Err(err) => Outcome::rejected("age", &err),
    };

    emit(ctx, &outcome, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use opme_core::clock::FixedClock;

    fn ctx(output: OutputFormat) -> Context {
        Context {
            clock: Box::new(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())),
            output,
        }
    }

    fn run<F>(f: F) -> (u8, String)
    where
        F: FnOnce(&mut dyn Write) -> anyhow::Result<u8>,
    {
        let mut buf = Vec::new();
        let code = f(&mut buf).unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_field_accepted_json() {
        let ctx = ctx(OutputFormat::Json);
        let (code, out) = run(|out| run_field(&ctx, FieldKind::Cnpj, "11.222.333/0001-81", out));
        assert_eq!(code, EXIT_ACCEPTED);

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["value"], "11222333000181");
        assert_eq!(json["display"], "11.222.333/0001-81");
    }

    #[test]
    fn test_field_rejected_json() {
        let ctx = ctx(OutputFormat::Json);
        let (code, out) = run(|out| run_field(&ctx, FieldKind::Cpf, "52998224726", out));
        assert_eq!(code, EXIT_REJECTED);

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["errors"][0]["code"], "check_digit_mismatch");
        assert_eq!(json["errors"][0]["category"], "checksum");
    }

    #[test]
    fn test_field_text_output() {
        let ctx = ctx(OutputFormat::Text);
        let (_, out) = run(|out| run_field(&ctx, FieldKind::Cid10, "i21.0", out));
        assert_eq!(out, "accepted cid10: I21.0\n");

        let (_, out) = run(|out| run_field(&ctx, FieldKind::Ncm, "9021101", out));
        assert_eq!(
            out,
            "rejected ncm:\n  ncm: ncm must be 8 digits, got 7 [wrong_length]\n"
        );
    }

    #[test]
    fn test_record() {
        let ctx = ctx(OutputFormat::Json);
        let record = r#"{ "corporate_name": "Ortho Ltda", "cnpj": "11111111111111" }"#;
        let (code, out) = run(|out| run_record(&ctx, RecordKind::Supplier, record, out));
        assert_eq!(code, EXIT_REJECTED);

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["errors"][0]["field"], "cnpj");
        assert_eq!(json["errors"][0]["category"], "filler");
    }

    #[test]
    fn test_record_input_errors() {
        let ctx = ctx(OutputFormat::Json);
        let mut buf = Vec::new();
        assert!(run_record(&ctx, RecordKind::Supplier, "not json", &mut buf).is_err());
        assert!(run_record(&ctx, RecordKind::Supplier, r#"{"cnpj": 1}"#, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_format_and_age() {
        let ctx = ctx(OutputFormat::Text);
        let (code, out) = run(|out| run_format(&ctx, FieldKind::Amount, "123456", out));
        assert_eq!(code, EXIT_ACCEPTED);
        assert_eq!(out, "accepted amount: R$ 1.234,56\n");

        let mut buf = Vec::new();
        assert!(run_format(&ctx, FieldKind::Sex, "M", &mut buf).is_err());

        let (code, out) = run(|out| run_age(&ctx, "20/08/1990", out));
        assert_eq!(code, EXIT_ACCEPTED);
        assert_eq!(out, "accepted age: 33\n");

        let (code, _) = run(|out| run_age(&ctx, "2024-06-16", out));
        assert_eq!(code, EXIT_REJECTED);
    }
}
