//! # Error Types
//!
//! Domain-specific error types for opme-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  opme-core errors (this file)                                          │
//! │  ├── ValidationError   - One field failed one rule                     │
//! │  ├── ValidationFailure - Serializable form of the above (wire type)    │
//! │  ├── FieldErrors       - Every failed field of one record              │
//! │  └── CoreError         - Record-level rejection                        │
//! │                                                                         │
//! │  opme-check errors (app)                                               │
//! │  └── ConfigError       - Bad configuration file / environment          │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → CoreError → CLI / form layer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Categories
//! ```text
//! ┌──────────────┬──────────────────────────────────────┬─────────────────┐
//! │ Category     │ Example                              │ Reason codes    │
//! ├──────────────┼──────────────────────────────────────┼─────────────────┤
//! │ Format       │ NCM has 7 digits instead of 8        │ wrong_length,   │
//! │              │                                      │ invalid_charset,│
//! │              │                                      │ pattern_mismatch│
//! │ Checksum     │ CPF check digit does not match       │ check_digit_... │
//! │ Filler       │ 111.111.111-11                       │ filler_value    │
//! │ Vocabulary   │ risk class "V"                       │ not_allowed     │
//! │ Temporal     │ birth date tomorrow                  │ date_in_future  │
//! │ Range        │ zero-value invoice line              │ must_be_positive│
//! └──────────────┴──────────────────────────────────────┴─────────────────┘
//! ```
//!
//! Every failure is recoverable by user correction. Nothing in this crate
//! panics on bad input.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Validation Error
// =============================================================================

/// A single field failing a single rule.
///
/// The first rule that fails wins; validators never report partial success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value has the wrong number of significant characters.
    ///
    /// `expected` is human-readable ("11 digits", "3-30 characters").
    #[error("{field} must be {expected}, got {actual}")]
    WrongLength {
        field: String,
        expected: String,
        actual: usize,
    },

    /// Value contains characters outside the allowed set.
    #[error("{field} has invalid characters: {reason}")]
    InvalidCharset { field: String, reason: String },

    /// Value has the right characters but the wrong shape.
    #[error("{field} has invalid format: {reason}")]
    PatternMismatch { field: String, reason: String },

    /// Every digit is the same (placeholder such as 000.000.000-00).
    ///
    /// These often pass naive checksums, so they are rejected before any
    /// arithmetic runs. Upstream flags them as likely fraud or filler.
    #[error("{field} cannot have all digits identical")]
    FillerValue { field: String },

    /// Computed check digit(s) differ from the ones supplied.
    #[error("{field} check digit does not match")]
    CheckDigitMismatch { field: String },

    /// Leading digit does not belong to a known numbering series.
    #[error("{field} series '{series}' is not a valid numbering series")]
    UnknownSeries { field: String, series: char },

    /// Value is not in the closed vocabulary.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Jurisdiction code is not one of the 27 federative units.
    #[error("{field} jurisdiction '{code}' is not recognized")]
    UnknownJurisdiction { field: String, code: String },

    /// Value does not parse as a calendar date or time.
    #[error("{field} is not a valid date: {reason}")]
    InvalidDate { field: String, reason: String },

    /// Date is later than today.
    #[error("{field} cannot be in the future")]
    DateInFuture { field: String },

    /// Date is earlier than today.
    #[error("{field} cannot be in the past")]
    DateInPast { field: String },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Fractional minor units (e.g. 100.5 centavos).
    #[error("{field} must be a whole number of centavos")]
    NotInteger { field: String },
}

impl ValidationError {
    /// Stable, machine-readable reason code.
    ///
    /// The form layer keys UI behaviour off this string; never rename one.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required { .. } => "required",
            ValidationError::WrongLength { .. } => "wrong_length",
            ValidationError::InvalidCharset { .. } => "invalid_charset",
            ValidationError::PatternMismatch { .. } => "pattern_mismatch",
            ValidationError::FillerValue { .. } => "filler_value",
            ValidationError::CheckDigitMismatch { .. } => "check_digit_mismatch",
            ValidationError::UnknownSeries { .. } => "unknown_series",
            ValidationError::NotAllowed { .. } => "not_allowed",
            ValidationError::UnknownJurisdiction { .. } => "unknown_jurisdiction",
            ValidationError::InvalidDate { .. } => "invalid_date",
            ValidationError::DateInFuture { .. } => "date_in_future",
            ValidationError::DateInPast { .. } => "date_in_past",
            ValidationError::MustBePositive { .. } => "must_be_positive",
            ValidationError::NotInteger { .. } => "not_integer",
        }
    }

    /// Which failure origin this error belongs to.
    pub fn category(&self) -> FailureCategory {
        match self {
            ValidationError::Required { .. }
            | ValidationError::WrongLength { .. }
            | ValidationError::InvalidCharset { .. }
            | ValidationError::PatternMismatch { .. }
            | ValidationError::UnknownSeries { .. }
            | ValidationError::InvalidDate { .. } => FailureCategory::Format,
            ValidationError::CheckDigitMismatch { .. } => FailureCategory::Checksum,
            ValidationError::FillerValue { .. } => FailureCategory::Filler,
            ValidationError::NotAllowed { .. } | ValidationError::UnknownJurisdiction { .. } => {
                FailureCategory::Vocabulary
            }
            ValidationError::DateInFuture { .. } | ValidationError::DateInPast { .. } => {
                FailureCategory::Temporal
            }
            ValidationError::MustBePositive { .. } | ValidationError::NotInteger { .. } => {
                FailureCategory::Range
            }
        }
    }

    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::WrongLength { field, .. }
            | ValidationError::InvalidCharset { field, .. }
            | ValidationError::PatternMismatch { field, .. }
            | ValidationError::FillerValue { field }
            | ValidationError::CheckDigitMismatch { field }
            | ValidationError::UnknownSeries { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::UnknownJurisdiction { field, .. }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::DateInFuture { field }
            | ValidationError::DateInPast { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::NotInteger { field } => field,
        }
    }

    /// Re-labels the failure with another field name.
    ///
    /// Record validators use this when one validator backs several fields
    /// (e.g. the issuer CNPJ and the supplier CNPJ).
    pub fn with_field(mut self, name: &str) -> Self {
        match &mut self {
            ValidationError::Required { field }
            | ValidationError::WrongLength { field, .. }
            | ValidationError::InvalidCharset { field, .. }
            | ValidationError::PatternMismatch { field, .. }
            | ValidationError::FillerValue { field }
            | ValidationError::CheckDigitMismatch { field }
            | ValidationError::UnknownSeries { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::UnknownJurisdiction { field, .. }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::DateInFuture { field }
            | ValidationError::DateInPast { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::NotInteger { field } => *field = name.to_string(),
        }
        self
    }
}

// =============================================================================
// Failure Category
// =============================================================================

/// Failure origin, used by the form layer to pick a rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Wrong length, charset or sub-pattern.
    Format,
    /// Check-digit arithmetic mismatch.
    Checksum,
    /// All-identical placeholder value.
    Filler,
    /// Value outside a closed vocabulary.
    Vocabulary,
    /// Date on the wrong side of today.
    Temporal,
    /// Monetary amount out of the accepted range.
    Range,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCategory::Format => "format",
            FailureCategory::Checksum => "checksum",
            FailureCategory::Filler => "filler",
            FailureCategory::Vocabulary => "vocabulary",
            FailureCategory::Temporal => "temporal",
            FailureCategory::Range => "range",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Validation Failure (wire type)
// =============================================================================

/// What the form layer receives for a rejected field.
///
/// ```json
/// {
///   "field": "cpf",
///   "code": "check_digit_mismatch",
///   "category": "checksum",
///   "message": "cpf check digit does not match"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ValidationFailure {
    pub field: String,
    pub code: String,
    pub category: FailureCategory,
    pub message: String,
}

impl From<&ValidationError> for ValidationFailure {
    fn from(err: &ValidationError) -> Self {
        ValidationFailure {
            field: err.field().to_string(),
            code: err.code().to_string(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

impl From<ValidationError> for ValidationFailure {
    fn from(err: ValidationError) -> Self {
        ValidationFailure::from(&err)
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Every failed field of one record, keyed by field name.
///
/// Ordered so that the same record always serializes the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, ValidationFailure>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the failure of `result`, if any, and passes the value through.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    /// Adds a failure. The first failure per field is kept.
    pub fn push(&mut self, err: ValidationError) {
        self.0
            .entry(err.field().to_string())
            .or_insert_with(|| ValidationFailure::from(&err));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&ValidationFailure> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.values()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{}", fields.join(", "))
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Record-level errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// At least one field of the record was rejected.
    #[error("{kind} record rejected: invalid {errors}")]
    InvalidRecord {
        kind: &'static str,
        errors: FieldErrors,
    },

    /// The record could not be read into its input shape (wrong JSON types,
    /// not an object).
    #[error("{kind} record is malformed: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::WrongLength {
            field: "ncm".to_string(),
            expected: "8 digits".to_string(),
            actual: 7,
        };
        assert_eq!(err.to_string(), "ncm must be 8 digits, got 7");

        let err = ValidationError::FillerValue {
            field: "cnpj".to_string(),
        };
        assert_eq!(err.to_string(), "cnpj cannot have all digits identical");
    }

    #[test]
    fn test_codes_and_categories() {
        let err = ValidationError::CheckDigitMismatch {
            field: "cpf".to_string(),
        };
        assert_eq!(err.code(), "check_digit_mismatch");
        assert_eq!(err.category(), FailureCategory::Checksum);

        let err = ValidationError::DateInPast {
            field: "surgery_date".to_string(),
        };
        assert_eq!(err.code(), "date_in_past");
        assert_eq!(err.category(), FailureCategory::Temporal);

        let err = ValidationError::NotInteger {
            field: "amount".to_string(),
        };
        assert_eq!(err.category(), FailureCategory::Range);
    }

    #[test]
    fn test_failure_serializes_for_form_layer() {
        let err = ValidationError::NotAllowed {
            field: "risk_class".to_string(),
            allowed: vec!["I".to_string(), "II".to_string()],
        };
        let json = serde_json::to_value(ValidationFailure::from(&err)).unwrap();
        assert_eq!(json["field"], "risk_class");
        assert_eq!(json["code"], "not_allowed");
        assert_eq!(json["category"], "vocabulary");
        assert_eq!(
            json["message"],
            "risk_class must be one of: [\"I\", \"II\"]"
        );
    }

    #[test]
    fn test_with_field_relabels() {
        let err = ValidationError::Required {
            field: "cnpj".to_string(),
        }
        .with_field("issuer_cnpj");
        assert_eq!(err.field(), "issuer_cnpj");
        assert_eq!(err.to_string(), "issuer_cnpj is required");
    }

    #[test]
    fn test_field_errors_keeps_first_failure_per_field() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.check::<u8>(Ok(1)), Some(1));
        errors.push(ValidationError::Required {
            field: "cpf".to_string(),
        });
        errors.push(ValidationError::CheckDigitMismatch {
            field: "cpf".to_string(),
        });
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("cpf").map(|f| f.code.as_str()), Some("required"));
    }

    #[test]
    fn test_invalid_record_message_lists_fields() {
        let mut errors = FieldErrors::new();
        errors.push(ValidationError::Required {
            field: "name".to_string(),
        });
        errors.push(ValidationError::FillerValue {
            field: "cpf".to_string(),
        });
        let err = CoreError::InvalidRecord {
            kind: "patient",
            errors,
        };
        assert_eq!(
            err.to_string(),
            "patient record rejected: invalid cpf, name"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cpf".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
