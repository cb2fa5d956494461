//! # Validation Module
//!
//! Field validators for every person, company, product and fiscal document.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Failure Origins                                    │
//! │                                                                         │
//! │  checksum    Arithmetic: CPF, CNPJ, EAN-13, CNS, NF-e key digit        │
//! │  structural  Format:     NCM, CFOP, NF-e key, CRM, RQE, CID-10,        │
//! │                          TUSS, CBHPM, lot, CEP                         │
//! │  rules       Context:    risk class, dates, time, sex, blood type,     │
//! │                          monetary amounts                              │
//! │                                                                         │
//! │  Each layer is independent; none calls into another.                   │
//! │  Record-level composition lives in `crate::schema`.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Call Contract
//! `validate_x(raw) -> Result<Canonical, ValidationError>`
//!
//! - Raw input may carry punctuation (`.`, `-`, `/`, whitespace).
//! - The returned value is canonical: punctuation stripped, case folded
//!   where the identifier is case-insensitive.
//! - The first failed constraint is returned; there is no partial success.
//!
//! ## Usage
//! ```rust
//! use opme_core::validation::{checksum::validate_cpf, optional, structural::validate_rqe};
//!
//! assert_eq!(validate_cpf("529.982.247-25").unwrap(), "52998224725");
//! assert_eq!(optional(Some("  "), validate_rqe).unwrap(), None);
//! ```

pub mod checksum;
pub mod rules;
pub mod structural;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Canonicalization
// =============================================================================

/// Separators that carry no meaning in numeric identifiers.
fn is_separator(c: char) -> bool {
    matches!(c, '.' | '-' | '/') || c.is_whitespace()
}

/// Strips non-significant punctuation (`.`, `-`, `/`, whitespace).
///
/// Anything else is kept so that the digit check can reject it; a letter
/// is never silently dropped.
///
/// ```rust
/// use opme_core::validation::canonicalize;
///
/// assert_eq!(canonicalize("11.222.333/0001-81"), "11222333000181");
/// assert_eq!(canonicalize("529a982"), "529a982");
/// ```
pub fn canonicalize(raw: &str) -> String {
    raw.chars().filter(|c| !is_separator(*c)).collect()
}

/// Canonicalizes `raw` and requires exactly `len` ASCII digits.
pub(crate) fn canonical_digits(field: &str, raw: &str, len: usize) -> ValidationResult<String> {
    let canonical = canonicalize(raw);
    require_digits(field, &canonical)?;

    if canonical.len() != len {
        return Err(ValidationError::WrongLength {
            field: field.to_string(),
            expected: format!("{} digits", len),
            actual: canonical.len(),
        });
    }

    Ok(canonical)
}

/// Rejects empty input and anything that is not an ASCII digit.
pub(crate) fn require_digits(field: &str, canonical: &str) -> ValidationResult<()> {
    if canonical.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !canonical.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidCharset {
            field: field.to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Converts an all-digit string to its digit values.
///
/// Callers guarantee the input passed [`require_digits`].
pub(crate) fn to_digits(canonical: &str) -> Vec<u32> {
    canonical.chars().filter_map(|c| c.to_digit(10)).collect()
}

// =============================================================================
// Text Fields
// =============================================================================

/// Validates a free-text field such as a patient or corporate name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
///
/// ## Returns
/// The trimmed text.
pub fn validate_text(field: &str, raw: &str, max: usize) -> ValidationResult<String> {
    let text = raw.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let count = text.chars().count();
    if count > max {
        return Err(ValidationError::WrongLength {
            field: field.to_string(),
            expected: format!("at most {} characters", max),
            actual: count,
        });
    }

    Ok(text.to_string())
}

// =============================================================================
// Optional Fields
// =============================================================================

/// Lifts a mandatory validator to an optional field.
///
/// `None`, empty and whitespace-only input mean "absent" and yield
/// `Ok(None)`. Anything else must pass `validate` in full, so the wrapped
/// validator itself never has to special-case the empty string.
pub fn optional<T, F>(raw: Option<&str>, validate: F) -> ValidationResult<Option<T>>
where
    F: FnOnce(&str) -> ValidationResult<T>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => validate(value).map(Some),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
