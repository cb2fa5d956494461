//! # Business-Rule Validators
//!
//! Constraints that need context: the current date, a closed vocabulary, or
//! the monetary conventions of the invoice ledger.
//!
//! ## Temporal Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                yesterday        TODAY        tomorrow                   │
//! │  ──────────────────┼──────────────┼──────────────┼──────────────►       │
//! │  birth date        ✅              ✅             ❌ date_in_future      │
//! │  surgery date      ❌ date_in_past ✅             ✅                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two date rules point in opposite directions and are kept as separate
//! functions. Both take `today` explicitly; nothing here reads the clock.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BloodType, RiskClass, Sex};
use crate::validation::ValidationResult;

/// Largest integer an IEEE-754 double represents exactly (2^53 - 1).
///
/// Amounts arrive from JSON as doubles; anything above this cannot be
/// trusted to be the integer the user typed.
pub const MAX_SAFE_MINOR_UNITS: f64 = 9_007_199_254_740_991.0;

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

static BR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid regex"));

static TIME_OF_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").expect("valid regex"));

// =============================================================================
// Vocabulary Rules
// =============================================================================

/// Validates a device risk class.
///
/// ## Rules
/// - Exactly `I`, `II`, `III` or `IV`
/// - No case folding (`i` fails), no numeral coercion (`1` fails)
///
/// ```rust
/// use opme_core::types::RiskClass;
/// use opme_core::validation::rules::validate_risk_class;
///
/// assert_eq!(validate_risk_class("III").unwrap(), RiskClass::III);
/// assert!(validate_risk_class("V").is_err());
/// ```
pub fn validate_risk_class(raw: &str) -> ValidationResult<RiskClass> {
    RiskClass::parse_exact(raw).ok_or_else(|| ValidationError::NotAllowed {
        field: "risk_class".to_string(),
        allowed: RiskClass::ALL.iter().map(|c| c.as_str().to_string()).collect(),
    })
}

/// Validates a sex code: exactly `M`, `F` or `O` (case-sensitive).
pub fn validate_sex(raw: &str) -> ValidationResult<Sex> {
    Sex::parse_exact(raw).ok_or_else(|| ValidationError::NotAllowed {
        field: "sex".to_string(),
        allowed: Sex::ALL.iter().map(|s| s.code().to_string()).collect(),
    })
}

/// Validates a blood type: one of the 8 ABO/Rh combinations.
///
/// A group without its Rh sign (`A`, `AB`) is rejected.
pub fn validate_blood_type(raw: &str) -> ValidationResult<BloodType> {
    BloodType::parse_exact(raw).ok_or_else(|| ValidationError::NotAllowed {
        field: "blood_type".to_string(),
        allowed: BloodType::ALL.iter().map(|b| b.as_str().to_string()).collect(),
    })
}

// =============================================================================
// Temporal Rules
// =============================================================================

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`.
fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    // chrono alone accepts unpadded fields and a signed year
    let format = if ISO_DATE_RE.is_match(raw) {
        Some("%Y-%m-%d")
    } else if BR_DATE_RE.is_match(raw) {
        Some("%d/%m/%Y")
    } else {
        None
    };

    format
        .and_then(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| ValidationError::InvalidDate {
            field: field.to_string(),
            reason: format!("'{}' is not a calendar date (YYYY-MM-DD or DD/MM/YYYY)", raw),
        })
}

/// Validates a birth date: a calendar date no later than `today`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use opme_core::validation::rules::validate_birth_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// assert!(validate_birth_date("2024-06-15", today).is_ok());
/// assert!(validate_birth_date("2024-06-16", today).is_err());
/// ```
pub fn validate_birth_date(raw: &str, today: NaiveDate) -> ValidationResult<NaiveDate> {
    let date = parse_date("birth_date", raw)?;

    if date > today {
        return Err(ValidationError::DateInFuture {
            field: "birth_date".to_string(),
        });
    }

    Ok(date)
}

/// Validates a procedure/surgery date: a calendar date no earlier than `today`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use opme_core::validation::rules::validate_surgery_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// assert!(validate_surgery_date("15/06/2024", today).is_ok());
/// assert!(validate_surgery_date("14/06/2024", today).is_err());
/// ```
pub fn validate_surgery_date(raw: &str, today: NaiveDate) -> ValidationResult<NaiveDate> {
    let date = parse_date("surgery_date", raw)?;

    if date < today {
        return Err(ValidationError::DateInPast {
            field: "surgery_date".to_string(),
        });
    }

    Ok(date)
}

/// Validates a time of day in strict `HH:MM` (24h, zero-padded).
///
/// `8:30` and `24:00` are rejected.
pub fn validate_time_of_day(raw: &str) -> ValidationResult<NaiveTime> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "time".to_string(),
        });
    }

    let invalid = || ValidationError::PatternMismatch {
        field: "time".to_string(),
        reason: "expected HH:MM with HH 00-23 and MM 00-59".to_string(),
    };

    let caps = TIME_OF_DAY_RE.captures(raw).ok_or_else(invalid)?;
    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

// =============================================================================
// Monetary Rules
// =============================================================================

/// Validates an amount in minor units (centavos) as received from JSON.
///
/// ## Rules
/// - Finite, whole number (`100.5` fails with `not_integer`)
/// - Strictly positive (`0` and `-100` fail with `must_be_positive`)
/// - At most [`MAX_SAFE_MINOR_UNITS`]
///
/// Zero is rejected on purpose: a zero-value line is a data-entry error in
/// the invoice ledger.
///
/// ```rust
/// use opme_core::validation::rules::validate_minor_units;
///
/// assert_eq!(validate_minor_units(10000.0).unwrap().cents(), 10000);
/// assert!(validate_minor_units(0.0).is_err());
/// assert!(validate_minor_units(100.5).is_err());
/// ```
pub fn validate_minor_units(value: f64) -> ValidationResult<Money> {
    let field = || "amount".to_string();

    if !value.is_finite() {
        return Err(ValidationError::NotInteger { field: field() });
    }

    if value <= 0.0 {
        return Err(ValidationError::MustBePositive { field: field() });
    }

    if value.fract() != 0.0 || value > MAX_SAFE_MINOR_UNITS {
        return Err(ValidationError::NotInteger { field: field() });
    }

    Ok(Money::from_cents(value as i64))
}

/// Validates an amount already held as integer centavos.
pub fn validate_amount_cents(cents: i64) -> ValidationResult<Money> {
    let amount = Money::from_cents(cents);

    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(amount)
}

// =============================================================================
// Unit Tests
// =============================================================================
