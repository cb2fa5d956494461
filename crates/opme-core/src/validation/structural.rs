//! # Structural Validators
//!
//! Fixed-format regulatory codes checked by length, charset and pattern.
//! No arithmetic: the issuing authorities either publish no check-digit
//! scheme, or verifying against their live registry is out of reach here.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────┐
//! │ Code         │ Rule                                                 │
//! ├──────────────┼──────────────────────────────────────────────────────┤
//! │ NCM          │ 8 digits                                             │
//! │ CFOP         │ 4 digits, first digit 1-7                            │
//! │ NF-e key     │ 44 digits                                            │
//! │ CRM          │ UF (2 letters) + 4-8 digits, case-insensitive        │
//! │ RQE          │ 4-8 digits                                           │
//! │ CID-10       │ A00, A00.0, A00.00 (case-insensitive)                │
//! │ TUSS         │ 8 digits                                             │
//! │ CBHPM        │ D.DD.DD.DD-D                                         │
//! │ Lot          │ 3-30 chars, [A-Za-z0-9-]                             │
//! │ CEP          │ 8 digits                                             │
//! └──────────────┴──────────────────────────────────────────────────────┘
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;
use crate::types::{MedicalLicense, Uf};
use crate::validation::{canonical_digits, canonicalize, require_digits, ValidationResult};

static CID10_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][0-9]{2}(\.[0-9]{1,2})?$").expect("valid regex"));

static CBHPM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]\.[0-9]{2}\.[0-9]{2}\.[0-9]{2}-[0-9]$").expect("valid regex")
});

/// Requires between `min` and `max` digits after canonicalization.
fn digits_in_range(field: &str, raw: &str, min: usize, max: usize) -> ValidationResult<String> {
    let canonical = canonicalize(raw);
    require_digits(field, &canonical)?;

    if !(min..=max).contains(&canonical.len()) {
        return Err(ValidationError::WrongLength {
            field: field.to_string(),
            expected: format!("{}-{} digits", min, max),
            actual: canonical.len(),
        });
    }

    Ok(canonical)
}

// =============================================================================
// Fiscal Codes
// =============================================================================

/// Validates an NCM (Mercosur customs classification) code: 8 digits.
///
/// ```rust
/// use opme_core::validation::structural::validate_ncm;
///
/// assert_eq!(validate_ncm("9021.10.10").unwrap(), "90211010");
/// assert!(validate_ncm("9021101").is_err());
/// ```
pub fn validate_ncm(raw: &str) -> ValidationResult<String> {
    canonical_digits("ncm", raw, 8)
}

/// Validates a CFOP (fiscal operation code).
///
/// ## Rules
/// - 4 digits
/// - First digit (operation origin) in `1-7`; `0`, `8`, `9` are reserved
pub fn validate_cfop(raw: &str) -> ValidationResult<String> {
    let cfop = canonical_digits("cfop", raw, 4)?;

    if !matches!(cfop.as_bytes()[0], b'1'..=b'7') {
        return Err(ValidationError::PatternMismatch {
            field: "cfop".to_string(),
            reason: "first digit must be between 1 and 7".to_string(),
        });
    }

    Ok(cfop)
}

/// Validates the shape of an NF-e access key: 44 digits.
///
/// The embedded check digit is verified separately by
/// [`crate::validation::checksum::validate_access_key_check_digit`].
pub fn validate_access_key(raw: &str) -> ValidationResult<String> {
    canonical_digits("access_key", raw, 44)
}

/// The fields packed into a 44-digit NF-e access key.
///
/// ```text
/// cUF  AAMM  CNPJ            mod  série  nNF        tpEmis  cNF       cDV
/// 35   2310  11222333000181  55   001    000000001  1       00000001  5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessKey {
    pub uf: Uf,
    /// Two-digit issue year (`23` for 2023).
    pub year: u8,
    pub month: u8,
    pub issuer_cnpj: String,
    /// Document model (`55` = NF-e, `65` = NFC-e).
    pub model: String,
    pub series: String,
    pub number: String,
    pub emission_type: u8,
    pub numeric_code: String,
    pub check_digit: u8,
}

impl AccessKey {
    /// Splits a structurally valid key into its fields.
    ///
    /// ## Rules
    /// - 44 digits
    /// - Leading IBGE code names one of the 27 units (`unknown_jurisdiction`)
    /// - Issue month in `01-12` (`pattern_mismatch`)
    pub fn parse(raw: &str) -> ValidationResult<AccessKey> {
        let key = validate_access_key(raw)?;
        // all ASCII digits past this point
        let num = |range: std::ops::Range<usize>| -> u8 {
            key[range].bytes().fold(0u8, |acc, b| acc * 10 + (b - b'0'))
        };

        let uf = Uf::from_ibge_code(num(0..2)).ok_or_else(|| ValidationError::UnknownJurisdiction {
            field: "access_key".to_string(),
            code: key[0..2].to_string(),
        })?;

        let month = num(4..6);
        if !(1..=12).contains(&month) {
            return Err(ValidationError::PatternMismatch {
                field: "access_key".to_string(),
                reason: format!("issue month '{}' is not between 01 and 12", &key[4..6]),
            });
        }

        Ok(AccessKey {
            uf,
            year: num(2..4),
            month,
            issuer_cnpj: key[6..20].to_string(),
            model: key[20..22].to_string(),
            series: key[22..25].to_string(),
            number: key[25..34].to_string(),
            emission_type: num(34..35),
            numeric_code: key[35..43].to_string(),
            check_digit: num(43..44),
        })
    }
}

// =============================================================================
// Professional Registrations
// =============================================================================

/// Drops a leading `CRM` label from an uppercased, canonicalized license.
///
/// `CRMSP123456` → `SP123456`. Left alone when the two characters after the
/// label are not letters, so `CRM` can never eat a jurisdiction prefix.
pub(crate) fn strip_license_label(canonical: &str) -> &str {
    match canonical.strip_prefix("CRM") {
        Some(rest)
            if rest.len() > 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic) =>
        {
            rest
        }
        _ => canonical,
    }
}

/// Validates a CRM (physician license).
///
/// ## Rules
/// - Punctuation and an optional leading `CRM` label are ignored
///   (`CRM/SP 123456`, `sp-123456` and `SP123456` are the same license)
/// - 2-letter prefix that names a federative unit
/// - Followed by 4-8 digits
///
/// ## Returns
/// The license with an uppercase jurisdiction.
///
/// ```rust
/// use opme_core::types::Uf;
/// use opme_core::validation::structural::validate_crm;
///
/// let license = validate_crm("sp123456").unwrap();
/// assert_eq!(license.uf, Uf::Sp);
/// assert_eq!(license.number, "123456");
/// ```
pub fn validate_crm(raw: &str) -> ValidationResult<MedicalLicense> {
    let uppercase = canonicalize(raw).to_ascii_uppercase();
    if uppercase.is_empty() {
        return Err(ValidationError::Required {
            field: "crm".to_string(),
        });
    }
    let canonical = strip_license_label(&uppercase);

    let prefix_len = canonical
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    if prefix_len != 2 {
        return Err(ValidationError::PatternMismatch {
            field: "crm".to_string(),
            reason: "must start with a 2-letter jurisdiction".to_string(),
        });
    }

    let (prefix, number) = canonical.split_at(2);
    let uf = Uf::from_abbr(prefix).ok_or_else(|| ValidationError::UnknownJurisdiction {
        field: "crm".to_string(),
        code: prefix.to_string(),
    })?;

    let number = digits_in_range("crm", number, 4, 8).map_err(|e| match e {
        // an empty number is a length problem, not a missing field
        ValidationError::Required { field } => ValidationError::WrongLength {
            field,
            expected: "4-8 digits".to_string(),
            actual: 0,
        },
        other => other,
    })?;

    Ok(MedicalLicense { uf, number })
}

/// Validates an RQE (specialist qualification registration): 4-8 digits.
///
/// Mandatory at this level; records wrap it with
/// [`crate::validation::optional`].
pub fn validate_rqe(raw: &str) -> ValidationResult<String> {
    digits_in_range("rqe", raw, 4, 8)
}

// =============================================================================
// Clinical Codes
// =============================================================================

/// Validates a CID-10 diagnosis code.
///
/// ## Rules
/// - Letters, digits and `.` only
/// - Starts with a letter
/// - Letter + 2 digits, optionally `.` + 1-2 digits
///
/// ## Returns
/// The code uppercased (`i21.0` → `I21.0`).
pub fn validate_cid10(raw: &str) -> ValidationResult<String> {
    let code = raw.trim().to_ascii_uppercase();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "cid10".to_string(),
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        return Err(ValidationError::InvalidCharset {
            field: "cid10".to_string(),
            reason: "must contain only letters, digits and '.'".to_string(),
        });
    }

    if !code.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(ValidationError::PatternMismatch {
            field: "cid10".to_string(),
            reason: "must start with a letter".to_string(),
        });
    }

    if !CID10_RE.is_match(&code) {
        return Err(ValidationError::PatternMismatch {
            field: "cid10".to_string(),
            reason: "expected a letter and 2 digits, optionally followed by '.' and 1-2 digits"
                .to_string(),
        });
    }

    Ok(code)
}

/// Validates a TUSS procedure code: 8 digits.
pub fn validate_tuss(raw: &str) -> ValidationResult<String> {
    canonical_digits("tuss", raw, 8)
}

/// Validates a CBHPM procedure code in its grouped form `D.DD.DD.DD-D`.
///
/// The separators are significant here, so nothing is stripped.
pub fn validate_cbhpm(raw: &str) -> ValidationResult<String> {
    let code = raw.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "cbhpm".to_string(),
        });
    }

    if !code.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return Err(ValidationError::InvalidCharset {
            field: "cbhpm".to_string(),
            reason: "must contain only digits, '.' and '-'".to_string(),
        });
    }

    if !CBHPM_RE.is_match(code) {
        return Err(ValidationError::PatternMismatch {
            field: "cbhpm".to_string(),
            reason: "expected D.DD.DD.DD-D".to_string(),
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Logistics
// =============================================================================

/// Validates a production lot code.
///
/// ## Rules
/// - 3 to 30 characters after trimming
/// - ASCII letters, digits and hyphens only
pub fn validate_lot(raw: &str) -> ValidationResult<String> {
    let lot = raw.trim();

    if lot.is_empty() {
        return Err(ValidationError::Required {
            field: "lot".to_string(),
        });
    }

    let count = lot.chars().count();
    if !(3..=30).contains(&count) {
        return Err(ValidationError::WrongLength {
            field: "lot".to_string(),
            expected: "3-30 characters".to_string(),
            actual: count,
        });
    }

    if !lot.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidCharset {
            field: "lot".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(lot.to_string())
}

/// Validates a CEP (postal code): 8 digits.
pub fn validate_cep(raw: &str) -> ValidationResult<String> {
    canonical_digits("cep", raw, 8)
}

// =============================================================================
// Unit Tests
// =============================================================================
