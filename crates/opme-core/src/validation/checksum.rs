//! # Checksum Validators
//!
//! Self-checking national identifiers verified by modular arithmetic.
//!
//! ```text
//! ┌──────────────┬────────┬──────────────────────────────────────────────┐
//! │ Identifier   │ Digits │ Scheme                                       │
//! ├──────────────┼────────┼──────────────────────────────────────────────┤
//! │ CPF          │ 11     │ 2 × mod 11, weights 10..2 then 11..2          │
//! │ CNPJ         │ 14     │ 2 × mod 11, weights 5..2,9..2 then 6..2,9..2  │
//! │ EAN-13       │ 13     │ mod 10, weights 1,3,1,3...                    │
//! │ CNS          │ 15     │ mod 11, weights 15..1 (two series)            │
//! │ NF-e key     │ 44     │ mod 11, weights 2..9 cycling from the right   │
//! └──────────────┴────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Every validator returns the canonical digit string on success. Failures
//! distinguish `wrong_length`, `filler_value` and `check_digit_mismatch`.

use crate::error::ValidationError;
use crate::validation::{
    canonical_digits, canonicalize, require_digits, to_digits, ValidationResult,
};

const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

// =============================================================================
// Shared Arithmetic
// =============================================================================

/// `11 - (Σ dᵢ·wᵢ mod 11)`, with results of 10 or 11 collapsed to 0.
fn mod11_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let dv = 11 - sum % 11;
    if dv >= 10 {
        0
    } else {
        dv
    }
}

fn reject_filler(field: &str, digits: &[u32]) -> ValidationResult<()> {
    if digits.windows(2).all(|pair| pair[0] == pair[1]) {
        return Err(ValidationError::FillerValue {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn mismatch(field: &str) -> ValidationError {
    ValidationError::CheckDigitMismatch {
        field: field.to_string(),
    }
}

// =============================================================================
// CPF (individual tax ID)
// =============================================================================

/// Validates a CPF.
///
/// ## Rules
/// - Exactly 11 digits after stripping punctuation
/// - Not all digits identical (000.000.000-00 ... 999.999.999-99)
/// - Both mod-11 check digits match
///
/// ## Example
/// ```rust
/// use opme_core::validation::checksum::validate_cpf;
///
/// assert_eq!(validate_cpf("529.982.247-25").unwrap(), "52998224725");
/// assert!(validate_cpf("52998224726").is_err());
/// ```
pub fn validate_cpf(raw: &str) -> ValidationResult<String> {
    let cpf = canonical_digits("cpf", raw, 11)?;
    let digits = to_digits(&cpf);
    reject_filler("cpf", &digits)?;

    let first = mod11_check_digit(&digits[..9], &CPF_FIRST_WEIGHTS);
    let second = mod11_check_digit(&digits[..10], &CPF_SECOND_WEIGHTS);

    if first != digits[9] || second != digits[10] {
        return Err(mismatch("cpf"));
    }

    Ok(cpf)
}

// =============================================================================
// CNPJ (company tax ID)
// =============================================================================

/// Validates a CNPJ.
///
/// ## Rules
/// - Exactly 14 digits after stripping punctuation
/// - Not all digits identical
/// - Both mod-11 check digits match
///
/// ## Example
/// ```rust
/// use opme_core::validation::checksum::validate_cnpj;
///
/// assert_eq!(validate_cnpj("11.222.333/0001-81").unwrap(), "11222333000181");
/// assert!(validate_cnpj("11222333000182").is_err());
/// ```
pub fn validate_cnpj(raw: &str) -> ValidationResult<String> {
    let cnpj = canonical_digits("cnpj", raw, 14)?;
    let digits = to_digits(&cnpj);
    reject_filler("cnpj", &digits)?;

    let first = mod11_check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS);
    let second = mod11_check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS);

    if first != digits[12] || second != digits[13] {
        return Err(mismatch("cnpj"));
    }

    Ok(cnpj)
}

/// Validates a tax ID that may be either a CPF or a CNPJ.
///
/// The canonical length picks the rule set: 11 digits → CPF, 14 → CNPJ.
/// Failures are reported under the `tax_id` field.
pub fn validate_tax_id(raw: &str) -> ValidationResult<String> {
    let canonical = canonicalize(raw);
    require_digits("tax_id", &canonical)?;

    let result = match canonical.len() {
        11 => validate_cpf(&canonical),
        14 => validate_cnpj(&canonical),
        actual => Err(ValidationError::WrongLength {
            field: "tax_id".to_string(),
            expected: "11 or 14 digits".to_string(),
            actual,
        }),
    };
    result.map_err(|e| e.with_field("tax_id"))
}

// =============================================================================
// EAN-13 (product barcode)
// =============================================================================

/// Validates an EAN-13 barcode.
///
/// ## Rules
/// - Exactly 13 digits
/// - Check digit = `(10 - (Σ odd·1 + Σ even·3) mod 10) mod 10` over the
///   first 12 digits (positions 1-indexed from the left)
///
/// ## Example
/// ```rust
/// use opme_core::validation::checksum::validate_ean13;
///
/// assert!(validate_ean13("7891234567895").is_ok());
/// assert!(validate_ean13("7891234567890").is_err());
/// ```
pub fn validate_ean13(raw: &str) -> ValidationResult<String> {
    let ean = canonical_digits("ean", raw, 13)?;
    let digits = to_digits(&ean);

    let sum: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    let check = (10 - sum % 10) % 10;

    if check != digits[12] {
        return Err(mismatch("ean"));
    }

    Ok(ean)
}

// =============================================================================
// CNS (health-insurance card)
// =============================================================================

/// Validates a CNS (Cartão Nacional de Saúde) number.
///
/// ## Numbering Series
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────────────┐
/// │ First digit│ Rule                                                     │
/// ├────────────┼──────────────────────────────────────────────────────────┤
/// │ 1, 2       │ Definitive card derived from the 11-digit PIS prefix.    │
/// │            │ s = Σ pisᵢ·(15-i); dv = 11 - s mod 11 (11 → 0).          │
/// │            │ dv == 10 → s += 2, recompute, filler "001"               │
/// │            │ otherwise filler "000". Expected = pis+filler+dv         │
/// │ 7, 8, 9    │ Provisional card: Σ dᵢ·(15-i) over all 15 ≡ 0 (mod 11)   │
/// │ other      │ unknown_series                                           │
/// └────────────┴──────────────────────────────────────────────────────────┘
/// ```
pub fn validate_cns(raw: &str) -> ValidationResult<String> {
    let cns = canonical_digits("cns", raw, 15)?;
    let digits = to_digits(&cns);

    let valid = match digits[0] {
        1 | 2 => definitive_cns(&digits[..11]) == digits.as_slice(),
        7..=9 => weighted_sum_15(&digits) % 11 == 0,
        _ => {
            return Err(ValidationError::UnknownSeries {
                field: "cns".to_string(),
                series: cns.chars().next().unwrap_or('0'),
            })
        }
    };

    if !valid {
        return Err(mismatch("cns"));
    }

    Ok(cns)
}

/// Rebuilds the full 15-digit definitive CNS from its PIS prefix.
fn definitive_cns(pis: &[u32]) -> Vec<u32> {
    let mut sum: u32 = pis.iter().zip((5..=15u32).rev()).map(|(d, w)| d * w).sum();
    let mut dv = 11 - sum % 11;
    let mut filler = [0, 0, 0];

    if dv == 11 {
        dv = 0;
    }
    if dv == 10 {
        sum += 2;
        dv = 11 - sum % 11;
        filler = [0, 0, 1];
    }

    let mut expected = pis.to_vec();
    expected.extend_from_slice(&filler);
    expected.push(dv);
    expected
}

fn weighted_sum_15(digits: &[u32]) -> u32 {
    digits.iter().zip((1..=15u32).rev()).map(|(d, w)| d * w).sum()
}

// =============================================================================
// NF-e access key check digit
// =============================================================================

/// Verifies the 44th digit of an NF-e access key.
///
/// ## Rules
/// - Exactly 44 digits
/// - Weights 2..9 cycle from the rightmost of the first 43 digits
/// - dv = 0 when `Σ mod 11 < 2`, otherwise `11 - Σ mod 11`
///
/// The structural rule ([`crate::validation::structural::validate_access_key`])
/// only checks length; this one is opt-in for callers that want the
/// arithmetic as well.
pub fn validate_access_key_check_digit(raw: &str) -> ValidationResult<String> {
    let key = canonical_digits("access_key", raw, 44)?;
    let digits = to_digits(&key);

    let sum: u32 = digits[..43]
        .iter()
        .rev()
        .zip((2..=9u32).cycle())
        .map(|(d, w)| d * w)
        .sum();
    let remainder = sum % 11;
    let dv = if remainder < 2 { 0 } else { 11 - remainder };

    if dv != digits[43] {
        return Err(mismatch("access_key"));
    }

    Ok(key)
}

// =============================================================================
// Unit Tests
// =============================================================================
