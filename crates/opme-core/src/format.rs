//! # Formatting Helpers
//!
//! Canonical value → display string, plus small derived computations.
//!
//! ```text
//! ┌──────────────┬───────────────────────┬────────────────────────────────┐
//! │ Value        │ Canonical             │ Display                        │
//! ├──────────────┼───────────────────────┼────────────────────────────────┤
//! │ CPF          │ 52998224725           │ 529.982.247-25                 │
//! │ CNPJ         │ 11222333000181        │ 11.222.333/0001-81             │
//! │ CEP          │ 01310100              │ 01310-100                      │
//! │ Amount       │ 123456                │ R$ 1.234,56                    │
//! │ CRM          │ SP123456              │ CRM/SP 123456                  │
//! │ CID-10       │ i210                  │ I21.0                          │
//! │ NF-e key     │ 3523...0015 (44)      │ 3523 1011 ... 0015             │
//! └──────────────┴───────────────────────┴────────────────────────────────┘
//! ```
//!
//! Formatters do not validate. Input that is not in canonical shape comes
//! back trimmed but otherwise untouched, never as a panic.

use chrono::{Datelike, NaiveDate};

use crate::money::Money;
use crate::types::Uf;
use crate::validation::canonicalize;
use crate::validation::structural::strip_license_label;

/// Label printed in front of physician licenses.
pub const LICENSE_LABEL: &str = "CRM";

/// Inserts `separators[i]` before digit position `at[i]`.
fn punctuate(digits: &str, at: &[(usize, char)]) -> String {
    let mut out = String::with_capacity(digits.len() + at.len());
    for (i, c) in digits.chars().enumerate() {
        if let Some((_, sep)) = at.iter().find(|(pos, _)| *pos == i) {
            out.push(*sep);
        }
        out.push(c);
    }
    out
}

/// Canonical digits of `raw` if it has exactly `len` of them.
fn digits_of_len(raw: &str, len: usize) -> Option<String> {
    let canonical = canonicalize(raw);
    (canonical.len() == len && canonical.chars().all(|c| c.is_ascii_digit())).then_some(canonical)
}

// =============================================================================
// Identifiers
// =============================================================================

/// `52998224725` → `529.982.247-25`.
pub fn format_cpf(cpf: &str) -> String {
    match digits_of_len(cpf, 11) {
        Some(d) => punctuate(&d, &[(3, '.'), (6, '.'), (9, '-')]),
        None => cpf.trim().to_string(),
    }
}

/// `11222333000181` → `11.222.333/0001-81`.
pub fn format_cnpj(cnpj: &str) -> String {
    match digits_of_len(cnpj, 14) {
        Some(d) => punctuate(&d, &[(2, '.'), (5, '.'), (8, '/'), (12, '-')]),
        None => cnpj.trim().to_string(),
    }
}

/// Formats an 11-digit value as CPF and a 14-digit value as CNPJ.
pub fn format_tax_id(tax_id: &str) -> String {
    match canonicalize(tax_id).len() {
        14 => format_cnpj(tax_id),
        _ => format_cpf(tax_id),
    }
}

/// `01310100` → `01310-100`.
pub fn format_cep(cep: &str) -> String {
    match digits_of_len(cep, 8) {
        Some(d) => punctuate(&d, &[(5, '-')]),
        None => cep.trim().to_string(),
    }
}

/// 44-digit NF-e key in eleven space-separated groups of four.
pub fn format_access_key(key: &str) -> String {
    match digits_of_len(key, 44) {
        Some(d) => {
            let groups: Vec<String> = d
                .as_bytes()
                .chunks(4)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect();
            groups.join(" ")
        }
        None => key.trim().to_string(),
    }
}

// =============================================================================
// Money
// =============================================================================

/// Renders centavos as reais: `123456` → `R$ 1.234,56`.
pub fn format_brl(cents: i64) -> String {
    Money::from_cents(cents).to_string()
}

// =============================================================================
// Physician Licenses
// =============================================================================

/// Extracts the issuing unit from a license number.
///
/// Returns `None` (never an error) when the two-letter prefix is not one of
/// the 27 federative units.
///
/// ```rust
/// use opme_core::format::extract_license_uf;
/// use opme_core::types::Uf;
///
/// assert_eq!(extract_license_uf("sp123456"), Some(Uf::Sp));
/// assert_eq!(extract_license_uf("XX123456"), None);
/// ```
pub fn extract_license_uf(license: &str) -> Option<Uf> {
    let canonical = canonicalize(license).to_ascii_uppercase();
    let prefix = strip_license_label(&canonical).get(..2)?;
    Uf::from_abbr(prefix)
}

/// `SP123456` → `CRM/SP 123456`.
///
/// Already-labelled input (`CRM/SP 123456`) formats to itself.
pub fn format_crm(license: &str) -> String {
    let uppercase = canonicalize(license).to_ascii_uppercase();
    let canonical = strip_license_label(&uppercase);
    match (extract_license_uf(canonical), canonical.get(2..)) {
        (Some(uf), Some(number)) if !number.is_empty() => {
            format!("{}/{} {}", LICENSE_LABEL, uf.abbr(), number)
        }
        _ => license.trim().to_string(),
    }
}

// =============================================================================
// Diagnosis Codes
// =============================================================================

/// Uppercases a CID-10 code and inserts `.` after the third character.
///
/// `i210` → `I21.0`; `I21.0` and `I21` are returned uppercased as-is.
pub fn format_cid10(code: &str) -> String {
    let code = code.trim().to_ascii_uppercase();

    if code.contains('.') || code.chars().count() <= 3 {
        return code;
    }

    let mut out = String::with_capacity(code.len() + 1);
    for (i, c) in code.chars().enumerate() {
        if i == 3 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Derived Values
// =============================================================================

/// Age in whole years on `today`.
///
/// A birthday that has not yet happened this year does not count. Someone
/// born on 29 February turns a year older on 1 March in common years.
/// Birth dates after `today` yield 0.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> u32 {
    if birth > today {
        return 0;
    }

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }

    u32::try_from(years).unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Builds a CNPJ from 12 base digits with weights 2..9 cycling from
    /// the right, independent of the validator's weight tables.
    fn build_cnpj(base: &[u32]) -> String {
        let mut digits = base.to_vec();
        for _ in 0..2 {
            let sum: u32 = digits
                .iter()
                .rev()
                .enumerate()
                .map(|(k, d)| d * (2 + (k as u32 % 8)))
                .sum();
            digits.push((sum * 10) % 11 % 10);
        }
        digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect()
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_cpf(" 123 "), "123");
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("abc"), "abc");
        assert_eq!(format_tax_id("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_tax_id("52998224725"), "529.982.247-25");
    }

    #[test]
    fn test_build_cnpj_matches_known_value() {
        let base: Vec<u32> = "112223330001".chars().filter_map(|c| c.to_digit(10)).collect();
        assert_eq!(build_cnpj(&base), "11222333000181");
    }

    #[test]
    fn test_format_cep_and_access_key() {
        assert_eq!(format_cep("01310100"), "01310-100");
        assert_eq!(
            format_access_key("35231011222333000181550010000000011000000015"),
            "3523 1011 2223 3300 0181 5500 1000 0000 0110 0000 0015"
        );
        assert_eq!(format_access_key("123"), "123");
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(1), "R$ 0,01");
        assert_eq!(format_brl(10000), "R$ 100,00");
        assert_eq!(format_brl(123456789), "R$ 1.234.567,89");
    }

    #[test]
    fn test_license_helpers() {
        assert_eq!(format_crm("SP123456"), "CRM/SP 123456");
        assert_eq!(format_crm("rj1234"), "CRM/RJ 1234");
        assert_eq!(format_crm("XX1234"), "XX1234");
        assert_eq!(format_crm("SP"), "SP");
        assert_eq!(format_crm("CRM/SP 123456"), "CRM/SP 123456");

        assert_eq!(extract_license_uf("MG-12345"), Some(Uf::Mg));
        assert_eq!(extract_license_uf("CRM/BA 12345"), Some(Uf::Ba));
        assert_eq!(extract_license_uf("ZZ12345"), None);
        assert_eq!(extract_license_uf("S"), None);
        assert_eq!(extract_license_uf(""), None);
        assert_eq!(extract_license_uf("é1234"), None);
    }

    #[test]
    fn test_format_cid10() {
        assert_eq!(format_cid10("i210"), "I21.0");
        assert_eq!(format_cid10("I2101"), "I21.01");
        assert_eq!(format_cid10("I21.0"), "I21.0");
        assert_eq!(format_cid10("i21"), "I21");
    }

    #[test]
    fn test_age_in_years() {
        let birth = date(1990, 8, 20);
        assert_eq!(age_in_years(birth, date(2024, 8, 19)), 33);
        assert_eq!(age_in_years(birth, date(2024, 8, 20)), 34);
        assert_eq!(age_in_years(birth, date(2024, 12, 31)), 34);
        assert_eq!(age_in_years(birth, birth), 0);
        assert_eq!(age_in_years(date(2030, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_age_leap_day_birthday() {
        let birth = date(2000, 2, 29);
        assert_eq!(age_in_years(birth, date(2023, 2, 28)), 22);
        assert_eq!(age_in_years(birth, date(2023, 3, 1)), 23);
        assert_eq!(age_in_years(birth, date(2024, 2, 29)), 24);
    }

    proptest! {
        /// format(canonicalize(format(x))) == format(x) for valid CNPJs.
        #[test]
        fn cnpj_formatting_is_idempotent(base in proptest::collection::vec(0u32..10, 12)) {
            let cnpj = build_cnpj(&base);
            let once = format_cnpj(&cnpj);
            prop_assert_eq!(format_cnpj(&canonicalize(&once)), once.clone());
            prop_assert_eq!(canonicalize(&once), cnpj);
        }

        #[test]
        fn cpf_formatting_is_idempotent(digits in "[0-9]{11}") {
            let once = format_cpf(&digits);
            prop_assert_eq!(format_cpf(&canonicalize(&once)), once.clone());
            prop_assert_eq!(format_cpf(&once), once);
        }
    }
}
