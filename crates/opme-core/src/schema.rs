//! # Record Schemas
//!
//! Whole-record composition of the field validators.
//!
//! ```text
//! ┌───────────────┐  validate(clock)  ┌──────────────────────────────────┐
//! │ PatientInput  │ ────────────────► │ every field validator runs       │
//! │ (raw strings) │                   │ failures collect in FieldErrors  │
//! └───────────────┘                   └───────────────┬──────────────────┘
//!                                                     │
//!                          ┌──────────────────────────┴──────────────┐
//!                          ▼                                         ▼
//!                 ┌──────────────────┐                  ┌───────────────────────┐
//!                 │ Patient          │                  │ CoreError::           │
//!                 │ (canonical,typed)│                  │ InvalidRecord{errors} │
//!                 └──────────────────┘                  └───────────────────────┘
//! ```
//!
//! A record never stops at its first bad field: the form layer wants every
//! failure at once. Record composition never changes a field's own result,
//! it only collects them. Optional fields go through
//! [`optional`]: empty or whitespace-only input means absent.
//!
//! Input fields default to empty, so a missing JSON key is reported as
//! `required` on that field rather than as a malformed record.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult, FieldErrors, ValidationError};
use crate::format;
use crate::money::Money;
use crate::types::{BloodType, MedicalLicense, RiskClass, Sex, Uf};
use crate::validation::checksum::{
    validate_access_key_check_digit, validate_cnpj, validate_cns, validate_cpf, validate_ean13,
    validate_tax_id,
};
use crate::validation::rules::{
    validate_birth_date, validate_blood_type, validate_minor_units, validate_risk_class,
    validate_sex, validate_surgery_date, validate_time_of_day,
};
use crate::validation::structural::{
    validate_cbhpm, validate_cep, validate_cfop, validate_cid10, validate_crm, validate_lot,
    validate_ncm, validate_rqe, validate_tuss, AccessKey,
};
use crate::validation::{optional, validate_text, ValidationResult};

/// Longest accepted person, company or product name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Plain decimal amount: no exponent, no leading `+`.
static AMOUNT_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid regex"));

// =============================================================================
// Patient
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientInput {
    pub name: String,
    pub cpf: String,
    pub cns: Option<String>,
    pub birth_date: String,
    pub sex: String,
    pub blood_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub name: String,
    pub cpf: String,
    pub cns: Option<String>,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub blood_type: Option<BloodType>,
}

impl PatientInput {
    pub fn validate(&self, clock: &dyn Clock) -> CoreResult<Patient> {
        let today = clock.today();
        let mut errors = FieldErrors::new();

        let name = errors.check(validate_text("name", &self.name, MAX_NAME_LEN));
        let cpf = errors.check(validate_cpf(&self.cpf));
        let cns = errors.check(optional(self.cns.as_deref(), validate_cns));
        let birth_date = errors.check(validate_birth_date(&self.birth_date, today));
        let sex = errors.check(validate_sex(&self.sex));
        let blood_type = errors.check(optional(self.blood_type.as_deref(), validate_blood_type));

        match (name, cpf, cns, birth_date, sex, blood_type) {
            (Some(name), Some(cpf), Some(cns), Some(birth_date), Some(sex), Some(blood_type)) => {
                Ok(Patient {
                    name,
                    cpf,
                    cns,
                    birth_date,
                    sex,
                    blood_type,
                })
            }
            _ => Err(rejected(RecordKind::Patient, errors)),
        }
    }
}

// =============================================================================
// Physician
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhysicianInput {
    pub name: String,
    pub crm: String,
    pub rqe: Option<String>,
    pub cpf: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Physician {
    pub name: String,
    pub crm: MedicalLicense,
    pub rqe: Option<String>,
    pub cpf: Option<String>,
}

impl PhysicianInput {
    pub fn validate(&self) -> CoreResult<Physician> {
        let mut errors = FieldErrors::new();

        let name = errors.check(validate_text("name", &self.name, MAX_NAME_LEN));
        let crm = errors.check(validate_crm(&self.crm));
        let rqe = errors.check(optional(self.rqe.as_deref(), validate_rqe));
        let cpf = errors.check(optional(self.cpf.as_deref(), validate_cpf));

        match (name, crm, rqe, cpf) {
            (Some(name), Some(crm), Some(rqe), Some(cpf)) => Ok(Physician {
                name,
                crm,
                rqe,
                cpf,
            }),
            _ => Err(rejected(RecordKind::Physician, errors)),
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupplierInput {
    pub corporate_name: String,
    pub cnpj: String,
    pub cep: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Supplier {
    pub corporate_name: String,
    pub cnpj: String,
    pub cep: Option<String>,
}

impl SupplierInput {
    pub fn validate(&self) -> CoreResult<Supplier> {
        let mut errors = FieldErrors::new();

        let corporate_name = errors.check(validate_text(
            "corporate_name",
            &self.corporate_name,
            MAX_NAME_LEN,
        ));
        let cnpj = errors.check(validate_cnpj(&self.cnpj));
        let cep = errors.check(optional(self.cep.as_deref(), validate_cep));

        match (corporate_name, cnpj, cep) {
            (Some(corporate_name), Some(cnpj), Some(cep)) => Ok(Supplier {
                corporate_name,
                cnpj,
                cep,
            }),
            _ => Err(rejected(RecordKind::Supplier, errors)),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub description: String,
    pub ean: String,
    pub ncm: String,
    pub risk_class: String,
    pub lot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub description: String,
    pub ean: String,
    pub ncm: String,
    pub risk_class: RiskClass,
    pub lot: Option<String>,
}

impl ProductInput {
    pub fn validate(&self) -> CoreResult<Product> {
        let mut errors = FieldErrors::new();

        let description =
            errors.check(validate_text("description", &self.description, MAX_NAME_LEN));
        let ean = errors.check(validate_ean13(&self.ean));
        let ncm = errors.check(validate_ncm(&self.ncm));
        let risk_class = errors.check(validate_risk_class(&self.risk_class));
        let lot = errors.check(optional(self.lot.as_deref(), validate_lot));

        match (description, ean, ncm, risk_class, lot) {
            (Some(description), Some(ean), Some(ncm), Some(risk_class), Some(lot)) => Ok(Product {
                description,
                ean,
                ncm,
                risk_class,
                lot,
            }),
            _ => Err(rejected(RecordKind::Product, errors)),
        }
    }
}

// =============================================================================
// Surgery
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SurgeryInput {
    pub surgery_date: String,
    pub time: String,
    pub tuss: Option<String>,
    pub cbhpm: Option<String>,
    pub cid10: String,
    pub crm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Surgery {
    pub surgery_date: NaiveDate,
    #[serde(serialize_with = "serialize_hh_mm")]
    pub time: NaiveTime,
    pub tuss: Option<String>,
    pub cbhpm: Option<String>,
    pub cid10: String,
    pub crm: MedicalLicense,
}

impl SurgeryInput {
    /// At least one of `tuss` and `cbhpm` must be present; when both are
    /// absent the failure is reported on `procedure`.
    pub fn validate(&self, clock: &dyn Clock) -> CoreResult<Surgery> {
        let today = clock.today();
        let mut errors = FieldErrors::new();

        let surgery_date = errors.check(validate_surgery_date(&self.surgery_date, today));
        let time = errors.check(validate_time_of_day(&self.time));
        let tuss = errors.check(optional(self.tuss.as_deref(), validate_tuss));
        let cbhpm = errors.check(optional(self.cbhpm.as_deref(), validate_cbhpm));
        let cid10 = errors.check(validate_cid10(&self.cid10));
        let crm = errors.check(validate_crm(&self.crm));

        if let (Some(None), Some(None)) = (&tuss, &cbhpm) {
            errors.push(ValidationError::Required {
                field: "procedure".to_string(),
            });
        }

        match (surgery_date, time, tuss, cbhpm, cid10, crm) {
            (Some(surgery_date), Some(time), Some(tuss), Some(cbhpm), Some(cid10), Some(crm))
                if errors.is_empty() =>
            {
                Ok(Surgery {
                    surgery_date,
                    time,
                    tuss,
                    cbhpm,
                    cid10,
                    crm,
                })
            }
            _ => Err(rejected(RecordKind::Surgery, errors)),
        }
    }
}

fn serialize_hh_mm<S: serde::Serializer>(
    time: &NaiveTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}

// =============================================================================
// Invoice Line
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceLineInput {
    pub access_key: String,
    pub cfop: String,
    pub issuer_cnpj: String,
    /// Amount in centavos. A JSON number; fractions are rejected.
    pub amount_cents: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub access_key: String,
    /// Issuing unit, read from the key's IBGE prefix.
    pub issuer_uf: Uf,
    pub cfop: String,
    pub issuer_cnpj: String,
    pub amount: Money,
}

impl InvoiceLineInput {
    /// The access key must be 44 digits with a matching check digit and a
    /// known IBGE prefix.
    pub fn validate(&self) -> CoreResult<InvoiceLine> {
        let mut errors = FieldErrors::new();

        let key = errors.check(
            validate_access_key_check_digit(&self.access_key).and_then(|key| {
                let parsed = AccessKey::parse(&key)?;
                Ok((key, parsed.uf))
            }),
        );
        let cfop = errors.check(validate_cfop(&self.cfop));
        let issuer_cnpj = errors.check(
            validate_cnpj(&self.issuer_cnpj).map_err(|e| e.with_field("issuer_cnpj")),
        );
        let amount = errors.check(validate_minor_units(self.amount_cents));

        match (key, cfop, issuer_cnpj, amount) {
            (Some((access_key, issuer_uf)), Some(cfop), Some(issuer_cnpj), Some(amount)) => {
                Ok(InvoiceLine {
                    access_key,
                    issuer_uf,
                    cfop,
                    issuer_cnpj,
                    amount,
                })
            }
            _ => Err(rejected(RecordKind::InvoiceLine, errors)),
        }
    }
}

// =============================================================================
// Record Dispatch
// =============================================================================

/// Every record shape the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Patient,
    Physician,
    Supplier,
    Product,
    Surgery,
    InvoiceLine,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Patient,
        RecordKind::Physician,
        RecordKind::Supplier,
        RecordKind::Product,
        RecordKind::Surgery,
        RecordKind::InvoiceLine,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Patient => "patient",
            RecordKind::Physician => "physician",
            RecordKind::Supplier => "supplier",
            RecordKind::Product => "product",
            RecordKind::Surgery => "surgery",
            RecordKind::InvoiceLine => "invoice-line",
        }
    }

    /// Reads `value` as this kind's input, validates it, and returns the
    /// validated record as JSON.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use opme_core::clock::FixedClock;
    /// use opme_core::schema::RecordKind;
    ///
    /// let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    /// let record = serde_json::json!({
    ///     "corporate_name": "Ortho Implantes Ltda",
    ///     "cnpj": "11.222.333/0001-81",
    /// });
    ///
    /// let out = RecordKind::Supplier.validate_json(record, &clock).unwrap();
    /// assert_eq!(out["cnpj"], "11222333000181");
    /// ```
    pub fn validate_json(
        &self,
        value: serde_json::Value,
        clock: &dyn Clock,
    ) -> CoreResult<serde_json::Value> {
        match self {
            RecordKind::Patient => run(*self, value, |input: PatientInput| input.validate(clock)),
            RecordKind::Physician => run(*self, value, |input: PhysicianInput| input.validate()),
            RecordKind::Supplier => run(*self, value, |input: SupplierInput| input.validate()),
            RecordKind::Product => run(*self, value, |input: ProductInput| input.validate()),
            RecordKind::Surgery => run(*self, value, |input: SurgeryInput| input.validate(clock)),
            RecordKind::InvoiceLine => {
                run(*self, value, |input: InvoiceLineInput| input.validate())
            }
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "record_kind".to_string(),
                allowed: RecordKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            })
    }
}

fn rejected(kind: RecordKind, errors: FieldErrors) -> CoreError {
    CoreError::InvalidRecord {
        kind: kind.as_str(),
        errors,
    }
}

fn run<I, O, F>(
    kind: RecordKind,
    value: serde_json::Value,
    validate: F,
) -> CoreResult<serde_json::Value>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(I) -> CoreResult<O>,
{
    let malformed = |e: serde_json::Error| CoreError::MalformedRecord {
        kind: kind.as_str(),
        reason: e.to_string(),
    };

    let input: I = serde_json::from_value(value).map_err(malformed)?;
    let output = validate(input)?;
    serde_json::to_value(output).map_err(malformed)
}

// =============================================================================
// Field Dispatch
// =============================================================================

/// Every single-field validator, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Cpf,
    Cnpj,
    TaxId,
    Ean13,
    Cns,
    Ncm,
    Cfop,
    AccessKey,
    Crm,
    Rqe,
    Cid10,
    Tuss,
    Cbhpm,
    Lot,
    Cep,
    RiskClass,
    BirthDate,
    SurgeryDate,
    TimeOfDay,
    Sex,
    BloodType,
    Amount,
}

impl FieldKind {
    pub const ALL: [FieldKind; 22] = [
        FieldKind::Cpf,
        FieldKind::Cnpj,
        FieldKind::TaxId,
        FieldKind::Ean13,
        FieldKind::Cns,
        FieldKind::Ncm,
        FieldKind::Cfop,
        FieldKind::AccessKey,
        FieldKind::Crm,
        FieldKind::Rqe,
        FieldKind::Cid10,
        FieldKind::Tuss,
        FieldKind::Cbhpm,
        FieldKind::Lot,
        FieldKind::Cep,
        FieldKind::RiskClass,
        FieldKind::BirthDate,
        FieldKind::SurgeryDate,
        FieldKind::TimeOfDay,
        FieldKind::Sex,
        FieldKind::BloodType,
        FieldKind::Amount,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Cpf => "cpf",
            FieldKind::Cnpj => "cnpj",
            FieldKind::TaxId => "tax-id",
            FieldKind::Ean13 => "ean13",
            FieldKind::Cns => "cns",
            FieldKind::Ncm => "ncm",
            FieldKind::Cfop => "cfop",
            FieldKind::AccessKey => "access-key",
            FieldKind::Crm => "crm",
            FieldKind::Rqe => "rqe",
            FieldKind::Cid10 => "cid10",
            FieldKind::Tuss => "tuss",
            FieldKind::Cbhpm => "cbhpm",
            FieldKind::Lot => "lot",
            FieldKind::Cep => "cep",
            FieldKind::RiskClass => "risk-class",
            FieldKind::BirthDate => "birth-date",
            FieldKind::SurgeryDate => "surgery-date",
            FieldKind::TimeOfDay => "time-of-day",
            FieldKind::Sex => "sex",
            FieldKind::BloodType => "blood-type",
            FieldKind::Amount => "amount",
        }
    }

    /// Runs the validator for this kind and returns the canonical value as
    /// a string.
    ///
    /// Dates come back as `YYYY-MM-DD`, times as `HH:MM`, amounts as whole
    /// centavos and licenses as `SP123456`. The access key also has its
    /// check digit verified.
    pub fn validate(&self, raw: &str, today: NaiveDate) -> ValidationResult<String> {
        match self {
            FieldKind::Cpf => validate_cpf(raw),
            FieldKind::Cnpj => validate_cnpj(raw),
            FieldKind::TaxId => validate_tax_id(raw),
            FieldKind::Ean13 => validate_ean13(raw),
            FieldKind::Cns => validate_cns(raw),
            FieldKind::Ncm => validate_ncm(raw),
            FieldKind::Cfop => validate_cfop(raw),
            FieldKind::AccessKey => validate_access_key_check_digit(raw),
            FieldKind::Crm => validate_crm(raw).map(|license| license.canonical()),
            FieldKind::Rqe => validate_rqe(raw),
            FieldKind::Cid10 => validate_cid10(raw),
            FieldKind::Tuss => validate_tuss(raw),
            FieldKind::Cbhpm => validate_cbhpm(raw),
            FieldKind::Lot => validate_lot(raw),
            FieldKind::Cep => validate_cep(raw),
            FieldKind::RiskClass => validate_risk_class(raw).map(|r| r.as_str().to_string()),
            FieldKind::BirthDate => validate_birth_date(raw, today).map(|d| d.to_string()),
            FieldKind::SurgeryDate => validate_surgery_date(raw, today).map(|d| d.to_string()),
            FieldKind::TimeOfDay => {
                validate_time_of_day(raw).map(|t| t.format("%H:%M").to_string())
            }
            FieldKind::Sex => validate_sex(raw).map(|s| s.code().to_string()),
            FieldKind::BloodType => validate_blood_type(raw).map(|b| b.as_str().to_string()),
            FieldKind::Amount => parse_amount_text(raw)
                .and_then(validate_minor_units)
                .map(|m| m.cents().to_string()),
        }
    }

    /// Display form of an already-validated canonical value, for the kinds
    /// that have one.
    pub fn format(&self, canonical: &str) -> Option<String> {
        match self {
            FieldKind::Cpf => Some(format::format_cpf(canonical)),
            FieldKind::Cnpj => Some(format::format_cnpj(canonical)),
            FieldKind::TaxId => Some(format::format_tax_id(canonical)),
            FieldKind::Cep => Some(format::format_cep(canonical)),
            FieldKind::AccessKey => Some(format::format_access_key(canonical)),
            FieldKind::Crm => Some(format::format_crm(canonical)),
            FieldKind::Cid10 => Some(format::format_cid10(canonical)),
            FieldKind::Amount => canonical.trim().parse::<i64>().ok().map(format::format_brl),
            _ => None,
        }
    }
}

/// Reads an amount typed as text, in centavos.
fn parse_amount_text(raw: &str) -> ValidationResult<f64> {
    let text = raw.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "amount".to_string(),
        });
    }

    if !AMOUNT_TEXT_RE.is_match(text) {
        return Err(ValidationError::InvalidCharset {
            field: "amount".to_string(),
            reason: "must be a plain decimal number".to_string(),
        });
    }

    text.parse().map_err(|_| ValidationError::InvalidCharset {
        field: "amount".to_string(),
        reason: "must be a plain decimal number".to_string(),
    })
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "field_kind".to_string(),
                allowed: FieldKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn today() -> NaiveDate {
        clock().0
    }

    fn codes(err: CoreError) -> Vec<(String, String)> {
        match err {
            CoreError::InvalidRecord { errors, .. } => errors
                .iter()
                .map(|f| (f.field.clone(), f.code.clone()))
                .collect(),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    fn patient() -> PatientInput {
        PatientInput {
            name: "Maria Silva".to_string(),
            cpf: "529.982.247-25".to_string(),
            cns: Some("700000000000005".to_string()),
            birth_date: "12/04/1985".to_string(),
            sex: "F".to_string(),
            blood_type: Some("O+".to_string()),
        }
    }

    #[test]
    fn test_valid_patient() {
        let patient = patient().validate(&clock()).unwrap();
        assert_eq!(patient.cpf, "52998224725");
        assert_eq!(
            patient.birth_date,
            NaiveDate::from_ymd_opt(1985, 4, 12).unwrap()
        );
        assert_eq!(patient.sex, Sex::Female);
        assert_eq!(patient.blood_type, Some(BloodType::OPositive));
    }

    #[test]
    fn test_patient_optional_fields_may_be_blank() {
        let input = PatientInput {
            cns: Some("   ".to_string()),
            blood_type: None,
            ..patient()
        };
        let patient = input.validate(&clock()).unwrap();
        assert_eq!(patient.cns, None);
        assert_eq!(patient.blood_type, None);
    }

    #[test]
    fn test_patient_collects_every_failure() {
        let input = PatientInput {
            name: "".to_string(),
            cpf: "111.111.111-11".to_string(),
            cns: Some("123".to_string()),
            birth_date: "2024-06-16".to_string(),
            sex: "f".to_string(),
            blood_type: Some("A".to_string()),
        };
        let codes = codes(input.validate(&clock()).unwrap_err());
        assert_eq!(
            codes,
            vec![
                ("birth_date".to_string(), "date_in_future".to_string()),
                ("blood_type".to_string(), "not_allowed".to_string()),
                ("cns".to_string(), "wrong_length".to_string()),
                ("cpf".to_string(), "filler_value".to_string()),
                ("name".to_string(), "required".to_string()),
                ("sex".to_string(), "not_allowed".to_string()),
            ]
        );
    }

    #[test]
    fn test_physician() {
        let input = PhysicianInput {
            name: "Dr. João Souza".to_string(),
            crm: "CRM/SP 123456".to_string(),
            rqe: Some("12345".to_string()),
            cpf: None,
        };
        let physician = input.validate().unwrap();
        assert_eq!(physician.crm.canonical(), "SP123456");
        assert_eq!(physician.rqe.as_deref(), Some("12345"));

        let input = PhysicianInput {
            rqe: Some("12".to_string()),
            ..input
        };
        assert_eq!(
            codes(input.validate().unwrap_err()),
            vec![("rqe".to_string(), "wrong_length".to_string())]
        );
    }

    #[test]
    fn test_supplier_and_product() {
        let supplier = SupplierInput {
            corporate_name: "Ortho Implantes Ltda".to_string(),
            cnpj: "11.222.333/0001-81".to_string(),
            cep: Some("01310-100".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(supplier.cep.as_deref(), Some("01310100"));

        let product = ProductInput {
            description: "Placa de titânio 6 furos".to_string(),
            ean: "7891234567895".to_string(),
            ncm: "9021.10.10".to_string(),
            risk_class: "III".to_string(),
            lot: Some("L23-0045".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(product.risk_class, RiskClass::III);
        assert_eq!(product.ncm, "90211010");
    }

    #[test]
    fn test_surgery_requires_a_procedure() {
        let input = SurgeryInput {
            surgery_date: "2024-06-15".to_string(),
            time: "07:30".to_string(),
            tuss: None,
            cbhpm: Some("".to_string()),
            cid10: "m17.1".to_string(),
            crm: "SP123456".to_string(),
        };
        assert_eq!(
            codes(input.validate(&clock()).unwrap_err()),
            vec![("procedure".to_string(), "required".to_string())]
        );

        let input = SurgeryInput {
            cbhpm: Some("3.07.15.01-6".to_string()),
            ..input
        };
        let surgery = input.validate(&clock()).unwrap();
        assert_eq!(surgery.cid10, "M17.1");
        assert_eq!(surgery.tuss, None);
    }

    #[test]
    fn test_surgery_in_the_past_is_rejected() {
        let input = SurgeryInput {
            surgery_date: "14/06/2024".to_string(),
            time: "7:30".to_string(),
            tuss: Some("30715016".to_string()),
            cbhpm: None,
            cid10: "M17.1".to_string(),
            crm: "SP123456".to_string(),
        };
        assert_eq!(
            codes(input.validate(&clock()).unwrap_err()),
            vec![
                ("surgery_date".to_string(), "date_in_past".to_string()),
                ("time".to_string(), "pattern_mismatch".to_string()),
            ]
        );
    }

    #[test]
    fn test_invoice_line() {
        let input = InvoiceLineInput {
            access_key: "35231011222333000181550010000000011000000015".to_string(),
            cfop: "5102".to_string(),
            issuer_cnpj: "11222333000181".to_string(),
            amount_cents: 150000.0,
        };
        let line = input.validate().unwrap();
        assert_eq!(line.issuer_uf, Uf::Sp);
        assert_eq!(line.amount, Money::from_cents(150000));

        let input = InvoiceLineInput {
            access_key: "35231011222333000181550010000000011000000016".to_string(),
            cfop: "9102".to_string(),
            issuer_cnpj: "11222333000182".to_string(),
            amount_cents: 0.0,
        };
        assert_eq!(
            codes(input.validate().unwrap_err()),
            vec![
                ("access_key".to_string(), "check_digit_mismatch".to_string()),
                ("amount".to_string(), "must_be_positive".to_string()),
                ("cfop".to_string(), "pattern_mismatch".to_string()),
                ("issuer_cnpj".to_string(), "check_digit_mismatch".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_json() {
        let record = json!({
            "surgery_date": "2024-06-20",
            "time": "07:30",
            "tuss": "30715016",
            "cid10": "m17.1",
            "crm": "sp123456",
        });
        let out = RecordKind::Surgery.validate_json(record, &clock()).unwrap();
        assert_eq!(out["surgery_date"], "2024-06-20");
        assert_eq!(out["time"], "07:30");
        assert_eq!(out["crm"]["uf"], "SP");
        assert_eq!(out["cbhpm"], serde_json::Value::Null);
    }

    #[test]
    fn test_validate_json_missing_and_malformed() {
        let err = RecordKind::Supplier.validate_json(json!({}), &clock()).unwrap_err();
        assert_eq!(
            codes(err),
            vec![
                ("cnpj".to_string(), "required".to_string()),
                ("corporate_name".to_string(), "required".to_string()),
            ]
        );

        let err = RecordKind::Supplier
            .validate_json(json!({ "cnpj": 11222333000181u64 }), &clock())
            .unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { kind: "supplier", .. }));

        let err = RecordKind::Patient.validate_json(json!([1, 2]), &clock()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }

    #[test]
    fn test_invalid_record_message_names_fields() {
        let err = RecordKind::Product
            .validate_json(json!({ "description": "Parafuso", "risk_class": "V" }), &clock())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "product record rejected: invalid ean, ncm, risk_class"
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "invoice-line".parse::<RecordKind>().unwrap(),
            RecordKind::InvoiceLine
        );
        assert_eq!("tax-id".parse::<FieldKind>().unwrap(), FieldKind::TaxId);
        assert_eq!(
            "CPF".parse::<FieldKind>().unwrap_err().code(),
            "not_allowed"
        );
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_field_dispatch() {
        let today = today();
        assert_eq!(
            FieldKind::Cpf.validate("529.982.247-25", today).unwrap(),
            "52998224725"
        );
        assert_eq!(
            FieldKind::Crm.validate("crm/rj 1234", today).unwrap(),
            "RJ1234"
        );
        assert_eq!(
            FieldKind::TimeOfDay.validate("23:59", today).unwrap(),
            "23:59"
        );
        assert_eq!(
            FieldKind::BirthDate.validate("15/06/2024", today).unwrap(),
            "2024-06-15"
        );
        assert_eq!(FieldKind::Amount.validate("10000", today).unwrap(), "10000");
        assert_eq!(
            FieldKind::Amount.validate("100.5", today).unwrap_err().code(),
            "not_integer"
        );
        assert_eq!(
            FieldKind::Amount.validate("abc", today).unwrap_err().code(),
            "invalid_charset"
        );
        assert_eq!(
            FieldKind::RiskClass.validate("i", today).unwrap_err().code(),
            "not_allowed"
        );
    }

    #[test]
    fn test_amount_text_shape() {
        let today = today();
        assert_eq!(FieldKind::Amount.validate(" 250 ", today).unwrap(), "250");
        assert_eq!(FieldKind::Amount.validate("250.0", today).unwrap(), "250");
        assert_eq!(
            FieldKind::Amount.validate("-100", today).unwrap_err().code(),
            "must_be_positive"
        );
        assert_eq!(
            FieldKind::Amount.validate("", today).unwrap_err().code(),
            "required"
        );

        for raw in ["1e3", "+5", "0x10", "inf", "NaN", ".5", "5.", "1 000"] {
            assert_eq!(
                FieldKind::Amount.validate(raw, today).unwrap_err().code(),
                "invalid_charset",
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_field_format_round_trip() {
        let today = today();
        let cases = [
            (FieldKind::Cnpj, "11222333000181", "11.222.333/0001-81"),
            (FieldKind::Crm, "SP 123456", "CRM/SP 123456"),
            (FieldKind::Cid10, "i21.0", "I21.0"),
            (FieldKind::Amount, "123456", "R$ 1.234,56"),
            (FieldKind::Cep, "01310100", "01310-100"),
        ];
        for (kind, raw, display) in cases {
            let canonical = kind.validate(raw, today).unwrap();
            assert_eq!(kind.format(&canonical).as_deref(), Some(display), "{kind}");
        }
        assert_eq!(FieldKind::Sex.format("M"), None);
    }
}
