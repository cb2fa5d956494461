//! # Domain Types
//!
//! Closed vocabularies used by the validators.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │       Uf        │   │   RiskClass     │   │   BloodType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  27 units       │   │  I  (low)       │   │  A+  A-         │       │
//! │  │  abbr "SP"      │   │  II             │   │  B+  B-         │       │
//! │  │  IBGE code 35   │   │  III            │   │  AB+ AB-        │       │
//! │  └─────────────────┘   │  IV (maximum)   │   │  O+  O-         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      Sex        │   │ MedicalLicense  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  M  F  O        │   │  uf + number    │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Vocabulary parsing is exact: no case folding, no numeral coercion.
//! The only case-insensitive lookup is [`Uf::from_abbr`], because license
//! numbers are typed in lowercase often enough to matter.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Federative Units
// =============================================================================

/// Brazilian federative unit (state or federal district).
///
/// Issues physician licenses and appears in the NF-e access key as its
/// numeric IBGE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Uf {
    Ac,
    Al,
    Ap,
    Am,
    Ba,
    Ce,
    Df,
    Es,
    Go,
    Ma,
    Mt,
    Ms,
    Mg,
    Pa,
    Pb,
    Pr,
    Pe,
    Pi,
    Rj,
    Rn,
    Rs,
    Ro,
    Rr,
    Sc,
    Sp,
    Se,
    To,
}

impl Uf {
    /// All 27 units in alphabetical order of their full names.
    pub const ALL: [Uf; 27] = [
        Uf::Ac,
        Uf::Al,
        Uf::Ap,
        Uf::Am,
        Uf::Ba,
        Uf::Ce,
        Uf::Df,
        Uf::Es,
        Uf::Go,
        Uf::Ma,
        Uf::Mt,
        Uf::Ms,
        Uf::Mg,
        Uf::Pa,
        Uf::Pb,
        Uf::Pr,
        Uf::Pe,
        Uf::Pi,
        Uf::Rj,
        Uf::Rn,
        Uf::Rs,
        Uf::Ro,
        Uf::Rr,
        Uf::Sc,
        Uf::Sp,
        Uf::Se,
        Uf::To,
    ];

    /// Two-letter uppercase abbreviation.
    pub const fn abbr(&self) -> &'static str {
        match self {
            Uf::Ac => "AC",
            Uf::Al => "AL",
            Uf::Ap => "AP",
            Uf::Am => "AM",
            Uf::Ba => "BA",
            Uf::Ce => "CE",
            Uf::Df => "DF",
            Uf::Es => "ES",
            Uf::Go => "GO",
            Uf::Ma => "MA",
            Uf::Mt => "MT",
            Uf::Ms => "MS",
            Uf::Mg => "MG",
            Uf::Pa => "PA",
            Uf::Pb => "PB",
            Uf::Pr => "PR",
            Uf::Pe => "PE",
            Uf::Pi => "PI",
            Uf::Rj => "RJ",
            Uf::Rn => "RN",
            Uf::Rs => "RS",
            Uf::Ro => "RO",
            Uf::Rr => "RR",
            Uf::Sc => "SC",
            Uf::Sp => "SP",
            Uf::Se => "SE",
            Uf::To => "TO",
        }
    }

    /// IBGE numeric code, as used in fiscal document keys.
    pub const fn ibge_code(&self) -> u8 {
        match self {
            Uf::Ro => 11,
            Uf::Ac => 12,
            Uf::Am => 13,
            Uf::Rr => 14,
            Uf::Pa => 15,
            Uf::Ap => 16,
            Uf::To => 17,
            Uf::Ma => 21,
            Uf::Pi => 22,
            Uf::Ce => 23,
            Uf::Rn => 24,
            Uf::Pb => 25,
            Uf::Pe => 26,
            Uf::Al => 27,
            Uf::Se => 28,
            Uf::Ba => 29,
            Uf::Mg => 31,
            Uf::Es => 32,
            Uf::Rj => 33,
            Uf::Sp => 35,
            Uf::Pr => 41,
            Uf::Sc => 42,
            Uf::Rs => 43,
            Uf::Ms => 50,
            Uf::Mt => 51,
            Uf::Go => 52,
            Uf::Df => 53,
        }
    }

    /// Looks up a unit by abbreviation, ignoring case.
    pub fn from_abbr(abbr: &str) -> Option<Uf> {
        Uf::ALL
            .into_iter()
            .find(|uf| uf.abbr().eq_ignore_ascii_case(abbr))
    }

    /// Looks up a unit by IBGE code.
    pub fn from_ibge_code(code: u8) -> Option<Uf> {
        Uf::ALL.into_iter().find(|uf| uf.ibge_code() == code)
    }
}

impl fmt::Display for Uf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}

// =============================================================================
// Risk Classification
// =============================================================================

/// Regulatory risk class of a medical device, from I (low) to IV (maximum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RiskClass {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "II")]
    II,
    #[serde(rename = "III")]
    III,
    #[serde(rename = "IV")]
    IV,
}

impl RiskClass {
    pub const ALL: [RiskClass; 4] = [RiskClass::I, RiskClass::II, RiskClass::III, RiskClass::IV];

    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskClass::I => "I",
            RiskClass::II => "II",
            RiskClass::III => "III",
            RiskClass::IV => "IV",
        }
    }

    /// Exact match only: "i", "1" and " I" are all `None`.
    pub fn parse_exact(s: &str) -> Option<RiskClass> {
        RiskClass::ALL.into_iter().find(|class| class.as_str() == s)
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sex
// =============================================================================

/// Patient sex as recorded in the clinical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Other];

    pub const fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
        }
    }

    /// Case-sensitive: "m" is `None`.
    pub fn parse_exact(s: &str) -> Option<Sex> {
        Sex::ALL.into_iter().find(|sex| sex.code() == s)
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Blood Type
// =============================================================================

/// ABO group combined with the Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }

    /// Exact match: "A" without the Rh sign is `None`.
    pub fn parse_exact(s: &str) -> Option<BloodType> {
        BloodType::ALL.into_iter().find(|bt| bt.as_str() == s)
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Medical License
// =============================================================================

/// A CRM (physician license) split into issuing unit and number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MedicalLicense {
    pub uf: Uf,
    /// 4 to 8 digits.
    pub number: String,
}

impl MedicalLicense {
    /// Canonical form, e.g. `SP123456`.
    pub fn canonical(&self) -> String {
        format!("{}{}", self.uf.abbr(), self.number)
    }
}

impl fmt::Display for MedicalLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.uf.abbr(), self.number)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
