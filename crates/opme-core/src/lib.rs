//! # opme-core: Identifier and Regulatory-Document Validation
//!
//! Every person, company, product and fiscal document in the OPME ERP passes
//! through this crate before it is accepted. It holds the validators and
//! formatters as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OPME ERP Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Form layer (TypeScript, ts-rs bindings)              │   │
//! │  │    Patient form ──► Surgery form ──► Invoice form               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ same rules, both sides                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ opme-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ checksum  │  │structural │  │   rules   │  │  format   │  │   │
//! │  │   │ CPF CNPJ  │  │ NCM CFOP  │  │ dates     │  │ display   │  │   │
//! │  │   │ EAN CNS   │  │ CRM CID   │  │ enums     │  │ age       │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                         schema (records)                        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO GLOBAL STATE • NO LOGGING • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          opme-check (CLI: server-side re-validation)            │   │
//! │  │              config, logging, exit codes                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`validation`] - Checksum, structural and business-rule validators
//! - [`format`] - Display formatting and derived values (age, UF)
//! - [`schema`] - Whole-record validation and field dispatch
//! - [`types`] - Closed vocabularies (UF, risk class, sex, blood type)
//! - [`money`] - Integer centavos with BRL display
//! - [`clock`] - Where "today" comes from
//! - [`error`] - Failure codes and categories
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input and same `today`, same output
//! 2. **No Partial Acceptance**: a value passes every rule or is rejected
//! 3. **Integer Money**: amounts are centavos (i64), never floats
//! 4. **Stable Codes**: every failure carries a machine-readable reason code
//!
//! ## Example Usage
//!
//! ```rust
//! use opme_core::format::format_cpf;
//! use opme_core::validation::checksum::validate_cpf;
//!
//! let cpf = validate_cpf("529.982.247-25").unwrap();
//! assert_eq!(cpf, "52998224725");
//! assert_eq!(format_cpf(&cpf), "529.982.247-25");
//!
//! let err = validate_cpf("529.982.247-26").unwrap_err();
//! assert_eq!(err.code(), "check_digit_mismatch");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod format;
pub mod money;
pub mod schema;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{
    CoreError, CoreResult, FailureCategory, FieldErrors, ValidationError, ValidationFailure,
};
pub use money::Money;
pub use schema::{FieldKind, RecordKind};
pub use types::*;
pub use validation::ValidationResult;
