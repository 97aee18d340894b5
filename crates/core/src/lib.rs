//! `registry-core` — resident domain model.
//!
//! This crate contains **pure domain** types and parsing rules (no storage or HTTP).

pub mod error;
pub mod id;
pub mod resident;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use id::{ResidentId, KEY_PATTERN, KEY_PREFIX, MISSING_ID};
pub use resident::{parse_bulk, FieldMap, Resident, ResidentField, ResidentPatch};
