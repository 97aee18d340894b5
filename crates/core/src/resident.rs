//! Resident records: the eight stored attributes, full records and partial patches.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::id::ResidentId;
use crate::value::{lenient_text, truthy_text};

/// Field-value mapping as stored in a resident hash.
pub type FieldMap = BTreeMap<String, String>;

/// One of the stored resident attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidentField {
    FirstName,
    LastName,
    DateOfBirth,
    Sex,
    HouseholdId,
    EmploymentStatus,
    Occupation,
    Income,
}

impl ResidentField {
    pub const COUNT: usize = 8;

    /// Every attribute, in storage order.
    pub const ALL: [ResidentField; Self::COUNT] = [
        ResidentField::FirstName,
        ResidentField::LastName,
        ResidentField::DateOfBirth,
        ResidentField::Sex,
        ResidentField::HouseholdId,
        ResidentField::EmploymentStatus,
        ResidentField::Occupation,
        ResidentField::Income,
    ];

    /// Wire and hash-field name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResidentField::FirstName => "firstname",
            ResidentField::LastName => "lastname",
            ResidentField::DateOfBirth => "dateofbirth",
            ResidentField::Sex => "sex",
            ResidentField::HouseholdId => "householdID",
            ResidentField::EmploymentStatus => "employmentStatus",
            ResidentField::Occupation => "occupation",
            ResidentField::Income => "income",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for ResidentField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full resident record: identifier plus all eight attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resident {
    id: ResidentId,
    values: [String; ResidentField::COUNT],
}

impl Resident {
    /// Record with every attribute empty.
    pub fn new(id: ResidentId) -> Self {
        Self {
            id,
            values: Default::default(),
        }
    }

    pub fn with(mut self, field: ResidentField, value: impl Into<String>) -> Self {
        self.values[field.index()] = value.into();
        self
    }

    /// Strict parse used by single create: `id` and every attribute must be supplied.
    pub fn from_json(body: &Value) -> DomainResult<Self> {
        let id = body
            .get("id")
            .and_then(ResidentId::from_json)
            .ok_or_else(|| DomainError::validation("missing required field: id"))?;

        let mut resident = Self::new(id);
        for field in ResidentField::ALL {
            let value = body
                .get(field.as_str())
                .and_then(truthy_text)
                .ok_or_else(|| DomainError::validation(format!("missing required field: {field}")))?;
            resident.values[field.index()] = value;
        }
        Ok(resident)
    }

    /// Lenient parse used by bulk ingestion: nothing is rejected.
    ///
    /// Supplied scalars are stored as text even when falsy (`0` → `"0"`);
    /// absent or `null` attributes become empty strings, and a non-object
    /// entry is a record with every field absent. See
    /// [`ResidentId::from_json_lenient`] for the id.
    pub fn from_json_lenient(body: &Value) -> Self {
        let mut resident = Self::new(ResidentId::from_json_lenient(body.get("id")));
        for field in ResidentField::ALL {
            resident.values[field.index()] = lenient_text(body.get(field.as_str()));
        }
        resident
    }

    pub fn id(&self) -> &ResidentId {
        &self.id
    }

    pub fn get(&self, field: ResidentField) -> &str {
        &self.values[field.index()]
    }

    /// `(field, value)` pairs for all eight attributes, in storage order.
    pub fn field_pairs(&self) -> Vec<(String, String)> {
        ResidentField::ALL
            .iter()
            .map(|f| (f.as_str().to_string(), self.values[f.index()].clone()))
            .collect()
    }
}

/// Parse a bulk request body (`{"residents": [...]}`).
///
/// The list must be a non-empty array; the entries themselves are taken as-is.
pub fn parse_bulk(body: &Value) -> DomainResult<Vec<Resident>> {
    match body.get("residents") {
        Some(Value::Array(items)) if !items.is_empty() => {
            Ok(items.iter().map(Resident::from_json_lenient).collect())
        }
        _ => Err(DomainError::validation("residents must be a non-empty list")),
    }
}

/// A partial update: any subset of the attributes.
///
/// Falsy values are treated as not supplied, so a patch can never clear a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidentPatch {
    values: [Option<String>; ResidentField::COUNT],
}

impl ResidentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: ResidentField, value: impl Into<String>) -> Self {
        let value = value.into();
        self.values[field.index()] = (!value.is_empty()).then_some(value);
        self
    }

    /// Parse an update body. Fails when no attribute is supplied.
    ///
    /// An `id` in the body is ignored; the path decides which record changes.
    pub fn from_json(body: &Value) -> DomainResult<Self> {
        let mut patch = Self::new();
        for field in ResidentField::ALL {
            patch.values[field.index()] = body.get(field.as_str()).and_then(truthy_text);
        }
        if patch.is_empty() {
            return Err(DomainError::validation("at least one field is required to update"));
        }
        Ok(patch)
    }

    pub fn get(&self, field: ResidentField) -> Option<&str> {
        self.values[field.index()].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// `(field, value)` pairs for the supplied attributes only.
    pub fn field_pairs(&self) -> Vec<(String, String)> {
        ResidentField::ALL
            .iter()
            .filter_map(|f| {
                self.values[f.index()]
                    .as_ref()
                    .map(|v| (f.as_str().to_string(), v.clone()))
            })
            .collect()
    }
}
