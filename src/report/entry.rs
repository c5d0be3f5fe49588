//! Visit report entries
//!
//! [`EntryPayload`] is the raw JSON shape. [`Entry`] is a payload that passed
//! validation. A field that is missing, `null` or `""` is absent; there is no
//! separate "present but empty" state.

use serde_json::{Map, Value};

use super::schema::Field;
use crate::error::ValidationError;

/// Report as received, keyed by header name (camelCase aliases accepted)
#[derive(Debug, Default)]
pub struct EntryPayload {
    pub timestamp: Option<String>,
    pub date: Option<String>,
    pub officer_name: Option<String>,
    pub planned_areas: Option<String>,
    pub actual_areas: Option<String>,
    pub doctors_visited: Option<String>,
    pub pharmacies_visited: Option<String>,
    pub orders: Option<String>,
    pub returns: Option<String>,
    pub notes: Option<String>,
}

impl EntryPayload {
    /// Interpret an already parsed JSON value as a report payload
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Null => Err(ValidationError::NoData),
            Value::Object(map) => Ok(Self::from_map(&map)),
            other => Err(ValidationError::InvalidJson(format!(
                "expected an object of report fields, found {}",
                kind(&other)
            ))),
        }
    }

    /// Parse report JSON text
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// The header key decides when present, even if its value is empty
    fn from_map(map: &Map<String, Value>) -> Self {
        let text = |field: Field| {
            map.get(field.header())
                .or_else(|| map.get(field.alias()))
                .and_then(lenient_text)
        };
        Self {
            timestamp: text(Field::Timestamp),
            date: text(Field::Date),
            officer_name: text(Field::OfficerName),
            planned_areas: text(Field::PlannedAreas),
            actual_areas: text(Field::ActualAreas),
            doctors_visited: text(Field::DoctorsVisited),
            pharmacies_visited: text(Field::PharmaciesVisited),
            orders: text(Field::Orders),
            returns: text(Field::Returns),
            notes: text(Field::Notes),
        }
    }
}

/// Scalars become text, `null` and `""` become absent
fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => (!s.is_empty()).then(|| s.clone()),
        other => Some(other.to_string()),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validated visit report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    date: String,
    officer_name: String,
    timestamp: Option<String>,
    planned_areas: Option<String>,
    actual_areas: Option<String>,
    doctors_visited: Option<String>,
    pharmacies_visited: Option<String>,
    orders: Option<String>,
    returns: Option<String>,
    notes: Option<String>,
}

impl TryFrom<EntryPayload> for Entry {
    type Error = ValidationError;

    fn try_from(payload: EntryPayload) -> Result<Self, Self::Error> {
        let (Some(date), Some(officer_name)) = (payload.date, payload.officer_name) else {
            return Err(ValidationError::MissingRequired);
        };

        Ok(Self {
            date,
            officer_name,
            timestamp: payload.timestamp,
            planned_areas: payload.planned_areas,
            actual_areas: payload.actual_areas,
            doctors_visited: payload.doctors_visited,
            pharmacies_visited: payload.pharmacies_visited,
            orders: payload.orders,
            returns: payload.returns,
            notes: payload.notes,
        })
    }
}

impl Entry {
    /// Value of a field, `None` when absent
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Date => Some(&self.date),
            Field::OfficerName => Some(&self.officer_name),
            Field::Timestamp => self.timestamp.as_deref(),
            Field::PlannedAreas => self.planned_areas.as_deref(),
            Field::ActualAreas => self.actual_areas.as_deref(),
            Field::DoctorsVisited => self.doctors_visited.as_deref(),
            Field::PharmaciesVisited => self.pharmacies_visited.as_deref(),
            Field::Orders => self.orders.as_deref(),
            Field::Returns => self.returns.as_deref(),
            Field::Notes => self.notes.as_deref(),
        }
    }

    pub fn officer_name(&self) -> &str {
        &self.officer_name
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}
