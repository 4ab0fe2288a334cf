//! Custom field value codec for external project trackers
//!
//! External trackers store every custom field value in a shape that depends on
//! the field's type: text fields carry `{ "text": .. }`, single-select fields
//! carry `{ "name": .. }`, assignee fields carry a `{ "users": { "nodes": [..] } }`
//! connection, and so on. This crate converts between those raw JSON shapes
//! and a strongly-typed [`FieldValue`].
//!
//! The codec is pure: no I/O, no shared state.
//!
//! # Example
//!
//! ```
//! use fieldcodec::{decode, encode, CustomField, FieldType, FieldValue};
//!
//! let field = CustomField::new("f1", "Estimate", FieldType::Number);
//! let raw = encode(&field, &FieldValue::Number(3.0))?;
//! assert_eq!(raw, serde_json::json!({ "number": 3.0 }));
//! assert_eq!(decode(&field, &raw)?, FieldValue::Number(3.0));
//! # Ok::<(), fieldcodec::Error>(())
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Title used when an iteration or milestone arrives as a bare id
pub const PLACEHOLDER_TITLE: &str = "Untitled";

/// Date format written to external date fields
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while encoding or decoding field values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(String),
}

impl Error {
    fn invalid(field: &CustomField, reason: impl Into<String>) -> Self {
        Error::InvalidFieldValue {
            field: field.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of custom field types
///
/// Deserialization goes through [`FromStr`], so an unknown type name fails
/// with [`Error::UnsupportedFieldType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum FieldType {
    Text,
    Number,
    Date,
    SingleSelect,
    Iteration,
    Milestone,
    Assignees,
    Labels,
}

impl FieldType {
    /// Every supported field type
    pub const ALL: [FieldType; 8] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::SingleSelect,
        FieldType::Iteration,
        FieldType::Milestone,
        FieldType::Assignees,
        FieldType::Labels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Date => "DATE",
            FieldType::SingleSelect => "SINGLE_SELECT",
            FieldType::Iteration => "ITERATION",
            FieldType::Milestone => "MILESTONE",
            FieldType::Assignees => "ASSIGNEES",
            FieldType::Labels => "LABELS",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    /// Parse an external type name; anything outside the closed set is rejected
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(|c: char| c == '-' || c == ' ', "_");
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| Error::UnsupportedFieldType(s.to_string()))
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Check every field declaration in `fields` for a supported type
///
/// `fields` is a raw JSON array of field declarations, as stored by a
/// tracker. Entries without a string `type` are left to the deserializer.
pub fn check_field_types(fields: &Value) -> Result<()> {
    if let Some(fields) = fields.as_array() {
        for field in fields {
            if let Some(name) = field.get("type").and_then(Value::as_str) {
                name.parse::<FieldType>()?;
            }
        }
    }
    Ok(())
}

/// A named option of a single-select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSelectOption {
    pub name: String,
}

impl SingleSelectOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A custom field declared on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Ordered options, only meaningful for SINGLE_SELECT
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SingleSelectOption>,
}

impl CustomField {
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            options: Vec::new(),
        }
    }

    /// Create a single-select field with options in the given order
    pub fn single_select<I, S>(id: impl Into<String>, name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            field_type: FieldType::SingleSelect,
            options: options.into_iter().map(SingleSelectOption::new).collect(),
        }
    }

    /// Whether `name` is one of the declared options
    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }
}

/// Reference to an iteration or milestone, as stored in a field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub title: String,
}

impl NamedRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A typed custom field value, one variant per field type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    SingleSelect(String),
    Iteration(NamedRef),
    Milestone(NamedRef),
    Assignees(Vec<String>),
    Labels(Vec<String>),
}

impl FieldValue {
    /// The field type this value belongs to
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::SingleSelect(_) => FieldType::SingleSelect,
            FieldValue::Iteration(_) => FieldType::Iteration,
            FieldValue::Milestone(_) => FieldType::Milestone,
            FieldValue::Assignees(_) => FieldType::Assignees,
            FieldValue::Labels(_) => FieldType::Labels,
        }
    }

    /// Parse an ISO-8601 calendar date (`2025-01-14`)
    pub fn date(s: &str) -> Option<Self> {
        parse_iso_date(s).map(FieldValue::Date)
    }

    /// A single assignee, promoted to a one-element list
    pub fn assignee(user_id: impl Into<String>) -> Self {
        FieldValue::Assignees(vec![user_id.into()])
    }

    /// A single label, promoted to a one-element list
    pub fn label(label_id: impl Into<String>) -> Self {
        FieldValue::Labels(vec![label_id.into()])
    }
}

/// Only plain calendar dates are accepted; timestamps would lose their time
/// and offset on the way back out.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Encode a typed value into the external shape for `field`
pub fn encode(field: &CustomField, value: &FieldValue) -> Result<Value> {
    if value.field_type() != field.field_type {
        return Err(Error::invalid(
            field,
            format!(
                "expected a {} value, got {}",
                field.field_type,
                value.field_type()
            ),
        ));
    }

    match value {
        FieldValue::Text(text) => Ok(json!({ "text": text })),
        FieldValue::Number(n) => {
            let number = serde_json::Number::from_f64(*n)
                .ok_or_else(|| Error::invalid(field, format!("{} is not a finite number", n)))?;
            Ok(json!({ "number": number }))
        }
        FieldValue::Date(date) => Ok(json!({ "date": date.format(DATE_FORMAT).to_string() })),
        FieldValue::SingleSelect(name) => {
            if !field.has_option(name) {
                return Err(Error::invalid(
                    field,
                    format!("'{}' is not one of the declared options", name),
                ));
            }
            Ok(json!({ "name": name }))
        }
        FieldValue::Iteration(r) => encode_named_ref(field, r, "iterationId"),
        FieldValue::Milestone(r) => encode_named_ref(field, r, "milestoneId"),
        FieldValue::Assignees(ids) => encode_connection(field, ids, "users"),
        FieldValue::Labels(ids) => encode_connection(field, ids, "labels"),
    }
}

fn encode_named_ref(field: &CustomField, r: &NamedRef, id_key: &str) -> Result<Value> {
    if r.id.trim().is_empty() {
        return Err(Error::invalid(field, "reference id must not be empty"));
    }
    let mut object = Map::new();
    object.insert(id_key.to_string(), Value::String(r.id.clone()));
    object.insert("title".to_string(), Value::String(r.title.clone()));
    Ok(Value::Object(object))
}

fn encode_connection(field: &CustomField, ids: &[String], key: &str) -> Result<Value> {
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(Error::invalid(field, "ids must not be empty"));
    }
    let nodes: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    let mut object = Map::new();
    object.insert(key.to_string(), json!({ "nodes": nodes }));
    Ok(Value::Object(object))
}

/// Decode an external value for `field` into its typed form
pub fn decode(field: &CustomField, raw: &Value) -> Result<FieldValue> {
    match field.field_type {
        FieldType::Text => string_member(field, raw, "text").map(FieldValue::Text),
        FieldType::Number => raw
            .get("number")
            .and_then(Value::as_f64)
            .map(FieldValue::Number)
            .ok_or_else(|| Error::invalid(field, "expected { number: <number> }")),
        FieldType::Date => {
            let text = string_member(field, raw, "date")?;
            parse_iso_date(&text)
                .map(FieldValue::Date)
                .ok_or_else(|| Error::invalid(field, format!("'{}' is not an ISO-8601 date", text)))
        }
        FieldType::SingleSelect => {
            let name = string_member(field, raw, "name")?;
            if !field.has_option(&name) {
                return Err(Error::invalid(
                    field,
                    format!("'{}' is not one of the declared options", name),
                ));
            }
            Ok(FieldValue::SingleSelect(name))
        }
        FieldType::Iteration => decode_named_ref(field, raw, "iterationId").map(FieldValue::Iteration),
        FieldType::Milestone => decode_named_ref(field, raw, "milestoneId").map(FieldValue::Milestone),
        FieldType::Assignees => {
            decode_connection(field, raw, "users", &["id", "login"]).map(FieldValue::Assignees)
        }
        FieldType::Labels => {
            decode_connection(field, raw, "labels", &["id", "name"]).map(FieldValue::Labels)
        }
    }
}

fn string_member(field: &CustomField, raw: &Value, key: &str) -> Result<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::invalid(field, format!("expected {{ {}: <string> }}", key)))
}

/// Accepts either a bare id or `{ <id_key>: .., title: .. }`
fn decode_named_ref(field: &CustomField, raw: &Value, id_key: &str) -> Result<NamedRef> {
    match raw {
        Value::Object(object) => {
            let id = object
                .get(id_key)
                .and_then(scalar_id)
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| Error::invalid(field, format!("missing '{}'", id_key)))?;
            let title = object
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(PLACEHOLDER_TITLE);
            Ok(NamedRef::new(id, title))
        }
        bare => scalar_id(bare)
            .filter(|id| !id.trim().is_empty())
            .map(|id| NamedRef::new(id, PLACEHOLDER_TITLE))
            .ok_or_else(|| {
                Error::invalid(field, format!("expected an id or {{ {}, title }}", id_key))
            }),
    }
}

/// Accepts `{ <key>: { nodes: [..] } }`, a bare list, or a single scalar id
fn decode_connection(
    field: &CustomField,
    raw: &Value,
    key: &str,
    node_keys: &[&str],
) -> Result<Vec<String>> {
    let inner = match raw {
        Value::Object(object) => object
            .get(key)
            .ok_or_else(|| Error::invalid(field, format!("missing '{}'", key)))?,
        other => other,
    };
    let nodes = match inner {
        Value::Object(connection) => connection
            .get("nodes")
            .ok_or_else(|| Error::invalid(field, format!("missing '{}.nodes'", key)))?,
        other => other,
    };

    match nodes {
        Value::Array(items) => items
            .iter()
            .map(|node| node_id(node, node_keys).ok_or_else(|| Error::invalid(field, "malformed node")))
            .collect(),
        scalar => node_id(scalar, node_keys)
            .map(|id| vec![id])
            .ok_or_else(|| Error::invalid(field, "expected an id or a list of ids")),
    }
}

fn node_id(node: &Value, node_keys: &[&str]) -> Option<String> {
    match node {
        Value::Object(object) => node_keys
            .iter()
            .find_map(|k| object.get(*k).and_then(scalar_id)),
        other => scalar_id(other),
    }
    .filter(|id| !id.trim().is_empty())
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
