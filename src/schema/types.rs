//! Virtual entity definitions
//!
//! Supported field types:
//! - string, number, integer, boolean
//! - date (YYYY-MM-DD), datetime (ISO-8601)
//! - email, phone, url
//! - enum (options.values), object, array (options.itemType)
//! - reference (UUID of another record)

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Closed set of field types understood by the validator and the query compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
    Email,
    Phone,
    Url,
    Enum,
    Object,
    Array,
    Reference,
}

impl FieldType {
    /// All field types, in wire order.
    pub const ALL: [FieldType; 13] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Url,
        FieldType::Enum,
        FieldType::Object,
        FieldType::Array,
        FieldType::Reference,
    ];

    /// Returns the wire name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Enum => "enum",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Reference => "reference",
        }
    }

    /// Resolves a wire name. Matching is exact; unknown names yield `None`.
    pub fn from_value(value: &str) -> Option<FieldType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one attribute of a virtual entity.
///
/// `field_type` is kept as the raw string so that definitions carrying an
/// unrecognised type still load; the validator reports them per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub field_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_label: Option<String>,
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    /// Type-specific options, e.g. `values` for enum or `itemType` for array.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
}

impl FieldDefinition {
    /// Creates an optional field of the given type
    pub fn new(field_key: impl Into<String>, field_type: FieldType) -> Self {
        Self::with_type_name(field_key, field_type.as_str())
    }

    /// Creates an optional field from a raw type name, recognised or not
    pub fn with_type_name(field_key: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            field_label: None,
            field_type: field_type.into(),
            required: false,
            options: Value::Null,
            order_index: None,
        }
    }

    /// Create a required field
    pub fn required(field_key: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(field_key, field_type).mark_required()
    }

    /// Create an optional field
    pub fn optional(field_key: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(field_key, field_type)
    }

    /// Create an enum field restricted to `values`
    pub fn enumeration<I, S>(field_key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        Self::new(field_key, FieldType::Enum).with_option("values", Value::Array(values))
    }

    /// Create an array field whose items must conform to `item_type`
    pub fn array_of(field_key: impl Into<String>, item_type: FieldType) -> Self {
        Self::new(field_key, FieldType::Array)
            .with_option("itemType", Value::String(item_type.as_str().to_string()))
    }

    pub fn mark_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.field_label = Some(label.into());
        self
    }

    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = Some(order_index);
        self
    }

    /// Sets one option. Replaces non-object options with a fresh map.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        if !self.options.is_object() {
            self.options = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.options {
            map.insert(key.into(), value);
        }
        self
    }

    /// Replaces the options wholesale, including with malformed shapes
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Returns the declared type if it is part of the vocabulary
    pub fn kind(&self) -> Option<FieldType> {
        FieldType::from_value(&self.field_type)
    }

    /// Looks up a single option value
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// A caller-defined record type: a name plus an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl EntityDefinition {
    /// Create a new entity with a random id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Fields sorted by `order_index`; unordered fields keep declaration
    /// order and come after ordered ones.
    pub fn ordered_fields(&self) -> Vec<FieldDefinition> {
        let mut fields = self.fields.clone();
        fields.sort_by_key(|f| (f.order_index.is_none(), f.order_index));
        fields
    }

    /// Validates the definition itself (not a record)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Entity name cannot be empty".into());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.field_key.trim().is_empty() {
                return Err(format!("Entity '{}' has a field with an empty key", self.name));
            }
            if !seen.insert(field.field_key.as_str()) {
                return Err(format!(
                    "Entity '{}' declares field '{}' more than once",
                    self.name, field.field_key
                ));
            }
        }

        Ok(())
    }
}
