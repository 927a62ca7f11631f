//! Compiled predicate tree
//!
//! `Criteria` is what the compiler hands to a record store. Stores either
//! evaluate it directly (see `executor::filters`) or translate it; the
//! `Display` impl renders the JSON-path SQL form used by explain output.

use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Storage path of a payload field.
///
/// Dotted keys descend into nested objects: `address.city` is
/// `payload->'address'->'city'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    keys: Vec<String>,
}

impl FieldPath {
    pub fn parse(field: &str) -> Self {
        Self {
            keys: field.split('.').map(str::to_string).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Looks the path up in a payload. Missing keys and non-object parents yield `None`.
    pub fn resolve<'a>(&self, payload: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.keys.split_first()?;
        rest.iter()
            .try_fold(payload.get(first)?, |current, key| current.as_object()?.get(key))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload")?;
        for key in &self.keys {
            write!(f, "->'{}'", key.replace('\'', "''"))?;
        }
        Ok(())
    }
}

/// A concrete comparison against one field
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// SQL LIKE pattern: `%` any run, `_` one character
    Like(String),
    /// Field is a list holding this element
    Contains(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
}

impl Comparison {
    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            Comparison::Eq(_) => "eq",
            Comparison::Neq(_) => "neq",
            Comparison::Gt(_) => "gt",
            Comparison::Gte(_) => "gte",
            Comparison::Lt(_) => "lt",
            Comparison::Lte(_) => "lte",
            Comparison::Like(_) => "like",
            Comparison::Contains(_) => "contains",
            Comparison::In(_) => "in",
            Comparison::NotIn(_) => "notIn",
            Comparison::IsNull => "isNull",
            Comparison::IsNotNull => "isNotNull",
        }
    }
}

/// Predicate over stored records
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Matches every record
    All,
    /// Record belongs to the entity
    EntityIs(Uuid),
    Field {
        path: FieldPath,
        comparison: Comparison,
    },
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
}

impl Criteria {
    pub fn field(field: &str, comparison: Comparison) -> Self {
        Criteria::Field {
            path: FieldPath::parse(field),
            comparison,
        }
    }

    /// Returns the entity id if the top level is `EntityIs(..) AND ...`
    pub fn entity_scope(&self) -> Option<Uuid> {
        match self {
            Criteria::EntityIs(id) => Some(*id),
            Criteria::And(parts) => parts.iter().find_map(|p| match p {
                Criteria::EntityIs(id) => Some(*id),
                _ => None,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::All => write!(f, "TRUE"),
            Criteria::EntityIs(id) => write!(f, "entity_id = '{}'", id),
            Criteria::Field { path, comparison } => write_comparison(f, path, comparison),
            Criteria::And(parts) => write_joined(f, parts, "AND", "TRUE"),
            Criteria::Or(parts) => write_joined(f, parts, "OR", "FALSE"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Criteria], op: &str, empty: &str) -> fmt::Result {
    if parts.is_empty() {
        return write!(f, "{}", empty);
    }
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}

fn write_comparison(f: &mut fmt::Formatter<'_>, path: &FieldPath, comparison: &Comparison) -> fmt::Result {
    match comparison {
        Comparison::Eq(v) => write!(f, "{} = {}", path, sql_literal(v)),
        Comparison::Neq(v) => write!(f, "{} <> {}", path, sql_literal(v)),
        Comparison::Gt(v) => write!(f, "{} > {}", path, sql_literal(v)),
        Comparison::Gte(v) => write!(f, "{} >= {}", path, sql_literal(v)),
        Comparison::Lt(v) => write!(f, "{} < {}", path, sql_literal(v)),
        Comparison::Lte(v) => write!(f, "{} <= {}", path, sql_literal(v)),
        Comparison::Like(pattern) => write!(f, "{} LIKE {}", path, quote(pattern)),
        Comparison::Contains(v) => write!(f, "{} @> {}", path, quote(&format!("[{}]", v))),
        Comparison::In(values) => write!(f, "{} IN ({})", path, sql_list(values)),
        Comparison::NotIn(values) => write!(f, "{} NOT IN ({})", path, sql_list(values)),
        Comparison::IsNull => write!(f, "{} IS NULL", path),
        Comparison::IsNotNull => write!(f, "{} IS NOT NULL", path),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

fn sql_list(values: &[Value]) -> String {
    values.iter().map(sql_literal).collect::<Vec<_>>().join(", ")
}
