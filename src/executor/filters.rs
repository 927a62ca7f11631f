//! Criteria evaluation against records
//!
//! Comparison rules:
//! - Missing and null fields only satisfy `IsNull`
//! - Numbers compare numerically; numeric text is read as a number when the
//!   other side is a number
//! - "true"/"false" text equals the matching boolean
//! - Ordering across unrelated types never matches

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{Comparison, Criteria};
use crate::schema::{parse_bool, parse_decimal};
use crate::storage::Record;

/// Evaluates compiled criteria against records
pub struct CriteriaFilter;

impl CriteriaFilter {
    /// Checks if a record satisfies the criteria
    pub fn matches(criteria: &Criteria, record: &Record) -> bool {
        match criteria {
            Criteria::All => true,
            Criteria::EntityIs(id) => record.entity_id == *id,
            Criteria::Field { path, comparison } => {
                Self::matches_comparison(path.resolve(&record.payload), comparison)
            }
            Criteria::And(parts) => parts.iter().all(|p| Self::matches(p, record)),
            Criteria::Or(parts) => parts.iter().any(|p| Self::matches(p, record)),
        }
    }

    fn matches_comparison(actual: Option<&Value>, comparison: &Comparison) -> bool {
        let actual = match actual {
            Some(v) if !v.is_null() => v,
            _ => return matches!(comparison, Comparison::IsNull),
        };

        match comparison {
            Comparison::IsNull => false,
            Comparison::IsNotNull => true,
            Comparison::Eq(expected) => values_equal(actual, expected),
            Comparison::Neq(expected) => !values_equal(actual, expected),
            Comparison::Gt(bound) => compare_values(actual, bound) == Some(Ordering::Greater),
            Comparison::Gte(bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::Lt(bound) => compare_values(actual, bound) == Some(Ordering::Less),
            Comparison::Lte(bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::Like(pattern) => {
                scalar_text(actual).is_some_and(|text| like_match(&text, pattern))
            }
            Comparison::Contains(element) => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, element))),
            Comparison::In(values) => values.iter().any(|v| values_equal(actual, v)),
            Comparison::NotIn(values) => !values.iter().any(|v| values_equal(actual, v)),
        }
    }
}

/// Equality with comparison-time coercion
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => {
            compare_values(actual, expected) == Some(Ordering::Equal)
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            parse_bool(s) == Some(*b)
        }
        _ => actual == expected,
    }
}

/// Orders two values of compatible types
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let a = as_f64(a)?;
            let b = as_f64(b)?;
            a.partial_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s).and_then(|v| v.as_f64()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// SQL LIKE matching: `%` matches any run, `_` exactly one character
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    // Last `%` seen and the value position it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, v));
                p += 1;
            }
            Some('_') => {
                v += 1;
                p += 1;
            }
            Some(c) if *c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star_p, star_v)) => {
                    backtrack = Some((star_p, star_v + 1));
                    p = star_p + 1;
                    v = star_v + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
