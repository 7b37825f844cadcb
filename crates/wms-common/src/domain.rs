//! Dimension domain values.
//!
//! A domain value is either a single instant or an inclusive range, over one of
//! three scalar kinds. Both bounds of a range always share the same kind.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::time::format_timestamp;

/// Scalar kind of a domain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainKind {
    Temporal,
    Numeric,
    Text,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKind::Temporal => write!(f, "temporal"),
            DomainKind::Numeric => write!(f, "numeric"),
            DomainKind::Text => write!(f, "string"),
        }
    }
}

/// Declared data type of a dimension before classification.
///
/// `Custom` dimensions get their kind from the first raw value they see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Temporal,
    Numeric,
    Custom,
}

impl DataType {
    /// The kind a value of this type must have, if it is fixed up front.
    pub fn fixed_kind(&self) -> Option<DomainKind> {
        match self {
            DataType::Temporal => Some(DomainKind::Temporal),
            DataType::Numeric => Some(DomainKind::Numeric),
            DataType::Custom => None,
        }
    }
}

/// A single value of a dimension domain.
#[derive(Debug, Clone)]
pub enum DomainValue {
    Time(DateTime<Utc>),
    Number(f64),
    Text(String),
    TimeRange(DateTime<Utc>, DateTime<Utc>),
    NumberRange(f64, f64),
    TextRange(String, String),
}

impl DomainValue {
    pub fn kind(&self) -> DomainKind {
        match self {
            DomainValue::Time(_) | DomainValue::TimeRange(..) => DomainKind::Temporal,
            DomainValue::Number(_) | DomainValue::NumberRange(..) => DomainKind::Numeric,
            DomainValue::Text(_) | DomainValue::TextRange(..) => DomainKind::Text,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            DomainValue::TimeRange(..) | DomainValue::NumberRange(..) | DomainValue::TextRange(..)
        )
    }

    /// Lower bound as an instant (the value itself for instants).
    pub fn lower(&self) -> DomainValue {
        match self {
            DomainValue::TimeRange(lo, _) => DomainValue::Time(*lo),
            DomainValue::NumberRange(lo, _) => DomainValue::Number(*lo),
            DomainValue::TextRange(lo, _) => DomainValue::Text(lo.clone()),
            instant => instant.clone(),
        }
    }

    /// Upper bound as an instant (the value itself for instants).
    pub fn upper(&self) -> DomainValue {
        match self {
            DomainValue::TimeRange(_, hi) => DomainValue::Time(*hi),
            DomainValue::NumberRange(_, hi) => DomainValue::Number(*hi),
            DomainValue::TextRange(_, hi) => DomainValue::Text(hi.clone()),
            instant => instant.clone(),
        }
    }

    /// Build a range from two instants of the same kind.
    ///
    /// Returns `None` when the kinds differ, either side is already a range,
    /// or `lower` lies above `upper`.
    pub fn range(lower: DomainValue, upper: DomainValue) -> Option<DomainValue> {
        if scalar_cmp(&lower, &upper) == Ordering::Greater {
            return None;
        }
        match (lower, upper) {
            (DomainValue::Time(lo), DomainValue::Time(hi)) => Some(DomainValue::TimeRange(lo, hi)),
            (DomainValue::Number(lo), DomainValue::Number(hi)) => {
                Some(DomainValue::NumberRange(lo, hi))
            }
            (DomainValue::Text(lo), DomainValue::Text(hi)) => Some(DomainValue::TextRange(lo, hi)),
            _ => None,
        }
    }

    /// Numeric position of the lower bound: the number itself, or epoch
    /// milliseconds for timestamps. Text has no position.
    pub fn position(&self) -> Option<f64> {
        match self {
            DomainValue::Number(v) | DomainValue::NumberRange(v, _) => Some(*v),
            DomainValue::Time(t) | DomainValue::TimeRange(t, _) => Some(t.timestamp_millis() as f64),
            DomainValue::Text(_) | DomainValue::TextRange(..) => None,
        }
    }

    /// Order two values of the same kind.
    ///
    /// Instants compare by value, ranges by lower bound then upper bound; an
    /// instant behaves like a range whose bounds coincide. Values of different
    /// kinds are not comparable.
    pub fn natural_cmp(&self, other: &DomainValue) -> Option<Ordering> {
        if self.kind() != other.kind() {
            return None;
        }
        let by_lower = scalar_cmp(&self.lower(), &other.lower());
        Some(by_lower.then_with(|| scalar_cmp(&self.upper(), &other.upper())))
    }
}

fn scalar_cmp(a: &DomainValue, b: &DomainValue) -> Ordering {
    match (a, b) {
        (DomainValue::Time(x), DomainValue::Time(y)) => x.cmp(y),
        (DomainValue::Number(x), DomainValue::Number(y)) => x.total_cmp(y),
        (DomainValue::Text(x), DomainValue::Text(y)) => x.cmp(y),
        _ => a.kind().cmp(&b.kind()),
    }
}

impl Ord for DomainValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.natural_cmp(other)
            .unwrap_or_else(|| self.kind().cmp(&other.kind()))
    }
}

impl PartialOrd for DomainValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DomainValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DomainValue {}

/// Numbers print with at least one fractional digit ("1.0", "0.25").
pub fn format_number(v: f64) -> String {
    format!("{:?}", v)
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainValue::Time(t) => f.write_str(&format_timestamp(t)),
            DomainValue::Number(v) => f.write_str(&format_number(*v)),
            DomainValue::Text(s) => f.write_str(s),
            DomainValue::TimeRange(lo, hi) => {
                write!(f, "{}/{}", format_timestamp(lo), format_timestamp(hi))
            }
            DomainValue::NumberRange(lo, hi) => {
                write!(f, "{}/{}", format_number(*lo), format_number(*hi))
            }
            DomainValue::TextRange(lo, hi) => write!(f, "{}/{}", lo, hi),
        }
    }
}

impl Serialize for DomainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
