//! Feature rows as produced by backing stores.
//!
//! A feature is an identified, keyed bag of attribute values. Joined queries
//! nest auxiliary rows (metadata, links) as `AttributeValue::Feature`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{BoundingBox, DomainValue};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
    Domain(DomainValue),
    Geometry(BoundingBox),
    Feature(Box<Feature>),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// View this attribute as a domain value, when it has a scalar meaning.
    pub fn to_domain_value(&self) -> Option<DomainValue> {
        match self {
            AttributeValue::Integer(v) => Some(DomainValue::Number(*v as f64)),
            AttributeValue::Number(v) => Some(DomainValue::Number(*v)),
            AttributeValue::Text(s) => Some(DomainValue::Text(s.clone())),
            AttributeValue::Time(t) => Some(DomainValue::Time(*t)),
            AttributeValue::Domain(d) => Some(d.clone()),
            _ => None,
        }
    }

    /// Compare two attribute values, `None` when they cannot be ordered.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => Some(a.cmp(b)),
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.to_domain_value()?;
                let b = other.to_domain_value()?;
                a.natural_cmp(&b)
            }
        }
    }

    /// Total order used for sorting rows.
    ///
    /// Scalars order as domain values (kind first, then value); booleans,
    /// scalars, geometries, nested features and nulls form separate groups
    /// in that order.
    pub fn total_cmp(&self, other: &AttributeValue) -> Ordering {
        match (self, other) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
            _ => match (self.to_domain_value(), other.to_domain_value()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.sort_group().cmp(&other.sort_group()),
            },
        }
    }

    fn sort_group(&self) -> u8 {
        match self {
            AttributeValue::Bool(_) => 0,
            AttributeValue::Integer(_)
            | AttributeValue::Number(_)
            | AttributeValue::Text(_)
            | AttributeValue::Time(_)
            | AttributeValue::Domain(_) => 1,
            AttributeValue::Geometry(_) => 2,
            AttributeValue::Feature(_) => 3,
            AttributeValue::Null => 4,
        }
    }

    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            AttributeValue::Feature(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(v: DateTime<Utc>) -> Self {
        AttributeValue::Time(v)
    }
}

impl From<DomainValue> for AttributeValue {
    fn from(v: DomainValue) -> Self {
        AttributeValue::Domain(v)
    }
}

impl From<BoundingBox> for AttributeValue {
    fn from(v: BoundingBox) -> Self {
        AttributeValue::Geometry(v)
    }
}

impl From<Feature> for AttributeValue {
    fn from(v: Feature) -> Self {
        AttributeValue::Feature(Box::new(v))
    }
}

/// An identified row of attribute values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Attribute value by name; missing attributes read as `None`.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Attribute value, treating explicit nulls as missing.
    pub fn get_non_null(&self, name: &str) -> Option<&AttributeValue> {
        self.get(name).filter(|v| !v.is_null())
    }

    /// Keep only the named attributes.
    pub fn project(&self, names: &[String]) -> Feature {
        Feature {
            id: self.id.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|(k, _)| names.iter().any(|n| n == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Union of every geometry attribute carried by this feature.
    pub fn bounds(&self) -> BoundingBox {
        self.attributes
            .values()
            .fold(BoundingBox::empty(), |acc, value| match value {
                AttributeValue::Geometry(b) => acc.union(b),
                _ => acc,
            })
    }
}

/// Description of the attributes a store exposes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub type_name: String,
    pub attribute_names: Vec<String>,
    pub geometry_attribute: Option<String>,
}

impl Schema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute_names.push(name.into());
        self
    }

    pub fn with_geometry(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.attribute_names.push(name.clone());
        self.geometry_attribute = Some(name);
        self
    }
}

/// An ordered, forward-only row-set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Envelope of all geometries in the collection; empty when none.
    pub fn bounds(&self) -> BoundingBox {
        self.features
            .iter()
            .fold(BoundingBox::empty(), |acc, f| acc.union(&f.bounds()))
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_mixed_numbers() {
        let a = AttributeValue::Integer(2);
        let b = AttributeValue::Number(2.5);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.compare(&AttributeValue::Text("x".into())), None);
        assert_eq!(AttributeValue::Null.compare(&a), None);
    }

    #[test]
    fn test_total_cmp_groups_kinds() {
        let int = AttributeValue::Integer(2);
        let num = AttributeValue::Number(2.5);
        let text = AttributeValue::Text("x".into());
        let geom = AttributeValue::Geometry(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(int.total_cmp(&num), Ordering::Less);
        assert_eq!(num.total_cmp(&text), text.total_cmp(&num).reverse());
        assert_ne!(num.total_cmp(&text), Ordering::Equal);
        assert_eq!(text.total_cmp(&geom), Ordering::Less);
        assert_eq!(AttributeValue::Bool(true).total_cmp(&int), Ordering::Less);
        assert_eq!(geom.total_cmp(&geom.clone()), Ordering::Equal);
    }

    #[test]
    fn test_collection_bounds() {
        let fc = FeatureCollection::new(vec![
            Feature::new("1").with("geom", BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            Feature::new("2").with("geom", BoundingBox::new(2.0, -1.0, 3.0, 0.5)),
            Feature::new("3").with("elevation", 10.0),
        ]);
        assert_eq!(fc.bounds(), BoundingBox::new(0.0, -1.0, 3.0, 1.0));
        assert!(FeatureCollection::empty().bounds().is_empty());
    }

    #[test]
    fn test_project_keeps_id() {
        let f = Feature::new("a").with("x", 1.0).with("y", 2.0);
        let p = f.project(&["y".to_string()]);
        assert_eq!(p.id, "a");
        assert!(p.get("x").is_none());
        assert_eq!(p.get("y"), Some(&AttributeValue::Number(2.0)));
    }
}
