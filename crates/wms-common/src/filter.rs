//! Row predicates.
//!
//! Filters are evaluated against one feature at a time. Stores that support
//! pushdown receive the filter inside a `Query`; the rest evaluate it locally.

use std::cmp::Ordering;

use crate::feature::{AttributeValue, Feature};
use crate::BoundingBox;

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl CompareOp {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::Less => ordering == Ordering::Less,
            CompareOp::LessOrEqual => ordering != Ordering::Greater,
            CompareOp::Greater => ordering == Ordering::Greater,
            CompareOp::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

/// A predicate over a single feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Accepts everything.
    #[default]
    Include,
    /// Rejects everything.
    Exclude,
    Compare {
        property: String,
        op: CompareOp,
        value: AttributeValue,
    },
    /// Inclusive on both ends.
    Between {
        property: String,
        lower: AttributeValue,
        upper: AttributeValue,
    },
    /// Text match where `*` stands for any run of characters.
    Like { property: String, pattern: String },
    IsNull { property: String },
    /// Geometry attribute intersects the box.
    BBox { property: String, bbox: BoundingBox },
    /// Feature id is one of the listed ids.
    Ids(Vec<String>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn compare(
        property: impl Into<String>,
        op: CompareOp,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Filter::Compare {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(property: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::compare(property, CompareOp::Equal, value)
    }

    pub fn between(
        property: impl Into<String>,
        lower: impl Into<AttributeValue>,
        upper: impl Into<AttributeValue>,
    ) -> Self {
        Filter::Between {
            property: property.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn bbox(property: impl Into<String>, bbox: BoundingBox) -> Self {
        Filter::BBox {
            property: property.into(),
            bbox,
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// Conjunction that collapses `Include` operands.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Include, f) | (f, Filter::Include) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(self, Filter::Include)
    }

    /// Evaluate against one feature.
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::Compare { property, op, value } => feature
                .get_non_null(property)
                .and_then(|v| v.compare(value))
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false),
            Filter::Between {
                property,
                lower,
                upper,
            } => match feature.get_non_null(property) {
                Some(v) => {
                    matches!(v.compare(lower), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(v.compare(upper), Some(Ordering::Less | Ordering::Equal))
                }
                None => false,
            },
            Filter::Like { property, pattern } => feature
                .get(property)
                .and_then(AttributeValue::as_text)
                .map(|text| wildcard_match(pattern, text))
                .unwrap_or(false),
            Filter::IsNull { property } => feature.get_non_null(property).is_none(),
            Filter::BBox { property, bbox } => match feature.get(property) {
                Some(AttributeValue::Geometry(g)) => g.intersects(bbox),
                _ => false,
            },
            Filter::Ids(ids) => ids.iter().any(|id| *id == feature.id),
            Filter::And(filters) => filters.iter().all(|f| f.evaluate(feature)),
            Filter::Or(filters) => filters.iter().any(|f| f.evaluate(feature)),
            Filter::Not(inner) => !inner.evaluate(feature),
        }
    }

    /// Rewrite every property name through `map`.
    ///
    /// Fails with the first property name `map` does not know.
    pub fn map_properties<F>(&self, map: &F) -> Result<Filter, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rename = |p: &str| map(p).ok_or_else(|| p.to_string());
        Ok(match self {
            Filter::Include => Filter::Include,
            Filter::Exclude => Filter::Exclude,
            Filter::Compare { property, op, value } => Filter::Compare {
                property: rename(property)?,
                op: *op,
                value: value.clone(),
            },
            Filter::Between {
                property,
                lower,
                upper,
            } => Filter::Between {
                property: rename(property)?,
                lower: lower.clone(),
                upper: upper.clone(),
            },
            Filter::Like { property, pattern } => Filter::Like {
                property: rename(property)?,
                pattern: pattern.clone(),
            },
            Filter::IsNull { property } => Filter::IsNull {
                property: rename(property)?,
            },
            Filter::BBox { property, bbox } => Filter::BBox {
                property: rename(property)?,
                bbox: *bbox,
            },
            Filter::Ids(ids) => Filter::Ids(ids.clone()),
            Filter::And(filters) => Filter::And(
                filters
                    .iter()
                    .map(|f| f.map_properties(map))
                    .collect::<Result<_, _>>()?,
            ),
            Filter::Or(filters) => Filter::Or(
                filters
                    .iter()
                    .map(|f| f.map_properties(map))
                    .collect::<Result<_, _>>()?,
            ),
            Filter::Not(inner) => Filter::Not(Box::new(inner.map_properties(map)?)),
        })
    }
}

/// Glob match supporting `*` only.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last) {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Feature {
        Feature::new("f1")
            .with("elevation", 2.0)
            .with("name", "sentinel-2a")
            .with("geom", BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .with("cloud", AttributeValue::Null)
    }

    #[test]
    fn test_compare_and_between() {
        let f = sample();
        assert!(Filter::compare("elevation", CompareOp::GreaterOrEqual, 2.0).evaluate(&f));
        assert!(!Filter::compare("elevation", CompareOp::Less, 2.0).evaluate(&f));
        assert!(Filter::between("elevation", 1.0, 2.0).evaluate(&f));
        assert!(!Filter::between("elevation", 2.5, 3.0).evaluate(&f));
        assert!(!Filter::equals("missing", 2.0).evaluate(&f));
    }

    #[test]
    fn test_like_and_null() {
        let f = sample();
        let like = |p: &str| Filter::Like {
            property: "name".into(),
            pattern: p.into(),
        };
        assert!(like("sentinel*").evaluate(&f));
        assert!(like("*2a").evaluate(&f));
        assert!(like("s*l-*a").evaluate(&f));
        assert!(!like("landsat*").evaluate(&f));
        assert!(like("sentinel-2a").evaluate(&f));
        assert!(Filter::IsNull { property: "cloud".into() }.evaluate(&f));
        assert!(Filter::IsNull { property: "other".into() }.evaluate(&f));
    }

    #[test]
    fn test_bbox_ids_and_logic() {
        let f = sample();
        assert!(Filter::bbox("geom", BoundingBox::new(0.5, 0.5, 2.0, 2.0)).evaluate(&f));
        assert!(!Filter::bbox("geom", BoundingBox::new(5.0, 5.0, 6.0, 6.0)).evaluate(&f));
        assert!(Filter::ids(["f0", "f1"]).evaluate(&f));
        let both = Filter::ids(["f1"]).and(Filter::equals("elevation", 3.0));
        assert!(!both.evaluate(&f));
        assert!(Filter::Not(Box::new(both)).evaluate(&f));
    }

    #[test]
    fn test_and_collapses_include() {
        let f = Filter::equals("a", 1.0);
        assert_eq!(Filter::Include.and(f.clone()), f);
        assert_eq!(f.clone().and(Filter::Include), f);
    }

    #[test]
    fn test_map_properties() {
        let map = |name: &str| match name {
            "timeStart" => Some("time_start".to_string()),
            _ => None,
        };
        let mapped = Filter::equals("timeStart", 1.0).map_properties(&map).unwrap();
        assert_eq!(mapped, Filter::equals("time_start", 1.0));

        let err = Filter::Or(vec![Filter::equals("timeStart", 1.0), Filter::equals("bogus", 1.0)])
            .map_properties(&map)
            .unwrap_err();
        assert_eq!(err, "bogus");
    }
}
