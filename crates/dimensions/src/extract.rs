//! Domain extraction: reduce a reader's rows to ordered domain values.

use std::cmp::Ordering;

use tracing::debug;

use wms_common::{
    AttributeValue, BoundingBox, DataType, DomainValue, Filter, WmsError, WmsResult,
};

use crate::converter::ValueConverter;
use crate::reader::{DimensionReader, DimensionValues};

/// Orders domain values; fails when two values cannot be ordered.
pub trait DomainComparator {
    fn compare(&self, a: &DomainValue, b: &DomainValue) -> WmsResult<Ordering>;
}

/// Ascending natural order within one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl DomainComparator for NaturalOrder {
    fn compare(&self, a: &DomainValue, b: &DomainValue) -> WmsResult<Ordering> {
        a.natural_cmp(b).ok_or_else(|| {
            WmsError::UnsupportedSort(format!("{} values mixed with {} values", a.kind(), b.kind()))
        })
    }
}

/// Descending natural order within one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOrder;

impl DomainComparator for ReverseOrder {
    fn compare(&self, a: &DomainValue, b: &DomainValue) -> WmsResult<Ordering> {
        NaturalOrder.compare(a, b).map(Ordering::reverse)
    }
}

/// Extracted domain: envelope of the rows read plus their ordered values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainResult {
    pub bounds: BoundingBox,
    pub values: Vec<DomainValue>,
}

impl DomainResult {
    /// No rows: empty envelope, no values.
    pub fn empty() -> Self {
        Self {
            bounds: BoundingBox::empty(),
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<&DomainValue> {
        self.values.first()
    }

    pub fn last(&self) -> Option<&DomainValue> {
        self.values.last()
    }
}

impl DimensionReader {
    /// Every value, duplicates kept, sorted by `comparator`.
    pub fn read_with_duplicates(
        &self,
        dimension: &str,
        filter: &Filter,
        data_type: DataType,
        comparator: &dyn DomainComparator,
    ) -> WmsResult<DomainResult> {
        let Some(values) = self.values(dimension, filter, data_type)? else {
            debug!(dimension, "Dimension not found, returning empty domain");
            return Ok(DomainResult::empty());
        };
        let Some((bounds, raw)) = collect_values(&values, data_type)? else {
            return Ok(DomainResult::empty());
        };

        Ok(DomainResult {
            bounds,
            values: sort_values(raw, comparator)?,
        })
    }

    /// Distinct values sorted by `comparator`; values the comparator deems
    /// equal collapse into the first one seen.
    pub fn read_without_duplicates(
        &self,
        dimension: &str,
        filter: &Filter,
        data_type: DataType,
        comparator: &dyn DomainComparator,
    ) -> WmsResult<DomainResult> {
        let mut result = self.read_with_duplicates(dimension, filter, data_type, comparator)?;
        result.values = dedup_sorted(result.values, comparator)?;
        Ok(result)
    }
}

/// Pull domain values out of the rows, reading only the resolved attributes.
///
/// Text cells on a temporal or numeric dimension are parsed; custom
/// dimensions classify text from the first text cell met.
fn collect_values(
    values: &DimensionValues,
    data_type: DataType,
) -> WmsResult<Option<(BoundingBox, Vec<DomainValue>)>> {
    let Some(features) = &values.features else {
        return Ok(None);
    };

    let mut converter: Option<ValueConverter> = None;
    let mut convert = |cell: &AttributeValue| -> WmsResult<Option<DomainValue>> {
        match cell {
            AttributeValue::Text(raw) => {
                let conv = *converter.get_or_insert_with(|| ValueConverter::for_domain(data_type, raw));
                conv.parse(raw).map(Some)
            }
            other => Ok(other.to_domain_value()),
        }
    };

    let mut out = Vec::with_capacity(features.len());
    let mut skipped = 0usize;
    for feature in features.iter() {
        let start = match feature.get_non_null(&values.attribute) {
            Some(cell) => convert(cell)?,
            None => None,
        };
        let Some(start) = start else {
            skipped += 1;
            continue;
        };

        let end = match values
            .end_attribute
            .as_deref()
            .and_then(|name| feature.get_non_null(name))
        {
            Some(cell) => convert(cell)?,
            None => None,
        };

        let value = match end {
            Some(end) => DomainValue::range(start.lower(), end.upper()).ok_or_else(|| {
                WmsError::parse(start.kind().to_string(), format!("{}/{}", start, end))
            })?,
            None => start,
        };
        out.push(value);
    }

    if skipped > 0 {
        debug!(
            attribute = %values.attribute,
            skipped,
            "Rows without a dimension value were ignored"
        );
    }

    Ok(Some((features.bounds(), out)))
}

/// Stable sort with a fallible comparator; the first failure is returned.
///
/// Every value is checked against the first one before sorting, so values
/// the comparator cannot order are rejected up front.
pub fn sort_values(
    mut values: Vec<DomainValue>,
    comparator: &dyn DomainComparator,
) -> WmsResult<Vec<DomainValue>> {
    if let Some((first, rest)) = values.split_first() {
        for value in rest {
            comparator.compare(first, value)?;
        }
    }

    let mut failure: Option<WmsError> = None;
    values.sort_by(|a, b| match comparator.compare(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Collapse neighbours that compare equal. Input must already be sorted.
pub fn dedup_sorted(
    values: Vec<DomainValue>,
    comparator: &dyn DomainComparator,
) -> WmsResult<Vec<DomainValue>> {
    let mut out: Vec<DomainValue> = Vec::with_capacity(values.len());
    for value in values {
        if let Some(last) = out.last() {
            if comparator.compare(last, &value)? == Ordering::Equal {
                continue;
            }
        }
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryFeatureSource, MemoryMetadataSource};
    use crate::reader::{FlatMetadataReader, VectorReader};
    use std::sync::Arc;
    use wms_common::{Feature, Schema};

    fn flat(domain: &str) -> DimensionReader {
        let source = MemoryMetadataSource::new().with_entry("ELEVATION_DOMAIN", domain);
        DimensionReader::FlatMetadata(FlatMetadataReader::new(Arc::new(source)))
    }

    #[test]
    fn test_sorted_with_duplicates() {
        let result = flat("3.0,1.0,2.0,1.0")
            .read_with_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
            .unwrap();
        let tokens: Vec<String> = result.values.iter().map(|v| v.to_string()).collect();
        assert_eq!(tokens, vec!["1.0", "1.0", "2.0", "3.0"]);
        assert!(result.bounds.is_empty());
    }

    #[test]
    fn test_without_duplicates_reverse() {
        let result = flat("3.0,1.0,2.0,1.0")
            .read_without_duplicates("elevation", &Filter::Include, DataType::Numeric, &ReverseOrder)
            .unwrap();
        let tokens: Vec<String> = result.values.iter().map(|v| v.to_string()).collect();
        assert_eq!(tokens, vec!["3.0", "2.0", "1.0"]);
    }

    #[test]
    fn test_equal_under_comparator_collapse() {
        let values = vec![
            DomainValue::Number(1.0),
            DomainValue::NumberRange(1.0, 1.0),
            DomainValue::Number(2.0),
        ];
        let out = dedup_sorted(sort_values(values, &NaturalOrder).unwrap(), &NaturalOrder).unwrap();
        assert_eq!(out.len(), 2);
        assert!(!out[0].is_range());
    }

    #[test]
    fn test_mixed_kinds_fail_to_sort() {
        let values = vec![DomainValue::Number(1.0), DomainValue::Text("a".into())];
        let err = sort_values(values, &NaturalOrder).unwrap_err();
        assert!(matches!(err, WmsError::UnsupportedSort(_)));
    }

    #[test]
    fn test_vector_ranges_and_text_cells() {
        let schema = Schema::new("obs")
            .with_attribute("start")
            .with_attribute("end");
        let source = MemoryFeatureSource::new(
            schema,
            vec![
                Feature::new("1").with("start", 5.0).with("end", 7.0),
                Feature::new("2").with("start", "1.5"),
                Feature::new("3").with("other", 1.0),
            ],
        );
        let reader = DimensionReader::Vector(VectorReader::new(
            Arc::new(source),
            Some("start".into()),
            Some("end".into()),
        ));
        let result = reader
            .read_with_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
            .unwrap();
        assert_eq!(
            result.values,
            vec![DomainValue::Number(1.5), DomainValue::NumberRange(5.0, 7.0)]
        );
        assert!(result.values[1].is_range());
    }

    #[test]
    fn test_end_before_start_is_a_parse_error() {
        let schema = Schema::new("obs").with_attribute("start").with_attribute("end");
        let source = MemoryFeatureSource::new(
            schema,
            vec![Feature::new("1").with("start", 7.0).with("end", 5.0)],
        );
        let reader = DimensionReader::Vector(VectorReader::new(
            Arc::new(source),
            Some("start".into()),
            Some("end".into()),
        ));
        let err = reader
            .read_with_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
            .unwrap_err();
        assert!(matches!(err, WmsError::Parse { ref token, .. } if token == "7.0/5.0"));
    }

    #[test]
    fn test_mixed_kinds_rejected_before_sorting() {
        let values: Vec<DomainValue> = (0..200)
            .map(|i| {
                if i % 3 == 0 {
                    DomainValue::Text(format!("t{}", i))
                } else {
                    DomainValue::Number(f64::from(i))
                }
            })
            .collect();
        let err = sort_values(values, &NaturalOrder).unwrap_err();
        assert!(matches!(err, WmsError::UnsupportedSort(_)));
    }

    #[test]
    fn test_empty_metadata_yields_empty_result() {
        let result = flat("")
            .read_without_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
            .unwrap();
        assert!(result.is_empty());
        assert!(result.bounds.is_empty());
    }
}
