//! Default value selection.

use std::cmp::Ordering;

use tracing::debug;

use wms_common::{
    DataType, DefaultValueSetting, DefaultValueStrategy, DimensionKind, DomainKind, DomainValue,
    WmsError, WmsResult,
};

use crate::converter;
use crate::extract::{sort_values, DomainComparator};

/// Strategy used when a dimension configures none: the latest time, the
/// lowest of anything else.
pub fn implicit_setting(kind: &DimensionKind) -> DefaultValueSetting {
    match kind {
        DimensionKind::Time => DefaultValueSetting::new(DefaultValueStrategy::Maximum),
        _ => DefaultValueSetting::new(DefaultValueStrategy::Minimum),
    }
}

/// Pick the representative value of `domain` under `setting`.
///
/// `Ok(None)` means there is no default: the domain is empty, or a NEAREST
/// lookup on a string domain found no exact match. FIXED ignores the domain.
pub fn resolve_default(
    domain: &[DomainValue],
    setting: &DefaultValueSetting,
    data_type: DataType,
    comparator: &dyn DomainComparator,
) -> WmsResult<Option<DomainValue>> {
    match setting.strategy {
        DefaultValueStrategy::Minimum => extreme(domain, comparator, Ordering::Less),
        DefaultValueStrategy::Maximum => extreme(domain, comparator, Ordering::Greater),
        DefaultValueStrategy::Nearest => {
            if domain.is_empty() {
                return Ok(None);
            }
            let reference = reference_value(domain, setting, data_type)?;
            nearest(domain, &reference, comparator)
        }
        DefaultValueStrategy::Fixed => reference_value(domain, setting, data_type).map(Some),
    }
}

/// The first value that beats every other one in `wanted` direction.
fn extreme(
    domain: &[DomainValue],
    comparator: &dyn DomainComparator,
    wanted: Ordering,
) -> WmsResult<Option<DomainValue>> {
    let mut best: Option<&DomainValue> = None;
    for value in domain {
        best = match best {
            Some(current) if comparator.compare(value, current)? != wanted => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned())
}

/// Parse the configured reference with the kind of the domain it applies to.
fn reference_value(
    domain: &[DomainValue],
    setting: &DefaultValueSetting,
    data_type: DataType,
) -> WmsResult<DomainValue> {
    let raw = setting.reference_value.as_deref().ok_or_else(|| {
        WmsError::InvalidConfig(format!(
            "default value strategy {:?} needs a reference value",
            setting.strategy
        ))
    })?;

    let kind = data_type
        .fixed_kind()
        .or_else(|| domain.first().map(DomainValue::kind))
        .unwrap_or_else(|| converter::classify(data_type, raw));
    converter::parse(kind, raw)
}

fn nearest(
    domain: &[DomainValue],
    reference: &DomainValue,
    comparator: &dyn DomainComparator,
) -> WmsResult<Option<DomainValue>> {
    if reference.kind() == DomainKind::Text {
        let found = domain.iter().find(|v| *v == reference).cloned();
        debug!(reference = %reference, found = found.is_some(), "Exact match lookup on string domain");
        return Ok(found);
    }

    let Some(target) = reference.position() else {
        return Ok(None);
    };

    // walk in comparator order so ties keep the lower value
    let sorted = sort_values(domain.to_vec(), comparator)?;
    let mut best: Option<(f64, DomainValue)> = None;
    for value in sorted {
        let Some(distance) = distance(&value, target) else {
            continue;
        };
        if best.as_ref().map_or(true, |(d, _)| distance < *d) {
            best = Some((distance, value));
        }
    }
    Ok(best.map(|(_, value)| value))
}

/// Distance from `target` to a value; zero when a range covers it.
fn distance(value: &DomainValue, target: f64) -> Option<f64> {
    let lower = value.lower().position()?;
    let upper = value.upper().position()?;
    if lower <= target && target <= upper {
        Some(0.0)
    } else {
        Some((lower - target).abs().min((upper - target).abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::NaturalOrder;
    use wms_common::parse_timestamp;

    fn numbers(values: &[f64]) -> Vec<DomainValue> {
        values.iter().map(|v| DomainValue::Number(*v)).collect()
    }

    fn setting(strategy: DefaultValueStrategy) -> DefaultValueSetting {
        DefaultValueSetting::new(strategy)
    }

    #[test]
    fn test_minimum_and_maximum() {
        let domain = numbers(&[2.0, 1.0, 2.0]);
        let min = resolve_default(&domain, &setting(DefaultValueStrategy::Minimum), DataType::Numeric, &NaturalOrder)
            .unwrap();
        let max = resolve_default(&domain, &setting(DefaultValueStrategy::Maximum), DataType::Numeric, &NaturalOrder)
            .unwrap();
        assert_eq!(min, Some(DomainValue::Number(1.0)));
        assert_eq!(max, Some(DomainValue::Number(2.0)));
    }

    #[test]
    fn test_empty_domain_has_no_default() {
        for strategy in [
            DefaultValueStrategy::Minimum,
            DefaultValueStrategy::Maximum,
            DefaultValueStrategy::Nearest,
        ] {
            let s = setting(strategy).with_reference("1.0");
            assert_eq!(
                resolve_default(&[], &s, DataType::Numeric, &NaturalOrder).unwrap(),
                None
            );
        }
    }

    #[test]
    fn test_nearest_ties_pick_lower() {
        let domain = numbers(&[3.0, 1.0, 5.0]);
        let s = setting(DefaultValueStrategy::Nearest).with_reference("2.0");
        let value = resolve_default(&domain, &s, DataType::Numeric, &NaturalOrder).unwrap();
        assert_eq!(value, Some(DomainValue::Number(1.0)));

        let s = setting(DefaultValueStrategy::Nearest).with_reference("4.5");
        let value = resolve_default(&domain, &s, DataType::Numeric, &NaturalOrder).unwrap();
        assert_eq!(value, Some(DomainValue::Number(5.0)));
    }

    #[test]
    fn test_nearest_time_inside_range() {
        let t = |s: &str| parse_timestamp(s).unwrap();
        let domain = vec![
            DomainValue::TimeRange(t("2012-02-01T00:00:00Z"), t("2012-02-10T00:00:00Z")),
            DomainValue::Time(t("2012-02-11T00:00:00Z")),
        ];
        let s = setting(DefaultValueStrategy::Nearest).with_reference("2012-02-05T00:00:00Z");
        let value = resolve_default(&domain, &s, DataType::Temporal, &NaturalOrder)
            .unwrap()
            .unwrap();
        assert!(value.is_range());
    }

    #[test]
    fn test_nearest_text_needs_exact_match() {
        let domain = vec![DomainValue::Text("red".into()), DomainValue::Text("blue".into())];
        let s = setting(DefaultValueStrategy::Nearest).with_reference("blue");
        assert_eq!(
            resolve_default(&domain, &s, DataType::Custom, &NaturalOrder).unwrap(),
            Some(DomainValue::Text("blue".into()))
        );
        let s = setting(DefaultValueStrategy::Nearest).with_reference("green");
        assert_eq!(
            resolve_default(&domain, &s, DataType::Custom, &NaturalOrder).unwrap(),
            None
        );
    }

    #[test]
    fn test_fixed_parses_reference() {
        let s = setting(DefaultValueStrategy::Fixed).with_reference("2012-02-11T00:00:00Z");
        let value = resolve_default(&[], &s, DataType::Temporal, &NaturalOrder).unwrap();
        assert_eq!(value.unwrap().to_string(), "2012-02-11T00:00:00.000Z");

        let s = setting(DefaultValueStrategy::Fixed).with_reference("abc");
        let err = resolve_default(&[], &s, DataType::Numeric, &NaturalOrder).unwrap_err();
        assert!(matches!(err, WmsError::Parse { .. }));
    }

    #[test]
    fn test_missing_reference_is_a_config_error() {
        let domain = numbers(&[1.0]);
        let err = resolve_default(&domain, &setting(DefaultValueStrategy::Fixed), DataType::Numeric, &NaturalOrder)
            .unwrap_err();
        assert!(matches!(err, WmsError::InvalidConfig(_)));
    }

    #[test]
    fn test_implicit_settings() {
        assert_eq!(
            implicit_setting(&DimensionKind::Time).strategy,
            DefaultValueStrategy::Maximum
        );
        assert_eq!(
            implicit_setting(&DimensionKind::Custom("band".into())).strategy,
            DefaultValueStrategy::Minimum
        );
    }
}
