//! End-to-end domain extraction over the three kinds of backing store.

use std::sync::Arc;

use dimensions::{
    extract_dimensions, BackingStore, DimensionDescriptor, DimensionReader, DimensionsConfig,
    MemoryFeatureSource, MemoryGranuleCatalog, MemoryMetadataSource, NaturalOrder, ReverseOrder,
};
use test_utils::{assert_bbox_approx_eq, domains, observation_schema, observations, ranged_observations};
use wms_common::{
    BoundingBox, CompareOp, DataType, DimensionConfig, DimensionKind, DomainValue, Filter,
    LayerDefinition, WmsError,
};

fn flat(key: &str, domain: &str) -> BackingStore {
    BackingStore::FlatMetadata(Arc::new(MemoryMetadataSource::new().with_entry(key, domain)))
}

fn vector() -> BackingStore {
    BackingStore::Vector(Arc::new(MemoryFeatureSource::new(
        observation_schema(),
        observations(),
    )))
}

fn structured() -> BackingStore {
    let granules = MemoryFeatureSource::new(observation_schema(), ranged_observations());
    let catalog = MemoryGranuleCatalog::new(
        "sst",
        vec![
            DimensionDescriptor::new("time", "time").with_end_attribute("time_end"),
            DimensionDescriptor::new("elevation", "elevation"),
        ],
        granules,
    );
    BackingStore::Structured(Arc::new(catalog))
}

fn tokens(values: &[DomainValue]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_empty_row_set_gives_empty_result_everywhere() {
    let empty_vector = BackingStore::Vector(Arc::new(MemoryFeatureSource::new(
        observation_schema(),
        vec![],
    )));
    let stores = [flat("ELEVATION_DOMAIN", ""), empty_vector, structured()];
    let config = DimensionConfig::default().with_attribute("elevation");

    for store in &stores {
        let reader = DimensionReader::from_store(store, &config);
        // structured catalog rows exist, so exclude them all
        let filter = Filter::Exclude;
        let with = reader
            .read_with_duplicates("elevation", &filter, DataType::Numeric, &NaturalOrder)
            .unwrap();
        let without = reader
            .read_without_duplicates("elevation", &filter, DataType::Numeric, &NaturalOrder)
            .unwrap();
        assert!(with.is_empty(), "{}", store.variant_name());
        assert!(with.bounds.is_empty(), "{}", store.variant_name());
        assert!(without.is_empty());
        assert!(without.bounds.is_empty());
    }
}

#[test]
fn test_unknown_dimension_is_empty_not_an_error() {
    let reader = DimensionReader::from_store(&structured(), &DimensionConfig::default());
    let result = reader
        .read_without_duplicates("band", &Filter::Include, DataType::Custom, &NaturalOrder)
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_deduplication_collapses_equal_values() {
    let reader = DimensionReader::from_store(
        &flat("ELEVATION_DOMAIN", "5.0,5.0,5.0,5.0"),
        &DimensionConfig::default(),
    );
    let result = reader
        .read_without_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
        .unwrap();
    assert_eq!(result.values, vec![DomainValue::Number(5.0)]);
}

#[test]
fn test_get_values_is_idempotent() {
    let reader = DimensionReader::from_store(&vector(), &DimensionConfig::default().with_attribute("time"));
    let filter = Filter::compare("elevation", CompareOp::Less, 25.0);
    let first = reader.values("time", &filter, DataType::Temporal).unwrap();
    let second = reader.values("time", &filter, DataType::Temporal).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_vector_domain_and_bounds() {
    let config = DimensionConfig::default().with_attribute("elevation");
    let reader = DimensionReader::from_store(&vector(), &config);

    let with = reader
        .read_with_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
        .unwrap();
    assert_eq!(tokens(&with.values), vec!["0.0", "0.0", "10.0", "20.0", "30.0"]);
    assert_bbox_approx_eq!(with.bounds, (0.0, 0.0, 20.0, 20.0), 1e-12);

    let without = reader
        .read_without_duplicates("elevation", &Filter::Include, DataType::Numeric, &ReverseOrder)
        .unwrap();
    assert_eq!(tokens(&without.values), vec!["30.0", "20.0", "10.0", "0.0"]);
}

#[test]
fn test_structured_ranges_and_spatial_filter() {
    let layer = LayerDefinition::new("sst").with_time(DimensionConfig::default());
    let dims = extract_dimensions(&layer, &structured(), &DimensionsConfig::default());
    assert_eq!(dims.len(), 1);
    let time = &dims[0];

    let values = time.domain_values(&Filter::Include).unwrap();
    assert!(values.iter().all(DomainValue::is_range));
    assert_eq!(
        tokens(&values),
        vec![
            "2016-02-23T00:00:00.000Z/2016-02-23T06:00:00.000Z",
            "2016-02-24T00:00:00.000Z/2016-02-24T12:00:00.000Z",
        ]
    );

    let filter = time.spatial_filter(BoundingBox::new(1.0, 1.0, 3.0, 3.0)).unwrap();
    assert!(!filter.is_include());
    let result = time.read_without_duplicates(&filter, &NaturalOrder).unwrap();
    assert_eq!(result.values.len(), 1);
    assert_bbox_approx_eq!(result.bounds, (2.0, 2.0, 2.0, 2.0), 1e-12);
}

#[test]
fn test_flat_ranges_parse_per_token() {
    let reader = DimensionReader::from_store(
        &flat("DEPTH_DOMAIN", domains::DEPTH_RANGES),
        &DimensionConfig::default(),
    );
    let result = reader
        .read_with_duplicates("depth", &Filter::Include, DataType::Custom, &NaturalOrder)
        .unwrap();
    assert_eq!(result.values.len(), 3);
    assert_eq!(result.values[2], DomainValue::NumberRange(20.0, 50.0));
}

#[test]
fn test_flat_parse_failure_propagates() {
    let reader = DimensionReader::from_store(
        &flat("ELEVATION_DOMAIN", "1.0,oops"),
        &DimensionConfig::default(),
    );
    let err = reader
        .read_with_duplicates("elevation", &Filter::Include, DataType::Numeric, &NaturalOrder)
        .unwrap_err();
    assert!(matches!(err, WmsError::Parse { .. }));
}

#[test]
fn test_disabled_dimension_is_not_discovered() {
    let layer = LayerDefinition::new("obs")
        .with_time(DimensionConfig::default().with_attribute("time").disabled());
    let dims = extract_dimensions(&layer, &vector(), &DimensionsConfig::default());
    assert!(dims.is_empty());
}

#[test]
fn test_discovery_order() {
    let layer = test_utils::layer_with_all_dimensions("obs");
    let dims = extract_dimensions(&layer, &vector(), &DimensionsConfig::default());
    let kinds: Vec<&DimensionKind> = dims.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            &DimensionKind::Time,
            &DimensionKind::Elevation,
            &DimensionKind::Custom("band".into())
        ]
    );
}
