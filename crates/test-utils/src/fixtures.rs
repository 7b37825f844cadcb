//! Common test fixtures for dimension and mapping tests.
//!
//! This module provides pre-defined domains, feature rows and layers that
//! represent the common shapes of data behind a dimensioned layer.

use chrono::{DateTime, Utc};
use wms_common::{
    BoundingBox, DefaultValueSetting, DefaultValueStrategy, DimensionConfig,
    DimensionPresentation, Feature, LayerDefinition, Schema,
};

/// Raw `<NAME>_DOMAIN` metadata strings.
pub mod domains {
    /// Elevations with one repeated value
    pub const ELEVATION: &str = "1.0,1.0,2.0";

    /// Two distinct elevations
    pub const ELEVATION_PAIR: &str = "1.0,2.0";

    /// Three daily instants, two identical
    pub const TIME_DAILY: &str =
        "2012-02-11T00:00:00Z,2012-02-11T00:00:00Z,2012-02-12T00:00:00Z";

    /// Numeric ranges
    pub const DEPTH_RANGES: &str = "0.0/10.0,10.0/20.0,20.0/50.0";

    /// Text values for a custom dimension
    pub const BANDS: &str = "red,green,blue,green";
}

/// Parse a fixture timestamp, panicking on malformed input.
pub fn timestamp(s: &str) -> DateTime<Utc> {
    wms_common::parse_timestamp(s).unwrap_or_else(|e| panic!("bad fixture timestamp {}: {}", s, e))
}

/// Schema of the observation fixtures.
pub fn observation_schema() -> Schema {
    Schema::new("observations")
        .with_attribute("time")
        .with_attribute("time_end")
        .with_attribute("elevation")
        .with_geometry("the_geom")
}

fn observation(id: &str, time: &str, elevation: f64, x: f64, y: f64) -> Feature {
    Feature::new(id)
        .with("time", timestamp(time))
        .with("elevation", elevation)
        .with("the_geom", BoundingBox::from_point(x, y))
}

/// Five point observations; `o5` repeats the time and elevation of `o1`.
pub fn observations() -> Vec<Feature> {
    vec![
        observation("o1", "2016-02-23T00:00:00Z", 0.0, 0.0, 0.0),
        observation("o2", "2016-02-23T03:00:00Z", 10.0, 5.0, 5.0),
        observation("o3", "2016-02-24T00:00:00Z", 20.0, 10.0, 0.0),
        observation("o4", "2016-02-25T00:00:00Z", 30.0, 20.0, 20.0),
        observation("o5", "2016-02-23T00:00:00Z", 0.0, 1.0, 1.0),
    ]
}

/// Observations carrying an end time, making every time value a range.
pub fn ranged_observations() -> Vec<Feature> {
    vec![
        observation("r1", "2016-02-23T00:00:00Z", 0.0, 0.0, 0.0)
            .with("time_end", timestamp("2016-02-23T06:00:00Z")),
        observation("r2", "2016-02-24T00:00:00Z", 5.0, 2.0, 2.0)
            .with("time_end", timestamp("2016-02-24T12:00:00Z")),
    ]
}

/// EO product table rows.
pub mod products {
    use super::*;

    pub const TABLE: &str = "product";
    pub const METADATA_TABLE: &str = "product_metadata";
    pub const LINK_TABLE: &str = "product_ogclink";

    pub fn schema() -> Schema {
        Schema::new(TABLE)
            .with_attribute("eoIdentifier")
            .with_attribute("timeStart")
            .with_attribute("eoCloudCover")
            .with_geometry("footprint")
    }

    /// Output property to column pairs for the product table.
    pub fn mappings() -> Vec<(String, String)> {
        [
            ("identifier", "eoIdentifier"),
            ("timeStart", "timeStart"),
            ("cloudCover", "eoCloudCover"),
        ]
        .into_iter()
        .map(|(p, s)| (p.to_string(), s.to_string()))
        .collect()
    }

    /// Products `A`, `B` and `C`, one day apart.
    pub fn rows() -> Vec<Feature> {
        vec![
            Feature::new("A")
                .with("eoIdentifier", "S2A_001")
                .with("timeStart", timestamp("2017-01-01T00:00:00Z"))
                .with("eoCloudCover", 10_i64)
                .with("footprint", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            Feature::new("B")
                .with("eoIdentifier", "S2A_002")
                .with("timeStart", timestamp("2017-01-02T00:00:00Z"))
                .with("footprint", BoundingBox::new(5.0, 5.0, 20.0, 15.0)),
            Feature::new("C")
                .with("eoIdentifier", "S2A_003")
                .with("timeStart", timestamp("2017-01-03T00:00:00Z"))
                .with("eoCloudCover", 80_i64)
                .with("footprint", BoundingBox::new(-5.0, -5.0, 0.0, 0.0)),
        ]
    }

    /// Two links on `A`, one on `C`, none on `B`.
    pub fn links() -> Vec<Feature> {
        vec![
            Feature::new("l1")
                .with("product_id", "A")
                .with("href", "http://example.com/A/wms"),
            Feature::new("l2")
                .with("product_id", "A")
                .with("href", "http://example.com/A/wcs"),
            Feature::new("l3")
                .with("product_id", "C")
                .with("href", "http://example.com/C/wms"),
        ]
    }

    pub fn metadata() -> Vec<Feature> {
        vec![
            Feature::new("m1").with("mid", "A").with("metadata", "<gmi>A</gmi>"),
            Feature::new("m3").with("mid", "C").with("metadata", "<gmi>C</gmi>"),
        ]
    }
}

/// A layer configuring time, elevation and a custom dimension.
pub fn layer_with_all_dimensions(name: &str) -> LayerDefinition {
    LayerDefinition::new(name)
        .with_time(
            DimensionConfig::default()
                .with_attribute("time")
                .with_presentation(DimensionPresentation::ContinuousInterval),
        )
        .with_elevation(
            DimensionConfig::default()
                .with_attribute("elevation")
                .with_default_value(DefaultValueSetting::new(DefaultValueStrategy::Maximum)),
        )
        .with_custom("band", DimensionConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_timestamps_parse() {
        assert_eq!(observations().len(), 5);
        assert_eq!(ranged_observations().len(), 2);
    }

    #[test]
    fn test_layer_has_three_dimensions() {
        assert_eq!(layer_with_all_dimensions("obs").configured_dimensions().len(), 3);
    }

    #[test]
    fn test_products_reference_existing_rows() {
        let ids: Vec<String> = products::rows().into_iter().map(|f| f.id).collect();
        for link in products::links() {
            let pid = link.get("product_id").and_then(|v| v.as_text()).unwrap();
            assert!(ids.iter().any(|id| id == pid));
        }
    }
}
