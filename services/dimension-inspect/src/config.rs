//! Layer file loading.
//!
//! A layer file lists layers, the dimensions configured on each and the store
//! behind them, with the store contents given inline:
//!
//! ```yaml
//! settings:
//!   max_histogram_buckets: 500
//! layers:
//!   - name: dem
//!     elevation: {}
//!     store:
//!       kind: flat
//!       metadata:
//!         ELEVATION_DOMAIN: "0.0,10.0,20.0"
//! ```
//!
//! `${VAR}` and `${VAR:-default}` are substituted from the environment before
//! parsing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;

use dimensions::{
    BackingStore, DimensionDescriptor, DimensionsConfig, MemoryFeatureSource,
    MemoryGranuleCatalog, MemoryMetadataSource,
};
use wms_common::{parse_timestamp, AttributeValue, BoundingBox, Feature, LayerDefinition, Schema};

/// Root of a layer file.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerFile {
    /// Engine settings; the environment is used when absent.
    #[serde(default)]
    pub settings: Option<DimensionsConfig>,

    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    #[serde(flatten)]
    pub layer: LayerDefinition,

    pub store: StoreConfig,
}

/// The store behind a layer, with its contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Flat raster: `<NAME>_DOMAIN` metadata strings.
    Flat { metadata: BTreeMap<String, String> },

    /// Vector features.
    Vector {
        type_name: String,
        #[serde(default)]
        geometry: Option<String>,
        features: Vec<FeatureEntry>,
    },

    /// Granule catalog of a single coverage.
    Structured {
        coverage: String,
        #[serde(default)]
        geometry: Option<String>,
        dimensions: Vec<DimensionDescriptor>,
        granules: Vec<FeatureEntry>,
    },
}

/// A feature row; every key other than `id` is an attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureEntry {
    pub id: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl LayerFile {
    pub fn find(&self, name: &str) -> Option<&LayerEntry> {
        self.layers.iter().find(|entry| entry.layer.name == name)
    }

    /// Settings from the file, or the environment when the file has none.
    pub fn settings(&self) -> Result<DimensionsConfig> {
        let settings = self
            .settings
            .clone()
            .unwrap_or_else(DimensionsConfig::from_env);
        settings
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid dimension settings: {}", e))?;
        Ok(settings)
    }
}

impl StoreConfig {
    pub fn build(&self) -> Result<BackingStore> {
        Ok(match self {
            StoreConfig::Flat { metadata } => BackingStore::FlatMetadata(Arc::new(
                metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<MemoryMetadataSource>(),
            )),
            StoreConfig::Vector {
                type_name,
                geometry,
                features,
            } => {
                let schema = schema(type_name, geometry.as_deref(), features);
                let rows = to_features(features, geometry.as_deref())?;
                BackingStore::Vector(Arc::new(MemoryFeatureSource::new(schema, rows)))
            }
            StoreConfig::Structured {
                coverage,
                geometry,
                dimensions,
                granules,
            } => {
                let schema = schema(coverage, geometry.as_deref(), granules);
                let rows = to_features(granules, geometry.as_deref())?;
                let catalog = MemoryGranuleCatalog::new(
                    coverage.clone(),
                    dimensions.clone(),
                    MemoryFeatureSource::new(schema, rows),
                );
                BackingStore::Structured(Arc::new(catalog))
            }
        })
    }
}

fn schema(type_name: &str, geometry: Option<&str>, rows: &[FeatureEntry]) -> Schema {
    let mut schema = Schema::new(type_name);
    for row in rows {
        for name in row.attributes.keys() {
            if Some(name.as_str()) != geometry && !schema.attribute_names.contains(name) {
                schema = schema.with_attribute(name.clone());
            }
        }
    }
    match geometry {
        Some(geometry) => schema.with_geometry(geometry),
        None => schema,
    }
}

fn to_features(rows: &[FeatureEntry], geometry: Option<&str>) -> Result<Vec<Feature>> {
    rows.iter()
        .map(|row| {
            let mut feature = Feature::new(row.id.clone());
            for (name, value) in &row.attributes {
                let value = if Some(name.as_str()) == geometry {
                    to_geometry(value)
                        .with_context(|| format!("Bad geometry on feature {}", row.id))?
                } else {
                    to_attribute(value)
                        .with_context(|| format!("Bad attribute {} on feature {}", name, row.id))?
                };
                feature.set(name.clone(), value);
            }
            Ok(feature)
        })
        .collect()
}

/// Geometries are written as `"min_x,min_y,max_x,max_y"`.
fn to_geometry(value: &Value) -> Result<AttributeValue> {
    let raw = value
        .as_str()
        .context("geometry must be a \"min_x,min_y,max_x,max_y\" string")?;
    let bbox = BoundingBox::from_wms_string(raw)?;
    Ok(AttributeValue::Geometry(bbox))
}

/// Strings that read as timestamps become times, everything else keeps its
/// YAML type.
fn to_attribute(value: &Value) -> Result<AttributeValue> {
    Ok(match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Integer(i),
            None => AttributeValue::Number(n.as_f64().context("number out of range")?),
        },
        Value::String(s) => match parse_timestamp(s) {
            Ok(t) => AttributeValue::Time(t),
            Err(_) => AttributeValue::Text(s.clone()),
        },
        other => anyhow::bail!("unsupported attribute value {:?}", other),
    })
}

/// Load and parse a layer file.
pub fn load_layer_file<P: AsRef<Path>>(path: P) -> Result<LayerFile> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read layer file from {:?}", path.as_ref()))?;
    let expanded = expand_env_vars(&content)?;
    let file: LayerFile = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse layer file {:?}", path.as_ref()))?;

    anyhow::ensure!(!file.layers.is_empty(), "Layer file defines no layers");
    Ok(file)
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::write_temp_file;

    const LAYERS: &str = r#"
settings:
  max_histogram_buckets: 100
layers:
  - name: dem
    elevation:
      presentation: CONTINUOUS_INTERVAL
    store:
      kind: flat
      metadata:
        ELEVATION_DOMAIN: "0.0,10.0,20.0"
  - name: obs
    time:
      attribute: time
    store:
      kind: vector
      type_name: observations
      geometry: the_geom
      features:
        - id: o1
          time: "2016-02-23T00:00:00Z"
          depth: 3
          the_geom: "0,0,1,1"
        - id: o2
          time: "2016-02-24T00:00:00Z"
          depth: 4.5
          the_geom: "2,2,3,3"
  - name: sst
    time: {}
    store:
      kind: structured
      coverage: sst
      dimensions:
        - name: TIME
          start_attribute: ingestion
      granules:
        - id: g1
          ingestion: "2012-02-11T00:00:00Z"
"#;

    #[test]
    fn test_load_all_store_kinds() {
        let file = write_temp_file(LAYERS, ".yaml");
        let layers = load_layer_file(file.path()).unwrap();
        assert_eq!(layers.layers.len(), 3);
        assert_eq!(layers.settings().unwrap().max_histogram_buckets, 100);

        let kinds: Vec<&str> = layers
            .layers
            .iter()
            .map(|entry| entry.store.build().unwrap().variant_name())
            .collect();
        assert_eq!(kinds, vec!["flat_metadata", "vector", "structured"]);

        let obs = layers.find("obs").unwrap();
        assert_eq!(obs.layer.time.as_ref().unwrap().attribute.as_deref(), Some("time"));
    }

    #[test]
    fn test_attribute_conversion() {
        let value: Value = serde_yaml::from_str("\"2016-02-23T00:00:00Z\"").unwrap();
        assert!(matches!(to_attribute(&value).unwrap(), AttributeValue::Time(_)));
        let value: Value = serde_yaml::from_str("3").unwrap();
        assert_eq!(to_attribute(&value).unwrap(), AttributeValue::Integer(3));
        let value: Value = serde_yaml::from_str("4.5").unwrap();
        assert_eq!(to_attribute(&value).unwrap(), AttributeValue::Number(4.5));
        let value: Value = serde_yaml::from_str("red").unwrap();
        assert_eq!(to_attribute(&value).unwrap(), AttributeValue::Text("red".into()));
        let value: Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert!(to_attribute(&value).is_err());
    }

    #[test]
    fn test_bad_geometry_is_reported() {
        let yaml = LAYERS.replace("the_geom: \"0,0,1,1\"", "the_geom: \"0,0\"");
        let file = write_temp_file(&yaml, ".yaml");
        let layers = load_layer_file(file.path()).unwrap();
        let err = layers.find("obs").unwrap().store.build().unwrap_err();
        assert!(format!("{:#}", err).contains("o1"));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("DIMENSION_INSPECT_TEST_DOMAIN", "1.0,2.0");
        let expanded = expand_env_vars(
            "a: ${DIMENSION_INSPECT_TEST_DOMAIN}\nb: ${DIMENSION_INSPECT_UNSET_VAR:-x}",
        )
        .unwrap();
        assert_eq!(expanded, "a: 1.0,2.0\nb: x");
        assert!(expand_env_vars("${DIMENSION_INSPECT_UNSET_VAR}").is_err());
        assert!(expand_env_vars("${OPEN").is_err());
    }

    #[test]
    fn test_empty_layer_list_rejected() {
        let file = write_temp_file("layers: []\n", ".yaml");
        assert!(load_layer_file(file.path()).is_err());
    }
}
