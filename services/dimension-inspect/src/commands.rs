//! Operations behind each subcommand.
//!
//! Every command resolves one layer from the layer file, builds its store and
//! returns a serializable report; printing is left to `main`.

use serde::Serialize;
use tracing::{debug, info, instrument};

use dimensions::{extract_dimensions, Dimension, DimensionsConfig, Histogram};
use wms_common::{
    BoundingBox, DefaultValueSetting, DefaultValueStrategy, DimensionPresentation, Filter,
    WmsError, WmsResult,
};

use crate::config::LayerFile;

/// One dimension as listed by `list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub layer: String,
    pub dimension: String,
    pub store: &'static str,
    pub presentation: DimensionPresentation,
    pub default_value: Option<String>,
}

/// Domain of one dimension as returned by `domain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReport {
    pub layer: String,
    pub dimension: String,
    pub values: Vec<String>,
    /// Envelope of the matching rows, when the store has geometries.
    pub bounds: Option<BoundingBox>,
    /// Domain in its advertised presentation.
    pub representation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultReport {
    pub layer: String,
    pub dimension: String,
    pub strategy: DefaultValueStrategy,
    pub value: Option<String>,
}

/// Resolved layer with its dimensions bound to a store.
pub struct Inspector {
    layers: LayerFile,
    settings: DimensionsConfig,
}

impl Inspector {
    pub fn new(layers: LayerFile) -> anyhow::Result<Self> {
        let settings = layers.settings()?;
        Ok(Self { layers, settings })
    }

    fn dimensions(&self, layer: &str) -> WmsResult<Vec<Dimension>> {
        let entry = self
            .layers
            .find(layer)
            .ok_or_else(|| WmsError::LayerNotFound(layer.to_string()))?;
        let store = entry
            .store
            .build()
            .map_err(|e| WmsError::InvalidConfig(format!("{:#}", e)))?;
        Ok(extract_dimensions(&entry.layer, &store, &self.settings))
    }

    fn dimension(&self, layer: &str, name: &str) -> WmsResult<Dimension> {
        self.dimensions(layer)?
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| WmsError::DimensionNotFound(format!("{}/{}", layer, name)))
    }

    fn filter(dimension: &Dimension, bbox: Option<BoundingBox>) -> WmsResult<Filter> {
        match bbox {
            Some(bbox) => dimension.spatial_filter(bbox),
            None => Ok(Filter::Include),
        }
    }

    /// Enabled dimensions of every layer, or of one layer.
    pub fn list(&self, layer: Option<&str>) -> WmsResult<Vec<DimensionSummary>> {
        let names: Vec<&str> = match layer {
            Some(layer) => vec![layer],
            None => self.layers.layers.iter().map(|e| e.layer.name.as_str()).collect(),
        };

        let mut out = Vec::new();
        for name in names {
            for dimension in self.dimensions(name)? {
                out.push(DimensionSummary {
                    layer: dimension.layer_name().to_string(),
                    dimension: dimension.name().to_string(),
                    store: dimension.reader().variant_name(),
                    presentation: dimension.config().presentation,
                    default_value: dimension.default_value()?.map(|v| v.to_string()),
                });
            }
        }
        info!(count = out.len(), "Listed dimensions");
        Ok(out)
    }

    #[instrument(skip(self))]
    pub fn domain(
        &self,
        layer: &str,
        dimension: &str,
        bbox: Option<BoundingBox>,
        duplicates: bool,
    ) -> WmsResult<DomainReport> {
        let dim = self.dimension(layer, dimension)?;
        let filter = Self::filter(&dim, bbox)?;
        let result = if duplicates {
            dim.read_with_duplicates(&filter, &dimensions::NaturalOrder)?
        } else {
            dim.read_without_duplicates(&filter, &dimensions::NaturalOrder)?
        };
        debug!(values = result.values.len(), "Read domain");

        Ok(DomainReport {
            layer: layer.to_string(),
            dimension: dim.name().to_string(),
            values: result.values.iter().map(|v| v.to_string()).collect(),
            bounds: (!result.bounds.is_empty()).then_some(result.bounds),
            representation: dim.domain_representation(&filter)?,
        })
    }

    #[instrument(skip(self))]
    pub fn histogram(
        &self,
        layer: &str,
        dimension: &str,
        resolution: &str,
        bbox: Option<BoundingBox>,
    ) -> WmsResult<Histogram> {
        let dim = self.dimension(layer, dimension)?;
        let filter = Self::filter(&dim, bbox)?;
        dim.histogram(&filter, resolution)
    }

    /// Default value under `strategy`, or under the configured one.
    #[instrument(skip(self))]
    pub fn default_value(
        &self,
        layer: &str,
        dimension: &str,
        strategy: Option<DefaultValueStrategy>,
        reference: Option<String>,
    ) -> WmsResult<DefaultReport> {
        let dim = self.dimension(layer, dimension)?;
        let setting = match strategy {
            Some(strategy) => DefaultValueSetting {
                strategy,
                reference_value: reference,
            },
            None => dim
                .config()
                .default_value
                .clone()
                .unwrap_or_else(|| dimensions::implicit_setting(dim.kind())),
        };
        let value = dim.default_value_with(&setting)?;

        Ok(DefaultReport {
            layer: layer.to_string(),
            dimension: dim.name().to_string(),
            strategy: setting.strategy,
            value: value.map(|v| v.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_layer_file;
    use test_utils::write_temp_file;

    const LAYERS: &str = r#"
layers:
  - name: dem
    elevation:
      presentation: CONTINUOUS_INTERVAL
    store:
      kind: flat
      metadata:
        ELEVATION_DOMAIN: "0.0,10.0,20.0,10.0"
  - name: obs
    elevation:
      attribute: depth
    store:
      kind: vector
      type_name: observations
      geometry: the_geom
      features:
        - id: o1
          depth: 1.0
          the_geom: "0,0,0,0"
        - id: o2
          depth: 2.0
          the_geom: "5,5,5,5"
        - id: o3
          depth: 3.0
          the_geom: "9,9,9,9"
"#;

    fn inspector() -> Inspector {
        let file = write_temp_file(LAYERS, ".yaml");
        Inspector::new(load_layer_file(file.path()).unwrap()).unwrap()
    }

    #[test]
    fn test_list_all_layers() {
        let summaries = inspector().list(None).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].store, "flat_metadata");
        assert_eq!(summaries[0].default_value.as_deref(), Some("0.0"));
        assert_eq!(summaries[1].store, "vector");
    }

    #[test]
    fn test_domain_with_representation() {
        let report = inspector().domain("dem", "elevation", None, false).unwrap();
        assert_eq!(report.values, vec!["0.0", "10.0", "20.0"]);
        assert_eq!(report.representation, vec!["0.0--20.0"]);
        assert_eq!(report.bounds, None);

        let with_dups = inspector().domain("dem", "ELEVATION", None, true).unwrap();
        assert_eq!(with_dups.values.len(), 4);
    }

    #[test]
    fn test_domain_spatially_filtered() {
        let bbox = BoundingBox::new(4.0, 4.0, 10.0, 10.0);
        let report = inspector().domain("obs", "elevation", Some(bbox), false).unwrap();
        assert_eq!(report.values, vec!["2.0", "3.0"]);
        assert_eq!(report.bounds, Some(BoundingBox::new(5.0, 5.0, 9.0, 9.0)));
    }

    #[test]
    fn test_histogram_and_default() {
        let inspector = inspector();
        let histogram = inspector.histogram("obs", "elevation", "1", None).unwrap();
        assert_eq!(histogram.domain, "1.0/3.0/1");
        assert_eq!(histogram.counts, vec![1, 2]);

        let max = inspector
            .default_value("dem", "elevation", Some(DefaultValueStrategy::Maximum), None)
            .unwrap();
        assert_eq!(max.value.as_deref(), Some("20.0"));

        let nearest = inspector
            .default_value(
                "dem",
                "elevation",
                Some(DefaultValueStrategy::Nearest),
                Some("12".to_string()),
            )
            .unwrap();
        assert_eq!(nearest.value.as_deref(), Some("10.0"));
    }

    #[test]
    fn test_unknown_layer_and_dimension() {
        let inspector = inspector();
        assert!(matches!(
            inspector.domain("nope", "time", None, false),
            Err(WmsError::LayerNotFound(_))
        ));
        assert!(matches!(
            inspector.domain("dem", "time", None, false),
            Err(WmsError::DimensionNotFound(_))
        ));
    }
}
