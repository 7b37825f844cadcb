//! Source reader strategy.
//!
//! One reader per dimension request, chosen by the kind of store behind the
//! layer. Callers only go through the shared operations below; which variant
//! they hold never matters to them.

use std::sync::Arc;

use tracing::debug;

use wms_common::{
    DataType, DimensionConfig, Feature, FeatureCollection, FeatureSource, Filter, Query,
    WmsError, WmsResult,
};

use crate::converter::ValueConverter;
use crate::store::{BackingStore, GranuleCatalog, MetadataSource};

/// Start and end attribute holding a dimension's values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeNames {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Raw rows for one dimension, with the attributes to read from them.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionValues {
    pub attribute: String,
    pub end_attribute: Option<String>,
    /// `None` when the store holds no values at all for the dimension.
    pub features: Option<FeatureCollection>,
}

/// Reader for a dimension of one layer.
#[derive(Clone)]
pub enum DimensionReader {
    Structured(StructuredReader),
    FlatMetadata(FlatMetadataReader),
    Vector(VectorReader),
}

impl std::fmt::Debug for DimensionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DimensionReader::{}", self.variant_name())
    }
}

impl DimensionReader {
    /// Pick the reader matching the layer's store.
    ///
    /// Vector readers take their attribute names from the dimension config;
    /// the raster readers discover them.
    pub fn from_store(store: &BackingStore, config: &DimensionConfig) -> Self {
        match store {
            BackingStore::Structured(catalog) => {
                DimensionReader::Structured(StructuredReader::new(catalog.clone()))
            }
            BackingStore::FlatMetadata(source) => {
                DimensionReader::FlatMetadata(FlatMetadataReader::new(source.clone()))
            }
            BackingStore::Vector(source) => DimensionReader::Vector(VectorReader::new(
                source.clone(),
                config.attribute.clone(),
                config.end_attribute.clone(),
            )),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            DimensionReader::Structured(_) => "structured",
            DimensionReader::FlatMetadata(_) => "flat_metadata",
            DimensionReader::Vector(_) => "vector",
        }
    }

    pub fn dimension_attribute_names(&self, dimension: &str) -> WmsResult<AttributeNames> {
        match self {
            DimensionReader::Structured(r) => r.dimension_attribute_names(dimension),
            DimensionReader::FlatMetadata(r) => Ok(r.dimension_attribute_names(dimension)),
            DimensionReader::Vector(r) => Ok(r.dimension_attribute_names()),
        }
    }

    /// Geometry attribute usable for spatial filtering, if any.
    pub fn geometry_attribute_name(&self) -> WmsResult<Option<String>> {
        match self {
            DimensionReader::Structured(r) => r.geometry_attribute_name(),
            DimensionReader::FlatMetadata(_) => Ok(None),
            DimensionReader::Vector(r) => r.geometry_attribute_name(),
        }
    }

    /// Fetch the rows carrying the dimension's values.
    ///
    /// `Ok(None)` means the dimension is unknown to the store.
    pub fn values(
        &self,
        dimension: &str,
        filter: &Filter,
        data_type: DataType,
    ) -> WmsResult<Option<DimensionValues>> {
        let values = match self {
            DimensionReader::Structured(r) => r.values(dimension, filter)?,
            DimensionReader::FlatMetadata(r) => Some(r.values(dimension, filter, data_type)?),
            DimensionReader::Vector(r) => r.values(filter)?,
        };

        debug!(
            reader = self.variant_name(),
            dimension,
            rows = values
                .as_ref()
                .and_then(|v| v.features.as_ref())
                .map(|fc| fc.len())
                .unwrap_or(0),
            "Read dimension values"
        );

        Ok(values)
    }
}

/// Reads a structured multi-granule catalog.
#[derive(Clone)]
pub struct StructuredReader {
    catalog: Arc<dyn GranuleCatalog>,
}

impl StructuredReader {
    pub fn new(catalog: Arc<dyn GranuleCatalog>) -> Self {
        Self { catalog }
    }

    fn coverage(&self) -> WmsResult<String> {
        self.catalog
            .coverage_names()?
            .into_iter()
            .next()
            .ok_or_else(|| WmsError::store("granule catalog serves no coverage"))
    }

    pub fn dimension_attribute_names(&self, dimension: &str) -> WmsResult<AttributeNames> {
        let coverage = self.coverage()?;
        let mut names = AttributeNames::default();
        // last matching descriptor wins
        for descriptor in self.catalog.dimension_descriptors(&coverage)? {
            if descriptor.name.eq_ignore_ascii_case(dimension) {
                names = AttributeNames {
                    start: Some(descriptor.start_attribute),
                    end: descriptor.end_attribute,
                };
            }
        }
        Ok(names)
    }

    pub fn geometry_attribute_name(&self) -> WmsResult<Option<String>> {
        let coverage = self.coverage()?;
        Ok(self.catalog.granule_schema(&coverage)?.geometry_attribute)
    }

    pub fn values(&self, dimension: &str, filter: &Filter) -> WmsResult<Option<DimensionValues>> {
        let coverage = self.coverage()?;
        let names = self.dimension_attribute_names(dimension)?;
        let Some(attribute) = names.start else {
            return Ok(None);
        };

        let schema = self.catalog.granule_schema(&coverage)?;
        let mut properties = vec![attribute.clone()];
        properties.extend(names.end.clone());
        properties.extend(schema.geometry_attribute.clone());

        let query = Query::new(schema.type_name)
            .with_filter(filter.clone())
            .with_properties(properties);
        let features = self.catalog.granules(&coverage, &query)?;

        Ok(Some(DimensionValues {
            attribute,
            end_attribute: names.end,
            features: Some(features),
        }))
    }
}

/// Reads domains encoded as `<NAME>_DOMAIN` metadata on a flat raster.
#[derive(Clone)]
pub struct FlatMetadataReader {
    source: Arc<dyn MetadataSource>,
}

impl FlatMetadataReader {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Metadata key holding the domain, e.g. `TIME_DOMAIN`.
    pub fn domain_key(dimension: &str) -> String {
        format!("{}_DOMAIN", dimension.to_uppercase())
    }

    pub fn dimension_attribute_names(&self, dimension: &str) -> AttributeNames {
        AttributeNames {
            start: Some(Self::domain_key(dimension)),
            end: None,
        }
    }

    /// Build one row per comma-separated token and filter the rows locally.
    pub fn values(
        &self,
        dimension: &str,
        filter: &Filter,
        data_type: DataType,
    ) -> WmsResult<DimensionValues> {
        let attribute = Self::domain_key(dimension);
        let raw = self.source.metadata_value(&attribute)?;

        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Ok(DimensionValues {
                    attribute,
                    end_attribute: None,
                    features: None,
                })
            }
        };

        let tokens: Vec<&str> = raw.split(',').collect();
        let converter = ValueConverter::for_domain(data_type, tokens[0]);

        let mut features = FeatureCollection::empty();
        for (index, token) in tokens.iter().enumerate() {
            let value = converter.parse(token)?;
            let feature = Feature::new(index.to_string()).with(attribute.clone(), value);
            if filter.evaluate(&feature) {
                features.push(feature);
            }
        }

        Ok(DimensionValues {
            attribute,
            end_attribute: None,
            features: Some(features),
        })
    }
}

/// Reads dimension columns of a vector feature source.
#[derive(Clone)]
pub struct VectorReader {
    source: Arc<dyn FeatureSource>,
    start_attribute: Option<String>,
    end_attribute: Option<String>,
}

impl VectorReader {
    pub fn new(
        source: Arc<dyn FeatureSource>,
        start_attribute: Option<String>,
        end_attribute: Option<String>,
    ) -> Self {
        Self {
            source,
            start_attribute,
            end_attribute,
        }
    }

    pub fn dimension_attribute_names(&self) -> AttributeNames {
        AttributeNames {
            start: self.start_attribute.clone(),
            end: self.end_attribute.clone(),
        }
    }

    pub fn geometry_attribute_name(&self) -> WmsResult<Option<String>> {
        Ok(self.source.schema()?.geometry_attribute)
    }

    pub fn values(&self, filter: &Filter) -> WmsResult<Option<DimensionValues>> {
        let Some(attribute) = self.start_attribute.clone() else {
            return Ok(None);
        };

        let schema = self.source.schema()?;
        let mut properties = vec![attribute.clone()];
        properties.extend(self.end_attribute.clone());
        properties.extend(schema.geometry_attribute.clone());

        let query = Query::new(schema.type_name)
            .with_filter(filter.clone())
            .with_properties(properties);

        Ok(Some(DimensionValues {
            attribute,
            end_attribute: self.end_attribute.clone(),
            features: Some(self.source.features(&query)?),
        }))
    }
}
