//! Backing store capabilities consumed by the dimension readers.
//!
//! Reading bytes off disk is not done here. Each capability is a narrow trait
//! implemented by whatever owns the data; `BackingStore` names which one a
//! layer uses.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wms_common::{FeatureCollection, Query, Schema, WmsResult};

pub use wms_common::FeatureSource;

/// Describes where a structured source keeps one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub name: String,
    pub start_attribute: String,
    #[serde(default)]
    pub end_attribute: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

impl DimensionDescriptor {
    pub fn new(name: impl Into<String>, start_attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_attribute: start_attribute.into(),
            end_attribute: None,
            units: None,
        }
    }

    pub fn with_end_attribute(mut self, end_attribute: impl Into<String>) -> Self {
        self.end_attribute = Some(end_attribute.into());
        self
    }
}

/// A multi-granule raster catalog with one row per granule.
pub trait GranuleCatalog: Send + Sync {
    /// Names of the coverages served; the first one is queried.
    fn coverage_names(&self) -> WmsResult<Vec<String>>;

    fn dimension_descriptors(&self, coverage: &str) -> WmsResult<Vec<DimensionDescriptor>>;

    fn granule_schema(&self, coverage: &str) -> WmsResult<Schema>;

    /// Granule rows matching the query; the filter is applied by the catalog.
    fn granules(&self, coverage: &str, query: &Query) -> WmsResult<FeatureCollection>;
}

/// A flat raster exposing its domains as metadata strings.
pub trait MetadataSource: Send + Sync {
    fn metadata_value(&self, key: &str) -> WmsResult<Option<String>>;
}

/// The store behind a layer.
#[derive(Clone)]
pub enum BackingStore {
    Structured(Arc<dyn GranuleCatalog>),
    FlatMetadata(Arc<dyn MetadataSource>),
    Vector(Arc<dyn FeatureSource>),
}

impl BackingStore {
    pub fn variant_name(&self) -> &'static str {
        match self {
            BackingStore::Structured(_) => "structured",
            BackingStore::FlatMetadata(_) => "flat_metadata",
            BackingStore::Vector(_) => "vector",
        }
    }
}

impl fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackingStore::{}", self.variant_name())
    }
}
