//! In-memory stores.
//!
//! Used by the inspection tool for layers described inline in YAML, and by
//! tests. They evaluate filters, ordering and paging the way a database-backed
//! store would.

use std::collections::BTreeMap;

use wms_common::{
    compare_features, Feature, FeatureCollection, FeatureSource, Query, Schema, WmsError,
    WmsResult,
};

use crate::store::{DimensionDescriptor, GranuleCatalog, MetadataSource};

/// Feature rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureSource {
    schema: Schema,
    features: Vec<Feature>,
}

impl MemoryFeatureSource {
    pub fn new(schema: Schema, features: Vec<Feature>) -> Self {
        Self { schema, features }
    }

    pub fn add(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    fn run(&self, query: &Query) -> WmsResult<Vec<Feature>> {
        if !query.joins.is_empty() {
            return Err(WmsError::store(format!(
                "in-memory source '{}' cannot execute joins",
                self.schema.type_name
            )));
        }

        let mut rows: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| query.filter.evaluate(f))
            .cloned()
            .collect();

        if !query.sort_by.is_empty() {
            rows.sort_by(|a, b| compare_features(a, b, &query.sort_by));
        }

        let start = query.start_index.unwrap_or(0);
        let rows = rows
            .into_iter()
            .skip(start)
            .take(query.max_features.unwrap_or(usize::MAX));

        Ok(match &query.property_names {
            Some(names) => rows.map(|f| f.project(names)).collect(),
            None => rows.collect(),
        })
    }
}

impl FeatureSource for MemoryFeatureSource {
    fn schema(&self) -> WmsResult<Schema> {
        Ok(self.schema.clone())
    }

    fn features(&self, query: &Query) -> WmsResult<FeatureCollection> {
        Ok(FeatureCollection::new(self.run(query)?))
    }
}

/// Metadata strings keyed by name, as a flat raster exposes them.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataSource {
    entries: BTreeMap<String, String>,
}

impl MemoryMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl FromIterator<(String, String)> for MemoryMetadataSource {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl MetadataSource for MemoryMetadataSource {
    fn metadata_value(&self, key: &str) -> WmsResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }
}

/// A single-coverage granule catalog over in-memory granule rows.
#[derive(Debug, Clone)]
pub struct MemoryGranuleCatalog {
    coverage: String,
    descriptors: Vec<DimensionDescriptor>,
    granules: MemoryFeatureSource,
}

impl MemoryGranuleCatalog {
    pub fn new(
        coverage: impl Into<String>,
        descriptors: Vec<DimensionDescriptor>,
        granules: MemoryFeatureSource,
    ) -> Self {
        Self {
            coverage: coverage.into(),
            descriptors,
            granules,
        }
    }

    fn check_coverage(&self, coverage: &str) -> WmsResult<()> {
        if coverage == self.coverage {
            Ok(())
        } else {
            Err(WmsError::store(format!("unknown coverage '{}'", coverage)))
        }
    }
}

impl GranuleCatalog for MemoryGranuleCatalog {
    fn coverage_names(&self) -> WmsResult<Vec<String>> {
        Ok(vec![self.coverage.clone()])
    }

    fn dimension_descriptors(&self, coverage: &str) -> WmsResult<Vec<DimensionDescriptor>> {
        self.check_coverage(coverage)?;
        Ok(self.descriptors.clone())
    }

    fn granule_schema(&self, coverage: &str) -> WmsResult<Schema> {
        self.check_coverage(coverage)?;
        self.granules.schema()
    }

    fn granules(&self, coverage: &str, query: &Query) -> WmsResult<FeatureCollection> {
        self.check_coverage(coverage)?;
        self.granules.features(query)
    }
}
