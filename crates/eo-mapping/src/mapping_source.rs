//! Nested EO records over a flat product table.
//!
//! Products live in one table, their metadata document and links in two
//! auxiliary ones. A joined query returns one flat row per (product, link)
//! pair; `MappedRecords` folds those rows back into one record per product.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wms_common::{
    AttributeValue, BoundingBox, Feature, FeatureSource, Filter, Join, Query, SortBy, WmsError,
    WmsResult,
};

use crate::property_mapper::SourcePropertyMapper;
use crate::pushback::PushbackIter;

/// Output property carrying the product metadata document.
pub const METADATA_PROPERTY: &str = "metadata";

/// Output property carrying the product links.
pub const LINKS_PROPERTY: &str = "links";

const METADATA_ALIAS: &str = "metadata";
const LINK_ALIAS: &str = "link";

/// Names of the auxiliary tables joined onto the product table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryTables {
    pub metadata_table: String,
    /// Column of the metadata table referencing the product id
    pub metadata_foreign_key: String,
    pub link_table: String,
    /// Column of the link table referencing the product id
    pub link_foreign_key: String,
}

impl Default for AuxiliaryTables {
    fn default() -> Self {
        Self {
            metadata_table: "product_metadata".to_string(),
            metadata_foreign_key: "mid".to_string(),
            link_table: "product_ogclink".to_string(),
            link_foreign_key: "product_id".to_string(),
        }
    }
}

/// One product folded back from its joined rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedRecord {
    pub id: String,
    /// Simple properties by output name; null columns are left out.
    pub properties: BTreeMap<String, AttributeValue>,
    pub metadata: Option<String>,
    /// Link rows in the order the store returned them.
    pub links: Vec<Feature>,
}

impl MappedRecord {
    pub fn get(&self, property: &str) -> Option<&AttributeValue> {
        self.properties.get(property)
    }
}

/// Serves `MappedRecord`s from a product table and its auxiliary tables.
#[derive(Clone)]
pub struct MappingSource {
    delegate: Arc<dyn FeatureSource>,
    mapper: SourcePropertyMapper,
    tables: AuxiliaryTables,
    default_sort: Vec<SortBy>,
}

impl std::fmt::Debug for MappingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingSource")
            .field("mapper", &self.mapper)
            .field("tables", &self.tables)
            .field("default_sort", &self.default_sort)
            .finish()
    }
}

impl MappingSource {
    pub fn new(
        delegate: Arc<dyn FeatureSource>,
        mapper: SourcePropertyMapper,
        tables: AuxiliaryTables,
    ) -> Self {
        let default_sort = default_sort(&mapper);
        Self {
            delegate,
            mapper,
            tables,
            default_sort,
        }
    }

    pub fn mapper(&self) -> &SourcePropertyMapper {
        &self.mapper
    }

    /// Sort applied when a query asks for none, keeping paging stable.
    pub fn default_sort(&self) -> &[SortBy] {
        &self.default_sort
    }

    /// Rewrite a query on output properties into one on the product table.
    ///
    /// With `add_joins` the metadata and link tables are joined as requested
    /// and paging is dropped: only non-joined queries can be paged.
    pub fn map_query(&self, query: &Query, add_joins: bool) -> WmsResult<Query> {
        let type_name = self.delegate.schema()?.type_name;
        let mut mapped = Query::new(type_name);

        mapped.filter = query
            .filter
            .map_properties(&|name: &str| self.mapper.source_name(name).map(str::to_string))
            .map_err(|property| {
                WmsError::invalid_parameter("filter", format!("unknown property '{}'", property))
            })?;

        if let Some(names) = query.property_names.as_ref().filter(|n| !n.is_empty()) {
            let sources: Vec<String> = names
                .iter()
                .filter_map(|name| self.mapper.source_name(name))
                .map(str::to_string)
                .collect();
            if sources.len() < names.len() {
                debug!(
                    requested = names.len(),
                    mapped = sources.len(),
                    "Dropped properties without a source column"
                );
            }
            // none left maps to every column
            mapped.property_names = if sources.is_empty() { None } else { Some(sources) };
        }

        mapped.sort_by = if query.sort_by.is_empty() {
            self.default_sort.clone()
        } else {
            query
                .sort_by
                .iter()
                .map(|sort| {
                    self.mapper
                        .source_name(&sort.property)
                        .map(|source| SortBy {
                            property: source.to_string(),
                            order: sort.order,
                        })
                        .ok_or_else(|| WmsError::UnsupportedSort(sort.property.clone()))
                })
                .collect::<WmsResult<_>>()?
        };

        if add_joins {
            if has_output_property(query, METADATA_PROPERTY, false) {
                mapped.joins.push(Join {
                    table: self.tables.metadata_table.clone(),
                    alias: METADATA_ALIAS.to_string(),
                    foreign_key: self.tables.metadata_foreign_key.clone(),
                    outer: false,
                });
            }
            // products may have no links at all
            if has_output_property(query, LINKS_PROPERTY, true) {
                mapped.joins.push(Join {
                    table: self.tables.link_table.clone(),
                    alias: LINK_ALIAS.to_string(),
                    foreign_key: self.tables.link_foreign_key.clone(),
                    outer: true,
                });
            }
        } else {
            mapped.start_index = query.start_index;
            mapped.max_features = query.max_features;
        }

        Ok(mapped)
    }

    /// Run `query` and fold the joined rows into records.
    ///
    /// The page of product ids is fetched first without joins, then the
    /// joined rows for exactly those ids.
    pub fn features(&self, query: &Query) -> WmsResult<MappedRecords<std::vec::IntoIter<Feature>>> {
        let ids_query = self.map_query(query, false)?;
        let id_rows = self.delegate.features(&ids_query)?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = id_rows
            .iter()
            .filter(|f| seen.insert(f.id.clone()))
            .map(|f| f.id.clone())
            .collect();

        if ids.is_empty() {
            debug!("No products matched, skipping joined query");
            return Ok(MappedRecords::new(Vec::new().into_iter(), self.mapper.clone()));
        }

        let mut data_query = self.map_query(query, true)?;
        data_query.filter = Filter::ids(ids.iter().cloned());
        let rows = self.delegate.features(&data_query)?;

        debug!(
            products = ids.len(),
            rows = rows.len(),
            joins = data_query.joins.len(),
            "Fetched joined product rows"
        );

        Ok(MappedRecords::new(rows.into_iter(), self.mapper.clone()))
    }

    pub fn count(&self, query: &Query) -> WmsResult<usize> {
        self.delegate.count(&self.map_query(query, false)?)
    }

    pub fn bounds(&self, query: &Query) -> WmsResult<BoundingBox> {
        self.delegate.bounds(&self.map_query(query, false)?)
    }
}

fn default_sort(mapper: &SourcePropertyMapper) -> Vec<SortBy> {
    let mut sort = Vec::new();
    match mapper.source_name("timeStart") {
        Some(source) => sort.push(SortBy::desc(source)),
        None => warn!("No timeStart column, default sort will not order by time"),
    }
    if let Some(source) = mapper.source_name("identifier") {
        sort.push(SortBy::asc(source));
    }
    sort
}

/// Whether the query's output includes `property`; `None` property names
/// select `included_by_default`.
fn has_output_property(query: &Query, property: &str, included_by_default: bool) -> bool {
    match &query.property_names {
        None => included_by_default,
        Some(names) => names.iter().any(|name| name == property),
    }
}

/// Records folded from a stream of joined rows sharing product ids.
#[derive(Debug)]
pub struct MappedRecords<I: Iterator<Item = Feature>> {
    rows: PushbackIter<I>,
    mapper: SourcePropertyMapper,
    exhausted: bool,
}

impl<I: Iterator<Item = Feature>> MappedRecords<I> {
    pub fn new(rows: I, mapper: SourcePropertyMapper) -> Self {
        Self {
            rows: PushbackIter::new(rows),
            mapper,
            exhausted: false,
        }
    }

    /// Fold the next product's rows; `None` once the rows run out.
    fn next_record(&mut self) -> WmsResult<Option<MappedRecord>> {
        let Some(primary) = self.rows.next() else {
            return Ok(None);
        };

        let mut record = MappedRecord {
            id: primary.id.clone(),
            ..Default::default()
        };
        for mapping in self.mapper.iter() {
            if let Some(value) = primary.get_non_null(&mapping.source) {
                record.properties.insert(mapping.property.clone(), value.clone());
            }
        }
        record.metadata = primary
            .get(METADATA_ALIAS)
            .and_then(AttributeValue::as_feature)
            .and_then(|m| m.get_non_null(METADATA_PROPERTY))
            .and_then(AttributeValue::as_text)
            .map(str::to_string);

        let mut current = primary;
        loop {
            if let Some(link) = current.get(LINK_ALIAS).and_then(AttributeValue::as_feature) {
                record.links.push(link.clone());
            }
            match self.rows.next() {
                Some(next) if next.id == record.id => current = next,
                Some(next) => {
                    self.rows.push_back(next)?;
                    break;
                }
                None => break,
            }
        }

        Ok(Some(record))
    }
}

impl<I: Iterator<Item = Feature>> Iterator for MappedRecords<I> {
    type Item = WmsResult<MappedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
