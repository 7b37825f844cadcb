//! In-memory product table with joinable auxiliary tables.

use std::collections::BTreeMap;
use std::sync::Mutex;

use wms_common::{
    compare_features, AttributeValue, Feature, FeatureCollection, FeatureSource, Join, Query,
    Schema, WmsError, WmsResult,
};

/// Product rows plus auxiliary tables, joined the way a relational store
/// would: one output row per matching auxiliary row, nested under the join
/// alias.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    schema: Schema,
    products: Vec<Feature>,
    tables: BTreeMap<String, Vec<Feature>>,
    executed: Mutex<Vec<Query>>,
}

impl MemoryProductStore {
    pub fn new(schema: Schema, products: Vec<Feature>) -> Self {
        Self {
            schema,
            products,
            ..Default::default()
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Feature>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    /// Queries run so far, oldest first.
    pub fn executed_queries(&self) -> Vec<Query> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    fn join(&self, rows: Vec<Feature>, join: &Join) -> WmsResult<Vec<Feature>> {
        let table = self
            .tables
            .get(&join.table)
            .ok_or_else(|| WmsError::store(format!("no table named '{}'", join.table)))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut matched = false;
            for aux in table.iter().filter(|aux| references(aux, &join.foreign_key, &row.id)) {
                matched = true;
                out.push(row.clone().with(join.alias.clone(), aux.clone()));
            }
            if !matched && join.outer {
                out.push(row.with(join.alias.clone(), AttributeValue::Null));
            }
        }
        Ok(out)
    }
}

fn references(aux: &Feature, foreign_key: &str, id: &str) -> bool {
    match aux.get_non_null(foreign_key) {
        Some(AttributeValue::Text(value)) => value == id,
        Some(AttributeValue::Integer(value)) => value.to_string() == id,
        _ => false,
    }
}

impl FeatureSource for MemoryProductStore {
    fn schema(&self) -> WmsResult<Schema> {
        Ok(self.schema.clone())
    }

    fn features(&self, query: &Query) -> WmsResult<FeatureCollection> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(query.clone());
        }

        let mut rows: Vec<Feature> = self
            .products
            .iter()
            .filter(|f| query.filter.evaluate(f))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_features(a, b, &query.sort_by));

        if let Some(names) = &query.property_names {
            rows = rows.into_iter().map(|f| f.project(names)).collect();
        }
        for join in &query.joins {
            rows = self.join(rows, join)?;
        }

        Ok(rows
            .into_iter()
            .skip(query.start_index.unwrap_or(0))
            .take(query.max_features.unwrap_or(usize::MAX))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryProductStore {
        MemoryProductStore::new(
            Schema::new("product"),
            vec![Feature::new("A"), Feature::new("B")],
        )
        .with_table(
            "links",
            vec![
                Feature::new("l1").with("pid", "A"),
                Feature::new("l2").with("pid", "A"),
            ],
        )
    }

    fn link_join(outer: bool) -> Join {
        Join {
            table: "links".into(),
            alias: "link".into(),
            foreign_key: "pid".into(),
            outer,
        }
    }

    #[test]
    fn test_outer_join_keeps_unmatched_rows() {
        let fc = store()
            .features(&Query::new("product").with_join(link_join(true)))
            .unwrap();
        let ids: Vec<&str> = fc.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "A", "B"]);
        assert_eq!(fc.iter().last().unwrap().get("link"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let fc = store()
            .features(&Query::new("product").with_join(link_join(false)))
            .unwrap();
        assert_eq!(fc.len(), 2);
    }

    #[test]
    fn test_unknown_table() {
        let join = Join {
            table: "nope".into(),
            ..link_join(true)
        };
        let err = store().features(&Query::new("product").with_join(join)).unwrap_err();
        assert!(matches!(err, WmsError::Store(_)));
    }
}
