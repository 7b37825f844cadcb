//! Store queries: filter, projection, ordering, paging and joins.

use std::cmp::Ordering;

use crate::feature::Feature;
use crate::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sort criterion on one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub property: String,
    pub order: SortOrder,
}

impl SortBy {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Order two rows by the sort criteria; rows missing a value sort last
/// whatever the direction.
pub fn compare_features(a: &Feature, b: &Feature, sort_by: &[SortBy]) -> Ordering {
    for criterion in sort_by {
        let left = a.get_non_null(&criterion.property);
        let right = b.get_non_null(&criterion.property);
        let ordering = match (left, right) {
            (Some(l), Some(r)) => {
                let natural = l.total_cmp(r);
                match criterion.order {
                    SortOrder::Ascending => natural,
                    SortOrder::Descending => natural.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A join to an auxiliary table; joined rows appear as a nested feature under
/// `alias` in each result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub alias: String,
    /// Column of the auxiliary table referencing the primary row id.
    pub foreign_key: String,
    /// Outer joins keep primary rows with no auxiliary match.
    pub outer: bool,
}

/// A query against a feature store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub type_name: String,
    pub filter: Filter,
    /// `None` selects every attribute.
    pub property_names: Option<Vec<String>>,
    pub sort_by: Vec<SortBy>,
    pub start_index: Option<usize>,
    pub max_features: Option<usize>,
    pub joins: Vec<Join>,
}

impl Query {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Every feature of the type, every attribute.
    pub fn all(type_name: impl Into<String>) -> Self {
        Self::new(type_name)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort(mut self, sort_by: Vec<SortBy>) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_paging(mut self, start_index: Option<usize>, max_features: Option<usize>) -> Self {
        self.start_index = start_index;
        self.max_features = max_features;
        self
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }
}
