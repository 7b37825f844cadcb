//! Output property names to source column names.

use serde::{Deserialize, Serialize};

/// One output property backed by a source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub property: String,
    pub source: String,
}

/// Maps the properties of the published record type onto the columns of the
/// table behind it. Properties without a column are not mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePropertyMapper {
    mappings: Vec<PropertyMapping>,
}

impl SourcePropertyMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, source: impl Into<String>) -> Self {
        self.mappings.push(PropertyMapping {
            property: property.into(),
            source: source.into(),
        });
        self
    }

    pub fn source_name(&self, property: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.property == property)
            .map(|m| m.source.as_str())
    }

    pub fn property_name(&self, source: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.source == source)
            .map(|m| m.property.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl FromIterator<(String, String)> for SourcePropertyMapper {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            mappings: iter
                .into_iter()
                .map(|(property, source)| PropertyMapping { property, source })
                .collect(),
        }
    }
}
