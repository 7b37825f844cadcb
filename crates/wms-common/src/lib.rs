//! Common types shared across the dimension and mapping crates.
//!
//! Everything here is plain data: envelopes, domain values, feature rows,
//! filters, queries and layer configuration. No I/O happens in this crate.

pub mod bbox;
pub mod domain;
pub mod error;
pub mod feature;
pub mod filter;
pub mod layer;
pub mod query;
pub mod source;
pub mod time;

pub use bbox::BoundingBox;
pub use domain::{format_number, DataType, DomainKind, DomainValue};
pub use error::{WmsError, WmsResult};
pub use feature::{AttributeValue, Feature, FeatureCollection, Schema};
pub use filter::{CompareOp, Filter};
pub use layer::{
    DefaultValueSetting, DefaultValueStrategy, DimensionConfig, DimensionKind,
    DimensionPresentation, LayerDefinition,
};
pub use query::{compare_features, Join, Query, SortBy, SortOrder};
pub use source::FeatureSource;
pub use time::{format_timestamp, parse_timestamp, IsoDuration, TimeParseError};
