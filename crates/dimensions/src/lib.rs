//! Dimension domain extraction for raster and vector layers
//!
//! Given a layer backed by a structured granule catalog, a flat raster with
//! metadata-encoded domains, or a vector feature source, this crate finds
//! where each dimension (time, elevation, custom) is stored and serves:
//!
//! - **Domains**: sorted values, with or without duplicates, plus the
//!   envelope of the rows they came from
//! - **Histograms**: fixed-width buckets over numeric or temporal domains
//! - **Default values**: MINIMUM, MAXIMUM, NEAREST or FIXED
//!
//! # Architecture
//!
//! ```text
//! LayerDefinition + BackingStore
//!      │
//!      ▼
//! extract_dimensions() ──► Dimension (one per enabled axis)
//!                               │
//!                               ▼
//!                     DimensionReader::{Structured, FlatMetadata, Vector}
//!                               │ rows
//!                               ▼
//!                     read_with_duplicates / read_without_duplicates
//!                               │ DomainResult
//!                   ┌───────────┴────────────┐
//!                   ▼                        ▼
//!            build_histogram()        resolve_default()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dimensions::{extract_dimensions, BackingStore, DimensionsConfig, MemoryMetadataSource};
//!
//! let source = MemoryMetadataSource::new().with_entry("ELEVATION_DOMAIN", "1.0,2.0");
//! let store = BackingStore::FlatMetadata(Arc::new(source));
//! for dim in extract_dimensions(&layer, &store, &DimensionsConfig::default()) {
//!     let histogram = dim.histogram(&Filter::Include, "0.1")?;
//! }
//! ```

pub mod config;
pub mod converter;
pub mod defaults;
pub mod dimension;
pub mod extract;
pub mod histogram;
pub mod memory;
pub mod reader;
pub mod store;

// Re-export commonly used types at crate root
pub use config::DimensionsConfig;
pub use converter::ValueConverter;
pub use defaults::{implicit_setting, resolve_default};
pub use dimension::{extract_dimensions, Dimension};
pub use extract::{DomainComparator, DomainResult, NaturalOrder, ReverseOrder};
pub use histogram::{build_histogram, Histogram};
pub use memory::{MemoryFeatureSource, MemoryGranuleCatalog, MemoryMetadataSource};
pub use reader::{AttributeNames, DimensionReader, DimensionValues};
pub use store::{BackingStore, DimensionDescriptor, FeatureSource, GranuleCatalog, MetadataSource};
