//! EO product mapping
//!
//! Products are published as nested records (simple properties, an optional
//! metadata document, any number of links) but stored flat: a product table
//! plus auxiliary metadata and link tables. This crate rewrites queries on
//! the published properties into queries on the tables, and folds the joined
//! rows back into records with a pushback sequence.
//!
//! ```text
//! Query (output properties)
//!      │
//!      ▼
//! MappingSource::map_query ──► ids query (paged, no joins)
//!      │                              │
//!      │                              ▼
//!      └────────────────────► joined query restricted to those ids
//!                                     │ flat rows, one per link
//!                                     ▼
//!                             MappedRecords (PushbackIter)
//!                                     │
//!                                     ▼
//!                               MappedRecord
//! ```

pub mod mapping_source;
pub mod memory;
pub mod property_mapper;
pub mod pushback;

pub use mapping_source::{
    AuxiliaryTables, MappedRecord, MappedRecords, MappingSource, LINKS_PROPERTY,
    METADATA_PROPERTY,
};
pub use memory::MemoryProductStore;
pub use property_mapper::{PropertyMapping, SourcePropertyMapper};
pub use pushback::{PushbackIter, PushbackState};
