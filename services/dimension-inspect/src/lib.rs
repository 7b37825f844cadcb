//! Command-line inspection of layer dimensions.
//!
//! Loads a YAML layer file, binds each layer to its backing store and serves
//! the dimension operations (domain, histogram, default value) from it.

pub mod commands;
pub mod config;

pub use commands::{DefaultReport, DimensionSummary, DomainReport, Inspector};
pub use config::{load_layer_file, LayerEntry, LayerFile, StoreConfig};
