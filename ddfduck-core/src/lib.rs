//! # ddfduck core
//!
//! Converts a DDF (Data Description Format) CSV dataset, such as Gapminder's
//! Systema Globalis, into a single self-documenting DuckDB database file.
//! Provides file discovery and classification, datapoint grouping, table
//! materialization, concept-driven annotation, metadata objects, indexes,
//! and the run summary.

pub mod annotate;
pub mod concepts;
pub mod config;
pub mod database;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod grouping;
pub mod index;
pub mod materialize;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod summary;

// Re-export commonly used types at the crate root.
pub use concepts::{Concept, ConceptDictionary};
pub use config::{ConvertConfig, DatabaseConfig, ImportConfig, SourceConfig, load_config};
pub use database::Database;
pub use discovery::{DiscoveredFiles, EntityFile, FileClass};
pub use error::{ConvertError, Result};
pub use grouping::{DatapointGroup, DatapointSignature};
pub use naming::TableKind;
pub use pipeline::{ConversionContext, Converter, RunReport, TableReport, UnitOutcome};
pub use summary::Summary;
