//! Data module - census loading and aggregation

pub mod labels;
mod loader;
pub mod pipeline;
pub mod schema;
mod summary;

pub use labels::{IndicatorGroup, LabelEntry, LabelMap};
pub use loader::{DataLoader, DataSource, Dataset, LoadError, LoadOptions, SourceEncoding};
pub use pipeline::{normalize_key, FilterSelection, FilteredView, Pipeline};
pub use schema::SchemaError;
pub use summary::{SummaryTable, UNMAPPED_LABEL};
