//! Data module - CSV loading, caching and per-state selection

mod cache;
mod loader;
mod processor;

pub use cache::DatasetCache;
pub use loader::{DatasetLoader, LoaderError, SurveillanceTable, TableSchema, WEEKS_COL};
pub use processor::DataProcessor;
