pub mod aggregation;
pub mod benefits;
pub mod cache;
pub mod classifier;
pub mod columns;
pub mod config;
pub mod dataset;
pub mod loader;
pub mod savings;
pub mod selection;
pub mod summary;
pub mod temporal;
