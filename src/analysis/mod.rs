//! Aggregation of catch records into derived statistics tables.

pub mod aggregator;

pub use aggregator::*;
