//! Corpus analysis.

pub mod aggregator;

pub use aggregator::*;
