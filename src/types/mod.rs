//! Domain data types for the argument graph pipeline.

pub mod component;
pub mod config;
pub mod graph;
pub mod page;
