//! Delimited-text writers.

pub mod csv;
