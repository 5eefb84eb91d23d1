#![forbid(unsafe_code)]
//! pq2csv-core: shared kernel for the Parquet → CSV converter.
//!
//! This crate contains only *pure* types and small helpers. There is **no I/O**
//! and **no Arrow** here; decoding lives in `pq2csv-io` and the conversion loop
//! lives in `pq2csv-exec`.
//!
//! - `schema`: ordered column descriptors of a file.
//! - `types`: `Scalar` values and `Row`s, plus their textual rendering.
//! - `config`: `ConvertConfig` (row limit, flush interval, batch size).
//! - `session`: per-call conversion state and its termination reason.

pub mod config;
pub mod error;
pub mod schema;
pub mod session;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
