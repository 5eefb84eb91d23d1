#![forbid(unsafe_code)]
//! pq2csv-exec: the read → stringify → write loop.
//!
//! `Converter::run` drives any `RowSource` into a `CsvWriter`, enforcing the
//! row limit and periodic flushes. `convert_parquet` wires in the Parquet reader.

pub mod runtime;

pub use runtime::{convert_parquet, ConvertError, Converter, WriteStage};
