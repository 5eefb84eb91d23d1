//! Row sources consumed by the conversion loop.

use pq2csv_core::schema::Schema;
use pq2csv_core::types::Row;

use crate::error::Result;

pub mod parquet;

/// A lazy, ordered sequence of rows sharing one schema.
///
/// `next_row` returns `Ok(None)` at end of data. An `Err` is terminal; callers
/// must not keep reading after one.
pub trait RowSource {
    fn schema(&self) -> &Schema;

    fn next_row(&mut self) -> Result<Option<Row>>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        (**self).next_row()
    }
}
