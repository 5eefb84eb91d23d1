//! Per-call conversion state.
//!
//! The counter tracks the row *attempt* number: it is bumped before each read,
//! so at end of data it sits one past the number of rows actually converted.

use serde::{Deserialize, Serialize};

/// Why a successful conversion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The reader ran out of rows.
    EndOfData,
    /// The configured row limit was hit; remaining rows were never read.
    RowLimit,
}

/// Outcome of a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Data rows written (header excluded).
    pub rows: u64,
    pub termination: Termination,
}

#[derive(Debug, Clone)]
pub struct ConversionSession {
    counter: u64,
    row_limit: u64,
    flush_every: u64,
}

impl ConversionSession {
    pub fn new(row_limit: u64, flush_every: u64) -> Self {
        Self {
            counter: 0,
            row_limit,
            flush_every: flush_every.max(1),
        }
    }

    /// Start the next row attempt and return its 1-based number.
    pub fn begin_row(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// True once the current attempt equals a non-zero row limit.
    pub fn limit_reached(&self) -> bool {
        self.row_limit > 0 && self.counter == self.row_limit
    }

    pub fn flush_due(&self) -> bool {
        self.counter > 0 && self.counter % self.flush_every == 0
    }

    /// Close the session after the reader signalled end of data.
    pub fn finish_end_of_data(self) -> ConversionReport {
        ConversionReport {
            rows: self.counter.saturating_sub(1),
            termination: Termination::EndOfData,
        }
    }

    /// Close the session after the row limit stopped the loop.
    pub fn finish_row_limit(self) -> ConversionReport {
        ConversionReport {
            rows: self.counter,
            termination: Termination::RowLimit,
        }
    }
}
