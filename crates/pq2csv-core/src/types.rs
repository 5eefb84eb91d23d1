//! Row values and their textual form.
//!
//! A decoded value is either a raw byte sequence (`Str`, `Bin`) that goes to
//! the output as text, or a scalar rendered through its `Display` impl. There
//! are no per-column formatting rules.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    /// The raw bytes of a byte-sequence value, `None` for scalars and nulls.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match self {
            Scalar::Str(s) => Some(s.as_bytes()),
            Scalar::Bin(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text written to the output for this value.
    ///
    /// Byte sequences are taken as text as-is (invalid UTF-8 is replaced with
    /// U+FFFD); everything else goes through `Display`, so `Null` becomes "".
    pub fn to_field(&self) -> Cow<'_, str> {
        match self.raw_bytes() {
            Some(bytes) => String::from_utf8_lossy(bytes),
            None => Cow::Owned(self.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => b.fmt(f),
            Scalar::I32(i) => i.fmt(f),
            Scalar::I64(i) => i.fmt(f),
            Scalar::U64(u) => u.fmt(f),
            Scalar::F32(x) => x.fmt(f),
            Scalar::F64(x) => x.fmt(f),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bin(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

/// One decoded record, positionally aligned with the file `Schema`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub values: Vec<Scalar>,
}

impl Row {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Output fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.values.iter().map(Scalar::to_field)
    }
}

impl From<Vec<Scalar>> for Row {
    fn from(values: Vec<Scalar>) -> Self {
        Self::new(values)
    }
}
