//! Arrow conversion utilities for the Parquet reader boundary.
//!
//! Converts Arrow schemas to the core `Schema`, and single slots of a
//! `RecordBatch` into `Scalar` values. Types without a dedicated `Scalar`
//! variant are rendered through Arrow's display formatter and carried as text.

use arrow_array::{
    Array, ArrayRef, BinaryArray, BooleanArray, FixedSizeBinaryArray, Float16Array, Float32Array,
    Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, LargeBinaryArray,
    LargeStringArray, RecordBatch, StringArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType as ArrowDataType, Schema as ArrowSchema};

use pq2csv_core::schema::{DataType, Field, Schema};
use pq2csv_core::types::{Row, Scalar};

use crate::error::{Error, Result};

/// Map an Arrow `DataType` onto the core `DataType`.
pub fn arrow_to_data_type(dtype: &ArrowDataType) -> DataType {
    match dtype {
        ArrowDataType::Boolean => DataType::Boolean,
        ArrowDataType::Int8 | ArrowDataType::Int16 | ArrowDataType::Int32 => DataType::Int32,
        ArrowDataType::Int64
        | ArrowDataType::UInt8
        | ArrowDataType::UInt16
        | ArrowDataType::UInt32 => DataType::Int64,
        ArrowDataType::UInt64 => DataType::UInt64,
        ArrowDataType::Float16 | ArrowDataType::Float32 => DataType::Float32,
        ArrowDataType::Float64 => DataType::Float64,
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => DataType::Utf8,
        ArrowDataType::Binary
        | ArrowDataType::LargeBinary
        | ArrowDataType::FixedSizeBinary(_) => DataType::Binary,
        other => DataType::Other(other.to_string()),
    }
}

/// Convert an Arrow schema to the core `Schema`, keeping top-level field order.
pub fn schema_from_arrow(schema: &ArrowSchema) -> Schema {
    let fields = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name().clone(), arrow_to_data_type(f.data_type()), f.is_nullable()))
        .collect();
    Schema::new(fields)
}

/// Extract row `row_idx` of `batch` as a `Row`, one value per column.
pub fn record_batch_row(batch: &RecordBatch, row_idx: usize) -> Result<Row> {
    if row_idx >= batch.num_rows() {
        return Err(Error::Other(format!(
            "row index {} out of bounds for batch of {} rows",
            row_idx,
            batch.num_rows()
        )));
    }

    let values = batch
        .columns()
        .iter()
        .map(|array| arrow_value_to_scalar(array, row_idx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(values))
}

/// Convert a single Arrow array slot to a `Scalar`.
pub fn arrow_value_to_scalar(array: &ArrayRef, row_idx: usize) -> Result<Scalar> {
    if array.is_null(row_idx) {
        return Ok(Scalar::Null);
    }

    let scalar = match array.data_type() {
        ArrowDataType::Boolean => Scalar::Bool(downcast::<BooleanArray>(array)?.value(row_idx)),
        ArrowDataType::Int8 => Scalar::I32(downcast::<Int8Array>(array)?.value(row_idx) as i32),
        ArrowDataType::Int16 => Scalar::I32(downcast::<Int16Array>(array)?.value(row_idx) as i32),
        ArrowDataType::Int32 => Scalar::I32(downcast::<Int32Array>(array)?.value(row_idx)),
        ArrowDataType::Int64 => Scalar::I64(downcast::<Int64Array>(array)?.value(row_idx)),
        ArrowDataType::UInt8 => Scalar::I64(downcast::<UInt8Array>(array)?.value(row_idx) as i64),
        ArrowDataType::UInt16 => {
            Scalar::I64(downcast::<UInt16Array>(array)?.value(row_idx) as i64)
        }
        ArrowDataType::UInt32 => {
            Scalar::I64(downcast::<UInt32Array>(array)?.value(row_idx) as i64)
        }
        ArrowDataType::UInt64 => Scalar::U64(downcast::<UInt64Array>(array)?.value(row_idx)),
        ArrowDataType::Float16 => {
            Scalar::F32(downcast::<Float16Array>(array)?.value(row_idx).to_f32())
        }
        ArrowDataType::Float32 => Scalar::F32(downcast::<Float32Array>(array)?.value(row_idx)),
        ArrowDataType::Float64 => Scalar::F64(downcast::<Float64Array>(array)?.value(row_idx)),
        ArrowDataType::Utf8 => {
            Scalar::Str(downcast::<StringArray>(array)?.value(row_idx).to_string())
        }
        ArrowDataType::LargeUtf8 => {
            Scalar::Str(downcast::<LargeStringArray>(array)?.value(row_idx).to_string())
        }
        ArrowDataType::Binary => {
            Scalar::Bin(downcast::<BinaryArray>(array)?.value(row_idx).to_vec())
        }
        ArrowDataType::LargeBinary => {
            Scalar::Bin(downcast::<LargeBinaryArray>(array)?.value(row_idx).to_vec())
        }
        ArrowDataType::FixedSizeBinary(_) => {
            Scalar::Bin(downcast::<FixedSizeBinaryArray>(array)?.value(row_idx).to_vec())
        }
        _ => {
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
            Scalar::Str(formatter.value(row_idx).to_string())
        }
    };
    Ok(scalar)
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Other(format!(
            "Failed to cast {} array to {}",
            array.data_type(),
            std::any::type_name::<T>()
        ))
    })
}
