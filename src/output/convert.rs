//! JSON to Arrow conversion
//!
//! Builds RecordBatches from decoded JSON records against a known schema.
//! Values that do not fit their column type become null.

use crate::error::{Error, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::sync::Arc;

/// Convert JSON records to an Arrow RecordBatch with the given schema
///
/// Fields missing from a record, explicit nulls and non-objects all yield
/// null cells. Fields not named by the schema are ignored.
pub fn json_to_arrow(records: &[Value], schema: &SchemaRef) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::clone(schema)));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(obj) => obj.get(field.name()).filter(|v| !v.is_null()),
                _ => None,
            })
            .collect();

        columns.push(build_array(&values, field.data_type())?);
    }

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(|e| Error::Decode {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        other => Err(Error::decode(format!(
            "Unsupported input column type: {other}"
        ))),
    }
}

