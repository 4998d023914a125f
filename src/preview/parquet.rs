//! Parquet sampling: schema-order column subset, rows read group by group

use super::value::{
    bytes_to_json, date_to_json, float_to_json, timestamp_micros_to_json,
    timestamp_millis_to_json, truncate_sequence,
};
use super::PreviewBlock;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use parquet::schema::types::{Type, TypePtr};
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;

type PreviewResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub(super) fn read_preview(
    path: &Path,
    max_rows: usize,
    max_columns: usize,
) -> PreviewResult<PreviewBlock> {
    let reader = SerializedFileReader::new(File::open(path)?)?;
    let file_metadata = reader.metadata().file_metadata();
    let total_rows = file_metadata.num_rows().max(0) as u64;

    let schema = file_metadata.schema();
    let selected: Vec<TypePtr> = schema
        .get_fields()
        .iter()
        .take(max_columns)
        .cloned()
        .collect();
    let columns: Vec<String> = selected.iter().map(|f| f.name().to_string()).collect();

    let mut rows: Vec<Map<String, Value>> = Vec::new();
    if selected.is_empty() || max_rows == 0 {
        return Ok(PreviewBlock {
            columns,
            rows,
            total_rows,
        });
    }

    let projection = Type::group_type_builder(schema.name())
        .with_fields(selected)
        .build()?;

    // Zero row groups simply leaves `rows` empty
    'groups: for index in 0..reader.num_row_groups() {
        let row_group = reader.get_row_group(index)?;
        for row in row_group.get_row_iter(Some(projection.clone()))? {
            if rows.len() >= max_rows {
                break 'groups;
            }
            rows.push(row_to_json(&row?));
        }
        if rows.len() >= max_rows {
            break;
        }
    }

    Ok(PreviewBlock {
        columns,
        rows,
        total_rows,
    })
}

fn row_to_json(row: &Row) -> Map<String, Value> {
    row.get_column_iter()
        .map(|(name, field)| (name.clone(), field_to_json(field)))
        .collect()
}

fn field_to_json(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(v) => Value::Bool(*v),
        Field::Byte(v) => Value::from(*v),
        Field::Short(v) => Value::from(*v),
        Field::Int(v) => Value::from(*v),
        Field::Long(v) => Value::from(*v),
        Field::UByte(v) => Value::from(*v),
        Field::UShort(v) => Value::from(*v),
        Field::UInt(v) => Value::from(*v),
        Field::ULong(v) => Value::from(*v),
        Field::Float(v) => float_to_json(*v as f64),
        Field::Double(v) => float_to_json(*v),
        Field::Str(s) => Value::String(s.clone()),
        Field::Bytes(b) => bytes_to_json(b.data()),
        Field::Date(days) => date_to_json(*days),
        Field::TimestampMillis(ms) => timestamp_millis_to_json(*ms),
        Field::TimestampMicros(us) => timestamp_micros_to_json(*us),
        Field::Group(row) => Value::Object(row_to_json(row)),
        Field::ListInternal(list) => truncate_sequence(list.elements().iter().map(field_to_json)),
        Field::MapInternal(map) => Value::Object(
            map.entries()
                .iter()
                .map(|(key, value)| (map_key(key), field_to_json(value)))
                .collect(),
        ),
        // Decimals, half floats, time-of-day values
        other => Value::String(other.to_string()),
    }
}

fn map_key(key: &Field) -> String {
    match key {
        Field::Str(s) => s.clone(),
        other => other.to_string(),
    }
}
