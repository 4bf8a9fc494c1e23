use std::collections::HashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{FieldValue, RecordId, Row};
use crate::schema::schema::{FieldType, TableSchema};

/// A typed record persisted as one row.
///
/// Field values are read through serde, so the serialized field names must
/// match the names declared in [`Record::schema`].
pub trait Record: Serialize + DeserializeOwned {
    fn schema() -> &'static TableSchema;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Declared field values keyed by field name.
    fn values(&self) -> Result<HashMap<String, FieldValue>> {
        let schema = Self::schema();
        let value = serde_json::to_value(self)?;
        let Value::Object(map) = value else {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("record for {} does not serialize to a map", schema.table),
            ));
        };

        let mut values = HashMap::with_capacity(schema.fields.len());
        for field in &schema.fields {
            if let Some(json) = map.get(&field.name) {
                values.insert(field.name.clone(), json_to_field(json, field.field_type));
            }
        }
        Ok(values)
    }

    /// Decode a stored row. Columns absent from the row keep their default.
    fn from_row(row: &Row) -> Result<Self> {
        let schema = Self::schema();
        let mut map = Map::new();

        for field in &schema.fields {
            let Some(cell) = row.get_field(&field.column) else {
                continue;
            };
            let json = field_to_json(cell, field.field_type).ok_or_else(|| {
                Error::new(
                    ErrorKind::Decode,
                    format!(
                        "cannot convert {}.{} to {:?}: {:?}",
                        schema.table, field.column, field.field_type, cell
                    ),
                )
            })?;
            map.insert(field.name.clone(), json);
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| {
            Error::new(ErrorKind::Decode, format!("decode {}: {}", schema.table, e))
        })
    }
}

fn json_to_field(json: &Value, field_type: FieldType) -> FieldValue {
    match (field_type, json) {
        (_, Value::Null) => FieldValue::Null,
        (FieldType::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
        (FieldType::Integer, Value::Number(n)) => n
            .as_i64()
            .map(FieldValue::Integer)
            .unwrap_or_else(|| FieldValue::Real(n.as_f64().unwrap_or_default())),
        (FieldType::Real, Value::Number(n)) => FieldValue::Real(n.as_f64().unwrap_or_default()),
        (_, Value::String(s)) => FieldValue::Text(s.clone()),
        (_, Value::Bool(b)) => FieldValue::Boolean(*b),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Real(n.as_f64().unwrap_or_default()),
        },
        (_, other) => FieldValue::Text(other.to_string()),
    }
}

fn field_to_json(cell: &FieldValue, field_type: FieldType) -> Option<Value> {
    match (field_type, cell) {
        (FieldType::Text, FieldValue::Text(s)) => Some(Value::String(s.clone())),
        (FieldType::Integer, FieldValue::Integer(i)) => Some(Value::Number((*i).into())),
        (FieldType::Boolean, FieldValue::Integer(i)) => Some(Value::Bool(*i == 1)),
        (FieldType::Boolean, FieldValue::Boolean(b)) => Some(Value::Bool(*b)),
        (FieldType::Real, FieldValue::Real(f)) => Number::from_f64(*f).map(Value::Number),
        (FieldType::Real, FieldValue::Integer(i)) => Some(Value::Number((*i).into())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Link {
        id: i64,
        title: String,
        weight: i64,
        visible: bool,
        note: String,
    }

    impl Record for Link {
        fn schema() -> &'static TableSchema {
            static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                TableSchema::new("link")
                    .text_field("title")
                    .integer_field("weight")
                    .boolean_field("visible")
                    .transient_field("note", FieldType::Text)
            })
        }

        fn id(&self) -> RecordId {
            RecordId(self.id)
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = id.0;
        }
    }

    #[test]
    fn values_follow_schema_types() {
        let link = Link { id: 0, title: "a".into(), weight: 3, visible: true, note: "n".into() };
        let values = link.values().unwrap();
        assert_eq!(values["title"], FieldValue::Text("a".into()));
        assert_eq!(values["weight"], FieldValue::Integer(3));
        assert_eq!(values["visible"], FieldValue::Boolean(true));
        assert_eq!(values["id"], FieldValue::Integer(0));
    }

    #[test]
    fn from_row_decodes_booleans_and_defaults_missing_columns() {
        let mut row = Row::new();
        row.add_field("id".into(), FieldValue::Integer(4));
        row.add_field("title".into(), FieldValue::Text("b".into()));
        row.add_field("weight".into(), FieldValue::Integer(9));
        row.add_field("visible".into(), FieldValue::Integer(0));

        let link = Link::from_row(&row).unwrap();
        assert_eq!(link.id, 4);
        assert!(!link.visible);
        assert_eq!(link.note, "");
    }

    #[test]
    fn from_row_rejects_mistyped_cells() {
        let mut row = Row::new();
        row.add_field("id".into(), FieldValue::Integer(4));
        row.add_field("weight".into(), FieldValue::Text(String::new()));

        let err = Link::from_row(&row).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
    }
}
