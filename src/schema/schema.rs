use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::query::sql::quote_ident;

/// Persisted field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,        // In-memory field name
    pub column: String,      // Persisted column name
    pub field_type: FieldType,
    pub persisted: bool,     // false: kept out of this table's DDL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Boolean,    // Stored as 0/1
}

impl FieldType {
    fn ddl(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT NOT NULL DEFAULT ''",
            FieldType::Integer | FieldType::Boolean => "INTEGER NOT NULL DEFAULT 0",
            FieldType::Real => "REAL NOT NULL DEFAULT 0",
        }
    }
}

/// Schema descriptor of one record type, built once per type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,                 // Without prefix/suffix
    pub fields: Vec<FieldDefinition>,
    pub required: Vec<String>,         // Must be non-zero on insert
    pub unique: Vec<String>,           // Combined value must not exist yet
}

impl TableSchema {
    /// Every schema starts with the integer `id` field.
    pub fn new(table: &str) -> Self {
        TableSchema {
            table: table.to_string(),
            fields: Vec::new(),
            required: Vec::new(),
            unique: Vec::new(),
        }
        .integer_field("id")
    }

    pub fn text_field(self, name: &str) -> Self {
        self.field_as(name, name, FieldType::Text)
    }

    pub fn integer_field(self, name: &str) -> Self {
        self.field_as(name, name, FieldType::Integer)
    }

    pub fn real_field(self, name: &str) -> Self {
        self.field_as(name, name, FieldType::Real)
    }

    pub fn boolean_field(self, name: &str) -> Self {
        self.field_as(name, name, FieldType::Boolean)
    }

    /// Field whose column name differs from the field name.
    pub fn field_as(mut self, name: &str, column: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.to_string(),
            column: column.to_string(),
            field_type,
            persisted: true,
        });
        self
    }

    /// Field carried in memory but stored elsewhere.
    pub fn transient_field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.to_string(),
            column: name.to_string(),
            field_type,
            persisted: false,
        });
        self
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn unique(mut self, fields: &[&str]) -> Self {
        self.unique = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn column_of(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.column.as_str())
    }

    pub fn field_for_column(&self, column: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn create_table_sql(&self, full_table: &str) -> Result<String> {
        let mut columns = Vec::with_capacity(self.fields.len());
        for field in self.fields.iter().filter(|f| f.persisted) {
            let column = quote_ident(&field.column)?;
            if field.column == "id" {
                columns.push(format!("{} INTEGER PRIMARY KEY", column));
            } else {
                columns.push(format!("{} {}", column, field.field_type.ddl()));
            }
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(full_table)?,
            columns.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableSchema {
        TableSchema::new("news")
            .text_field("title")
            .field_as("phone", "phone_number", FieldType::Text)
            .boolean_field("is_show")
            .transient_field("content", FieldType::Text)
            .required(&["title"])
            .unique(&["title"])
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let schema = sample();
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "phone", "is_show", "content"]);
        assert_eq!(schema.column_of("phone"), Some("phone_number"));
        assert_eq!(schema.field_for_column("phone_number").unwrap().name, "phone");
    }

    #[test]
    fn ddl_skips_transient_fields() {
        let sql = sample().create_table_sql("cms_news").unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"cms_news\""));
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY"));
        assert!(sql.contains("\"phone_number\" TEXT"));
        assert!(!sql.contains("content"));
    }

    #[test]
    fn ddl_rejects_bad_table_name() {
        assert!(sample().create_table_sql("news; DROP TABLE x").is_err());
    }
}
