use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::types::RecordId;
use crate::query::ast::Predicate;
use crate::repo::{unix_now, Repository};
use crate::schema::record::Record;
use crate::schema::schema::TableSchema;

pub type UploadFileRepository = Repository<UploadFile>;

/// Metadata of a stored upload, deduplicated by content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadFile {
    pub id: RecordId,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub extension: String,
    pub hash: String,
    pub upload_time: i64,
}

impl Default for UploadFile {
    fn default() -> Self {
        UploadFile {
            id: RecordId(0),
            file_name: String::new(),
            file_path: String::new(),
            file_size: 0,
            file_type: String::new(),
            extension: String::new(),
            hash: String::new(),
            upload_time: unix_now(),
        }
    }
}

impl Record for UploadFile {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("upload_file")
                .text_field("file_name")
                .text_field("file_path")
                .integer_field("file_size")
                .text_field("file_type")
                .text_field("extension")
                .text_field("hash")
                .integer_field("upload_time")
                .required(&["file_name", "file_path", "file_size", "file_type", "hash"])
                .unique(&["hash"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

impl Repository<UploadFile> {
    /// Earlier upload with the same content, if any.
    pub fn find_by_hash(&self, hash: &str) -> Result<Option<UploadFile>> {
        match self.find(Predicate::eq("hash", hash)) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.is_empty_data() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
