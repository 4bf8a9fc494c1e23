use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::core::types::RecordId;
use crate::repo::{unix_now, Repository};
use crate::schema::record::Record;
use crate::schema::schema::TableSchema;

pub type NewsClassRepository = Repository<NewsClass>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsClass {
    pub id: RecordId,
    pub admin_id: i64,
    pub name: String,
    pub parent_id: i64,
    pub sort: i64,
    pub icon: String,
    pub description: String,
    pub keywords: String,
    pub is_show: bool,
    pub is_recommend: bool,
    pub is_hot: bool,
    pub status: i64,
    pub create_time: i64,
    pub update_time: i64,
}

impl Default for NewsClass {
    fn default() -> Self {
        let now = unix_now();
        NewsClass {
            id: RecordId(0),
            admin_id: 0,
            name: String::new(),
            parent_id: 0,
            sort: 50,
            icon: String::new(),
            description: String::new(),
            keywords: String::new(),
            is_show: true,
            is_recommend: false,
            is_hot: false,
            status: 1,
            create_time: now,
            update_time: now,
        }
    }
}

impl Record for NewsClass {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("news_class")
                .integer_field("admin_id")
                .text_field("name")
                .integer_field("parent_id")
                .integer_field("sort")
                .text_field("icon")
                .text_field("description")
                .text_field("keywords")
                .boolean_field("is_show")
                .boolean_field("is_recommend")
                .boolean_field("is_hot")
                .integer_field("status")
                .integer_field("create_time")
                .integer_field("update_time")
                .required(&["name", "sort", "is_show", "status", "create_time"])
                .unique(&["parent_id", "name"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
