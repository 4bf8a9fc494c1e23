use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::types::RecordId;
use crate::query::ast::Predicate;
use crate::query::types::{OrderBy, QueryParams};
use crate::repo::{unix_now, Repository};
use crate::schema::record::Record;
use crate::schema::schema::TableSchema;

pub type NavRepository = Repository<Nav>;

/// A link in the navigation directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nav {
    pub id: RecordId,
    pub admin_id: i64,
    pub class_id: i64,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub description: String,
    pub icon: String,
    pub keywords: String,
    pub sort: i64,
    pub views: i64,
    pub is_show: bool,
    pub is_recommend: bool,
    pub status: i64,        // 0 = disabled, 1 = enabled
    pub create_time: i64,
    pub update_time: i64,
}

impl Default for Nav {
    fn default() -> Self {
        let now = unix_now();
        Nav {
            id: RecordId(0),
            admin_id: 0,
            class_id: 0,
            title: String::new(),
            subtitle: String::new(),
            url: String::new(),
            description: String::new(),
            icon: String::new(),
            keywords: String::new(),
            sort: 50,
            views: 0,
            is_show: true,
            is_recommend: false,
            status: 1,
            create_time: now,
            update_time: now,
        }
    }
}

impl Record for Nav {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("nav")
                .integer_field("admin_id")
                .integer_field("class_id")
                .text_field("title")
                .text_field("subtitle")
                .text_field("url")
                .text_field("description")
                .text_field("icon")
                .text_field("keywords")
                .integer_field("sort")
                .integer_field("views")
                .boolean_field("is_show")
                .boolean_field("is_recommend")
                .integer_field("status")
                .integer_field("create_time")
                .integer_field("update_time")
                .required(&["class_id", "title", "url", "sort", "is_show", "status", "create_time"])
                .unique(&["class_id", "title", "url"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

impl Repository<Nav> {
    /// Visible links of one category, by `sort` then id.
    pub fn list_by_class(&self, class_id: i64) -> Result<Vec<Nav>> {
        let params = QueryParams::new(Predicate::and(vec![
            Predicate::eq("class_id", class_id),
            Predicate::eq("is_show", true),
        ]))
        .order_by(OrderBy::asc("sort"))
        .order_by(OrderBy::asc("id"));
        self.select(&params)
    }
}
