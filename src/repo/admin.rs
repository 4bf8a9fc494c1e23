use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::types::RecordId;
use crate::query::ast::Predicate;
use crate::repo::{unix_now, Repository};
use crate::schema::record::Record;
use crate::schema::schema::TableSchema;

pub type AdminRepository = Repository<Admin>;

/// Back-office account. `password` holds whatever digest the caller stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Admin {
    pub id: RecordId,
    pub username: String,
    pub password: String,
    pub salt: String,
    pub email: String,
    pub phone_number: String,
    pub avatar: String,
    pub role: String,
    pub status: i64,
    pub last_login_time: i64,
    pub create_time: i64,
    pub update_time: i64,
}

impl Default for Admin {
    fn default() -> Self {
        let now = unix_now();
        Admin {
            id: RecordId(0),
            username: String::new(),
            password: String::new(),
            salt: String::new(),
            email: String::new(),
            phone_number: String::new(),
            avatar: String::new(),
            role: String::new(),
            status: 1,
            last_login_time: 0,
            create_time: now,
            update_time: now,
        }
    }
}

impl Record for Admin {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("admin")
                .text_field("username")
                .text_field("password")
                .text_field("salt")
                .text_field("email")
                .text_field("phone_number")
                .text_field("avatar")
                .text_field("role")
                .integer_field("status")
                .integer_field("last_login_time")
                .integer_field("create_time")
                .integer_field("update_time")
                .required(&["username", "password"])
                .unique(&["username"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

impl Repository<Admin> {
    pub fn find_by_username(&self, username: &str) -> Result<Admin> {
        self.find(Predicate::eq("username", username))
    }
}
