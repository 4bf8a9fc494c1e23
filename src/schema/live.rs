use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use lru::LruCache;
use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::error::{Context, Error, ErrorKind, Result};
use crate::schema::schema::{FieldDefinition, TableSchema};

pub type ColumnSet = Arc<HashSet<String>>;

/// Live column sets per table, so repeated writes skip the metadata query
pub struct ColumnCache {
    pub cache: Mutex<LruCache<String, ColumnSet>>,
    pub size_limit: usize,
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
}

impl ColumnCache {
    pub fn new(size_limit: usize) -> Self {
        let cap = NonZeroUsize::new(size_limit).unwrap_or(NonZeroUsize::MIN);
        ColumnCache {
            cache: Mutex::new(LruCache::new(cap)),
            size_limit: cap.get(),
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    /// Columns `table` currently has. A table with no columns does not exist.
    pub fn live_columns(&self, conn: &Connection, table: &str) -> Result<ColumnSet> {
        if let Some(columns) = self.cache.lock().get(table) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(columns.clone());
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let columns = Arc::new(query_columns(conn, table)?);
        if columns.is_empty() {
            return Err(Error::new(
                ErrorKind::Schema,
                format!("table {} does not exist", table),
            ));
        }

        debug!(table, columns = columns.len(), "cached live columns");
        self.cache.lock().put(table.to_string(), columns.clone());
        Ok(columns)
    }

    pub fn invalidate(&self, table: &str) {
        self.cache.lock().pop(table);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.size_limit,
        }
    }
}

fn query_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn
        .prepare_cached("SELECT name FROM pragma_table_info(?1)")
        .map_err(|e| Error::new(ErrorKind::Schema, e.to_string()))?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .context("list live columns")?;

    let mut columns = HashSet::new();
    for name in names {
        columns.insert(name.context("read column name")?);
    }
    Ok(columns)
}

/// Declared fields whose column exists in `live`, in declaration order.
pub fn declared_columns<'a>(schema: &'a TableSchema, live: &HashSet<String>) -> Vec<&'a FieldDefinition> {
    schema
        .fields
        .iter()
        .filter(|f| f.persisted && live.contains(&f.column))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema::FieldType;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE nav (id INTEGER PRIMARY KEY, title TEXT, url TEXT)")
            .unwrap();
        conn
    }

    #[test]
    fn caches_until_invalidated() {
        let conn = conn();
        let cache = ColumnCache::new(4);

        let first = cache.live_columns(&conn, "nav").unwrap();
        assert!(first.contains("title"));
        cache.live_columns(&conn, "nav").unwrap();
        assert_eq!(cache.stats().hit_count, 1);

        conn.execute_batch("ALTER TABLE nav ADD COLUMN icon TEXT").unwrap();
        assert!(!cache.live_columns(&conn, "nav").unwrap().contains("icon"));

        cache.invalidate("nav");
        assert!(cache.live_columns(&conn, "nav").unwrap().contains("icon"));
        assert_eq!(cache.stats().miss_count, 2);
    }

    #[test]
    fn missing_table_is_a_schema_error() {
        let conn = conn();
        let cache = ColumnCache::new(4);
        let err = cache.live_columns(&conn, "ghost").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn declared_columns_drop_fields_without_backing_column() {
        let schema = TableSchema::new("nav")
            .text_field("title")
            .transient_field("content", FieldType::Text)
            .text_field("url");
        let live: HashSet<String> = ["id", "title", "url"].iter().map(|s| s.to_string()).collect();

        let columns: Vec<_> = declared_columns(&schema, &live).iter().map(|f| f.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "title", "url"]);
    }
}
