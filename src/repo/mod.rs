pub mod nav;
pub mod nav_class;
pub mod news;
pub mod news_class;
pub mod admin;
pub mod upload_file;

use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;
use crate::core::database::Database;
use crate::core::error::{Context, Error, Result};
use crate::core::types::RecordId;
use crate::query::ast::Predicate;
use crate::query::types::{QueryParams, UpdateData, WriteOutcome};
use crate::schema::record::Record;

use self::admin::Admin;
use self::nav::Nav;
use self::nav_class::NavClass;
use self::news::NewsRepository;
use self::news_class::NewsClass;
use self::upload_file::UploadFile;

/// Current time as a 10-digit unix timestamp.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Typed access to one table through the generic engine
pub struct Repository<R: Record> {
    db: Arc<Database>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Repository::new(self.db.clone())
    }
}

impl<R: Record> Repository<R> {
    pub fn new(db: Arc<Database>) -> Self {
        Repository {
            db,
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        &R::schema().table
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn ensure_table(&self) -> Result<()> {
        self.db.ensure_table::<R>()
    }

    /// First matching record. No match is an `EmptyData` error.
    pub fn find(&self, filter: Predicate) -> Result<R> {
        let rows = self
            .db
            .select(self.table(), &QueryParams::new(filter).limit(1))
            .context("find")?;
        let row = rows.first().ok_or_else(Error::empty_data)?;
        R::from_row(row).context(&format!("map row to {}", self.table()))
    }

    pub fn find_by_id(&self, id: RecordId) -> Result<R> {
        self.find(Predicate::eq("id", id))
    }

    /// Matching records; rows that fail to decode are logged and skipped.
    pub fn select(&self, params: &QueryParams) -> Result<Vec<R>> {
        let rows = self.db.select(self.table(), params).context("select")?;

        let mut list = Vec::with_capacity(rows.len());
        for row in &rows {
            match R::from_row(row) {
                Ok(item) => list.push(item),
                Err(e) => warn!(table = self.table(), error = %e, "skipping undecodable row"),
            }
        }
        Ok(list)
    }

    pub fn insert(&self, records: &mut [R]) -> Result<WriteOutcome> {
        self.db.insert(records)
    }

    pub fn update(&self, updates: &[UpdateData<R>]) -> Result<WriteOutcome> {
        self.db.update(updates)
    }

    /// Update, reporting the changed ids of each entry separately.
    pub fn update_each(&self, updates: &[UpdateData<R>]) -> Result<Vec<WriteOutcome>> {
        self.db.update_each(updates)
    }

    pub fn update_one(&self, record: &R, filter: &Predicate) -> Result<WriteOutcome> {
        self.db.update_one(record, filter)
    }

    pub fn delete(&self, filter: &Predicate) -> Result<WriteOutcome> {
        self.db.delete(self.table(), filter)
    }

    pub fn count(&self, filter: &Predicate) -> Result<i64> {
        self.db.count(self.table(), filter)
    }

    pub fn exists(&self, record: &R) -> Result<bool> {
        self.db.check_existing_record(record)
    }
}

/// One repository per entity, sharing a database handle.
pub struct Tables {
    pub nav: Repository<Nav>,
    pub nav_class: Repository<NavClass>,
    pub news: NewsRepository,
    pub news_class: Repository<NewsClass>,
    pub admin: Repository<Admin>,
    pub upload_file: Repository<UploadFile>,
}

impl Tables {
    pub fn new(db: Arc<Database>) -> Self {
        Tables {
            nav: Repository::new(db.clone()),
            nav_class: Repository::new(db.clone()),
            news: NewsRepository::new(db.clone()),
            news_class: Repository::new(db.clone()),
            admin: Repository::new(db.clone()),
            upload_file: Repository::new(db),
        }
    }

    /// Create every missing table.
    pub fn ensure_all(&self) -> Result<()> {
        self.nav.ensure_table()?;
        self.nav_class.ensure_table()?;
        self.news.ensure_tables()?;
        self.news_class.ensure_table()?;
        self.admin.ensure_table()?;
        self.upload_file.ensure_table()?;
        Ok(())
    }
}
