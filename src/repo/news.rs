use std::sync::{Arc, OnceLock};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::database::Database;
use crate::core::error::{Context, Result};
use crate::core::types::RecordId;
use crate::query::ast::Predicate;
use crate::query::types::{QueryParams, UpdateData, WriteOutcome};
use crate::repo::{unix_now, Repository};
use crate::schema::record::Record;
use crate::schema::schema::{FieldType, TableSchema};

/// A news article. `content` lives in the `news_content` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct News {
    pub id: RecordId,
    pub admin_id: i64,
    pub class_id: i64,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub description: String,
    pub icon: String,
    pub keywords: String,
    pub author: String,
    pub source: String,
    pub language: String,
    pub sort: i64,
    pub view_count: i64,
    pub comment_count: i64,
    pub is_show: bool,
    pub is_hot: bool,
    pub is_headline: bool,
    pub is_recommended: bool,
    pub status: i64,
    pub create_time: i64,
    pub content: String,
}

impl Default for News {
    fn default() -> Self {
        News {
            id: RecordId(0),
            admin_id: 0,
            class_id: 0,
            title: String::new(),
            subtitle: String::new(),
            url: String::new(),
            description: String::new(),
            icon: String::new(),
            keywords: String::new(),
            author: String::new(),
            source: String::new(),
            language: "cn".to_string(),
            sort: 50,
            view_count: 0,
            comment_count: 0,
            is_show: true,
            is_hot: false,
            is_headline: false,
            is_recommended: false,
            status: 1,
            create_time: unix_now(),
            content: String::new(),
        }
    }
}

impl Record for News {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("news")
                .integer_field("admin_id")
                .integer_field("class_id")
                .text_field("title")
                .text_field("subtitle")
                .text_field("url")
                .text_field("description")
                .text_field("icon")
                .text_field("keywords")
                .text_field("author")
                .text_field("source")
                .text_field("language")
                .integer_field("sort")
                .integer_field("view_count")
                .integer_field("comment_count")
                .boolean_field("is_show")
                .boolean_field("is_hot")
                .boolean_field("is_headline")
                .boolean_field("is_recommended")
                .integer_field("status")
                .integer_field("create_time")
                .transient_field("content", FieldType::Text)
                .required(&["title", "description"])
                .unique(&["title", "source"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Body text of one article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsContent {
    pub id: RecordId,
    pub news_id: i64,
    pub content: String,
}

impl Record for NewsContent {
    fn schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            TableSchema::new("news_content")
                .integer_field("news_id")
                .text_field("content")
                .required(&["news_id"])
                .unique(&["news_id"])
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Articles plus their body text, kept in two tables.
///
/// Writes touch `news` first and then the matching `news_content` rows. The
/// two steps are not one transaction: a failure between them leaves the
/// article without its content.
#[derive(Clone)]
pub struct NewsRepository {
    news: Repository<News>,
    contents: Repository<NewsContent>,
}

impl NewsRepository {
    pub fn new(db: Arc<Database>) -> Self {
        NewsRepository {
            news: Repository::new(db.clone()),
            contents: Repository::new(db),
        }
    }

    pub fn articles(&self) -> &Repository<News> {
        &self.news
    }

    pub fn contents(&self) -> &Repository<NewsContent> {
        &self.contents
    }

    pub fn ensure_tables(&self) -> Result<()> {
        self.news.ensure_table()?;
        self.contents.ensure_table()
    }

    /// First matching article with its content loaded.
    pub fn find(&self, filter: Predicate) -> Result<News> {
        let mut news = self.news.find(filter)?;
        news.content = self.load_content(news.id)?;
        Ok(news)
    }

    pub fn find_by_id(&self, id: RecordId) -> Result<News> {
        self.find(Predicate::eq("id", id))
    }

    /// Article list without content.
    pub fn select(&self, params: &QueryParams) -> Result<Vec<News>> {
        self.news.select(params)
    }

    /// Insert articles and store the content of every one actually inserted.
    pub fn insert(&self, records: &mut [News]) -> Result<WriteOutcome> {
        let outcome = self.news.insert(records)?;

        for record in records.iter() {
            if record.content.is_empty() || !outcome.ids.contains(&record.id) {
                continue;
            }
            self.save_content(record.id, &record.content)
                .context("save news content")?;
        }
        Ok(outcome)
    }

    /// Update articles. Non-empty content is upserted for every article the
    /// entry's filter actually changed.
    pub fn update(&self, updates: &[UpdateData<News>]) -> Result<WriteOutcome> {
        let per_entry = self.news.update_each(updates)?;

        let mut outcome = WriteOutcome::default();
        for (entry, changed) in updates.iter().zip(per_entry) {
            if !entry.data.content.is_empty() {
                for id in &changed.ids {
                    self.save_content(*id, &entry.data.content)
                        .context("save news content")?;
                }
            }
            outcome.merge(changed);
        }
        Ok(outcome)
    }

    pub fn update_one(&self, record: &News, filter: &Predicate) -> Result<WriteOutcome> {
        self.update(&[UpdateData::new(record.clone(), filter.clone())])
    }

    /// Delete articles and the content rows of every deleted id.
    pub fn delete(&self, filter: &Predicate) -> Result<WriteOutcome> {
        let outcome = self.news.delete(filter)?;
        if outcome.ids.is_empty() {
            return Ok(outcome);
        }

        // IN lists are capped by the filter validator
        let chunk_size = self.contents.database().config().max_bool_clauses.max(1);
        let mut removed = 0;
        for ids in outcome.ids.chunks(chunk_size) {
            removed += self
                .contents
                .delete(&Predicate::one_of("news_id", ids.iter().copied()))
                .context("delete news content")?
                .affected;
        }
        debug!(articles = outcome.affected, contents = removed, "news deleted");
        Ok(outcome)
    }

    pub fn count(&self, filter: &Predicate) -> Result<i64> {
        self.news.count(filter)
    }

    fn load_content(&self, news_id: RecordId) -> Result<String> {
        match self.contents.find(Predicate::eq("news_id", news_id)) {
            Ok(row) => Ok(row.content),
            Err(e) if e.is_empty_data() => Ok(String::new()),
            Err(e) => Err(e.wrap("load news content")),
        }
    }

    fn save_content(&self, news_id: RecordId, content: &str) -> Result<()> {
        let filter = Predicate::eq("news_id", news_id);
        let mut row = NewsContent {
            id: RecordId(0),
            news_id: news_id.value(),
            content: content.to_string(),
        };

        if self.contents.count(&filter)? > 0 {
            self.contents.update_one(&row, &filter)?;
        } else {
            self.contents.insert(std::slice::from_mut(&mut row))?;
        }
        Ok(())
    }
}
