use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection, TransactionBehavior};
use tracing::{debug, info};
use crate::core::config::Config;
use crate::core::error::{Context, Error, ErrorKind, Result};
use crate::core::stats::{DatabaseStats, HealthCheck, HealthCheckResult, HealthStatus};
use crate::core::types::{FieldValue, RecordId, Row};
use crate::query::ast::Predicate;
use crate::query::sql::{SqlBuilder, Statement};
use crate::query::types::{QueryParams, UpdateData, WriteOutcome};
use crate::query::validator::{FilterValidator, ValidationConfig};
use crate::schema::live::{declared_columns, ColumnCache};
use crate::schema::record::Record;
use crate::schema::schema::{FieldDefinition, TableSchema};
use crate::storage::id_allocator::IdAllocator;

/// Generic CRUD over any [`Record`] type.
///
/// Writes are restricted to the columns the table really has, so a record
/// may carry fields that are stored elsewhere.
pub struct Database {
    config: Config,
    conn: Mutex<Connection>,
    ids: Arc<IdAllocator>,
    columns: ColumnCache,
    validator: FilterValidator,
    start_time: SystemTime,
}

impl Database {
    pub fn open(config: Config) -> Result<Self> {
        let ids = Arc::new(IdAllocator::open(config.id_store_path.clone())?);
        Self::open_with_allocator(config, ids)
    }

    /// Open with an allocator shared with other handles.
    pub fn open_with_allocator(config: Config, ids: Arc<IdAllocator>) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            Connection::open(&config.database_path).context("open database")?
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.wal_mode && !config.is_in_memory() {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!(mode = %mode, "journal mode");
        }

        info!(
            path = %config.database_path.display(),
            id_store = %ids.path().display(),
            "database opened"
        );

        Ok(Database {
            columns: ColumnCache::new(config.column_cache_size),
            validator: FilterValidator::new(ValidationConfig::from(&config)),
            conn: Mutex::new(conn),
            ids,
            config,
            start_time: SystemTime::now(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn allocator(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    pub fn full_table_name(&self, table: &str) -> String {
        self.config.full_table_name(table)
    }

    /// Create the table of `R` if missing and sync its id counter with the
    /// highest stored id.
    pub fn ensure_table<R: Record>(&self) -> Result<()> {
        let schema = R::schema();
        let full = self.full_table_name(&schema.table);
        let builder = SqlBuilder::new(&full)?;

        let conn = self.conn.lock();
        conn.execute_batch(&schema.create_table_sql(&full)?)
            .context("create table")?;
        self.columns.invalidate(&full);

        let max_id: i64 = conn.query_row(&builder.max_id().sql, [], |row| row.get(0))?;
        drop(conn);

        self.ids.advance_to(&full, max_id)?;
        info!(table = %full, max_id, "table ready");
        Ok(())
    }

    /// Forget cached live columns, e.g. after an external schema change.
    pub fn invalidate_columns(&self, table: &str) {
        self.columns.invalidate(&self.full_table_name(table));
    }

    pub fn select(&self, table: &str, params: &QueryParams) -> Result<Vec<Row>> {
        let full = self.full_table_name(table);
        let conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        self.validator.validate_params(params, &live)?;

        let stmt = SqlBuilder::new(&full)?.select(params)?;
        debug!(sql = %stmt.sql, "select");
        query_rows(&conn, &stmt).context("execute select")
    }

    pub fn count(&self, table: &str, filter: &Predicate) -> Result<i64> {
        let full = self.full_table_name(table);
        let conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        self.validator.validate(filter, &live)?;

        let stmt = SqlBuilder::new(&full)?.count(filter)?;
        debug!(sql = %stmt.sql, "count");
        let count = conn
            .query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |row| row.get(0))
            .context("execute count")?;
        Ok(count)
    }

    /// Insert `records`, skipping those whose unique fields already exist.
    ///
    /// Required fields are checked for the whole batch before any id is
    /// issued; one violation rejects the batch. Inserted records get their
    /// new id written back. A batch made only of duplicates succeeds with
    /// nothing inserted.
    pub fn insert<R: Record>(&self, records: &mut [R]) -> Result<WriteOutcome> {
        let schema = R::schema();
        if records.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("empty insert batch for {}", schema.table),
            ));
        }

        let mut values = Vec::with_capacity(records.len());
        for record in records.iter() {
            let record_values = record.values()?;
            check_required(schema, &record_values)?;
            values.push(record_values);
        }

        let full = self.full_table_name(&schema.table);
        let builder = SqlBuilder::new(&full)?;

        let mut conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        if !live.contains("id") {
            return Err(Error::new(ErrorKind::Schema, format!("table {} has no id column", full)));
        }
        let columns = declared_columns(schema, &live);
        let unique = unique_columns(schema, &live)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("begin insert")?;

        let mut seen: Vec<Vec<FieldValue>> = Vec::new();
        let mut accepted = Vec::with_capacity(values.len());
        for (i, record_values) in values.iter().enumerate() {
            if !unique.is_empty() {
                let key: Vec<FieldValue> = unique
                    .iter()
                    .map(|f| record_values.get(&f.name).cloned().unwrap_or(FieldValue::Null))
                    .collect();
                if seen.contains(&key) || row_exists(&tx, &builder, &unique_filter(&unique, &key))? {
                    debug!(table = %full, index = i, "duplicate record skipped");
                    continue;
                }
                seen.push(key);
            }
            accepted.push(i);
        }

        if accepted.is_empty() {
            tx.commit()?;
            info!(table = %full, offered = records.len(), "every record was a duplicate");
            return Ok(WriteOutcome::default());
        }

        let mut rows = Vec::with_capacity(accepted.len());
        let mut new_ids = Vec::with_capacity(accepted.len());
        for &i in &accepted {
            let id = self.ids.next_id(&full).context("allocate id")?;
            let record_values = &mut values[i];
            record_values.insert("id".to_string(), FieldValue::Integer(id));
            rows.push(
                columns
                    .iter()
                    .map(|f| record_values.remove(&f.name).unwrap_or(FieldValue::Null))
                    .collect(),
            );
            new_ids.push(RecordId(id));
        }

        let column_names: Vec<&str> = columns.iter().map(|f| f.column.as_str()).collect();
        let stmt = builder.insert(&column_names, rows)?;
        debug!(sql = %stmt.sql, rows = new_ids.len(), "insert");

        let inserted = tx
            .execute(&stmt.sql, params_from_iter(stmt.params.iter()))
            .context("execute insert")?;
        tx.commit().context("commit insert")?;

        for (&i, id) in accepted.iter().zip(&new_ids) {
            records[i].set_id(*id);
        }

        Ok(WriteOutcome { affected: inserted, ids: new_ids })
    }

    /// Apply each entry to the rows its own filter matches, in one transaction.
    /// The `id` column is never rewritten.
    pub fn update<R: Record>(&self, updates: &[UpdateData<R>]) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();
        for entry in self.update_each(updates)? {
            outcome.merge(entry);
        }
        Ok(outcome)
    }

    /// Like [`Database::update`], reporting the rows changed by each entry
    /// separately, in input order.
    pub fn update_each<R: Record>(&self, updates: &[UpdateData<R>]) -> Result<Vec<WriteOutcome>> {
        self.update_entries::<R>(updates.iter().map(|u| (&u.data, &u.filter)).collect())
    }

    pub fn update_one<R: Record>(&self, record: &R, filter: &Predicate) -> Result<WriteOutcome> {
        let mut outcomes = self.update_entries::<R>(vec![(record, filter)])?;
        Ok(outcomes.pop().unwrap_or_default())
    }

    fn update_entries<R: Record>(&self, entries: Vec<(&R, &Predicate)>) -> Result<Vec<WriteOutcome>> {
        let schema = R::schema();
        if entries.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("empty update batch for {}", schema.table),
            ));
        }

        let full = self.full_table_name(&schema.table);
        let builder = SqlBuilder::new(&full)?;

        let mut conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        let columns: Vec<&FieldDefinition> = declared_columns(schema, &live)
            .into_iter()
            .filter(|f| f.column != "id")
            .collect();

        let mut statements = Vec::with_capacity(entries.len());
        for (record, filter) in entries {
            self.check_write_filter(filter, &live)?;
            let mut record_values = record.values()?;
            let assignments = columns
                .iter()
                .map(|f| (f.column.as_str(), record_values.remove(&f.name).unwrap_or(FieldValue::Null)))
                .collect();
            statements.push(builder.update(assignments, filter)?);
        }

        let tx = conn.transaction().context("begin update")?;
        let mut outcomes = Vec::with_capacity(statements.len());
        for stmt in &statements {
            debug!(sql = %stmt.sql, "update");
            outcomes.push(WriteOutcome::from_ids(query_ids(&tx, stmt).context("execute update")?));
        }
        tx.commit().context("commit update")?;

        Ok(outcomes)
    }

    /// Delete matching rows and report exactly the ids removed.
    pub fn delete(&self, table: &str, filter: &Predicate) -> Result<WriteOutcome> {
        let full = self.full_table_name(table);
        let conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        self.check_write_filter(filter, &live)?;

        let stmt = SqlBuilder::new(&full)?.delete(filter)?;
        debug!(sql = %stmt.sql, "delete");
        let ids = query_ids(&conn, &stmt).context("execute delete")?;
        Ok(WriteOutcome::from_ids(ids))
    }

    /// Whether a row with the same unique field values as `record` exists.
    /// Types without unique fields never match.
    pub fn check_existing_record<R: Record>(&self, record: &R) -> Result<bool> {
        let schema = R::schema();
        if schema.unique.is_empty() {
            return Ok(false);
        }

        let full = self.full_table_name(&schema.table);
        let builder = SqlBuilder::new(&full)?;
        let record_values = record.values()?;

        let conn = self.conn.lock();
        let live = self.columns.live_columns(&conn, &full)?;
        let unique = unique_columns(schema, &live)?;
        let key: Vec<FieldValue> = unique
            .iter()
            .map(|f| record_values.get(&f.name).cloned().unwrap_or(FieldValue::Null))
            .collect();

        row_exists(&conn, &builder, &unique_filter(&unique, &key))
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            uptime_secs: self.start_time.elapsed().map(|d| d.as_secs()).unwrap_or(0),
            start_time: self.start_time,
            column_cache: self.columns.stats(),
            id_counters: self.ids.snapshot(),
        }
    }

    pub fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let probe = self
            .conn
            .lock()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0));
        let status = match probe {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };

        HealthCheckResult {
            status: status.clone(),
            checks: vec![HealthCheck {
                name: "store".to_string(),
                status,
                message: None,
                latency_ms: started.elapsed().as_millis() as u64,
            }],
            timestamp: SystemTime::now(),
        }
    }

    fn check_write_filter(&self, filter: &Predicate, live: &HashSet<String>) -> Result<()> {
        if filter.is_match_all() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "update and delete require a filter".to_string(),
            ));
        }
        self.validator.validate(filter, live)
    }
}

fn check_required(
    schema: &TableSchema,
    values: &std::collections::HashMap<String, FieldValue>,
) -> Result<()> {
    for field in &schema.required {
        if values.get(field).is_none_or(FieldValue::is_zero) {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("required field {} of {} is missing or empty", field, schema.table),
            ));
        }
    }
    Ok(())
}

fn unique_columns<'a>(schema: &'a TableSchema, live: &HashSet<String>) -> Result<Vec<&'a FieldDefinition>> {
    schema
        .unique
        .iter()
        .map(|name| match schema.field(name) {
            Some(field) if live.contains(&field.column) => Ok(field),
            _ => Err(Error::new(
                ErrorKind::Schema,
                format!("unique field {} of {} has no live column", name, schema.table),
            )),
        })
        .collect()
}

fn unique_filter(unique: &[&FieldDefinition], key: &[FieldValue]) -> Predicate {
    Predicate::and(
        unique
            .iter()
            .zip(key)
            .map(|(f, v)| Predicate::eq(&f.column, v.clone()))
            .collect(),
    )
}

fn row_exists(conn: &Connection, builder: &SqlBuilder, filter: &Predicate) -> Result<bool> {
    let stmt = builder.select(&QueryParams::new(filter.clone()).limit(1))?;
    let rows = query_rows(conn, &stmt).context("check existing record")?;
    Ok(!rows.is_empty())
}

fn query_rows(conn: &Connection, stmt: &Statement) -> Result<Vec<Row>> {
    let mut prepared = conn.prepare(&stmt.sql)?;
    let columns: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();

    let mut rows = prepared.query(params_from_iter(stmt.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut decoded = Row::new();
        for (i, name) in columns.iter().enumerate() {
            decoded.add_field(name.clone(), FieldValue::from_cell(row.get_ref(i)?));
        }
        out.push(decoded);
    }
    Ok(out)
}

fn query_ids(conn: &Connection, stmt: &Statement) -> Result<Vec<RecordId>> {
    let mut prepared = conn.prepare(&stmt.sql)?;
    let ids = prepared
        .query_map(params_from_iter(stmt.params.iter()), |row| row.get::<_, i64>(0))?
        .map(|id| id.map(RecordId))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}
