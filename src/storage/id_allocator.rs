use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use crate::core::error::{Context, Result};

/// Last issued id of one table
struct TableCounter {
    lock: Mutex<()>,     // Serializes allocation for this table only
    last: AtomicI64,     // Only advanced after the file holds the new value
}

impl TableCounter {
    fn new(last: i64) -> Self {
        TableCounter {
            lock: Mutex::new(()),
            last: AtomicI64::new(last),
        }
    }
}

/// Per-table, strictly increasing ids persisted to one JSON file.
///
/// A new id is written to disk before it becomes visible in memory, so an id
/// handed to a caller is never issued again after a restart.
pub struct IdAllocator {
    path: PathBuf,
    counters: RwLock<HashMap<String, Arc<TableCounter>>>,
    persist_lock: Mutex<()>,
}

impl IdAllocator {
    /// Load counters from `path`. Missing or malformed files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let loaded = load_counters(&path);
        debug!(path = %path.display(), tables = loaded.len(), "loaded id counters");

        let counters = loaded
            .into_iter()
            .map(|(table, last)| (table, Arc::new(TableCounter::new(last))))
            .collect();

        Ok(IdAllocator {
            path,
            counters: RwLock::new(counters),
            persist_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_id(&self, table: &str) -> Result<i64> {
        let counter = self.counter(table);
        let _guard = counter.lock.lock();

        let next = counter.last.load(Ordering::Acquire) + 1;
        self.persist_and_publish(table, &counter, next)
            .context("persist id counter")?;

        debug!(table, id = next, "allocated id");
        Ok(next)
    }

    /// Last id issued for `table`, 0 if none.
    pub fn current(&self, table: &str) -> i64 {
        self.counters
            .read()
            .get(table)
            .map(|c| c.last.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Raise the counter of `table` to at least `floor`.
    pub fn advance_to(&self, table: &str, floor: i64) -> Result<()> {
        let counter = self.counter(table);
        let _guard = counter.lock.lock();

        if counter.last.load(Ordering::Acquire) >= floor {
            return Ok(());
        }
        warn!(table, floor, "id counter behind stored rows, advancing");
        self.persist_and_publish(table, &counter, floor)
            .context("persist id counter")
    }

    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .read()
            .iter()
            .map(|(table, c)| (table.clone(), c.last.load(Ordering::Acquire)))
            .collect()
    }

    fn counter(&self, table: &str) -> Arc<TableCounter> {
        if let Some(counter) = self.counters.read().get(table) {
            return counter.clone();
        }
        self.counters
            .write()
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(TableCounter::new(0)))
            .clone()
    }

    // The in-memory value is published while the persist lock is held, so a
    // concurrent rewrite for another table always sees it.
    fn persist_and_publish(&self, table: &str, counter: &TableCounter, value: i64) -> Result<()> {
        let _persist = self.persist_lock.lock();

        let mut all = self.snapshot();
        all.insert(table.to_string(), value);
        save_counters(&self.path, &all)?;

        counter.last.store(value, Ordering::Release);
        Ok(())
    }
}

fn load_counters(path: &Path) -> HashMap<String, i64> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read id counters, starting empty");
            return HashMap::new();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(counters) => counters,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed id counter file, starting empty");
            HashMap::new()
        }
    }
}

/// Write to a sibling temp file and rename it over `path`.
fn save_counters(path: &Path, counters: &BTreeMap<String, i64>) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut file, counters)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
