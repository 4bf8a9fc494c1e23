use serde::{Deserialize, Serialize};
use crate::core::types::RecordId;
use crate::query::ast::Predicate;

/// Sort order for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,   // Ascending: 0 → 9, A → Z
    Desc,  // Descending: 9 → 0, Z → A
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        OrderBy { column: column.to_string(), order: SortOrder::Asc }
    }

    pub fn desc(column: &str) -> Self {
        OrderBy { column: column.to_string(), order: SortOrder::Desc }
    }
}

/// Filter, ordering and pagination of a read.
///
/// `limit <= 0` reads every matching row regardless of `page`/`page_size`.
/// With `limit > 0` and `page > 0` the offset is `(page - 1) * page_size`;
/// with `page <= 0` only the limit applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub filter: Predicate,
    pub order_by: Vec<OrderBy>,
    pub limit: i64,
    pub page: i64,
    pub page_size: i64,
}

impl QueryParams {
    pub fn new(filter: Predicate) -> Self {
        QueryParams { filter, ..QueryParams::default() }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// `limit` rows starting at page `page` of `page_size` rows.
    pub fn page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// `(limit, offset)` to apply, if any.
    pub fn window(&self) -> Option<(i64, Option<i64>)> {
        if self.limit <= 0 {
            return None;
        }
        if self.page > 0 {
            let offset = (self.page - 1).saturating_mul(self.page_size).max(0);
            Some((self.limit, Some(offset)))
        } else {
            Some((self.limit, None))
        }
    }
}

/// One record to write and the rows it applies to.
#[derive(Debug, Clone)]
pub struct UpdateData<T> {
    pub data: T,
    pub filter: Predicate,
}

impl<T> UpdateData<T> {
    pub fn new(data: T, filter: Predicate) -> Self {
        UpdateData { data, filter }
    }
}

/// Rows touched by a write and their identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub affected: usize,
    pub ids: Vec<RecordId>,
}

impl WriteOutcome {
    pub fn from_ids(ids: Vec<RecordId>) -> Self {
        WriteOutcome { affected: ids.len(), ids }
    }

    pub fn merge(&mut self, other: WriteOutcome) {
        self.affected += other.affected;
        self.ids.extend(other.ids);
    }
}
