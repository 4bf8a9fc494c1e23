use std::sync::OnceLock;
use regex::Regex;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldValue;
use crate::query::ast::{BoolPredicate, Predicate, RangePredicate};
use crate::query::types::{QueryParams, SortOrder};

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

fn ident_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"))
}

/// Validate and double-quote a table or column name.
pub fn quote_ident(name: &str) -> Result<String> {
    if !ident_pattern().is_match(name) {
        return Err(Error::new(
            ErrorKind::InvalidArgument,
            format!("invalid identifier {:?}", name),
        ));
    }
    Ok(format!("\"{}\"", name))
}

/// Builds statements for one table
pub struct SqlBuilder {
    table: String,
}

impl SqlBuilder {
    pub fn new(table: &str) -> Result<Self> {
        Ok(SqlBuilder { table: quote_ident(table)? })
    }

    pub fn select(&self, params: &QueryParams) -> Result<Statement> {
        let mut sql = format!("SELECT * FROM {}", self.table);
        let mut values = Vec::new();
        push_where(&params.filter, &mut sql, &mut values)?;

        if !params.order_by.is_empty() {
            let mut terms = Vec::with_capacity(params.order_by.len());
            for order in &params.order_by {
                let direction = match order.order {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                terms.push(format!("{} {}", quote_ident(&order.column)?, direction));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        match params.window() {
            Some((limit, Some(offset))) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                values.push(FieldValue::Integer(limit));
                values.push(FieldValue::Integer(offset));
            }
            Some((limit, None)) => {
                sql.push_str(" LIMIT ?");
                values.push(FieldValue::Integer(limit));
            }
            None => {}
        }

        Ok(Statement { sql, params: values })
    }

    pub fn count(&self, filter: &Predicate) -> Result<Statement> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut values = Vec::new();
        push_where(filter, &mut sql, &mut values)?;
        Ok(Statement { sql, params: values })
    }

    pub fn max_id(&self) -> Statement {
        Statement {
            sql: format!("SELECT COALESCE(MAX(\"id\"), 0) FROM {}", self.table),
            params: Vec::new(),
        }
    }

    /// One multi-row INSERT; every row must have one value per column.
    pub fn insert(&self, columns: &[&str], rows: Vec<Vec<FieldValue>>) -> Result<Statement> {
        if columns.is_empty() || rows.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "nothing to insert".to_string()));
        }

        let quoted = columns.iter().map(|c| quote_ident(c)).collect::<Result<Vec<_>>>()?;
        let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));

        let mut values = Vec::with_capacity(columns.len() * rows.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != columns.len() {
                return Err(Error::new(
                    ErrorKind::Internal,
                    format!("row has {} values for {} columns", row.len(), columns.len()),
                ));
            }
            values.extend(row);
            tuples.push(placeholders.as_str());
        }

        Ok(Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES {}",
                self.table,
                quoted.join(", "),
                tuples.join(", ")
            ),
            params: values,
        })
    }

    pub fn update(&self, assignments: Vec<(&str, FieldValue)>, filter: &Predicate) -> Result<Statement> {
        if assignments.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "nothing to update".to_string()));
        }

        let mut set = Vec::with_capacity(assignments.len());
        let mut values = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            set.push(format!("{} = ?", quote_ident(column)?));
            values.push(value);
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, set.join(", "));
        push_where(filter, &mut sql, &mut values)?;
        sql.push_str(" RETURNING \"id\"");
        Ok(Statement { sql, params: values })
    }

    pub fn delete(&self, filter: &Predicate) -> Result<Statement> {
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut values = Vec::new();
        push_where(filter, &mut sql, &mut values)?;
        sql.push_str(" RETURNING \"id\"");
        Ok(Statement { sql, params: values })
    }
}

fn push_where(filter: &Predicate, sql: &mut String, values: &mut Vec<FieldValue>) -> Result<()> {
    if filter.is_match_all() {
        return Ok(());
    }
    sql.push_str(" WHERE ");
    sql.push_str(&compile(filter, values)?);
    Ok(())
}

/// Compile `predicate` to a boolean SQL expression, appending bound values.
pub fn compile(predicate: &Predicate, values: &mut Vec<FieldValue>) -> Result<String> {
    match predicate {
        Predicate::Term(term) => {
            values.push(term.value.clone());
            Ok(format!("{} {} ?", quote_ident(&term.column)?, term.op.as_sql()))
        }
        Predicate::Range(range) => compile_range(range, values),
        Predicate::Prefix(prefix) => {
            values.push(FieldValue::Text(format!("{}%", escape_like(&prefix.prefix))));
            Ok(format!("{} LIKE ? ESCAPE '\\'", quote_ident(&prefix.column)?))
        }
        Predicate::In(in_predicate) => {
            if in_predicate.values.is_empty() {
                return Ok("0 = 1".to_string());
            }
            let column = quote_ident(&in_predicate.column)?;
            values.extend(in_predicate.values.iter().cloned());
            Ok(format!("{} IN ({})", column, vec!["?"; in_predicate.values.len()].join(", ")))
        }
        Predicate::IsEmpty(column) => {
            let column = quote_ident(column)?;
            Ok(format!("({} IS NULL OR {} = '')", column, column))
        }
        Predicate::Bool(bool_predicate) => compile_bool(bool_predicate, values),
        Predicate::MatchAll => Ok("1 = 1".to_string()),
    }
}

fn compile_range(range: &RangePredicate, values: &mut Vec<FieldValue>) -> Result<String> {
    let column = quote_ident(&range.column)?;
    let bounds = [(">", &range.gt), (">=", &range.gte), ("<", &range.lt), ("<=", &range.lte)];

    let mut parts = Vec::new();
    for (op, bound) in bounds {
        if let Some(value) = bound {
            parts.push(format!("{} {} ?", column, op));
            values.push(value.clone());
        }
    }

    if parts.is_empty() {
        return Ok("1 = 1".to_string());
    }
    Ok(format!("({})", parts.join(" AND ")))
}

fn compile_bool(bool_predicate: &BoolPredicate, values: &mut Vec<FieldValue>) -> Result<String> {
    let mut parts = Vec::new();

    for p in &bool_predicate.must {
        parts.push(compile(p, values)?);
    }
    if !bool_predicate.should.is_empty() {
        let mut any = Vec::with_capacity(bool_predicate.should.len());
        for p in &bool_predicate.should {
            any.push(compile(p, values)?);
        }
        parts.push(format!("({})", any.join(" OR ")));
    }
    for p in &bool_predicate.must_not {
        parts.push(format!("NOT ({})", compile(p, values)?));
    }

    if parts.is_empty() {
        return Ok("1 = 1".to_string());
    }
    Ok(format!("({})", parts.join(" AND ")))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
