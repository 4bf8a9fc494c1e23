use serde::{Serialize, Deserialize};
use crate::core::types::FieldValue;

/// Structured row filter. Compiles to a parameterized WHERE clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Term(TermPredicate),     // column <op> value
    Range(RangePredicate),   // Numeric/text bounds
    Prefix(PrefixPredicate), // LIKE 'prefix%'
    In(InPredicate),         // column IN (...)
    Bool(BoolPredicate),     // Boolean combinations
    IsEmpty(String),         // Column is NULL or ''
    MatchAll,                // No WHERE clause
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermPredicate {
    pub column: String,
    pub op: CompareOp,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredicate {
    pub column: String,
    pub gt: Option<FieldValue>,
    pub gte: Option<FieldValue>,
    pub lt: Option<FieldValue>,
    pub lte: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixPredicate {
    pub column: String,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InPredicate {
    pub column: String,
    pub values: Vec<FieldValue>,
}

/// Boolean predicate with must/should/must_not clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolPredicate {
    pub must: Vec<Predicate>,      // All must match (AND)
    pub should: Vec<Predicate>,    // At least one must match (OR)
    pub must_not: Vec<Predicate>,  // None must match (NOT)
}

impl Predicate {
    pub fn compare(column: &str, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Predicate::Term(TermPredicate {
            column: column.to_string(),
            op,
            value: value.into(),
        })
    }

    pub fn eq(column: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn prefix(column: &str, prefix: &str) -> Self {
        Predicate::Prefix(PrefixPredicate {
            column: column.to_string(),
            prefix: prefix.to_string(),
        })
    }

    pub fn one_of<V: Into<FieldValue>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(InPredicate {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// AND of all `predicates`.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Predicate::Bool(BoolPredicate { must: predicates, ..BoolPredicate::new() })
    }

    /// OR of all `predicates`.
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Bool(BoolPredicate { should: predicates, ..BoolPredicate::new() })
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Bool(BoolPredicate::new().with_must_not(predicate))
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    /// Columns this predicate reads, in visit order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Term(t) => out.push(&t.column),
            Predicate::Range(r) => out.push(&r.column),
            Predicate::Prefix(p) => out.push(&p.column),
            Predicate::In(i) => out.push(&i.column),
            Predicate::IsEmpty(column) => out.push(column),
            Predicate::Bool(b) => {
                for p in b.must.iter().chain(&b.should).chain(&b.must_not) {
                    p.collect_columns(out);
                }
            }
            Predicate::MatchAll => {}
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::MatchAll
    }
}

impl RangePredicate {
    pub fn new(column: &str) -> Self {
        RangePredicate {
            column: column.to_string(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn gte(mut self, value: impl Into<FieldValue>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn gt(mut self, value: impl Into<FieldValue>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<FieldValue>) -> Self {
        self.lte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<FieldValue>) -> Self {
        self.lt = Some(value.into());
        self
    }
}

impl BoolPredicate {
    pub fn new() -> Self {
        BoolPredicate {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn with_must(mut self, predicate: Predicate) -> Self {
        self.must.push(predicate);
        self
    }

    pub fn with_should(mut self, predicate: Predicate) -> Self {
        self.should.push(predicate);
        self
    }

    pub fn with_must_not(mut self, predicate: Predicate) -> Self {
        self.must_not.push(predicate);
        self
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len()
    }
}

impl Default for BoolPredicate {
    fn default() -> Self {
        Self::new()
    }
}
