use std::collections::HashSet;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::Predicate;
use crate::query::types::QueryParams;

/// Filter validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_bool_clauses: usize,
    pub max_filter_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            max_bool_clauses: 256,
            max_filter_depth: 8,
        }
    }
}

impl From<&Config> for ValidationConfig {
    fn from(config: &Config) -> Self {
        ValidationConfig {
            max_bool_clauses: config.max_bool_clauses,
            max_filter_depth: config.max_filter_depth,
        }
    }
}

/// Checks filter shape and that every referenced column is live
pub struct FilterValidator {
    config: ValidationConfig,
}

impl FilterValidator {
    pub fn new(config: ValidationConfig) -> Self {
        FilterValidator { config }
    }

    pub fn validate(&self, filter: &Predicate, live: &HashSet<String>) -> Result<()> {
        self.validate_depth(filter, 0)?;
        for column in filter.columns() {
            if !live.contains(column) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("filter references unknown column {}", column),
                ));
            }
        }
        Ok(())
    }

    pub fn validate_params(&self, params: &QueryParams, live: &HashSet<String>) -> Result<()> {
        self.validate(&params.filter, live)?;
        for order in &params.order_by {
            if !live.contains(&order.column) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("cannot order by unknown column {}", order.column),
                ));
            }
        }
        Ok(())
    }

    fn validate_depth(&self, filter: &Predicate, depth: usize) -> Result<()> {
        if depth > self.config.max_filter_depth {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Filter depth {} exceeds maximum {}",
                        depth, self.config.max_filter_depth)
            ));
        }

        match filter {
            Predicate::Bool(bool_predicate) => {
                let total_clauses = bool_predicate.clause_count();
                if total_clauses > self.config.max_bool_clauses {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!("Boolean filter has {} clauses, max is {}",
                                total_clauses, self.config.max_bool_clauses)
                    ));
                }
                for p in bool_predicate.must.iter()
                    .chain(&bool_predicate.should)
                    .chain(&bool_predicate.must_not)
                {
                    self.validate_depth(p, depth + 1)?;
                }
            }
            Predicate::In(in_predicate) if in_predicate.values.len() > self.config.max_bool_clauses => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("IN list has {} values, max is {}",
                            in_predicate.values.len(), self.config.max_bool_clauses)
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::OrderBy;

    fn live() -> HashSet<String> {
        ["id", "title"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_unknown_columns() {
        let validator = FilterValidator::new(ValidationConfig::default());
        assert!(validator.validate(&Predicate::eq("title", "x"), &live()).is_ok());

        let err = validator
            .validate(&Predicate::and(vec![Predicate::eq("id", 1), Predicate::eq("nope", 1)]), &live())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let params = QueryParams::default().order_by(OrderBy::asc("secret"));
        assert!(validator.validate_params(&params, &live()).is_err());
    }

    #[test]
    fn enforces_depth_and_clause_limits() {
        let validator = FilterValidator::new(ValidationConfig { max_bool_clauses: 2, max_filter_depth: 1 });

        let wide = Predicate::or(vec![Predicate::eq("id", 1), Predicate::eq("id", 2), Predicate::eq("id", 3)]);
        assert!(validator.validate(&wide, &live()).is_err());

        let deep = Predicate::not(Predicate::not(Predicate::not(Predicate::eq("id", 1))));
        assert!(validator.validate(&deep, &live()).is_err());

        let ok = Predicate::not(Predicate::eq("id", 1));
        assert!(validator.validate(&ok, &live()).is_ok());
    }
}
