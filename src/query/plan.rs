//! Executable query plans
//!
//! A plan keeps the SQL statement and the values bound to its placeholders
//! apart until the executor sends them. Placeholders use the ClickHouse
//! `{name:Type}` syntax.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::BuildError;

/// SQL statement plus bound parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    statement: String,
    parameters: BTreeMap<String, String>,
}

impl QueryPlan {
    /// Create a plan, checking that placeholders and bound values agree.
    ///
    /// # Arguments
    /// * `statement` - SQL text with `{name:Type}` placeholders
    /// * `parameters` - Value for every placeholder name
    ///
    /// # Returns
    /// * `Result<Self, BuildError>` - Plan, or `InvalidFilter` when a
    ///   placeholder is unbound or a value has no placeholder
    pub fn new(
        statement: String,
        parameters: BTreeMap<String, String>,
    ) -> std::result::Result<Self, BuildError> {
        let placeholders = placeholder_names(&statement);
        let bound: BTreeSet<String> = parameters.keys().cloned().collect();

        if let Some(missing) = placeholders.difference(&bound).next() {
            return Err(BuildError::InvalidFilter(format!(
                "placeholder '{missing}' has no bound value"
            )));
        }
        if let Some(unused) = bound.difference(&placeholders).next() {
            return Err(BuildError::InvalidFilter(format!(
                "parameter '{unused}' is not referenced by the statement"
            )));
        }

        Ok(Self {
            statement,
            parameters,
        })
    }

    /// Rendered SQL text
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Bound values keyed by placeholder name
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Value bound to a single placeholder
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Collect the names of all `{name:Type}` placeholders in a statement.
pub fn placeholder_names(statement: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut rest = statement;

    while let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('}') else {
            break;
        };
        let inner = &rest[..close];
        if let Some((name, ty)) = inner.split_once(':') {
            let is_ident = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if is_ident && !ty.trim().is_empty() {
                names.insert(name.to_string());
            }
        }
        rest = &rest[close + 1..];
    }

    names
}
