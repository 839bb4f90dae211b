use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Soft-delete predicates every post query carries
const VISIBLE_POST: &str = "\"deleted\" = FALSE";
const VISIBLE_OWNER: &str = "\"member_id\" IN (SELECT \"id\" FROM \"members\" WHERE \"deleted\" = FALSE)";

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn eq(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        self.conditions.push(FilterWhereInfo { column, operator: FilterOp::Eq, data: value.into() });
        self
    }

    /// Substring match against any of the comma separated columns
    pub fn contains_any(&mut self, columns: &'static str, needle: &str) -> &mut Self {
        self.conditions.push(FilterWhereInfo {
            column: columns,
            operator: FilterOp::Like,
            data: Value::String(format!("%{}%", escape_like(needle))),
        });
        self
    }

    /// Builds the WHERE body; the visibility predicates always come first
    pub fn build(&mut self) -> Result<(String, Vec<Value>), FilterError> {
        let mut sql_conditions = vec![VISIBLE_POST.to_string(), VISIBLE_OWNER.to_string()];
        let conditions = std::mem::take(&mut self.conditions);
        for condition in &conditions {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        self.conditions = conditions;
        Ok((sql_conditions.join(" AND "), self.param_values.clone()))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        match condition.operator {
            FilterOp::Eq => {
                let column = quote_column(condition.column)?;
                Ok(format!("{} = {}", column, self.param(condition.data.clone())))
            }
            FilterOp::Like => {
                // One placeholder shared by every column of the OR group
                let placeholder = self.param(condition.data.clone());
                let parts = condition
                    .column
                    .split(',')
                    .map(|c| quote_column(c.trim()).map(|q| format!("{} LIKE {} ESCAPE '\\'", q, placeholder)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

pub(crate) fn quote_column(column: &str) -> Result<String, FilterError> {
    let valid = column
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
    }
    Ok(format!("\"{}\"", column))
}

/// Escapes LIKE metacharacters so the keyword matches literally
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
