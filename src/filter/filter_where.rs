use serde_json::Value;

use super::error::FilterError;
use super::is_identifier;
use super::types::{FilterOp, FilterWhereOptions};

/// Compiles a filter document into a WHERE expression with `$n` placeholders.
///
/// Supported shapes: `{col: value}`, `{col: {"$gte"|"$lte": v}}`,
/// `{col: {"$in": [..]}}`, `{"$or": [filter, ..]}` and
/// `{"$text": {"$search": "..."}}`. Branches of `$or` share one parameter
/// list, so numbering continues across the whole expression.
pub struct FilterWhere<'a> {
    params: Vec<Value>,
    options: &'a FilterWhereOptions,
}

impl<'a> FilterWhere<'a> {
    pub fn generate(where_data: &Value, options: &'a FilterWhereOptions) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self { params: vec![], options };
        let sql = filter_where.clause(where_data)?;
        Ok((sql, filter_where.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn clause(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            match key.as_str() {
                "$or" => parts.push(self.any_of(value)?),
                "$text" => parts.push(self.text_search(value)?),
                op if op.starts_with('$') => return Err(FilterError::UnsupportedOperator(op.to_string())),
                field => parts.extend(self.field(field, value)?),
            }
        }

        Ok(if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") })
    }

    fn any_of(&mut self, value: &Value) -> Result<String, FilterError> {
        let branches = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData("$or requires array".to_string()))?;
        if branches.is_empty() {
            return Ok("1=0".to_string());
        }
        let mut sql_parts = Vec::with_capacity(branches.len());
        for branch in branches {
            sql_parts.push(format!("({})", self.clause(branch)?));
        }
        Ok(format!("({})", sql_parts.join(" OR ")))
    }

    /// `{"$text": {"$search": "..."}}` against the configured text columns.
    fn text_search(&mut self, value: &Value) -> Result<String, FilterError> {
        let term = value
            .get("$search")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::InvalidOperatorData("$text requires a $search string".to_string()))?;

        if self.options.text_columns.is_empty() {
            return Err(FilterError::UnsupportedOperator("$text is not enabled for this table".to_string()));
        }
        for column in &self.options.text_columns {
            if !is_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        let language = self.options.text_language.as_deref().unwrap_or("simple");
        if !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FilterError::InvalidOperatorData(format!("Invalid text search language: {}", language)));
        }

        let document = self
            .options
            .text_columns
            .iter()
            .map(|c| format!("coalesce(\"{}\", '')", c))
            .collect::<Vec<_>>()
            .join(" || ' ' || ");
        let param = self.param(Value::String(term.to_string()));
        Ok(format!(
            "to_tsvector('{lang}', {doc}) @@ plainto_tsquery('{lang}', {param})",
            lang = language,
            doc = document,
            param = param
        ))
    }

    fn field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        let column = format!("\"{}\"", field);

        match value {
            Value::Object(obj) => {
                let mut out = Vec::with_capacity(obj.len());
                for (op_key, op_val) in obj {
                    let op = FilterOp::from_key(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    out.push(self.condition(&column, op, op_val)?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            _ => Ok(vec![self.condition(&column, FilterOp::Eq, value)?]),
        }
    }

    fn condition(&mut self, column: &str, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        Ok(match op {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", column),
            FilterOp::Eq => format!("{} = {}", column, self.param(data.clone())),
            FilterOp::Gte => format!("{} >= {}", column, self.param(data.clone())),
            FilterOp::Lte => format!("{} <= {}", column, self.param(data.clone())),
            FilterOp::In => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in requires an array".to_string()))?;
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                format!("{} IN ({})", column, params.join(", "))
            }
        })
    }

    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}
