use serde_json::Value;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::{Query, QueryAs};

use super::{Filter, ID_FIELD, StoreError};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Id(u64),
    /// Plain string compared against a generated key column.
    Text(String),
    /// Serialized JSON compared with `CAST(? AS JSON)`.
    Json(String),
}

/// A body field mirrored into an indexed generated column.
///
/// The column holds the field only when it is a JSON string, so only string
/// equality tests can be answered from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumn {
    pub field: &'static str,
    pub column: &'static str,
}

/// ===============================
/// WHERE clause container
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

fn check_field(field: &str) -> Result<&str, StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(field)
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

/// ===============================
/// Build WHERE over the JSON body
/// ===============================
/// String tests on a `keys` field hit its indexed column; everything else
/// goes through `JSON_EXTRACT`.
pub fn build_where(filter: &Filter, keys: &[KeyColumn]) -> Result<SqlWhere, StoreError> {
    if filter.clauses().is_empty() {
        return Ok(SqlWhere {
            clause: "TRUE".to_string(),
            values: Vec::new(),
        });
    }

    let mut conditions = Vec::with_capacity(filter.clauses().len());
    let mut values = Vec::with_capacity(filter.clauses().len());

    for (field, value) in filter.clauses() {
        if field == ID_FIELD {
            match value.as_u64() {
                Some(id) => {
                    conditions.push("id = ?".to_string());
                    values.push(SqlValue::Id(id));
                }
                // identifiers are always unsigned integers
                None => conditions.push("FALSE".to_string()),
            }
            continue;
        }

        let key = keys.iter().find(|key| key.field == field);
        if let (Some(key), Some(text)) = (key, value.as_str()) {
            conditions.push(format!("{} = ?", key.column));
            values.push(SqlValue::Text(text.to_string()));
            continue;
        }

        let path = format!("'$.\"{}\"'", check_field(field)?);
        if value.is_null() {
            conditions.push(format!(
                "(JSON_EXTRACT(body, {path}) IS NULL OR JSON_TYPE(JSON_EXTRACT(body, {path})) = 'NULL')"
            ));
        } else {
            conditions.push(format!("JSON_EXTRACT(body, {path}) = CAST(? AS JSON)"));
            values.push(SqlValue::Json(serde_json::to_string(value)?));
        }
    }

    Ok(SqlWhere {
        clause: conditions.join(" AND "),
        values,
    })
}

pub fn bind_query<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &'q [SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::Id(v) => query.bind(*v),
            SqlValue::Text(v) | SqlValue::Json(v) => query.bind(v.as_str()),
        };
    }
    query
}

pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &'q [SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::Id(v) => query.bind(*v),
            SqlValue::Text(v) | SqlValue::Json(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Strips the identifier before a body is written.
pub fn body_of(doc: &super::Document) -> Value {
    let mut body = doc.clone();
    body.remove(ID_FIELD);
    Value::Object(body)
}
