pub mod attendance;
pub mod employee;
pub mod role;

pub use role::Role;

use serde_json::Value;

use crate::error::AppError;
use crate::store::{Document, MAX_DATE_LEN, MAX_EMAIL_LEN};

pub(crate) fn object_of(body: Value, message: &str) -> Result<Document, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

pub(crate) fn check_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Refuses key strings longer than the store indexes hold.
pub(crate) fn check_key_fields(fields: &Document) -> Result<(), AppError> {
    for (field, max) in [("email", MAX_EMAIL_LEN), ("date", MAX_DATE_LEN)] {
        if let Some(value) = fields.get(field).and_then(Value::as_str) {
            check_length(field, value, max)?;
        }
    }
    Ok(())
}
