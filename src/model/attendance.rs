use serde_json::Value;

use super::{check_key_fields, check_length, object_of};
use crate::error::AppError;
use crate::store::{Document, Filter, ID_FIELD, MAX_DATE_LEN, MAX_EMAIL_LEN};

/// The (email, date) pair identifying one employee's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceKey {
    pub email: String,
    /// Caller-chosen format, compared verbatim.
    pub date: String,
}

impl AttendanceKey {
    pub fn new(email: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            date: date.into(),
        }
    }

    /// Rejects keys too long to be stored.
    pub fn check_len(&self) -> Result<(), AppError> {
        check_length("email", &self.email, MAX_EMAIL_LEN)?;
        check_length("date", &self.date, MAX_DATE_LEN)
    }

    pub fn filter(&self) -> Filter {
        Filter::new()
            .eq("email", self.email.as_str())
            .eq("date", self.date.as_str())
    }
}

/// Attendance record as submitted to `POST /attendance`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub key: AttendanceKey,
    pub fields: Document,
}

impl NewAttendance {
    pub fn from_body(body: Value) -> Result<Self, AppError> {
        let mut fields = object_of(body, "Attendance record must be a JSON object")?;
        fields.remove(ID_FIELD);

        let text = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);
        let (Some(email), Some(date)) = (text("email"), text("date")) else {
            return Err(AppError::BadRequest(
                "Attendance record requires email and date".into(),
            ));
        };
        check_key_fields(&fields)?;

        Ok(Self {
            key: AttendanceKey::new(email, date),
            fields,
        })
    }
}

/// Fields for an attendance `$set`. May be empty: an upsert then only
/// creates the bare (email, date) record.
pub fn update_fields(body: Value) -> Result<Document, AppError> {
    let mut fields = object_of(body, "Payload must be a JSON object")?;
    fields.remove(ID_FIELD);
    check_key_fields(&fields)?;
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_attendance_requires_email_and_date() {
        assert!(NewAttendance::from_body(json!({"email": "a@x.com"})).is_err());
        assert!(NewAttendance::from_body(json!({"date": "2024-01-01"})).is_err());

        let record = NewAttendance::from_body(json!({
            "email": "a@x.com",
            "date": "2024-01-01",
            "status": "present"
        }))
        .unwrap();
        assert_eq!(record.key, AttendanceKey::new("a@x.com", "2024-01-01"));
        assert_eq!(record.fields["status"], "present");
    }

    #[test]
    fn overlong_keys_are_refused() {
        let long_date = "9".repeat(65);

        assert!(NewAttendance::from_body(json!({"email": "a@x.com", "date": long_date})).is_err());
        assert!(update_fields(json!({"date": long_date})).is_err());
        assert!(AttendanceKey::new("a@x.com", long_date).check_len().is_err());
        assert!(AttendanceKey::new("a@x.com", "2024-01-01").check_len().is_ok());
    }
}
