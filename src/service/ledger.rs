use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::policy::AttendanceUpdatePolicy;
use crate::error::AppError;
use crate::model::attendance::{AttendanceKey, NewAttendance, update_fields};
use crate::store::{Collection, DeleteResult, Document, Filter, InsertOneResult, UpdateResult};

pub const RECORD_NOT_FOUND: &str = "Attendance record not found";

fn already_taken(date: &str) -> AppError {
    AppError::Conflict(format!("Attendance for {date} has already been taken."))
}

/// One attendance record per (email, date).
#[derive(Clone)]
pub struct AttendanceLedger {
    attendance: Arc<dyn Collection>,
    on_update: AttendanceUpdatePolicy,
}

impl AttendanceLedger {
    pub fn new(attendance: Arc<dyn Collection>, on_update: AttendanceUpdatePolicy) -> Self {
        Self {
            attendance,
            on_update,
        }
    }

    /// Insert-if-absent. An existing (email, date) is a `Conflict`.
    #[instrument(name = "ledger_create", skip(self, body))]
    pub async fn create(&self, body: Value) -> Result<InsertOneResult, AppError> {
        let record = NewAttendance::from_body(body)?;

        if self.attendance.find_one(&record.key.filter()).await?.is_some() {
            debug!(email = %record.key.email, date = %record.key.date, "Attendance already taken");
            return Err(already_taken(&record.key.date));
        }

        match self.attendance.insert_one(record.fields).await {
            Ok(ack) => {
                info!(id = %ack.inserted_id, "Attendance recorded");
                Ok(ack)
            }
            Err(e) if e.is_duplicate_key() => Err(already_taken(&record.key.date)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.attendance.find(&Filter::new()).await?)
    }

    pub async fn list_by_email(&self, email: &str) -> Result<Vec<Document>, AppError> {
        Ok(self.attendance.find(&Filter::new().eq("email", email)).await?)
    }

    /// `$set` merge on (email, date). Under the `Upsert` policy a missing
    /// record is created; under `RequireExisting` it is `NotFound`.
    #[instrument(name = "ledger_upsert", skip(self, body), fields(policy = %self.on_update))]
    pub async fn upsert_by_email_and_date(
        &self,
        key: &AttendanceKey,
        body: Value,
    ) -> Result<UpdateResult, AppError> {
        let fields = update_fields(body)?;
        let upsert = self.on_update == AttendanceUpdatePolicy::Upsert;
        if upsert {
            key.check_len()?;
        }

        // a clash happens on the date the record ends up with
        let target_date = fields
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or(key.date.as_str())
            .to_string();

        let result = self
            .attendance
            .update_one(&key.filter(), fields, upsert)
            .await
            .map_err(|e| {
                if e.is_duplicate_key() {
                    already_taken(&target_date)
                } else {
                    e.into()
                }
            })?;

        if !upsert && result.matched_count == 0 {
            return Err(AppError::NotFound(RECORD_NOT_FOUND.to_string()));
        }
        if result.upserted_count > 0 {
            info!("Attendance created by update");
        }
        Ok(result)
    }

    #[instrument(name = "ledger_delete", skip(self))]
    pub async fn delete_by_email_and_date(
        &self,
        key: &AttendanceKey,
    ) -> Result<DeleteResult, AppError> {
        let result = self.attendance.delete_one(&key.filter()).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound(RECORD_NOT_FOUND.to_string()));
        }
        Ok(result)
    }
}
