use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::policy::DuplicateUserPolicy;
use crate::error::AppError;
use crate::model::Role;
use crate::model::employee::{NewEmployee, patch_fields, role_of};
use crate::store::{Collection, Document, DocumentId, Filter, InsertOneResult};

pub const USER_EXISTS: &str = "User already exists";
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Inserted(InsertOneResult),
    /// The email was already on the roster; nothing was written.
    AlreadyExists,
}

/// Employee roster keyed by email.
#[derive(Clone)]
pub struct EmployeeDirectory {
    employees: Arc<dyn Collection>,
    on_duplicate: DuplicateUserPolicy,
}

fn by_email(email: &str) -> Filter {
    Filter::new().eq("email", email)
}

impl EmployeeDirectory {
    pub fn new(employees: Arc<dyn Collection>, on_duplicate: DuplicateUserPolicy) -> Self {
        Self {
            employees,
            on_duplicate,
        }
    }

    fn duplicate(&self) -> Result<CreateOutcome, AppError> {
        match self.on_duplicate {
            DuplicateUserPolicy::Acknowledge => Ok(CreateOutcome::AlreadyExists),
            DuplicateUserPolicy::Reject => Err(AppError::Conflict(USER_EXISTS.to_string())),
        }
    }

    #[instrument(name = "directory_create", skip(self, body))]
    pub async fn create(&self, body: Value) -> Result<CreateOutcome, AppError> {
        let employee = NewEmployee::from_body(body)?;

        if self.employees.find_one(&by_email(&employee.email)).await?.is_some() {
            debug!(email = %employee.email, "Employee already on roster");
            return self.duplicate();
        }

        match self.employees.insert_one(employee.into_document()).await {
            Ok(ack) => {
                info!(id = %ack.inserted_id, "Employee created");
                Ok(CreateOutcome::Inserted(ack))
            }
            // a concurrent create won the race
            Err(e) if e.is_duplicate_key() => self.duplicate(),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.employees.find(&Filter::new()).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Vec<Document>, AppError> {
        Ok(self.employees.find(&by_email(email)).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Document, AppError> {
        let id: DocumentId = id
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid user id".to_string()))?;

        self.employees
            .find_one(&Filter::by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// Role of the record holding `email`; no record is a non-admin.
    pub async fn role_of(&self, email: &str) -> Result<Role, AppError> {
        let record = self.employees.find_one(&by_email(email)).await?;
        Ok(record.as_ref().map(role_of).unwrap_or(Role::Employee))
    }

    /// `$set` merge. Nothing modified (missing record, or identical values)
    /// answers `NotFound`.
    #[instrument(name = "directory_patch", skip(self, body))]
    pub async fn patch_by_email(&self, email: &str, body: Value) -> Result<(), AppError> {
        let fields = patch_fields(body)?;

        let result = self
            .employees
            .update_one(&by_email(email), fields, false)
            .await
            .map_err(|e| {
                if e.is_duplicate_key() {
                    AppError::Conflict(USER_EXISTS.to_string())
                } else {
                    e.into()
                }
            })?;

        if result.modified_count == 0 {
            debug!(matched = result.matched_count, "Patch modified nothing");
            return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    #[instrument(name = "directory_delete", skip(self))]
    pub async fn delete_by_email(&self, email: &str) -> Result<(), AppError> {
        let result = self.employees.delete_one(&by_email(email)).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
        }
        info!("Employee deleted");
        Ok(())
    }
}
