use actix_web::{HttpResponse, Responder, web};
use serde_json::{Value, json};
use tracing::error;

use crate::error::AppError;
use crate::service::directory::USER_EXISTS;
use crate::service::{CreateOutcome, EmployeeDirectory};

/// Create Employee
///
/// The email must not be on the roster yet.
#[utoipa::path(
    post,
    path = "/users",
    request_body(content = Object, example = json!({
        "email": "john@email.com",
        "name": "John Doe",
        "role": "employee"
    })),
    responses(
        (status = 200, description = "Inserted, or already on the roster", body = Object, example = json!({
            "acknowledged": true,
            "insertedId": 1
        })),
        (status = 400, description = "Body is not an object with an email, or duplicate under the reject policy"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_user(
    directory: web::Data<EmployeeDirectory>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    match directory.create(body.into_inner()).await? {
        CreateOutcome::Inserted(ack) => Ok(HttpResponse::Ok().json(ack)),
        CreateOutcome::AlreadyExists => Ok(HttpResponse::Ok().json(json!({
            "message": USER_EXISTS
        }))),
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Every employee record", body = [Object]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_users(
    directory: web::Data<EmployeeDirectory>,
) -> Result<impl Responder, AppError> {
    let employees = directory.list_all().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Find Employee by email
#[utoipa::path(
    get,
    path = "/employee/{email}",
    params(
        ("email", Path, description = "Employee email")
    ),
    responses(
        (status = 200, description = "Zero or one matching record", body = [Object]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn employee_by_email(
    directory: web::Data<EmployeeDirectory>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let matches = directory.find_by_email(&path).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id", Path, description = "Store-assigned employee id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Object),
        (status = 400, description = "Malformed id", body = String, example = json!("Invalid user id")),
        (status = 404, description = "Employee not found", body = String, example = json!("User not found")),
        (status = 500, description = "Internal server error", body = String, example = json!("Internal server error"))
    ),
    tag = "Employee"
)]
pub async fn get_user(
    directory: web::Data<EmployeeDirectory>,
    path: web::Path<String>,
) -> impl Responder {
    match directory.find_by_id(&path).await {
        Ok(employee) => HttpResponse::Ok().json(employee),
        // this route answers in plain text
        Err(AppError::BadRequest(message)) => HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body(message),
        Err(AppError::NotFound(message)) => HttpResponse::NotFound()
            .content_type("text/plain; charset=utf-8")
            .body(message),
        Err(e) => {
            error!(error = %e, id = %path, "Failed to fetch employee");
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Internal server error")
        }
    }
}

/// Update Employee
///
/// Merges the given fields into the record with this email.
#[utoipa::path(
    patch,
    path = "/users/{email}",
    params(
        ("email", Path, description = "Employee email")
    ),
    request_body(content = Object, example = json!({"role": "admin"})),
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "User updated successfully"
        })),
        (status = 404, description = "No record was modified", body = Object, example = json!({
            "message": "User not found"
        })),
        (status = 403, description = "Admin required (ADMIN_GUARDED_MUTATIONS)"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn patch_user(
    directory: web::Data<EmployeeDirectory>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    directory.patch_by_email(&path, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/users/{email}",
    params(
        ("email", Path, description = "Employee email")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "User deleted successfully"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "User not found"
        })),
        (status = 403, description = "Admin required (ADMIN_GUARDED_MUTATIONS)"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn delete_user(
    directory: web::Data<EmployeeDirectory>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    directory.delete_by_email(&path).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted successfully"
    })))
}
