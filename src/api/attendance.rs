use actix_web::{HttpResponse, Responder, web};
use serde_json::Value;

use crate::error::AppError;
use crate::model::attendance::AttendanceKey;
use crate::service::AttendanceLedger;

/// Record attendance
///
/// One record per employee per date.
#[utoipa::path(
    post,
    path = "/attendance",
    request_body(content = Object, example = json!({
        "email": "john@email.com",
        "date": "2024-01-01",
        "status": "present"
    })),
    responses(
        (status = 200, description = "Recorded", body = Object, example = json!({
            "acknowledged": true,
            "insertedId": 1
        })),
        (status = 400, description = "Already taken for that date", body = String, example = json!(
            "Attendance for 2024-01-01 has already been taken."
        )),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn create_attendance(
    ledger: web::Data<AttendanceLedger>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let ack = ledger.create(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ack))
}

/// List attendance
#[utoipa::path(
    get,
    path = "/attendance",
    responses(
        (status = 200, description = "Every attendance record", body = [Object]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    ledger: web::Data<AttendanceLedger>,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(ledger.list_all().await?))
}

/// Attendance of one employee
#[utoipa::path(
    get,
    path = "/attendance/{email}",
    params(
        ("email", Path, description = "Employee email")
    ),
    responses(
        (status = 200, description = "That employee's records", body = [Object]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_by_email(
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(ledger.list_by_email(&path).await?))
}

/// Update attendance
///
/// Creates the record when absent, unless ATTENDANCE_UPDATE_POLICY=require-existing.
#[utoipa::path(
    put,
    path = "/attendance/{email}/{date}",
    params(
        ("email", Path, description = "Employee email"),
        ("date", Path, description = "Attendance date, as recorded")
    ),
    request_body(content = Object, example = json!({"status": "late"})),
    responses(
        (status = 200, description = "Store update result", body = Object, example = json!({
            "acknowledged": true,
            "matchedCount": 1,
            "modifiedCount": 1,
            "upsertedId": null,
            "upsertedCount": 0
        })),
        (status = 404, description = "No record (require-existing policy)"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let (email, date) = path.into_inner();
    let result = ledger
        .upsert_by_email_and_date(&AttendanceKey::new(email, date), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Delete attendance
#[utoipa::path(
    delete,
    path = "/attendance/{email}/{date}",
    params(
        ("email", Path, description = "Employee email"),
        ("date", Path, description = "Attendance date, as recorded")
    ),
    responses(
        (status = 200, description = "Store delete result", body = Object, example = json!({
            "acknowledged": true,
            "deletedCount": 1
        })),
        (status = 404, description = "No such record", body = Object, example = json!({
            "message": "Attendance record not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (email, date) = path.into_inner();
    let result = ledger
        .delete_by_email_and_date(&AttendanceKey::new(email, date))
        .await?;
    Ok(HttpResponse::Ok().json(result))
}
