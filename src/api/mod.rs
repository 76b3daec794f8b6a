pub mod attendance;
pub mod employee;

use actix_web::{Responder, get};

/// Liveness check.
#[get("/")]
pub async fn index() -> impl Responder {
    "Workflow server is running"
}
