use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::identity::Decoded;
use super::jwt::TokenService;
use super::role_guard::RoleGuard;
use crate::error::AppError;

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9.eyJlbWFpbCI6ImFAeC5jb20ifQ.sig")]
    pub token: String,
}

/// Issue an access token
///
/// Signs the posted identity claim for three hours. No credential check.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body(content = Object, example = json!({"email": "john@email.com"})),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Claim is not a JSON object"),
        (status = 500, description = "No signing secret configured")
    ),
    tag = "Auth"
)]
pub async fn issue_token(
    claim: web::Json<Value>,
    tokens: web::Data<TokenService>,
) -> Result<impl Responder, AppError> {
    let token = tokens.issue(&claim)?;
    info!("Access token issued");
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// Is the caller an admin
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(
        ("email", Path, description = "Employee email; must match the token's email")
    ),
    responses(
        (status = 200, description = "Admin status", body = Object, example = json!({
            "admin": true
        })),
        (status = 401, description = "Unauthorized", body = Object, example = json!({
            "error": true,
            "message": "Unauthorized access"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
#[instrument(name = "admin_status", skip(decoded, guard))]
pub async fn admin_status(
    decoded: Decoded,
    path: web::Path<String>,
    guard: web::Data<RoleGuard>,
) -> Result<impl Responder, AppError> {
    let email = path.into_inner();
    let admin = guard.is_admin(&decoded.0, &email).await?;
    Ok(HttpResponse::Ok().json(json!({ "admin": admin })))
}
