use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use tracing::{debug, error, warn};

use super::identity::Decoded;
use super::jwt::TokenService;
use super::role_guard::RoleGuard;
use crate::error::AppError;

fn reject(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

/// Verifies `Authorization: Bearer <token>` and stores the claim as
/// [`Decoded`]. Any failure answers 401 before the handler runs.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(tokens) = req.app_data::<Data<TokenService>>().cloned() else {
        error!("TokenService missing from app data");
        return Err(actix_web::error::ErrorInternalServerError("App config missing"));
    };

    let header_value = match req.headers().get(AUTHORIZATION) {
        Some(h) => h.to_str().ok(),
        None => {
            warn!(path = %req.path(), "Missing Authorization header");
            return Ok(reject(req, AppError::Unauthorized));
        }
    };

    // "<scheme> <credential>"
    let Some(token) = header_value.and_then(|h| h.split_whitespace().nth(1)) else {
        warn!(path = %req.path(), "Malformed Authorization header");
        return Ok(reject(req, AppError::Unauthorized));
    };

    let claim = match tokens.verify(token) {
        Ok(claim) => claim,
        Err(e) => {
            warn!(path = %req.path(), "Invalid or expired token");
            return Ok(reject(req, e));
        }
    };

    debug!(email = ?claim.email(), "Request authenticated");
    req.extensions_mut().insert(Decoded(claim));

    next.call(req).await
}

/// Lets the request through only when the authenticated identity's
/// employee record has role `"admin"`. Must run after [`auth_middleware`].
pub async fn verify_admin(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(guard) = req.app_data::<Data<RoleGuard>>().cloned() else {
        error!("RoleGuard missing from app data");
        return Err(actix_web::error::ErrorInternalServerError("App config missing"));
    };

    let decoded = req.extensions().get::<Decoded>().cloned();
    let Some(Decoded(claim)) = decoded else {
        return Ok(reject(req, AppError::Unauthorized));
    };

    match guard.require_admin(&claim).await {
        Ok(capability) => {
            req.extensions_mut().insert(capability);
            next.call(req).await
        }
        Err(e) => {
            warn!(path = %req.path(), email = ?claim.email(), "Admin check failed");
            Ok(reject(req, e))
        }
    }
}
