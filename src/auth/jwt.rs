use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::identity::IdentityClaim;
use crate::error::AppError;

/// Mints and checks HS256 access tokens.
///
/// The caller's claim is signed as-is, plus `iat`, `exp` and `jti`.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    ttl: i64,
}

impl TokenService {
    pub fn new(secret: Option<String>, ttl_secs: u64) -> Self {
        Self {
            secret,
            ttl: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, claim: &Value) -> Result<String, AppError> {
        self.issue_at(claim, Utc::now().timestamp())
    }

    fn issue_at(&self, claim: &Value, now: i64) -> Result<String, AppError> {
        let Some(secret) = self.secret.as_deref() else {
            error!("Token requested but no signing secret is configured");
            return Err(AppError::TokenUnavailable);
        };

        let mut payload: Map<String, Value> = claim
            .as_object()
            .cloned()
            .ok_or_else(|| AppError::BadRequest("Identity claim must be a JSON object".into()))?;

        let jti = Uuid::new_v4().to_string();
        payload.insert("iat".into(), now.into());
        payload.insert("exp".into(), now.saturating_add(self.ttl).into());
        payload.insert("jti".into(), jti.clone().into());

        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| {
            error!(error = %e, "Failed to sign token");
            AppError::TokenUnavailable
        })?;

        debug!(jti = %jti, "Token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaim, AppError> {
        let Some(secret) = self.secret.as_deref() else {
            warn!("Token presented but no signing secret is configured");
            return Err(AppError::Unauthorized);
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // arbitrary caller claims may carry an `aud`
        validation.validate_aud = false;

        decode::<Map<String, Value>>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| IdentityClaim::new(data.claims))
        .map_err(|e| {
            debug!(error = %e, "Token rejected");
            AppError::Unauthorized
        })
    }
}
