use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::errors::ApiError;
use crate::session_lock::{ActivityKind, InactivityLock};

fn bearer(req: &ServiceRequest) -> Result<String, ApiError> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding".into()))?;

    header_value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized("Authorization header must start with Bearer".into()))
}

fn reject(req: ServiceRequest, error: ApiError) -> Result<ServiceResponse<BoxBody>, Error> {
    Ok(req.into_response(error.error_response()))
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let jwt_secret = req
        .app_data::<Data<Config>>()
        .map(|c| c.jwt_secret.clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match bearer(&req) {
        Ok(t) => t,
        Err(e) => return reject(req, e),
    };

    let claims = match verify_token(&token, &jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            return reject(req, ApiError::Unauthorized("Invalid or expired token".into()));
        }
    };

    let auth_user = match AuthUser::try_from(claims) {
        Ok(user) => user,
        Err(e) => return reject(req, e),
    };

    if let Some(lock) = req.app_data::<Data<InactivityLock>>().cloned() {
        if lock.is_locked() {
            return reject(req, ApiError::Locked);
        }
        lock.record_activity(ActivityKind::Request);
    }

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
