use std::str::FromStr;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::{
    auth::jwt::verify_token,
    config::Config,
    errors::ApiError,
    model::role::{Permission, Role, RoleAccess, has_permission},
    models::Claims,
    store::DataApi,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::from_str(&claims.role).map_err(|_| ApiError::Unauthorized("Invalid role".into()))?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }
}

/// Reads the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing token".into()))
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Ok(t) => t,
            Err(e) => return ready(Err(e)),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Unavailable("Config missing".into()))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token".into()))),
        };

        ready(AuthUser::try_from(claims))
    }
}

impl AuthUser {
    pub fn require(&self, permission: Permission, table: &[RoleAccess]) -> Result<(), ApiError> {
        if has_permission(self.role, permission, table) {
            Ok(())
        } else {
            tracing::info!(user_id = %self.user_id, role = %self.role, %permission, "Permission denied");
            Err(ApiError::Forbidden(permission.to_string()))
        }
    }

    /// Like [`AuthUser::require`], against the backend's current table.
    pub async fn authorize(&self, api: &dyn DataApi, permission: Permission) -> Result<(), ApiError> {
        let table = api.access_control().await?;
        self.require(permission, &table)
    }

    /// Passes if the user holds at least one of `permissions`.
    pub async fn authorize_any(&self, api: &dyn DataApi, permissions: &[Permission]) -> Result<(), ApiError> {
        let table = api.access_control().await?;
        if permissions.iter().any(|p| has_permission(self.role, *p, &table)) {
            return Ok(());
        }
        match permissions.first() {
            Some(p) => Err(ApiError::Forbidden(p.to_string())),
            None => Ok(()),
        }
    }
}
