use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::role::{Permission, RoleAccess},
    store::DataApi,
};

/// Role to permission table
#[utoipa::path(
    get,
    path = "/api/access",
    responses(
        (status = 200, description = "Current access control table", body = [RoleAccess]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Access"
)]
pub async fn get_access(auth: AuthUser, api: web::Data<dyn DataApi>) -> Result<impl Responder, ApiError> {
    let table = api.access_control().await?;
    auth.require(Permission::ManageAcl, &table)?;
    Ok(HttpResponse::Ok().json(table))
}

/// Replace the table
#[utoipa::path(
    put,
    path = "/api/access",
    request_body = [RoleAccess],
    responses(
        (status = 200, description = "Table replaced", body = Object, example = json!({
            "message": "Access control updated"
        })),
        (status = 400, description = "Role listed twice"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Access"
)]
pub async fn save_access(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    payload: web::Json<Vec<RoleAccess>>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ManageAcl).await?;

    api.save_access_control(payload.into_inner()).await?;
    info!(by = %auth.user_id, "Access control updated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Access control updated" })))
}
