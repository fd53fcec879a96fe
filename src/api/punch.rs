use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::{
        punch::PunchSubmission,
        role::Permission,
    },
    store::DataApi,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PunchQuery {
    pub employee_id: Option<String>,
}

/// Attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/punches",
    params(PunchQuery),
    responses(
        (status = 200, description = "Recorded punches", body = [crate::model::punch::PunchEvent]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_punches(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    query: web::Query<PunchQuery>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;

    let mut punches = api.list_punches().await?;
    if let Some(employee_id) = &query.employee_id {
        punches.retain(|p| &p.employee_id == employee_id);
    }
    Ok(HttpResponse::Ok().json(punches))
}

/// Register a punch directly
#[utoipa::path(
    post,
    path = "/api/punches",
    request_body = PunchSubmission,
    responses(
        (status = 201, description = "Punch recorded", body = crate::model::punch::PunchEvent),
        (status = 404, description = "Unknown employee"),
        (status = 409, description = "Employee inactive", body = Object, example = json!({
            "message": "employee c3 is not active"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn register_punch(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    payload: web::Json<PunchSubmission>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewTimeclock).await?;

    let event = api.register_punch(payload.into_inner()).await?;
    info!(punch_id = %event.id, employee_id = %event.employee_id, direction = %event.direction, "Punch registered via API");
    Ok(HttpResponse::Created().json(event))
}
