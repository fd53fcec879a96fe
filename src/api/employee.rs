use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::{
        employee::{Employee, NewEmployee, filter_roster},
        role::Permission,
    },
    store::DataApi,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Case-insensitive match on name or job title
    pub search: Option<String>,
    /// Only active employees (the time clock roster)
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 3)]
    pub total: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct BiometricPayload {
    /// Captured face image as a data URL
    #[schema(example = "data:image/x-portable-pixmap;base64,UDYK...")]
    pub image: String,
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee list", body = EmployeeListResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    query: web::Query<EmployeeQuery>,
) -> Result<impl Responder, ApiError> {
    auth.authorize_any(api.get_ref(), &[Permission::ViewAttendance, Permission::ViewTimeclock])
        .await?;

    let employees = api.list_employees().await?;
    let search = query.search.as_deref().unwrap_or("");
    let data: Vec<Employee> = filter_roster(&employees, search)
        .into_iter()
        .filter(|e| query.active.is_none_or(|active| e.active == active))
        .cloned()
        .collect();

    debug!(total = data.len(), search, "Employees listed");
    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

/// Onboard an employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created, active with the default vacation balance", body = Employee),
        (status = 400, description = "Name or email missing", body = Object, example = json!({
            "message": "invalid data: name and email are required"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    payload: web::Json<NewEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;

    let employee = api.add_employee(payload.into_inner()).await?;
    info!(employee_id = %employee.id, by = %auth.user_id, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

/// Activate or deactivate an employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}/status",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee with the flipped status", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_status(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;

    let employee = api.toggle_employee_status(&path).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Register a face template
#[utoipa::path(
    put,
    path = "/api/employees/{id}/biometric",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    request_body = BiometricPayload,
    responses(
        (status = 200, description = "Biometric reference recorded", body = Employee),
        (status = 400, description = "Missing image"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register_biometric(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    path: web::Path<String>,
    payload: web::Json<BiometricPayload>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;

    let employee = api.update_biometric(&path, &payload.image).await?;
    info!(employee_id = %employee.id, "Biometric reference registered");
    Ok(HttpResponse::Ok().json(employee))
}
