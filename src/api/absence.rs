use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::{
        absence::{ApprovalStatus, NewAbsence},
        role::Permission,
    },
    store::DataApi,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct Decision {
    /// `approved` or `rejected`
    pub status: ApprovalStatus,
}

fn decided(decision: &Decision) -> Result<ApprovalStatus, ApiError> {
    match decision.status {
        ApprovalStatus::Pending => Err(ApiError::BadRequest("Decision must be approved or rejected".into())),
        status => Ok(status),
    }
}

#[utoipa::path(
    get,
    path = "/api/absences",
    responses(
        (status = 200, description = "All absences", body = [crate::model::absence::Absence])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn list_absences(auth: AuthUser, api: web::Data<dyn DataApi>) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;
    Ok(HttpResponse::Ok().json(api.list_absences().await?))
}

/// Justify an absence
#[utoipa::path(
    post,
    path = "/api/absences",
    request_body = NewAbsence,
    responses(
        (status = 201, description = "Absence recorded as pending", body = crate::model::absence::Absence),
        (status = 400, description = "start_date after end_date"),
        (status = 404, description = "Unknown employee")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn create_absence(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    payload: web::Json<NewAbsence>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;

    let absence = api.create_absence(payload.into_inner()).await?;
    info!(absence_id = %absence.id, employee_id = %absence.employee_id, "Absence created");
    Ok(HttpResponse::Created().json(absence))
}

#[utoipa::path(
    put,
    path = "/api/absences/{id}/status",
    params(
        ("id" = String, Path, description = "Absence ID")
    ),
    request_body = Decision,
    responses(
        (status = 200, description = "Absence decided", body = crate::model::absence::Absence),
        (status = 400, description = "Status must be approved or rejected"),
        (status = 404, description = "Absence not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn decide_absence(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    path: web::Path<String>,
    payload: web::Json<Decision>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ManageAbsences).await?;

    let status = decided(&payload)?;
    let absence = api.set_absence_status(&path, status).await?;
    info!(absence_id = %absence.id, %status, by = %auth.user_id, "Absence decided");
    Ok(HttpResponse::Ok().json(absence))
}

#[utoipa::path(
    get,
    path = "/api/vacations",
    responses(
        (status = 200, description = "All vacation requests", body = [crate::model::absence::VacationRequest])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn list_vacations(auth: AuthUser, api: web::Data<dyn DataApi>) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewAttendance).await?;
    Ok(HttpResponse::Ok().json(api.list_vacations().await?))
}

#[utoipa::path(
    put,
    path = "/api/vacations/{id}/status",
    params(
        ("id" = String, Path, description = "Vacation request ID")
    ),
    request_body = Decision,
    responses(
        (status = 200, description = "Vacation request decided", body = crate::model::absence::VacationRequest),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn decide_vacation(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    path: web::Path<String>,
    payload: web::Json<Decision>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ManageVacations).await?;

    let status = decided(&payload)?;
    let request = api.set_vacation_status(&path, status).await?;
    info!(vacation_id = %request.id, %status, by = %auth.user_id, "Vacation request decided");
    Ok(HttpResponse::Ok().json(request))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::testing::{bearer, peer, test_app};

    #[actix_web::test]
    async fn absence_is_created_pending_then_approved() {
        let app = test_app!();
        let req = test::TestRequest::post().peer_addr(peer())
            .uri("/api/absences")
            .insert_header(bearer("ana@mdv.ao"))
            .set_json(json!({
                "employee_id": "c3",
                "start_date": "2026-05-04",
                "end_date": "2026-05-05",
                "kind": "family",
                "reason": "Funeral",
                "proof_url": null
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["status"], "pending");
        assert_eq!(created["employee_name"], "António Motorista");

        let req = test::TestRequest::put().peer_addr(peer())
            .uri(&format!("/api/absences/{}/status", created["id"].as_str().unwrap()))
            .insert_header(bearer("ana@mdv.ao"))
            .set_json(json!({"status": "approved"}))
            .to_request();
        let decided: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(decided["status"], "approved");
    }

    #[actix_web::test]
    async fn reversed_dates_are_rejected() {
        let app = test_app!();
        let req = test::TestRequest::post().peer_addr(peer())
            .uri("/api/absences")
            .insert_header(bearer("ana@mdv.ao"))
            .set_json(json!({
                "employee_id": "c1",
                "start_date": "2026-05-05",
                "end_date": "2026-05-04",
                "kind": "sickness",
                "reason": "Flu",
                "proof_url": null
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn vacation_decision_needs_permission_and_final_status() {
        let app = test_app!();
        let req = test::TestRequest::put().peer_addr(peer())
            .uri("/api/vacations/f1/status")
            .insert_header(bearer("pedro@mdv.ao"))
            .set_json(json!({"status": "approved"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put().peer_addr(peer())
            .uri("/api/vacations/f1/status")
            .insert_header(bearer("ana@mdv.ao"))
            .set_json(json!({"status": "pending"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put().peer_addr(peer())
            .uri("/api/vacations/f1/status")
            .insert_header(bearer("ana@mdv.ao"))
            .set_json(json!({"status": "rejected"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "rejected");
    }
}
