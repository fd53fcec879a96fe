//! Kiosk endpoints driving one punch wizard per session.

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::{employee::Employee, punch::PunchDirection, role::Permission},
    store::DataApi,
    timeclock::{
        sessions::KioskSessions,
        workflow::{ConfirmOutcome, IgnoredReason, PunchWorkflow, WorkflowView},
    },
};

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub view: WorkflowView,
}

#[derive(Deserialize, ToSchema)]
pub struct DirectionPayload {
    pub direction: PunchDirection,
}

#[derive(Deserialize, ToSchema)]
pub struct EmployeePayload {
    #[schema(example = "c1")]
    pub employee_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RosterQuery {
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConfirmResult {
    Ignored { reason: IgnoredReason },
    AwaitingFrame,
    Recorded { punch_id: String },
    Failed { detail: String },
}

impl From<ConfirmOutcome> for ConfirmResult {
    fn from(outcome: ConfirmOutcome) -> Self {
        match outcome {
            ConfirmOutcome::Ignored(reason) => ConfirmResult::Ignored { reason },
            ConfirmOutcome::AwaitingFrame => ConfirmResult::AwaitingFrame,
            ConfirmOutcome::Recorded(event) => ConfirmResult::Recorded { punch_id: event.id },
            ConfirmOutcome::Failed(detail) => ConfirmResult::Failed { detail },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ConfirmResponse {
    pub outcome: ConfirmResult,
    pub view: WorkflowView,
}

async fn kiosk(
    auth: &AuthUser,
    api: &dyn DataApi,
    sessions: &KioskSessions,
    id: &Uuid,
) -> Result<Arc<PunchWorkflow>, ApiError> {
    auth.authorize(api, Permission::ViewTimeclock).await?;
    sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("kiosk session {id} not found")))
}

/// Open a kiosk session
#[utoipa::path(
    post,
    path = "/api/timeclock/sessions",
    responses(
        (status = 201, description = "Session opened at the direction step", body = SessionResponse),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn open_session(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewTimeclock).await?;

    let (session_id, workflow) = sessions.open().await;
    debug!(%session_id, user_id = %auth.user_id, "Kiosk opened");
    Ok(HttpResponse::Created().json(SessionResponse {
        session_id,
        view: workflow.view(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/timeclock/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Current wizard state", body = WorkflowView),
        (status = 404, description = "Unknown or expired session")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn get_session(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    Ok(HttpResponse::Ok().json(workflow.view()))
}

/// Close a session, releasing its camera
#[utoipa::path(
    delete,
    path = "/api/timeclock/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown or expired session")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn close_session(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    auth.authorize(api.get_ref(), Permission::ViewTimeclock).await?;

    if sessions.close(&path).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound(format!("kiosk session {} not found", *path)))
    }
}

#[utoipa::path(
    post,
    path = "/api/timeclock/sessions/{id}/direction",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = DirectionPayload,
    responses(
        (status = 200, description = "Moved to employee selection", body = WorkflowView),
        (status = 409, description = "Not at the direction step")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn select_direction(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
    payload: web::Json<DirectionPayload>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    Ok(HttpResponse::Ok().json(workflow.select_direction(payload.direction)?))
}

/// Roster shown by the kiosk
#[utoipa::path(
    get,
    path = "/api/timeclock/sessions/{id}/employees",
    params(("id" = Uuid, Path, description = "Session ID"), RosterQuery),
    responses(
        (status = 200, description = "Active employees matching the search", body = [Employee])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn roster(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
    query: web::Query<RosterQuery>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    let employees: Vec<Employee> = workflow.roster(query.search.as_deref().unwrap_or(""));
    Ok(HttpResponse::Ok().json(employees))
}

/// Pick the employee and start camera and location
#[utoipa::path(
    post,
    path = "/api/timeclock/sessions/{id}/employee",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Capturing; devices are being acquired", body = WorkflowView),
        (status = 404, description = "Employee not on the active roster"),
        (status = 409, description = "Not at the employee step")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn select_employee(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
    payload: web::Json<EmployeePayload>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    Ok(HttpResponse::Ok().json(workflow.select_employee(&payload.employee_id)?))
}

/// Capture the frame and register the punch
#[utoipa::path(
    post,
    path = "/api/timeclock/sessions/{id}/confirm",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Outcome of the capture and the resulting state", body = ConfirmResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn confirm(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    let outcome = workflow.confirm_capture().await;
    Ok(HttpResponse::Ok().json(ConfirmResponse {
        outcome: outcome.into(),
        view: workflow.view(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/timeclock/sessions/{id}/cancel",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Back at the direction step", body = WorkflowView)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn cancel(
    auth: AuthUser,
    api: web::Data<dyn DataApi>,
    sessions: web::Data<KioskSessions>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let workflow = kiosk(&auth, api.get_ref(), &sessions, &path).await?;
    Ok(HttpResponse::Ok().json(workflow.cancel()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::testing::{bearer, peer, test_app};

    #[actix_web::test]
    async fn kiosk_records_a_check_in() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/api/timeclock/sessions")
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let opened: Value = test::read_body_json(resp).await;
        assert_eq!(opened["view"]["stage"], "select_direction");
        let base = format!("/api/timeclock/sessions/{}", opened["session_id"].as_str().unwrap());

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri(&format!("{base}/direction"))
            .insert_header(bearer("pedro@mdv.ao"))
            .set_json(json!({"direction": "CHECK_IN"}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["stage"], "select_employee");

        let req = test::TestRequest::get()
            .peer_addr(peer())
            .uri(&format!("{base}/employees?search=MARIA"))
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let roster: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(roster.as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri(&format!("{base}/employee"))
            .insert_header(bearer("pedro@mdv.ao"))
            .set_json(json!({"employee_id": "c2"}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["stage"], "capturing");

        let mut view = Value::Null;
        for _ in 0..100 {
            let req = test::TestRequest::get()
                .peer_addr(peer())
                .uri(&base)
                .insert_header(bearer("pedro@mdv.ao"))
                .to_request();
            view = test::call_and_read_body_json(&app, req).await;
            if view["camera"]["state"] != "starting" && view["location"]["state"] != "locating" {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(view["camera"]["state"], "live");
        assert_eq!(view["location"]["state"], "acquired");
        assert_eq!(view["can_confirm"], true);

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri(&format!("{base}/confirm"))
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let confirmed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(confirmed["outcome"]["result"], "recorded");
        assert_eq!(confirmed["view"]["stage"], "completed");
        assert_eq!(confirmed["view"]["last_punch"]["employee_id"], "c2");
        assert!(confirmed["view"]["last_punch"]["captured_image"].is_null());

        let req = test::TestRequest::get()
            .peer_addr(peer())
            .uri("/api/punches?employee_id=c2")
            .insert_header(bearer("carlos@mdv.ao"))
            .to_request();
        let punches: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(punches.as_array().unwrap().len(), 1);
        assert_eq!(punches[0]["latitude"], -8.8383);
    }

    #[actix_web::test]
    async fn confirm_before_capture_is_ignored() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/api/timeclock/sessions")
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let opened: Value = test::call_and_read_body_json(&app, req).await;
        let base = format!("/api/timeclock/sessions/{}", opened["session_id"].as_str().unwrap());

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri(&format!("{base}/confirm"))
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["outcome"], json!({"result": "ignored", "reason": "not_capturing"}));

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri(&format!("{base}/employee"))
            .insert_header(bearer("pedro@mdv.ao"))
            .set_json(json!({"employee_id": "c1"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn closed_session_is_gone() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/api/timeclock/sessions")
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        let opened: Value = test::call_and_read_body_json(&app, req).await;
        let base = format!("/api/timeclock/sessions/{}", opened["session_id"].as_str().unwrap());

        let req = test::TestRequest::delete()
            .peer_addr(peer())
            .uri(&base)
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .peer_addr(peer())
            .uri(&base)
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn manager_has_no_kiosk_access() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/api/timeclock/sessions")
            .insert_header(bearer("ana@mdv.ao"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
