use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token},
    config::Config,
    errors::ApiError,
    models::{LoginReqDto, LoginResponse},
    session_lock::{ActivityKind, InactivityLock},
    store::{DataApi, StoreError},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivityPayload {
    pub kind: ActivityKind,
}

/// Login by email
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Email required"),
        (status = 401, description = "Unknown or inactive user")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(api, config, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    api: web::Data<dyn DataApi>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    info!("Login request received");

    if user.email.trim().is_empty() {
        info!("Validation failed: empty email");
        return Err(ApiError::BadRequest("Email required".into()));
    }

    let account = match api.find_user_by_email(&user.email).await {
        Ok(account) => account,
        Err(StoreError::NotFound(_)) => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        Err(e) => return Err(e.into()),
    };

    if !account.active {
        info!(user_id = %account.id, "Login refused: user inactive");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    debug!(user_id = %account.id, role = %account.role, "Generating access token");
    let access_token = generate_access_token(&account, &config.jwt_secret, config.access_token_ttl).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign access token");
        ApiError::Unavailable("Could not issue token".into())
    })?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        expires_in: config.access_token_ttl,
    }))
}

/// Release the inactivity lock
#[utoipa::path(
    post,
    path = "/auth/unlock",
    responses(
        (status = 200, description = "Session unlocked", body = Object, example = json!({
            "message": "Session unlocked"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn unlock(auth: AuthUser, lock: web::Data<InactivityLock>) -> impl Responder {
    lock.unlock();
    info!(user_id = %auth.user_id, "Inactivity lock released");
    HttpResponse::Ok().json(json!({ "message": "Session unlocked" }))
}

/// Report user activity seen by the dashboard
#[utoipa::path(
    post,
    path = "/api/activity",
    request_body = ActivityPayload,
    responses(
        (status = 204, description = "Idle timer reset"),
        (status = 400, description = "Unknown activity kind"),
        (status = 401, description = "Unauthorized"),
        (status = 423, description = "Session locked")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn report_activity(
    payload: web::Json<ActivityPayload>,
    lock: web::Data<InactivityLock>,
) -> Result<impl Responder, ApiError> {
    if !lock.record_activity(payload.kind) && lock.is_locked() {
        return Err(ApiError::Locked);
    }
    debug!(kind = %payload.kind, "Activity reported");
    Ok(HttpResponse::NoContent().finish())
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated user", body = Object, example = json!({
            "user_id": "3", "email": "pedro@mdv.ao", "role": "operator", "employee_id": null
        })),
        (status = 401, description = "Unauthorized"),
        (status = 423, description = "Session locked")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "email": auth.email,
        "role": auth.role,
        "employee_id": auth.employee_id,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::testing::{bearer, peer, test_app};
    use crate::session_lock::InactivityLock;

    #[actix_web::test]
    async fn login_issues_a_usable_token() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/auth/login")
            .set_json(json!({"email": "Pedro@MDV.ao"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let token = body["access_token"].as_str().unwrap();
        assert_eq!(body["expires_in"], 900);

        let req = test::TestRequest::get()
            .peer_addr(peer())
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["email"], "pedro@mdv.ao");
        assert_eq!(me["role"], "operator");
    }

    #[actix_web::test]
    async fn unknown_email_and_missing_token_are_unauthorized() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/auth/login")
            .set_json(json!({"email": "nobody@mdv.ao"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().peer_addr(peer()).uri("/api/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Missing Authorization header");
    }

    #[actix_web::test]
    async fn locked_session_refuses_api_calls_until_unlocked() {
        let lock = InactivityLock::default();
        let app = test_app!(lock.clone());

        lock.start(Duration::from_millis(5));
        actix_web::rt::time::sleep(Duration::from_millis(50)).await;
        assert!(lock.is_locked());

        let me = || {
            test::TestRequest::get()
                .peer_addr(peer())
                .uri("/api/me")
                .insert_header(bearer("pedro@mdv.ao"))
                .to_request()
        };
        assert_eq!(test::call_service(&app, me()).await.status(), StatusCode::LOCKED);

        let req = test::TestRequest::post()
            .peer_addr(peer())
            .uri("/auth/unlock")
            .insert_header(bearer("pedro@mdv.ao"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        lock.start(Duration::from_secs(900));
        assert_eq!(test::call_service(&app, me()).await.status(), StatusCode::OK);
        lock.shutdown();
    }

    #[actix_web::test]
    async fn reported_activity_keeps_the_session_open() {
        let lock = InactivityLock::default();
        let app = test_app!(lock.clone());
        lock.start(Duration::from_millis(500));

        let report = |kind: &str| {
            test::TestRequest::post()
                .peer_addr(peer())
                .uri("/api/activity")
                .insert_header(bearer("pedro@mdv.ao"))
                .set_json(json!({ "kind": kind }))
                .to_request()
        };
        for kind in ["pointer_move", "key_down", "click", "scroll"] {
            actix_web::rt::time::sleep(Duration::from_millis(150)).await;
            assert_eq!(test::call_service(&app, report(kind)).await.status(), StatusCode::NO_CONTENT);
        }
        assert!(!lock.is_locked());

        let resp = test::call_service(&app, report("wheel")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        actix_web::rt::time::sleep(Duration::from_millis(1000)).await;
        assert!(lock.is_locked());
        assert_eq!(test::call_service(&app, report("click")).await.status(), StatusCode::LOCKED);
        lock.shutdown();
    }
}
