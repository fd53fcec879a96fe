use crate::api::{
    absence::Decision,
    employee::{BiometricPayload, EmployeeListResponse},
    timeclock::{ConfirmResponse, ConfirmResult, DirectionPayload, EmployeePayload, SessionResponse},
};
use crate::model::{
    absence::{Absence, AbsenceKind, ApprovalStatus, NewAbsence, VacationRequest},
    employee::{Employee, NewEmployee},
    punch::{PunchDirection, PunchEvent, PunchMethod, PunchSubmission},
    role::{Permission, Role, RoleAccess},
};
use crate::auth::handlers::ActivityPayload;
use crate::models::{LoginReqDto, LoginResponse};
use crate::session_lock::ActivityKind;
use crate::timeclock::workflow::{
    Advisory, AdvisoryLevel, CameraStatus, IgnoredReason, LocationStatus, Stage, WorkflowView,
};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ponto API",
        version = "1.0.0",
        description = r#"
## HR time clock

Backend of the HR dashboard's attendance features.

### Key Features
- **Time clock kiosk**
  - Three-step punch wizard: direction, employee, face capture with location
- **Employees**
  - Onboarding, activation and biometric registration
- **Attendance**
  - Punch history, absences and vacation approvals
- **Access control**
  - Role to permission table

### Security
Every `/api` endpoint needs a JWT bearer token from `POST /auth/login`.
After 15 minutes without activity the session locks (HTTP 423) until
`POST /auth/unlock`.

State lives in process memory and resets on restart.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::unlock,
        crate::auth::handlers::me,
        crate::auth::handlers::report_activity,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::toggle_status,
        crate::api::employee::register_biometric,

        crate::api::punch::list_punches,
        crate::api::punch::register_punch,

        crate::api::absence::list_absences,
        crate::api::absence::create_absence,
        crate::api::absence::decide_absence,
        crate::api::absence::list_vacations,
        crate::api::absence::decide_vacation,

        crate::api::access::get_access,
        crate::api::access::save_access,

        crate::api::timeclock::open_session,
        crate::api::timeclock::get_session,
        crate::api::timeclock::close_session,
        crate::api::timeclock::select_direction,
        crate::api::timeclock::roster,
        crate::api::timeclock::select_employee,
        crate::api::timeclock::confirm,
        crate::api::timeclock::cancel
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ActivityPayload,
            ActivityKind,
            Employee,
            NewEmployee,
            EmployeeListResponse,
            BiometricPayload,
            PunchDirection,
            PunchMethod,
            PunchEvent,
            PunchSubmission,
            Absence,
            AbsenceKind,
            ApprovalStatus,
            NewAbsence,
            VacationRequest,
            Decision,
            Role,
            Permission,
            RoleAccess,
            SessionResponse,
            DirectionPayload,
            EmployeePayload,
            ConfirmResponse,
            ConfirmResult,
            WorkflowView,
            Stage,
            Advisory,
            AdvisoryLevel,
            CameraStatus,
            LocationStatus,
            IgnoredReason
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and inactivity lock"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Punch history and registration"),
        (name = "Absence", description = "Absence justification and approval"),
        (name = "Vacation", description = "Vacation approval"),
        (name = "Access", description = "Role based access control"),
        (name = "Timeclock", description = "Kiosk punch wizard"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
