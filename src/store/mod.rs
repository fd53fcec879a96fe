//! Data access port.
//!
//! Every screen of the dashboard talks to the backend through [`DataApi`], one
//! method per resource operation. The service ships an in-memory backend; a
//! real one only has to implement this trait.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    absence::{Absence, ApprovalStatus, NewAbsence, VacationRequest},
    employee::{Employee, NewEmployee},
    punch::{PunchEvent, PunchSubmission},
    role::RoleAccess,
    user::User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("employee {0} is not active")]
    Inactive(String),

    #[error("invalid data: {0}")]
    Validation(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DataApi: Send + Sync {
    // roster
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn add_employee(&self, new: NewEmployee) -> StoreResult<Employee>;
    async fn toggle_employee_status(&self, id: &str) -> StoreResult<Employee>;
    async fn update_biometric(&self, id: &str, image: &str) -> StoreResult<Employee>;

    // punches
    async fn list_punches(&self) -> StoreResult<Vec<PunchEvent>>;
    async fn register_punch(&self, submission: PunchSubmission) -> StoreResult<PunchEvent>;

    // absences and vacations
    async fn list_absences(&self) -> StoreResult<Vec<Absence>>;
    async fn create_absence(&self, new: NewAbsence) -> StoreResult<Absence>;
    async fn set_absence_status(&self, id: &str, status: ApprovalStatus) -> StoreResult<Absence>;
    async fn list_vacations(&self) -> StoreResult<Vec<VacationRequest>>;
    async fn set_vacation_status(&self, id: &str, status: ApprovalStatus) -> StoreResult<VacationRequest>;

    // users and access control
    async fn find_user_by_email(&self, email: &str) -> StoreResult<User>;
    async fn access_control(&self) -> StoreResult<Vec<RoleAccess>>;
    async fn save_access_control(&self, table: Vec<RoleAccess>) -> StoreResult<()>;
}
