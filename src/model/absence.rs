use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceKind {
    Sickness,
    Family,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Absence {
    #[schema(example = "a1")]
    pub id: String,
    #[schema(example = "c1")]
    pub employee_id: String,
    /// Denormalized for list screens
    #[schema(example = "João Operário")]
    pub employee_name: String,
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub kind: AbsenceKind,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(nullable = true)]
    pub proof_url: Option<String>,
    pub status: ApprovalStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewAbsence {
    #[schema(example = "c1")]
    pub employee_id: String,
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub kind: AbsenceKind,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(nullable = true)]
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacationRequest {
    #[schema(example = "f1")]
    pub id: String,
    #[schema(example = "c2")]
    pub employee_id: String,
    #[schema(example = "Maria Silva")]
    pub employee_name: String,
    #[schema(example = "2026-08-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-15", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 10)]
    pub working_days: u32,
    pub status: ApprovalStatus,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}
