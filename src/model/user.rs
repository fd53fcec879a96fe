use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = "1")]
    pub id: String,
    #[schema(example = "Carlos Manuel")]
    pub name: String,
    #[schema(example = "carlos@mdv.ao")]
    pub email: String,
    pub role: Role,
    /// Present only if this user is linked to an employee record
    #[schema(nullable = true)]
    pub employee_id: Option<String>,
    pub active: bool,
}
