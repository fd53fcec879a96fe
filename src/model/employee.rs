use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Marker stored once a face template has been captured for an employee.
pub const BIOMETRIC_REGISTERED: &str = "registered";

/// Vacation days granted to a freshly onboarded employee.
pub const DEFAULT_VACATION_BALANCE: u32 = 22;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "c1",
        "name": "João Operário",
        "email": "joao@mdv.ao",
        "job_title": "Operador de Máquinas",
        "department": "Produção",
        "vacation_balance": 22,
        "biometric_reference": null,
        "active": true
    })
)]
pub struct Employee {
    #[schema(example = "c1")]
    pub id: String,

    #[schema(example = "João Operário")]
    pub name: String,

    #[schema(example = "joao@mdv.ao")]
    pub email: String,

    #[schema(example = "Operador de Máquinas")]
    pub job_title: String,

    #[schema(example = "Produção")]
    pub department: String,

    #[schema(example = 22)]
    pub vacation_balance: u32,

    #[schema(example = "registered", nullable = true)]
    pub biometric_reference: Option<String>,

    #[schema(example = true)]
    pub active: bool,
}

impl Employee {
    /// Case-insensitive substring match against the name or the job title.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.job_title.to_lowercase().contains(&needle)
    }
}

/// HR onboarding payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Rui Carpinteiro")]
    pub name: String,
    #[schema(example = "rui@mdv.ao", format = "email")]
    pub email: String,
    #[schema(example = "Carpinteiro")]
    pub job_title: String,
    #[schema(example = "Produção")]
    pub department: String,
}

/// Keeps the employees matching `search`, preserving roster order.
pub fn filter_roster<'a>(roster: &'a [Employee], search: &str) -> Vec<&'a Employee> {
    roster.iter().filter(|e| e.matches(search)).collect()
}

#[cfg(test)]
pub(crate) fn sample(id: &str, name: &str, job_title: &str) -> Employee {
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@mdv.ao"),
        job_title: job_title.to_string(),
        department: "Produção".to_string(),
        vacation_balance: DEFAULT_VACATION_BALANCE,
        biometric_reference: None,
        active: true,
    }
}
