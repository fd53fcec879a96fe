use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::{DataApi, StoreError, StoreResult};
use crate::model::{
    absence::{Absence, AbsenceKind, ApprovalStatus, NewAbsence, VacationRequest},
    employee::{BIOMETRIC_REGISTERED, DEFAULT_VACATION_BALANCE, Employee, NewEmployee},
    punch::{PunchEvent, PunchMethod, PunchSubmission},
    role::{Role, RoleAccess, default_access_table},
    user::User,
};

/// Process-memory backend. Everything resets on restart.
pub struct InMemoryApi {
    latency: Duration,
    punch_processing: Duration,
    employees: RwLock<Vec<Employee>>,
    punches: RwLock<Vec<PunchEvent>>,
    absences: RwLock<Vec<Absence>>,
    vacations: RwLock<Vec<VacationRequest>>,
    users: RwLock<Vec<User>>,
    access: RwLock<Vec<RoleAccess>>,
}

impl InMemoryApi {
    /// Empty backend with no simulated latency.
    pub fn empty() -> Self {
        Self {
            latency: Duration::ZERO,
            punch_processing: Duration::ZERO,
            employees: RwLock::new(Vec::new()),
            punches: RwLock::new(Vec::new()),
            absences: RwLock::new(Vec::new()),
            vacations: RwLock::new(Vec::new()),
            users: RwLock::new(Vec::new()),
            access: RwLock::new(default_access_table()),
        }
    }

    /// Backend preloaded with the demo roster, users and HR requests.
    pub fn seeded() -> Self {
        let api = Self::empty();
        *api.employees.write().expect("employees lock poisoned") = seed_employees();
        *api.users.write().expect("users lock poisoned") = seed_users();
        *api.absences.write().expect("absences lock poisoned") = vec![Absence {
            id: "a1".into(),
            employee_id: "c1".into(),
            employee_name: "João Operário".into(),
            start_date: date(2024, 3, 10),
            end_date: date(2024, 3, 12),
            kind: AbsenceKind::Sickness,
            reason: "Flu".into(),
            proof_url: None,
            status: ApprovalStatus::Approved,
        }];
        *api.vacations.write().expect("vacations lock poisoned") = vec![VacationRequest {
            id: "f1".into(),
            employee_id: "c2".into(),
            employee_name: "Maria Silva".into(),
            start_date: date(2024, 8, 1),
            end_date: date(2024, 8, 15),
            working_days: 10,
            status: ApprovalStatus::Pending,
            notes: Some("Summer holidays".into()),
        }];
        api
    }

    /// Delay applied to every call, emulating a remote backend.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Extra delay for punch registration, where the face check would run.
    pub fn with_punch_processing(mut self, delay: Duration) -> Self {
        self.punch_processing = delay;
        self
    }

    #[cfg(test)]
    pub fn with_employees(self, employees: Vec<Employee>) -> Self {
        *self.employees.write().expect("employees lock poisoned") = employees;
        self
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn employee(&self, id: &str) -> StoreResult<Employee> {
        self.employees
            .read()
            .expect("employees lock poisoned")
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("employee {id}")))
    }

    fn update_employee<F>(&self, id: &str, change: F) -> StoreResult<Employee>
    where
        F: FnOnce(&mut Employee),
    {
        let mut employees = self.employees.write().expect("employees lock poisoned");
        let employee = employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("employee {id}")))?;
        change(employee);
        Ok(employee.clone())
    }
}

#[async_trait]
impl DataApi for InMemoryApi {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.pause().await;
        Ok(self.employees.read().expect("employees lock poisoned").clone())
    }

    async fn add_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        self.pause().await;

        if new.name.trim().is_empty() || new.email.trim().is_empty() {
            return Err(StoreError::Validation("name and email are required".into()));
        }

        let employee = Employee {
            id: format!("c{}", Uuid::new_v4().simple()),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            job_title: new.job_title,
            department: new.department,
            vacation_balance: DEFAULT_VACATION_BALANCE,
            biometric_reference: None,
            active: true,
        };
        self.employees
            .write()
            .expect("employees lock poisoned")
            .push(employee.clone());

        info!(employee_id = %employee.id, "Employee onboarded");
        Ok(employee)
    }

    async fn toggle_employee_status(&self, id: &str) -> StoreResult<Employee> {
        self.pause().await;
        let employee = self.update_employee(id, |e| e.active = !e.active)?;
        info!(employee_id = id, active = employee.active, "Employee status toggled");
        Ok(employee)
    }

    async fn update_biometric(&self, id: &str, image: &str) -> StoreResult<Employee> {
        self.pause().await;
        if image.is_empty() {
            return Err(StoreError::Validation("image is required".into()));
        }
        // Only the fact that a template exists is kept, never the image.
        self.update_employee(id, |e| e.biometric_reference = Some(BIOMETRIC_REGISTERED.to_string()))
    }

    async fn list_punches(&self) -> StoreResult<Vec<PunchEvent>> {
        self.pause().await;
        let mut punches = self.punches.read().expect("punches lock poisoned").clone();
        punches.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(punches)
    }

    async fn register_punch(&self, submission: PunchSubmission) -> StoreResult<PunchEvent> {
        self.pause().await;
        if !self.punch_processing.is_zero() {
            tokio::time::sleep(self.punch_processing).await;
        }

        let employee = self.employee(&submission.employee_id)?;
        if !employee.active {
            return Err(StoreError::Inactive(employee.id));
        }

        let event = PunchEvent {
            id: format!("mov-{}", Uuid::new_v4().simple()),
            employee_id: employee.id,
            recorded_at: Utc::now(),
            direction: submission.direction,
            method: PunchMethod::Facial,
            confidence_score: Some(rand::rng().random_range(0.94..0.99)),
            captured_image: Some(submission.image),
            latitude: submission.latitude,
            longitude: submission.longitude,
        };

        // History keeps the metadata only; the capture goes back to the caller.
        self.punches.write().expect("punches lock poisoned").push(PunchEvent {
            captured_image: None,
            ..event.clone()
        });

        debug!(
            punch_id = %event.id,
            employee_id = %event.employee_id,
            direction = %event.direction,
            has_coordinates = event.has_coordinates(),
            "Punch recorded"
        );
        Ok(event)
    }

    async fn list_absences(&self) -> StoreResult<Vec<Absence>> {
        self.pause().await;
        Ok(self.absences.read().expect("absences lock poisoned").clone())
    }

    async fn create_absence(&self, new: NewAbsence) -> StoreResult<Absence> {
        self.pause().await;

        if new.start_date > new.end_date {
            return Err(StoreError::Validation("start_date cannot be after end_date".into()));
        }
        let employee = self.employee(&new.employee_id)?;

        let absence = Absence {
            id: format!("a{}", Uuid::new_v4().simple()),
            employee_id: employee.id,
            employee_name: employee.name,
            start_date: new.start_date,
            end_date: new.end_date,
            kind: new.kind,
            reason: new.reason,
            proof_url: new.proof_url,
            status: ApprovalStatus::Pending,
        };
        self.absences
            .write()
            .expect("absences lock poisoned")
            .push(absence.clone());
        Ok(absence)
    }

    async fn set_absence_status(&self, id: &str, status: ApprovalStatus) -> StoreResult<Absence> {
        self.pause().await;
        let mut absences = self.absences.write().expect("absences lock poisoned");
        let absence = absences
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("absence {id}")))?;
        absence.status = status;
        Ok(absence.clone())
    }

    async fn list_vacations(&self) -> StoreResult<Vec<VacationRequest>> {
        self.pause().await;
        Ok(self.vacations.read().expect("vacations lock poisoned").clone())
    }

    async fn set_vacation_status(&self, id: &str, status: ApprovalStatus) -> StoreResult<VacationRequest> {
        self.pause().await;
        let mut vacations = self.vacations.write().expect("vacations lock poisoned");
        let request = vacations
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("vacation request {id}")))?;
        request.status = status;
        Ok(request.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.pause().await;
        let needle = email.trim().to_lowercase();
        self.users
            .read()
            .expect("users lock poisoned")
            .iter()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }

    async fn access_control(&self) -> StoreResult<Vec<RoleAccess>> {
        self.pause().await;
        Ok(self.access.read().expect("access lock poisoned").clone())
    }

    async fn save_access_control(&self, table: Vec<RoleAccess>) -> StoreResult<()> {
        self.pause().await;

        for (i, entry) in table.iter().enumerate() {
            if table[..i].iter().any(|other| other.role == entry.role) {
                return Err(StoreError::Validation(format!("role {} listed twice", entry.role)));
            }
        }

        *self.access.write().expect("access lock poisoned") = table;
        info!("Access control table replaced");
        Ok(())
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn seed_employees() -> Vec<Employee> {
    let employee = |id: &str, name: &str, email: &str, job_title: &str, department: &str, balance| Employee {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        job_title: job_title.into(),
        department: department.into(),
        vacation_balance: balance,
        biometric_reference: None,
        active: true,
    };

    vec![
        employee("c1", "João Operário", "joao@mdv.ao", "Operador de Máquinas", "Produção", 22),
        employee("c2", "Maria Silva", "maria@mdv.ao", "Assistente RH", "Recursos Humanos", 15),
        employee("c3", "António Motorista", "antonio@mdv.ao", "Logística", "Logística", 5),
    ]
}

fn seed_users() -> Vec<User> {
    let user = |id: &str, name: &str, email: &str, role| User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        employee_id: None,
        active: true,
    };

    vec![
        user("1", "Carlos Manuel", "carlos@mdv.ao", Role::Administrator),
        user("2", "Ana Sousa", "ana@mdv.ao", Role::Manager),
        user("3", "Pedro Costa", "pedro@mdv.ao", Role::Operator),
    ]
}
