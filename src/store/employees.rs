use uuid::Uuid;

use super::FleetStore;
use crate::authz::capabilities::{EMPLOYEES_CREATE, EMPLOYEES_DELETE, EMPLOYEES_EDIT, EMPLOYEES_VIEW};
use crate::authz::Session;
use crate::errors::{AppError, AppResult};
use crate::models::employee::{Employee, EmployeeCreateRequest, EmployeeStatus, EmployeeUpdateRequest};
use crate::utils::{normalize_email, utc_now};

impl FleetStore {
    pub async fn list_employees(&self, session: &Session) -> AppResult<Vec<Employee>> {
        self.gate(session, EMPLOYEES_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(data.employees.clone())
    }

    pub async fn get_employee(&self, session: &Session, employee_id: Uuid) -> AppResult<Employee> {
        self.gate(session, EMPLOYEES_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        data.employees
            .iter()
            .find(|employee| employee.id == employee_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("employee not found"))
    }

    /// Needs `employees.create` and the new role must be one the actor may assign.
    pub async fn create_employee(&self, session: &Session, payload: EmployeeCreateRequest) -> AppResult<Employee> {
        let actor_id = self.gate(session, EMPLOYEES_CREATE)?;
        self.engine.require_assignable(session, payload.role)?;
        payload.validate()?;
        self.simulate_latency().await;

        let email = normalize_email(&payload.email);
        let mut data = self.data.write().await;
        if data.employees.iter().any(|e| normalize_email(&e.email) == email) {
            return Err(AppError::conflict("email already in use"));
        }

        let now = utc_now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            email,
            department: payload.department.trim().to_string(),
            role: payload.role,
            status: EmployeeStatus::Active,
            password_changed: false,
            created_at: now,
            updated_at: now,
        };
        data.employees.push(employee.clone());

        tracing::info!(employee_id = %employee.id, role = %employee.role, "employee created");
        self.record("created", actor_id, &employee, None).await;
        Ok(employee)
    }

    /// Needs `employees.edit`. Changing role or status additionally needs both
    /// the target's current role and any new role to be assignable by the actor.
    pub async fn update_employee(
        &self,
        session: &Session,
        employee_id: Uuid,
        payload: EmployeeUpdateRequest,
    ) -> AppResult<Employee> {
        let actor_id = self.gate(session, EMPLOYEES_EDIT)?;
        let changes_authority = payload.role.is_some() || payload.status.is_some();
        if changes_authority {
            self.require_authority_over(session, employee_id).await?;
        }
        if let Some(role) = payload.role {
            self.engine.require_assignable(session, role)?;
        }
        payload.validate()?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let new_email = payload.email.as_deref().map(normalize_email);
        if let Some(email) = &new_email {
            if data
                .employees
                .iter()
                .any(|e| e.id != employee_id && normalize_email(&e.email) == *email)
            {
                return Err(AppError::conflict("email already in use"));
            }
        }

        let employee = data
            .employees
            .iter_mut()
            .find(|employee| employee.id == employee_id)
            .ok_or_else(|| AppError::not_found("employee not found"))?;
        // re-checked under the write lock
        if changes_authority {
            self.engine.require_assignable(session, employee.role)?;
        }
        let old = employee.clone();

        if let Some(name) = payload.name {
            employee.name = name.trim().to_string();
        }
        if let Some(email) = new_email {
            employee.email = email;
        }
        if let Some(department) = payload.department {
            employee.department = department.trim().to_string();
        }
        if let Some(role) = payload.role {
            employee.role = role;
        }
        if let Some(status) = payload.status {
            employee.status = status;
        }
        employee.updated_at = utc_now();
        let updated = employee.clone();

        tracing::info!(
            employee_id = %updated.id,
            role = %updated.role,
            previous_role = %old.role,
            "employee updated"
        );
        self.record("updated", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    /// Needs `employees.delete` and the target's role to be assignable by the actor.
    pub async fn delete_employee(&self, session: &Session, employee_id: Uuid) -> AppResult<()> {
        let actor_id = self.gate(session, EMPLOYEES_DELETE)?;
        if actor_id == employee_id {
            return Err(AppError::conflict("cannot delete the signed-in employee"));
        }
        self.require_authority_over(session, employee_id).await?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let index = data
            .employees
            .iter()
            .position(|employee| employee.id == employee_id)
            .ok_or_else(|| AppError::not_found("employee not found"))?;
        self.engine.require_assignable(session, data.employees[index].role)?;
        let employee = data.employees.remove(index);

        tracing::info!(employee_id = %employee.id, "employee deleted");
        self.record("deleted", actor_id, &employee, None).await;
        Ok(())
    }
}

impl FleetStore {
    /// The actor may only act on employees whose current role it could assign.
    async fn require_authority_over(&self, session: &Session, employee_id: Uuid) -> AppResult<()> {
        let role = {
            let data = self.data.read().await;
            data.employees
                .iter()
                .find(|employee| employee.id == employee_id)
                .map(|employee| employee.role)
                .ok_or_else(|| AppError::not_found("employee not found"))?
        };
        if let Err(err) = self.engine.require_assignable(session, role) {
            tracing::warn!(employee_id = %employee_id, target_role = %role, error = %err, "employee change rejected");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::Role;
    use crate::store::test_support::{session_as, store};

    fn hire(email: &str, role: Role) -> EmployeeCreateRequest {
        EmployeeCreateRequest {
            name: "New Hire".to_string(),
            email: email.to_string(),
            department: "Sales".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn manager_hires_only_assignable_roles() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let before = store.snapshot().await.employees.len();

        let hired = store
            .create_employee(&session, hire("hire@rentals.example", Role::BookingAgent))
            .await
            .unwrap();
        assert_eq!(hired.role, Role::BookingAgent);
        assert!(!hired.password_changed);

        let err = store
            .create_employee(&session, hire("boss@rentals.example", Role::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(store.snapshot().await.employees.len(), before + 1);
    }

    #[tokio::test]
    async fn manager_cannot_promote_to_accountant() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let agent = store
            .snapshot()
            .await
            .employees
            .into_iter()
            .find(|e| e.role == Role::BookingAgent && e.is_active())
            .unwrap();

        let err = store
            .update_employee(
                &session,
                agent.id,
                EmployeeUpdateRequest { role: Some(Role::Accountant), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let moved = store
            .update_employee(
                &session,
                agent.id,
                EmployeeUpdateRequest { department: Some("Support".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(moved.role, Role::BookingAgent);
        assert_eq!(moved.department, "Support");
    }

    #[tokio::test]
    async fn manager_cannot_demote_or_deactivate_super_admin() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let admin = store
            .snapshot()
            .await
            .employees
            .into_iter()
            .find(|e| e.role == Role::SuperAdmin)
            .unwrap();

        let err = store
            .update_employee(
                &session,
                admin.id,
                EmployeeUpdateRequest { role: Some(Role::BookingAgent), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = store
            .update_employee(
                &session,
                admin.id,
                EmployeeUpdateRequest { status: Some(EmployeeStatus::Inactive), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let unchanged = store.get_employee(&session, admin.id).await.unwrap();
        assert_eq!(unchanged.role, Role::SuperAdmin);
        assert!(unchanged.is_active());
    }

    #[tokio::test]
    async fn manager_reassigns_within_own_grant() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let agent = store
            .snapshot()
            .await
            .employees
            .into_iter()
            .find(|e| e.role == Role::BookingAgent && e.is_active())
            .unwrap();

        let moved = store
            .update_employee(
                &session,
                agent.id,
                EmployeeUpdateRequest { role: Some(Role::CustomerService), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(moved.role, Role::CustomerService);
    }

    #[tokio::test]
    async fn super_admin_assigns_any_role() {
        let store = store();
        let session = session_as(&store, Role::SuperAdmin).await;

        for (i, role) in Role::ALL.into_iter().enumerate() {
            let email = format!("staff{i}@rentals.example");
            let hired = store.create_employee(&session, hire(&email, role)).await.unwrap();
            assert_eq!(hired.role, role);
        }
    }

    #[tokio::test]
    async fn cannot_delete_self() {
        let store = store();
        let session = session_as(&store, Role::SuperAdmin).await;
        let me = session.actor().unwrap().id;

        let err = store.delete_employee(&session, me).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deactivated_employee_can_no_longer_log_in() {
        let store = store();
        let admin = session_as(&store, Role::SuperAdmin).await;
        let agent = store
            .snapshot()
            .await
            .employees
            .into_iter()
            .find(|e| e.role == Role::BookingAgent && e.is_active())
            .unwrap();

        store
            .update_employee(
                &admin,
                agent.id,
                EmployeeUpdateRequest { status: Some(EmployeeStatus::Inactive), ..Default::default() },
            )
            .await
            .unwrap();

        let mut session = Session::new();
        assert!(store.login(&mut session, &agent.email, "pw").await.is_err());
        assert!(!session.is_authenticated());
    }
}
