use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::session::Session;
use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::models::rbac::{Role, RoleInfo, RoleTable};

/// Which roles an actor may grant to other employees.
///
/// Kept apart from the capability table on purpose: holding
/// `employees.create` says nothing about which roles may be handed out.
#[derive(Debug, Clone, Default)]
pub struct AssignmentPolicy {
    grants: HashMap<Role, BTreeSet<Role>>,
}

impl AssignmentPolicy {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_grant(mut self, granter: Role, grantable: impl IntoIterator<Item = Role>) -> Self {
        self.grants.insert(granter, grantable.into_iter().collect());
        self
    }

    /// super_admin may assign anything, branch_manager the front-line roles.
    pub fn standard() -> Self {
        Self::empty()
            .with_grant(Role::SuperAdmin, Role::ALL)
            .with_grant(
                Role::BranchManager,
                [Role::BookingAgent, Role::CustomerService, Role::MaintenanceStaff],
            )
    }

    pub fn assignable_by(&self, granter: Role) -> BTreeSet<Role> {
        self.grants.get(&granter).cloned().unwrap_or_default()
    }
}

/// Single source of truth for "does the current actor hold capability C".
///
/// Evaluation order:
/// 1. no actor -> deny
/// 2. actor's role missing from the table -> deny
/// 3. exact membership of the capability in the role's set
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    table: Arc<RoleTable>,
    assignments: Arc<AssignmentPolicy>,
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::new(RoleTable::standard(), AssignmentPolicy::standard())
    }
}

impl PermissionEngine {
    pub fn new(table: RoleTable, assignments: AssignmentPolicy) -> Self {
        Self {
            table: Arc::new(table),
            assignments: Arc::new(assignments),
        }
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn has_permission(&self, session: &Session, capability: &str) -> bool {
        let Some(actor) = session.actor() else {
            tracing::debug!(capability = %capability, "no actor, permission denied");
            return false;
        };

        let Some(info) = self.table.get(actor.role) else {
            tracing::debug!(
                employee_id = %actor.id,
                role = %actor.role,
                capability = %capability,
                "role not in table, permission denied"
            );
            return false;
        };

        let granted = info.has_permission(capability);
        tracing::debug!(
            employee_id = %actor.id,
            role = %actor.role,
            capability = %capability,
            granted,
            "permission check"
        );
        granted
    }

    pub fn user_role(&self, session: &Session) -> Option<&RoleInfo> {
        session.actor().and_then(|actor| self.table.get(actor.role))
    }

    pub fn assignable_roles(&self, session: &Session) -> BTreeSet<Role> {
        session
            .actor()
            .map(|actor| self.assignments.assignable_by(actor.role))
            .unwrap_or_default()
    }

    pub fn can_assign(&self, session: &Session, role: Role) -> bool {
        self.assignable_roles(session).contains(&role)
    }

    /// Gate used ahead of every store call; yields the permitted actor.
    pub fn require<'s>(&self, session: &'s Session, capability: &str) -> AppResult<&'s Employee> {
        let Some(actor) = session.actor() else {
            return Err(AppError::unauthorized("no active session"));
        };
        if !self.has_permission(session, capability) {
            return Err(AppError::forbidden(format!("missing capability {capability}")));
        }
        Ok(actor)
    }

    pub fn require_assignable(&self, session: &Session, role: Role) -> AppResult<()> {
        if !session.is_authenticated() {
            return Err(AppError::unauthorized("no active session"));
        }
        if !self.can_assign(session, role) {
            return Err(AppError::forbidden(format!("role {role} cannot be assigned by this actor")));
        }
        Ok(())
    }
}
