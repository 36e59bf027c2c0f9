use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::utils::normalize_email;

/// Authentication state of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Employee),
}

/// Holds the current actor. Passed explicitly to every permission check and
/// store call; there is no process-wide current user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: AuthState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already bound to `actor`, bypassing login.
    pub fn authenticated(actor: Employee) -> Self {
        Self {
            state: AuthState::Authenticated(actor),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn actor(&self) -> Option<&Employee> {
        match &self.state {
            AuthState::Authenticated(actor) => Some(actor),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor().is_some()
    }

    /// Mock login: binds the first active employee whose email matches.
    ///
    /// The password is accepted as given and never checked. On failure the
    /// session keeps whatever state it had.
    pub fn login<'a>(
        &mut self,
        directory: impl IntoIterator<Item = &'a Employee>,
        email: &str,
        _password: &str,
    ) -> AppResult<Employee> {
        let wanted = normalize_email(email);
        let actor = directory
            .into_iter()
            .find(|employee| employee.is_active() && normalize_email(&employee.email) == wanted)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

        tracing::info!(
            employee_id = %actor.id,
            role = %actor.role,
            "login succeeded"
        );

        self.state = AuthState::Authenticated(actor.clone());
        Ok(actor)
    }

    /// Clears the current actor. Calling it on an empty session is a no-op.
    pub fn logout(&mut self) {
        if let AuthState::Authenticated(actor) = &self.state {
            tracing::info!(employee_id = %actor.id, "logout");
        }
        self.state = AuthState::Unauthenticated;
    }
}
