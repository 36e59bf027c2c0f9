use anyhow::{Context, Result};

use fleet_admin::authz::capabilities;
use fleet_admin::authz::AuthState;
use fleet_admin::fixtures::{INACTIVE_EMAIL, MAINTENANCE_EMAIL, MANAGER_EMAIL, SUPER_ADMIN_EMAIL};
use fleet_admin::models::rbac::Role;
use fleet_admin::{AppError, FleetStore, Session, StoreConfig};

#[tokio::test]
async fn login_with_any_password_then_logout_twice() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let mut session = Session::new();

    // The mock login never checks the password.
    let actor = store.login(&mut session, MAINTENANCE_EMAIL, "definitely-wrong").await?;
    assert_eq!(actor.role, Role::MaintenanceStaff);

    let engine = store.engine();
    assert!(engine.has_permission(&session, capabilities::CARS_EDIT));
    assert!(!engine.has_permission(&session, capabilities::CARS_CREATE));
    let info = engine.user_role(&session).context("role descriptor")?;
    assert_eq!(info.label, "Maintenance Staff");

    store.logout(&mut session);
    assert_eq!(session.state(), &AuthState::Unauthenticated);
    store.logout(&mut session);
    assert_eq!(session.state(), &AuthState::Unauthenticated);

    for capability in capabilities::ALL {
        assert!(!engine.has_permission(&session, capability));
    }
    assert!(engine.user_role(&session).is_none());
    assert!(engine.assignable_roles(&session).is_empty());

    Ok(())
}

#[tokio::test]
async fn failed_logins_leave_session_unauthenticated() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let mut session = Session::new();

    for email in ["nobody@rentals.example", INACTIVE_EMAIL, ""] {
        let err = store
            .login(&mut session, email, "password123")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Unauthorized(_)), "{email}: {err}");
        assert!(!session.is_authenticated());
    }

    Ok(())
}

#[tokio::test]
async fn each_login_replaces_the_actor() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let mut session = Session::new();

    store.login(&mut session, SUPER_ADMIN_EMAIL, "x").await?;
    assert_eq!(store.engine().assignable_roles(&session).len(), Role::ALL.len());

    store.login(&mut session, MANAGER_EMAIL, "x").await?;
    let assignable: Vec<Role> = store.engine().assignable_roles(&session).into_iter().collect();
    assert_eq!(
        assignable,
        vec![Role::BookingAgent, Role::CustomerService, Role::MaintenanceStaff]
    );

    Ok(())
}
