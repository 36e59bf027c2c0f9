use anyhow::{Context, Result};
use chrono::NaiveDate;

use fleet_admin::fixtures::{ACCOUNTANT_EMAIL, AGENT_EMAIL, MANAGER_EMAIL, SUPER_ADMIN_EMAIL};
use fleet_admin::models::booking::{BookingCreateRequest, BookingStatus};
use fleet_admin::models::car::{CarFilter, CarStatus};
use fleet_admin::{AppError, FleetStore, Session, StoreConfig};

#[tokio::test]
async fn mutations_are_chained_into_the_activity_log() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let log = store.activity_log();

    let mut agent = Session::new();
    store.login(&mut agent, AGENT_EMAIL, "pw").await?;
    let mut accountant = Session::new();
    store.login(&mut accountant, ACCOUNTANT_EMAIL, "pw").await?;

    let cars = store.list_cars(&agent, &CarFilter::default()).await?;
    let customers = store.list_customers(&agent, Some("chloe")).await?;
    let customer = customers.first().context("fixture customer")?;

    let booking = store
        .create_booking(
            &agent,
            BookingCreateRequest {
                car_id: cars[2].id,
                customer_id: customer.id,
                start_date: NaiveDate::from_ymd_opt(2024, 6, 1).context("date")?,
                end_date: NaiveDate::from_ymd_opt(2024, 6, 2).context("date")?,
            },
        )
        .await?;
    store.record_payment(&agent, booking.id).await?;
    store.refund_booking(&accountant, booking.id).await?;

    // denied calls emit nothing
    assert!(store.refund_booking(&agent, booking.id).await.is_err());

    assert_eq!(log.len().await, 3);
    assert!(log.verify_chain().await);
    let recent = log.recent(10).await;
    assert_eq!(recent[0].event_name, "booking.refunded");
    assert_eq!(recent[2].event_name, "booking.created");
    assert_eq!(recent[0].severity.as_str(), "critical");

    Ok(())
}

#[tokio::test]
async fn recent_activity_is_gated_by_analytics() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let mut manager = Session::new();
    store.login(&mut manager, MANAGER_EMAIL, "pw").await?;
    let mut agent = Session::new();
    store.login(&mut agent, AGENT_EMAIL, "pw").await?;

    assert!(store.recent_activity(&manager, 5).await?.is_empty());
    assert!(matches!(
        store.recent_activity(&agent, 5).await,
        Err(AppError::Forbidden(_))
    ));

    let mut events = store.subscribe();
    let bookings = store.list_bookings(&manager, &Default::default()).await?;
    let confirmed = bookings
        .iter()
        .find(|b| b.status == BookingStatus::Confirmed)
        .context("confirmed booking")?;
    store
        .update_booking_status(&manager, confirmed.id, BookingStatus::Active)
        .await?;

    let event = events.recv().await?;
    assert_eq!(event["name"], "booking.status_changed");
    assert_eq!(event["payload"]["old"]["status"], "confirmed");
    assert_eq!(event["payload"]["new"]["status"], "active");

    Ok(())
}

#[tokio::test]
async fn recent_activity_reflects_store_mutations() -> Result<()> {
    let store = FleetStore::with_fixtures(StoreConfig::immediate());
    let mut admin = Session::new();
    store.login(&mut admin, SUPER_ADMIN_EMAIL, "pw").await?;

    let retired = store
        .list_cars(&admin, &CarFilter { status: Some(CarStatus::Retired), ..Default::default() })
        .await?;
    let retired = retired.first().context("retired fixture car")?;
    store.delete_car(&admin, retired.id).await?;

    let recent = store.recent_activity(&admin, 10).await?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].event_name, "car.deleted");
    assert_eq!(recent[0].subject_id, Some(retired.id));
    assert_eq!(recent[0].actor_id, admin.actor().map(|a| a.id));
    assert!(store.activity_log().verify_chain().await);

    Ok(())
}
