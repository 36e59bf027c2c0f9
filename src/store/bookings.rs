use uuid::Uuid;

use super::{Collections, FleetStore};
use crate::authz::capabilities::{
    BOOKINGS_CANCEL, BOOKINGS_CREATE, BOOKINGS_DELETE, BOOKINGS_EDIT, BOOKINGS_REFUND, BOOKINGS_VIEW,
};
use crate::authz::Session;
use crate::errors::{AppError, AppResult};
use crate::models::booking::{Booking, BookingCreateRequest, BookingFilter, BookingStatus, PaymentStatus};
use crate::models::car::CarStatus;
use crate::models::customer::CustomerStatus;
use crate::utils::{rental_days, utc_now};

/// Flips a rented car back to available when no active booking references it.
fn release_car_if_idle(data: &mut Collections, car_id: Uuid) {
    let still_rented = data
        .bookings
        .iter()
        .any(|booking| booking.car_id == car_id && booking.status == BookingStatus::Active);
    if still_rented {
        return;
    }
    if let Some(car) = data.cars.iter_mut().find(|car| car.id == car_id && car.status == CarStatus::Rented) {
        car.status = CarStatus::Available;
        car.updated_at = utc_now();
    }
}

impl FleetStore {
    pub async fn list_bookings(&self, session: &Session, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        self.gate(session, BOOKINGS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(data
            .bookings
            .iter()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect())
    }

    pub async fn get_booking(&self, session: &Session, booking_id: Uuid) -> AppResult<Booking> {
        self.gate(session, BOOKINGS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        data.bookings
            .iter()
            .find(|booking| booking.id == booking_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("booking not found"))
    }

    /// Creates a confirmed, unpaid booking priced at the car's daily rate.
    pub async fn create_booking(&self, session: &Session, payload: BookingCreateRequest) -> AppResult<Booking> {
        let actor_id = self.gate(session, BOOKINGS_CREATE)?;
        payload.validate()?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let car = data
            .cars
            .iter()
            .find(|car| car.id == payload.car_id)
            .ok_or_else(|| AppError::not_found("car not found"))?;
        match car.status {
            CarStatus::Retired => return Err(AppError::conflict("car is retired")),
            CarStatus::Maintenance => return Err(AppError::conflict("car is in maintenance")),
            CarStatus::Available | CarStatus::Rented => {}
        }
        let total = car
            .daily_rate
            .checked_mul(rental_days(payload.start_date, payload.end_date))
            .ok_or_else(|| AppError::validation("booking total is out of range"))?;

        let customer = data
            .customers
            .iter()
            .find(|customer| customer.id == payload.customer_id)
            .ok_or_else(|| AppError::not_found("customer not found"))?;
        if customer.status == CustomerStatus::Blocked {
            return Err(AppError::conflict("customer is blocked"));
        }

        let now = utc_now();
        let booking = Booking {
            id: Uuid::new_v4(),
            car_id: payload.car_id,
            customer_id: payload.customer_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Pending,
            total,
            created_at: now,
            updated_at: now,
        };
        data.bookings.push(booking.clone());

        tracing::info!(booking_id = %booking.id, total = booking.total, "booking created");
        self.record("created", actor_id, &booking, None).await;
        Ok(booking)
    }

    /// Assigns `status` directly. Moving to `cancelled` also needs
    /// `bookings.cancel`. The car follows: active marks it rented, and a rented
    /// car goes back to available once no active booking holds it.
    pub async fn update_booking_status(
        &self,
        session: &Session,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        let actor_id = self.gate(session, BOOKINGS_EDIT)?;
        if status == BookingStatus::Cancelled {
            self.gate(session, BOOKINGS_CANCEL)?;
        }
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let index = data
            .bookings
            .iter()
            .position(|booking| booking.id == booking_id)
            .ok_or_else(|| AppError::not_found("booking not found"))?;
        let car_id = data.bookings[index].car_id;

        if status == BookingStatus::Active {
            let car_status = data.cars.iter().find(|car| car.id == car_id).map(|car| car.status);
            if let Some(CarStatus::Maintenance | CarStatus::Retired) = car_status {
                return Err(AppError::conflict("car is not available for rental"));
            }
        }

        let booking = &mut data.bookings[index];
        let old = booking.clone();
        booking.status = status;
        booking.updated_at = utc_now();
        let updated = booking.clone();

        if status == BookingStatus::Active {
            if let Some(car) = data.cars.iter_mut().find(|car| car.id == car_id) {
                car.status = CarStatus::Rented;
            }
        } else {
            release_car_if_idle(&mut data, car_id);
        }

        tracing::info!(
            booking_id = %updated.id,
            from = old.status.as_str(),
            to = updated.status.as_str(),
            "booking status changed"
        );
        self.record("status_changed", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    pub async fn record_payment(&self, session: &Session, booking_id: Uuid) -> AppResult<Booking> {
        let actor_id = self.gate(session, BOOKINGS_EDIT)?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let booking = data
            .bookings
            .iter_mut()
            .find(|booking| booking.id == booking_id)
            .ok_or_else(|| AppError::not_found("booking not found"))?;
        if booking.payment_status != PaymentStatus::Pending {
            return Err(AppError::conflict("booking is not awaiting payment"));
        }
        let old = booking.clone();
        booking.payment_status = PaymentStatus::Paid;
        booking.updated_at = utc_now();
        let updated = booking.clone();

        tracing::info!(booking_id = %updated.id, total = updated.total, "payment recorded");
        self.record("paid", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    pub async fn refund_booking(&self, session: &Session, booking_id: Uuid) -> AppResult<Booking> {
        let actor_id = self.gate(session, BOOKINGS_REFUND)?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let booking = data
            .bookings
            .iter_mut()
            .find(|booking| booking.id == booking_id)
            .ok_or_else(|| AppError::not_found("booking not found"))?;
        if booking.payment_status != PaymentStatus::Paid {
            return Err(AppError::conflict("only paid bookings can be refunded"));
        }
        let old = booking.clone();
        booking.payment_status = PaymentStatus::Refunded;
        booking.updated_at = utc_now();
        let updated = booking.clone();

        tracing::info!(booking_id = %updated.id, amount = updated.total, "booking refunded");
        self.record("refunded", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    pub async fn delete_booking(&self, session: &Session, booking_id: Uuid) -> AppResult<()> {
        let actor_id = self.gate(session, BOOKINGS_DELETE)?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let index = data
            .bookings
            .iter()
            .position(|booking| booking.id == booking_id)
            .ok_or_else(|| AppError::not_found("booking not found"))?;
        let booking = data.bookings.remove(index);
        release_car_if_idle(&mut data, booking.car_id);

        tracing::info!(booking_id = %booking.id, "booking deleted");
        self.record("deleted", actor_id, &booking, None).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::Role;
    use crate::store::test_support::{session_as, store};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn create_prices_by_inclusive_days() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let data = store.snapshot().await;
        let car = data.cars.iter().find(|c| c.status == CarStatus::Available).unwrap();
        let customer = data.customers.iter().find(|c| c.status == CustomerStatus::Active).unwrap();

        let booking = store
            .create_booking(
                &session,
                BookingCreateRequest {
                    car_id: car.id,
                    customer_id: customer.id,
                    start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(booking.total, car.daily_rate * 3);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn blocked_customer_cannot_book() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let data = store.snapshot().await;
        let blocked = data.customers.iter().find(|c| c.status == CustomerStatus::Blocked).unwrap();

        let err = store
            .create_booking(
                &session,
                BookingCreateRequest {
                    car_id: data.cars[0].id,
                    customer_id: blocked.id,
                    start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn cancelling_requires_cancel_capability() {
        let store = store();
        let data = store.snapshot().await;
        let confirmed = data.bookings.iter().find(|b| b.status == BookingStatus::Confirmed).unwrap().id;

        // accountant holds neither edit nor cancel
        let accountant = session_as(&store, Role::Accountant).await;
        let err = store
            .update_booking_status(&accountant, confirmed, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let support = session_as(&store, Role::CustomerService).await;
        let booking = store
            .update_booking_status(&support, confirmed, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn status_moves_drive_car_availability() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let data = store.snapshot().await;
        let booking = data.bookings.iter().find(|b| b.status == BookingStatus::Confirmed).unwrap().clone();

        store.update_booking_status(&session, booking.id, BookingStatus::Active).await.unwrap();
        assert_eq!(store.get_car(&session, booking.car_id).await.unwrap().status, CarStatus::Rented);

        store.update_booking_status(&session, booking.id, BookingStatus::Completed).await.unwrap();
        assert_eq!(store.get_car(&session, booking.car_id).await.unwrap().status, CarStatus::Available);
    }

    fn request(car_id: Uuid, customer_id: Uuid, days: u32) -> BookingCreateRequest {
        BookingCreateRequest {
            car_id,
            customer_id,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, days).unwrap(),
        }
    }

    #[tokio::test]
    async fn cancelling_one_booking_keeps_car_rented_by_another() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let data = store.snapshot().await;
        let active = data.bookings.iter().find(|b| b.status == BookingStatus::Active).unwrap().clone();
        let other_customer = data
            .customers
            .iter()
            .find(|c| c.status == CustomerStatus::Active && c.id != active.customer_id)
            .unwrap();

        let extra = store
            .create_booking(&session, request(active.car_id, other_customer.id, 2))
            .await
            .unwrap();
        store.update_booking_status(&session, extra.id, BookingStatus::Cancelled).await.unwrap();

        assert_eq!(store.get_booking(&session, active.id).await.unwrap().status, BookingStatus::Active);
        assert_eq!(store.get_car(&session, active.car_id).await.unwrap().status, CarStatus::Rented);

        store.update_booking_status(&session, active.id, BookingStatus::Completed).await.unwrap();
        assert_eq!(store.get_car(&session, active.car_id).await.unwrap().status, CarStatus::Available);
    }

    #[tokio::test]
    async fn car_in_maintenance_is_neither_booked_nor_rented() {
        let store = store();
        let session = session_as(&store, Role::BranchManager).await;
        let data = store.snapshot().await;
        let customer = data.customers.iter().find(|c| c.status == CustomerStatus::Active).unwrap();
        let in_shop = data.cars.iter().find(|c| c.status == CarStatus::Maintenance).unwrap();

        let err = store.create_booking(&session, request(in_shop.id, customer.id, 3)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let confirmed = data.bookings.iter().find(|b| b.status == BookingStatus::Confirmed).unwrap().clone();
        store.data.write().await.cars.iter_mut().find(|c| c.id == confirmed.car_id).unwrap().status =
            CarStatus::Maintenance;

        let err = store
            .update_booking_status(&session, confirmed.id, BookingStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.get_booking(&session, confirmed.id).await.unwrap().status, BookingStatus::Confirmed);
        assert_eq!(store.get_car(&session, confirmed.car_id).await.unwrap().status, CarStatus::Maintenance);
    }

    #[tokio::test]
    async fn deleting_active_booking_releases_car() {
        let store = store();
        let session = session_as(&store, Role::SuperAdmin).await;
        let active = store
            .snapshot()
            .await
            .bookings
            .into_iter()
            .find(|b| b.status == BookingStatus::Active)
            .unwrap();

        store.delete_booking(&session, active.id).await.unwrap();
        assert_eq!(store.get_car(&session, active.car_id).await.unwrap().status, CarStatus::Available);
    }

    #[tokio::test]
    async fn total_out_of_range_is_a_validation_error() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let data = store.snapshot().await;
        let car = data.cars.iter().find(|c| c.status == CarStatus::Available).unwrap();
        let customer = data.customers.iter().find(|c| c.status == CustomerStatus::Active).unwrap();
        store.data.write().await.cars.iter_mut().find(|c| c.id == car.id).unwrap().daily_rate = i64::MAX / 2;

        let err = store.create_booking(&session, request(car.id, customer.id, 3)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.snapshot().await.bookings.len(), data.bookings.len());
    }

    #[tokio::test]
    async fn transitions_are_not_policed() {
        let store = store();
        let session = session_as(&store, Role::SuperAdmin).await;
        let data = store.snapshot().await;
        let completed = data.bookings.iter().find(|b| b.status == BookingStatus::Completed).unwrap().id;

        let booking = store
            .update_booking_status(&session, completed, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn refund_only_paid_bookings() {
        let store = store();
        let session = session_as(&store, Role::Accountant).await;
        let data = store.snapshot().await;
        let paid = data.bookings.iter().find(|b| b.payment_status == PaymentStatus::Paid).unwrap().id;
        let pending = data.bookings.iter().find(|b| b.payment_status == PaymentStatus::Pending).unwrap().id;

        let refunded = store.refund_booking(&session, paid).await.unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

        assert!(matches!(store.refund_booking(&session, paid).await, Err(AppError::Conflict(_))));
        assert!(matches!(store.refund_booking(&session, pending).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn agent_cannot_refund_or_delete() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let id = store.snapshot().await.bookings[0].id;

        assert!(matches!(store.refund_booking(&session, id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(store.delete_booking(&session, id).await, Err(AppError::Forbidden(_))));
        assert_eq!(store.snapshot().await.bookings.len(), 6);
    }

    #[tokio::test]
    async fn record_payment_then_filter() {
        let store = store();
        let session = session_as(&store, Role::BookingAgent).await;
        let data = store.snapshot().await;
        let pending = data
            .bookings
            .iter()
            .find(|b| b.payment_status == PaymentStatus::Pending && b.status == BookingStatus::Confirmed)
            .unwrap()
            .clone();

        let paid = store.record_payment(&session, pending.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        let for_customer = store
            .list_bookings(&session, &BookingFilter { customer_id: Some(pending.customer_id), ..Default::default() })
            .await
            .unwrap();
        assert!(for_customer.iter().all(|b| b.customer_id == pending.customer_id));
        assert!(for_customer.iter().any(|b| b.id == pending.id));
    }
}
