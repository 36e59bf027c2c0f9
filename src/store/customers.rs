use uuid::Uuid;

use super::FleetStore;
use crate::authz::capabilities::{CUSTOMERS_CREATE, CUSTOMERS_DELETE, CUSTOMERS_EDIT, CUSTOMERS_VIEW};
use crate::authz::Session;
use crate::errors::{AppError, AppResult};
use crate::models::booking::BookingStatus;
use crate::models::customer::{Customer, CustomerCreateRequest, CustomerStatus, CustomerUpdateRequest};
use crate::utils::{matches_search, normalize_email, utc_now};

impl FleetStore {
    /// Lists customers, optionally narrowed by a free-text match on name or email.
    pub async fn list_customers(&self, session: &Session, search: Option<&str>) -> AppResult<Vec<Customer>> {
        self.gate(session, CUSTOMERS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(data
            .customers
            .iter()
            .filter(|customer| {
                search.map_or(true, |needle| {
                    matches_search(needle, &[customer.name.as_str(), customer.email.as_str()])
                })
            })
            .cloned()
            .collect())
    }

    pub async fn get_customer(&self, session: &Session, customer_id: Uuid) -> AppResult<Customer> {
        self.gate(session, CUSTOMERS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        data.customers
            .iter()
            .find(|customer| customer.id == customer_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("customer not found"))
    }

    pub async fn create_customer(&self, session: &Session, payload: CustomerCreateRequest) -> AppResult<Customer> {
        let actor_id = self.gate(session, CUSTOMERS_CREATE)?;
        payload.validate()?;
        self.simulate_latency().await;

        let email = normalize_email(&payload.email);
        let mut data = self.data.write().await;
        if data.customers.iter().any(|c| normalize_email(&c.email) == email) {
            return Err(AppError::conflict("email already in use"));
        }

        let now = utc_now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            email,
            phone: payload.phone.trim().to_string(),
            license_number: payload.license_number.trim().to_string(),
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        };
        data.customers.push(customer.clone());

        tracing::info!(customer_id = %customer.id, "customer created");
        self.record("created", actor_id, &customer, None).await;
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        session: &Session,
        customer_id: Uuid,
        payload: CustomerUpdateRequest,
    ) -> AppResult<Customer> {
        let actor_id = self.gate(session, CUSTOMERS_EDIT)?;
        payload.validate()?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let new_email = payload.email.as_deref().map(normalize_email);
        if let Some(email) = &new_email {
            if data
                .customers
                .iter()
                .any(|c| c.id != customer_id && normalize_email(&c.email) == *email)
            {
                return Err(AppError::conflict("email already in use"));
            }
        }

        let customer = data
            .customers
            .iter_mut()
            .find(|customer| customer.id == customer_id)
            .ok_or_else(|| AppError::not_found("customer not found"))?;
        let old = customer.clone();

        if let Some(name) = payload.name {
            customer.name = name.trim().to_string();
        }
        if let Some(email) = new_email {
            customer.email = email;
        }
        if let Some(phone) = payload.phone {
            customer.phone = phone.trim().to_string();
        }
        if let Some(license) = payload.license_number {
            customer.license_number = license.trim().to_string();
        }
        if let Some(status) = payload.status {
            customer.status = status;
        }
        customer.updated_at = utc_now();
        let updated = customer.clone();

        tracing::info!(customer_id = %updated.id, "customer updated");
        self.record("updated", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    /// Removes a customer unless a confirmed or active booking is still theirs.
    pub async fn delete_customer(&self, session: &Session, customer_id: Uuid) -> AppResult<()> {
        let actor_id = self.gate(session, CUSTOMERS_DELETE)?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let index = data
            .customers
            .iter()
            .position(|customer| customer.id == customer_id)
            .ok_or_else(|| AppError::not_found("customer not found"))?;

        let has_open_booking = data.bookings.iter().any(|booking| {
            booking.customer_id == customer_id
                && matches!(booking.status, BookingStatus::Confirmed | BookingStatus::Active)
        });
        if has_open_booking {
            return Err(AppError::conflict("customer has open bookings"));
        }

        let customer = data.customers.remove(index);
        tracing::info!(customer_id = %customer.id, "customer deleted");
        self.record("deleted", actor_id, &customer, None).await;
        Ok(())
    }
}
