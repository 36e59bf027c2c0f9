use uuid::Uuid;

use super::FleetStore;
use crate::authz::capabilities::{CARS_CREATE, CARS_DELETE, CARS_EDIT, CARS_VIEW};
use crate::authz::Session;
use crate::errors::{AppError, AppResult};
use crate::models::booking::BookingStatus;
use crate::models::car::{Car, CarCreateRequest, CarFilter, CarStatus, CarUpdateRequest};
use crate::utils::utc_now;

fn same_plate(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl FleetStore {
    pub async fn list_cars(&self, session: &Session, filter: &CarFilter) -> AppResult<Vec<Car>> {
        self.gate(session, CARS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(data.cars.iter().filter(|car| filter.matches(car)).cloned().collect())
    }

    pub async fn get_car(&self, session: &Session, car_id: Uuid) -> AppResult<Car> {
        self.gate(session, CARS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        data.cars
            .iter()
            .find(|car| car.id == car_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("car not found"))
    }

    pub async fn create_car(&self, session: &Session, payload: CarCreateRequest) -> AppResult<Car> {
        let actor_id = self.gate(session, CARS_CREATE)?;
        payload.validate()?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        if data.cars.iter().any(|car| same_plate(&car.plate, &payload.plate)) {
            return Err(AppError::conflict("plate already registered"));
        }

        let now = utc_now();
        let car = Car {
            id: Uuid::new_v4(),
            make: payload.make.trim().to_string(),
            model: payload.model.trim().to_string(),
            year: payload.year,
            plate: payload.plate.trim().to_uppercase(),
            category: payload.category,
            status: CarStatus::Available,
            daily_rate: payload.daily_rate,
            mileage: payload.mileage,
            location: payload.location.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        data.cars.push(car.clone());

        tracing::info!(car_id = %car.id, plate = %car.plate, "car created");
        self.record("created", actor_id, &car, None).await;
        Ok(car)
    }

    pub async fn update_car(&self, session: &Session, car_id: Uuid, payload: CarUpdateRequest) -> AppResult<Car> {
        let actor_id = self.gate(session, CARS_EDIT)?;
        payload.validate()?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        if let Some(plate) = &payload.plate {
            if data
                .cars
                .iter()
                .any(|car| car.id != car_id && same_plate(&car.plate, plate))
            {
                return Err(AppError::conflict("plate already registered"));
            }
        }

        let car = data
            .cars
            .iter_mut()
            .find(|car| car.id == car_id)
            .ok_or_else(|| AppError::not_found("car not found"))?;
        let old = car.clone();

        if let Some(make) = payload.make {
            car.make = make.trim().to_string();
        }
        if let Some(model) = payload.model {
            car.model = model.trim().to_string();
        }
        if let Some(year) = payload.year {
            car.year = year;
        }
        if let Some(plate) = payload.plate {
            car.plate = plate.trim().to_uppercase();
        }
        if let Some(category) = payload.category {
            car.category = category;
        }
        if let Some(status) = payload.status {
            car.status = status;
        }
        if let Some(rate) = payload.daily_rate {
            car.daily_rate = rate;
        }
        if let Some(mileage) = payload.mileage {
            car.mileage = mileage;
        }
        if let Some(location) = payload.location {
            car.location = location.trim().to_string();
        }
        car.updated_at = utc_now();
        let updated = car.clone();

        tracing::info!(car_id = %updated.id, status = updated.status.as_str(), "car updated");
        self.record("updated", actor_id, &updated, Some(&old)).await;
        Ok(updated)
    }

    /// Removes a car unless a confirmed or active booking still points at it.
    pub async fn delete_car(&self, session: &Session, car_id: Uuid) -> AppResult<()> {
        let actor_id = self.gate(session, CARS_DELETE)?;
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        let index = data
            .cars
            .iter()
            .position(|car| car.id == car_id)
            .ok_or_else(|| AppError::not_found("car not found"))?;

        let has_open_booking = data.bookings.iter().any(|booking| {
            booking.car_id == car_id
                && matches!(booking.status, BookingStatus::Confirmed | BookingStatus::Active)
        });
        if has_open_booking {
            return Err(AppError::conflict("car has open bookings"));
        }

        let car = data.cars.remove(index);
        tracing::info!(car_id = %car.id, plate = %car.plate, "car deleted");
        self.record("deleted", actor_id, &car, None).await;
        Ok(())
    }
}
