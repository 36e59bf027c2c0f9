//! Analytics and revenue reporting over the in-memory collections.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{Collections, FleetStore};
use crate::authz::capabilities::{ANALYTICS_VIEW, REPORTS_EXPORT, REPORTS_VIEW};
use crate::authz::Session;
use crate::errors::{AppError, AppResult};
use crate::models::booking::{BookingStatus, PaymentStatus};
use crate::models::car::{CarCategory, CarStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStats {
    pub total_cars: usize,
    pub by_status: BTreeMap<CarStatus, usize>,
    /// Rented cars over cars still in service (not retired).
    pub utilization_rate: f64,
    pub open_bookings: usize,
}

/// Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSummary {
    pub total_revenue: i64,
    pub refunded: i64,
    pub outstanding: i64,
    pub by_month: BTreeMap<String, i64>,
    pub by_category: BTreeMap<CarCategory, i64>,
    pub bookings_by_status: BTreeMap<BookingStatus, usize>,
}

pub fn compute_fleet_stats(data: &Collections) -> FleetStats {
    let mut by_status = BTreeMap::new();
    for car in &data.cars {
        *by_status.entry(car.status).or_insert(0) += 1;
    }

    let in_service = data.cars.len() - by_status.get(&CarStatus::Retired).copied().unwrap_or(0);
    let rented = by_status.get(&CarStatus::Rented).copied().unwrap_or(0);
    let utilization_rate = if in_service == 0 {
        0.0
    } else {
        rented as f64 / in_service as f64
    };

    let open_bookings = data
        .bookings
        .iter()
        .filter(|b| matches!(b.status, BookingStatus::Confirmed | BookingStatus::Active))
        .count();

    FleetStats {
        total_cars: data.cars.len(),
        by_status,
        utilization_rate,
        open_bookings,
    }
}

/// Sums saturate at `i64::MAX` instead of wrapping.
fn add_cents(total: &mut i64, amount: i64) {
    *total = total.saturating_add(amount);
}

/// Revenue counts paid bookings only; refunded ones move to `refunded`,
/// pending ones that are not cancelled to `outstanding`.
pub fn compute_revenue(data: &Collections) -> RevenueSummary {
    let categories: HashMap<_, _> = data.cars.iter().map(|car| (car.id, car.category)).collect();

    let mut summary = RevenueSummary {
        total_revenue: 0,
        refunded: 0,
        outstanding: 0,
        by_month: BTreeMap::new(),
        by_category: BTreeMap::new(),
        bookings_by_status: BTreeMap::new(),
    };

    for booking in &data.bookings {
        *summary.bookings_by_status.entry(booking.status).or_insert(0) += 1;

        match booking.payment_status {
            PaymentStatus::Paid => {
                add_cents(&mut summary.total_revenue, booking.total);
                let month = booking.start_date.format("%Y-%m").to_string();
                add_cents(summary.by_month.entry(month).or_insert(0), booking.total);
                // bookings whose car was since removed still count towards the total
                if let Some(category) = categories.get(&booking.car_id) {
                    add_cents(summary.by_category.entry(*category).or_insert(0), booking.total);
                }
            }
            PaymentStatus::Refunded => add_cents(&mut summary.refunded, booking.total),
            PaymentStatus::Pending if booking.status != BookingStatus::Cancelled => {
                add_cents(&mut summary.outstanding, booking.total)
            }
            PaymentStatus::Pending => {}
        }
    }

    summary
}

impl FleetStore {
    pub async fn fleet_stats(&self, session: &Session) -> AppResult<FleetStats> {
        self.gate(session, ANALYTICS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(compute_fleet_stats(&data))
    }

    pub async fn revenue_summary(&self, session: &Session) -> AppResult<RevenueSummary> {
        self.gate(session, REPORTS_VIEW)?;
        self.simulate_latency().await;

        let data = self.data.read().await;
        Ok(compute_revenue(&data))
    }

    /// Revenue summary rendered as pretty JSON for download.
    pub async fn export_revenue_report(&self, session: &Session) -> AppResult<String> {
        self.gate(session, REPORTS_EXPORT)?;
        self.simulate_latency().await;

        let summary = {
            let data = self.data.read().await;
            compute_revenue(&data)
        };
        serde_json::to_string_pretty(&summary)
            .map_err(|err| AppError::internal(format!("failed to render report: {err}")))
    }
}
