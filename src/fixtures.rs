//! Synthetic seed data loaded into the store at start-up.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::car::{Car, CarCategory, CarStatus};
use crate::models::customer::{Customer, CustomerStatus};
use crate::models::employee::{Employee, EmployeeStatus};
use crate::models::rbac::Role;
use crate::store::Collections;
use crate::utils::{rental_days, utc_now};

pub const SUPER_ADMIN_EMAIL: &str = "admin@rentals.example";
pub const MANAGER_EMAIL: &str = "manager@rentals.example";
pub const AGENT_EMAIL: &str = "agent@rentals.example";
pub const SUPPORT_EMAIL: &str = "support@rentals.example";
pub const MAINTENANCE_EMAIL: &str = "maintenance@rentals.example";
pub const ACCOUNTANT_EMAIL: &str = "accounts@rentals.example";
pub const INACTIVE_EMAIL: &str = "former@rentals.example";

fn employee(name: &str, email: &str, department: &str, role: Role, status: EmployeeStatus) -> Employee {
    let now = utc_now();
    Employee {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        department: department.to_string(),
        role,
        status,
        password_changed: status == EmployeeStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

#[allow(clippy::too_many_arguments)]
fn car(
    make: &str,
    model: &str,
    year: i32,
    plate: &str,
    category: CarCategory,
    status: CarStatus,
    daily_rate: i64,
    mileage: u32,
    location: &str,
) -> Car {
    let now = utc_now();
    Car {
        id: Uuid::new_v4(),
        make: make.to_string(),
        model: model.to_string(),
        year,
        plate: plate.to_string(),
        category,
        status,
        daily_rate,
        mileage,
        location: location.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn customer(name: &str, email: &str, phone: &str, license: &str, status: CustomerStatus) -> Customer {
    let now = utc_now();
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        license_number: license.to_string(),
        status,
        created_at: now,
        updated_at: now,
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn booking(
    car: &Car,
    customer: &Customer,
    start: NaiveDate,
    end: NaiveDate,
    status: BookingStatus,
    payment_status: PaymentStatus,
) -> Booking {
    let now = utc_now();
    Booking {
        id: Uuid::new_v4(),
        car_id: car.id,
        customer_id: customer.id,
        start_date: start,
        end_date: end,
        status,
        payment_status,
        total: car.daily_rate.saturating_mul(rental_days(start, end)),
        created_at: now,
        updated_at: now,
    }
}

pub fn seed() -> Collections {
    let employees = vec![
        employee("Dana Whitfield", SUPER_ADMIN_EMAIL, "Administration", Role::SuperAdmin, EmployeeStatus::Active),
        employee("Sam Okafor", MANAGER_EMAIL, "Operations", Role::BranchManager, EmployeeStatus::Active),
        employee("Priya Nair", AGENT_EMAIL, "Sales", Role::BookingAgent, EmployeeStatus::Active),
        employee("Luis Romero", SUPPORT_EMAIL, "Customer Care", Role::CustomerService, EmployeeStatus::Active),
        employee("Jo Becker", MAINTENANCE_EMAIL, "Workshop", Role::MaintenanceStaff, EmployeeStatus::Active),
        employee("Mei Tanaka", ACCOUNTANT_EMAIL, "Finance", Role::Accountant, EmployeeStatus::Active),
        employee("Chris Hale", INACTIVE_EMAIL, "Sales", Role::BookingAgent, EmployeeStatus::Inactive),
    ];

    let cars = vec![
        car("Toyota", "Corolla", 2022, "RNT-1001", CarCategory::Economy, CarStatus::Available, 4_500, 32_150, "Downtown"),
        car("Honda", "Civic", 2021, "RNT-1002", CarCategory::Compact, CarStatus::Rented, 5_200, 41_800, "Airport"),
        car("Ford", "Explorer", 2023, "RNT-1003", CarCategory::Suv, CarStatus::Available, 8_900, 12_400, "Airport"),
        car("BMW", "5 Series", 2023, "RNT-1004", CarCategory::Luxury, CarStatus::Maintenance, 15_000, 9_870, "Downtown"),
        car("Mercedes", "Sprinter", 2020, "RNT-1005", CarCategory::Van, CarStatus::Available, 11_000, 78_300, "Harbor"),
        car("Nissan", "Versa", 2016, "RNT-0999", CarCategory::Economy, CarStatus::Retired, 3_000, 151_020, "Harbor"),
    ];

    let customers = vec![
        customer("Alice Moreau", "alice@mail.example", "+1-555-0101", "D1234567", CustomerStatus::Active),
        customer("Ben Carter", "ben@mail.example", "+1-555-0102", "D2345678", CustomerStatus::Active),
        customer("Chloe Ng", "chloe@mail.example", "+1-555-0103", "D3456789", CustomerStatus::Active),
        customer("Dmitri Volkov", "dmitri@mail.example", "+1-555-0104", "D4567890", CustomerStatus::Blocked),
    ];

    let bookings = vec![
        booking(&cars[0], &customers[0], date(2024, 1, 5), date(2024, 1, 8), BookingStatus::Completed, PaymentStatus::Paid),
        booking(&cars[2], &customers[1], date(2024, 1, 20), date(2024, 1, 22), BookingStatus::Completed, PaymentStatus::Paid),
        booking(&cars[3], &customers[2], date(2024, 2, 2), date(2024, 2, 4), BookingStatus::Completed, PaymentStatus::Refunded),
        booking(&cars[1], &customers[0], date(2024, 2, 10), date(2024, 2, 16), BookingStatus::Active, PaymentStatus::Paid),
        booking(&cars[4], &customers[2], date(2024, 3, 1), date(2024, 3, 3), BookingStatus::Confirmed, PaymentStatus::Pending),
        booking(&cars[0], &customers[1], date(2024, 3, 12), date(2024, 3, 12), BookingStatus::Cancelled, PaymentStatus::Pending),
    ];

    Collections {
        cars,
        bookings,
        customers,
        employees,
    }
}
