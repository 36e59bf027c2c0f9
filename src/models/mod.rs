pub mod booking;
pub mod car;
pub mod customer;
pub mod employee;
pub mod rbac;
