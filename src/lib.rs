//! Employee roster and daily attendance service.
//!
//! Bearer tokens are minted by [`auth::TokenService`], checked by
//! [`auth::middleware::auth_middleware`], and role checks go through
//! [`auth::RoleGuard`]. Records live in a [`store::Store`] and are only
//! touched through [`service::EmployeeDirectory`] and
//! [`service::AttendanceLedger`], which keep email and (email, date) unique.

pub mod api;
pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
