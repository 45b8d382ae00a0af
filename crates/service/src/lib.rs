//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod search;
pub mod policy;
pub mod session;
pub mod user_service;
pub mod car_service;
pub mod order_service;
pub mod review_service;
pub mod catalog_service;
pub mod dashboard;
pub mod profile_service;
#[cfg(test)]
pub mod test_support;
