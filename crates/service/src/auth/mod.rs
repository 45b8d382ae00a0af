//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and token checks for shop accounts live here; the
//! web layer only moves the token in and out of a cookie.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService, Claims};
