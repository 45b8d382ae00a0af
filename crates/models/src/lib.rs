pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod user_profile;
pub mod car_model;
pub mod car;
pub mod service;
pub mod order;
pub mod order_entry;
pub mod order_review;
pub mod pricing;
