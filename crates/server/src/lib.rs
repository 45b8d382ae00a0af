pub mod routes;
pub mod startup;
pub mod errors;
pub mod state;
pub mod auth;
pub mod session;
pub mod render;

pub use startup::run;
pub use state::ServerState;
