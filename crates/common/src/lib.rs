//! Cross-cutting helpers shared by the binaries and the HTTP crate.

pub mod types;
pub mod utils;
pub mod env;
