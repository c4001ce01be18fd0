//! # Polydao Config
//!
//! Storage configuration for Polydao: the driver key and credentials a
//! backend is started from, pool tuning, logging, and a layered loader over
//! files and environment variables.

mod app_config;
mod driver;
mod loader;
mod validation;

pub use app_config::*;
pub use driver::*;
pub use loader::*;
pub use validation::*;
