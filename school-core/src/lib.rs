pub mod auth;
pub mod common;
pub mod config;
pub mod domain;
pub mod graphql;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod seed;
pub mod storage;

#[cfg(feature = "db")]
pub mod database;

pub use common::{Result, SchoolError};
pub use domain::*;

// Re-export database manager when db feature is enabled
#[cfg(feature = "db")]
pub use database::DatabaseManager;
