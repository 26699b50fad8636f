pub mod in_memory;
pub mod traits;

#[cfg(feature = "db")]
pub mod database;

pub use in_memory::InMemoryStorage;
pub use traits::Storage;

#[cfg(feature = "db")]
pub use database::DatabaseStorage;

use crate::common::error::Result;
use crate::config::ServiceConfig;
use std::sync::Arc;
use tracing::info;

/// Open the storage backend a service runs on.
///
/// With `in_memory` set, or when the crate is built without the `db`
/// feature, data lives only as long as the process.
pub async fn open_storage(config: &ServiceConfig, in_memory: bool) -> Result<Arc<dyn Storage>> {
    #[cfg(feature = "db")]
    if !in_memory {
        let storage = DatabaseStorage::open(&config.database_path).await?;
        return Ok(Arc::new(storage));
    }

    #[cfg(not(feature = "db"))]
    let _ = (config, in_memory);

    info!("Using in-memory storage");
    Ok(Arc::new(InMemoryStorage::new()))
}
