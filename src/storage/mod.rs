pub mod cached;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use cached::CachedLinkStore;
pub use postgres::PostgresLinkStore;
pub use sqlite::SqliteLinkStore;
pub use trait_def::{LinkStore, StoreError, StoreResult};
