pub mod connection;
pub mod leads;
pub mod notifications;
pub mod sentinel_runs;
pub mod store;

pub use connection::{init_db, Database};
pub use store::SqliteStore;
