//! # SnapQueue Store
//!
//! Durable queue store for photos waiting to be uploaded.
//!
//! ## Features
//!
//! - Store-assigned, monotonically increasing insertion keys
//! - Ordered full read and removal of the oldest entry
//! - SQLite, file-per-entry and in-memory backends

pub mod error;
pub mod file;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use file::FileQueueStore;
pub use sqlite::SqliteQueueStore;
pub use store::{MemoryQueueStore, QueueStore, open_store};
