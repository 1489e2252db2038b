//! Rate My Next Engine - Analysis pipeline and result storage
//!
//! Wires the repository analysis steps from `ratemynext-repo` to a durable result store
//! behind process-local caches.

pub mod analyzer;
pub mod cache;
pub mod store;

pub use analyzer::Engine;
pub use cache::{MemoCache, TtlCache};
pub use store::{open_backend, MemoryKeyValueStore, ResultStore, LEADERBOARD_KEY};

#[cfg(feature = "sqlite")]
pub use store::SqliteKeyValueStore;
