//! Durable keyed storage and time-boxed collections for the pharmacy client.
//!
//! Two kinds of state live here:
//!
//! - **Durable**: [`Cache`] over a [`KvStore`] backend (a directory of JSON
//!   files, or memory) and typed [`Record`]s on top of it. The
//!   cart is persisted this way so it survives restarts.
//! - **Volatile**: [`TimedCollection`], a single wholesale entry with a TTL,
//!   optimistic mutation with rollback, and version-checked fetch
//!   completion. The back-office dashboard keeps one per collection.
//!
//! # Example
//!
//! ```rust,ignore
//! use pharma_cache::{Cache, Record, SystemClock};
//! use std::sync::Arc;
//!
//! let cache = Cache::open("/var/lib/pharma/cart")?;
//! let record = Record::<Vec<String>>::new(cache, "cart:guest", Arc::new(SystemClock));
//! let mut ids = record.get_or_default()?;
//! ids.push("42".into());
//! record.save(&ids)?;
//! ```

mod clock;
mod collection;
mod error;
mod kv;
mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{FetchTicket, Snapshot, TimedCollection, DEFAULT_TTL};
pub use error::CacheError;
pub use kv::{Cache, FileStore, KvStore, MemoryStore};
pub use record::{Record, Stored};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, Clock, Record, Snapshot, TimedCollection};
}
