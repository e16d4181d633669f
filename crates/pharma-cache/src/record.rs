//! Versioned records persisted in the key-value store.

use crate::{Cache, CacheError, Clock};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

/// Record data as it sits in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stored<T> {
    /// User-defined data.
    pub data: T,
    /// Number of writes so far.
    pub version: u64,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

/// A single typed value living under one key.
///
/// # Example
///
/// ```rust,ignore
/// let record = Record::<Vec<CartLine>>::new(cache, "cart:guest", clock);
/// let lines = record.get_or_default()?;
/// record.save(&lines)?;
/// ```
pub struct Record<T> {
    cache: Cache,
    key: String,
    clock: Arc<dyn Clock>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> std::fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record").field("key", &self.key).finish()
    }
}

impl<T> Record<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(cache: Cache, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            key: key.into(),
            clock,
            _phantom: std::marker::PhantomData,
        }
    }

    /// The key this record is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get full record data including its write count.
    pub fn load(&self) -> Result<Option<Stored<T>>, CacheError> {
        self.cache.get::<Stored<T>>(&self.key)
    }

    /// Get the data, or `T::default()` when nothing is stored yet.
    pub fn get_or_default(&self) -> Result<T, CacheError> {
        Ok(self.load()?.map(|s| s.data).unwrap_or_default())
    }

    /// Unconditional write. Returns the new version.
    pub fn save(&self, data: &T) -> Result<u64, CacheError> {
        let version = self.load_version()? + 1;
        self.write(data, version)?;
        Ok(version)
    }

    /// Remove the record entirely.
    pub fn delete(&self) -> Result<(), CacheError> {
        self.cache.delete(&self.key)
    }

    fn load_version(&self) -> Result<u64, CacheError> {
        Ok(self.load()?.map(|s| s.version).unwrap_or(0))
    }

    fn write(&self, data: &T, version: u64) -> Result<(), CacheError> {
        let stored = Stored {
            data: data.clone(),
            version,
            updated_at: self.clock.now(),
        };
        self.cache.set(&self.key, &stored)
    }
}
