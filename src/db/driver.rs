use std::path::Path;

use bincode::{
    config::{BigEndian, WithOtherEndian},
    DefaultOptions, Options,
};
use serde::{de::DeserializeOwned, Serialize};
use sled::Db as Sled;

use crate::error::StoreResult;

/// Typed key-value driver: sled for storage, big-endian bincode for values.
#[derive(Clone)]
pub struct Db {
    handle: Sled,
    encoder: WithOtherEndian<DefaultOptions, BigEndian>,
}
impl Db {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let handle = sled::open(path)?;
        Ok(Self::with_handle(handle))
    }
    // Lives in memory and is removed once the last handle drops.
    pub fn temporary() -> StoreResult<Self> {
        let handle = sled::Config::new().temporary(true).open()?;
        Ok(Self::with_handle(handle))
    }
    fn with_handle(handle: Sled) -> Self {
        let encoder = bincode::options().with_big_endian();
        Self { handle, encoder }
    }

    // CRUD
    pub fn next_id(&self) -> StoreResult<u64> {
        let id = self.handle.generate_id()?;
        Ok(id)
    }
    pub fn insert<T: Serialize, K: AsRef<str>>(&self, key: K, value: &T) -> StoreResult<()> {
        let key = key.as_ref();
        let value = self.encoder.serialize(value)?;
        self.handle.insert(key, value)?;
        Ok(())
    }
    pub fn get<T: DeserializeOwned, K: AsRef<str>>(&self, key: K) -> StoreResult<Option<T>> {
        let key = key.as_ref();
        let value = match self.handle.get(key)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let value = self.encoder.deserialize(&value)?;
        Ok(Some(value))
    }
    pub fn remove<K: AsRef<str>>(&self, key: K) -> StoreResult<bool> {
        let key = key.as_ref();
        let removed = self.handle.remove(key)?;
        Ok(removed.is_some())
    }
    pub fn flush(&self) -> StoreResult<()> {
        self.handle.flush()?;
        Ok(())
    }

    // Iterators
    pub fn iter_prefix<'a, T: DeserializeOwned + 'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = StoreResult<T>> + 'a {
        self.handle.scan_prefix(prefix).map(move |item| -> StoreResult<T> {
            let (_, value) = item?;
            let value = self.encoder.deserialize(&value)?;
            Ok(value)
        })
    }
}

// Required Debug implementation for `Db`
impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish()
    }
}
