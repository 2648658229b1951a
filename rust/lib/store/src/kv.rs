//! KvStore trait + KvOps CRUD operations.
//!
//! The model impls `KvStore` to declare its key + hooks.
//! `KvOps<T>` provides the actual get/save/list/delete using a KVStore backend.

use std::marker::PhantomData;
use std::sync::Arc;

use aidiy_core::ServiceError;
use aidiy_kv::{KVError, KVStore};
use serde::{de::DeserializeOwned, Serialize};

/// Trait implemented by models to declare KV storage behavior.
///
/// Hooks have default no-op impls.
pub trait KvStore: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable resource name, used in error messages ("user", "child").
    const KIND: &'static str;

    /// KV key prefix: "{app}:{resource}:".
    fn kv_prefix() -> &'static str;

    /// Key suffix for this instance. May itself contain `:` separators
    /// for nested keys (e.g. `{parent}:{code}`).
    fn key_value(&self) -> String;

    /// Called before inserting a new record. Use for auto-fill (ids, timestamps).
    fn before_create(&mut self) {}

    /// Called before updating an existing record.
    fn before_update(&mut self) {}
}

/// CRUD operations for a KvStore model. Holds a reference to the KV backend.
pub struct KvOps<T: KvStore> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: KvStore> Clone for KvOps<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.kv))
    }
}

impl<T: KvStore> KvOps<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<T, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::KIND, e)))
    }

    fn encode(record: &T) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(record)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::KIND, e)))
    }

    /// Get a record by key value. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        let key = Self::make_key(id);
        match self.kv.get(&key).map_err(Self::kv_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound error.
    pub fn get_or_err(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::KIND, id)))
    }

    /// List all records of this model, in key order.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        self.list_under("")
    }

    /// List records whose key suffix starts with `sub_prefix`.
    ///
    /// For a child keyed `{parent}:{code}`, `list_under("{parent}:")`
    /// returns that parent's children.
    pub fn list_under(&self, sub_prefix: &str) -> Result<Vec<T>, ServiceError> {
        let entries = self
            .kv
            .scan(&Self::make_key(sub_prefix))
            .map_err(Self::kv_err)?;
        let mut records = Vec::with_capacity(entries.len());
        for (_key, bytes) in entries {
            records.push(Self::decode(&bytes)?);
        }
        Ok(records)
    }

    /// First record matching a predicate (full scan).
    pub fn find<F>(&self, pred: F) -> Result<Option<T>, ServiceError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list()?.into_iter().find(|r| pred(r)))
    }

    /// Count all records of this model.
    pub fn count(&self) -> Result<usize, ServiceError> {
        let entries = self.kv.scan(T::kv_prefix()).map_err(Self::kv_err)?;
        Ok(entries.len())
    }

    /// Create a new record. Calls before_create hook, checks for duplicates.
    pub fn save_new(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create();

        let id = record.key_value();
        let key = Self::make_key(&id);

        if self.kv.get(&key).map_err(Self::kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' already exists",
                T::KIND,
                id
            )));
        }

        self.kv
            .set(&key, &Self::encode(&record)?)
            .map_err(Self::kv_err)?;
        Ok(record)
    }

    /// Write a record, creating or replacing it. Calls before_update hook.
    pub fn save(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_update();

        let key = Self::make_key(&record.key_value());
        self.kv
            .set(&key, &Self::encode(&record)?)
            .map_err(Self::kv_err)?;
        Ok(record)
    }

    /// Delete a record by key value.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.get_or_err(id)?;
        self.kv.delete(&Self::make_key(id)).map_err(Self::kv_err)
    }

    /// Delete every record matching a predicate. Returns how many were removed.
    pub fn delete_where<F>(&self, pred: F) -> Result<usize, ServiceError>
    where
        F: Fn(&T) -> bool,
    {
        let keys: Vec<String> = self
            .list()?
            .iter()
            .filter(|r| pred(r))
            .map(|r| Self::make_key(&r.key_value()))
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.kv.batch_delete(&refs).map_err(Self::kv_err)?;
        tracing::debug!("deleted {} {} records", keys.len(), T::KIND);
        Ok(keys.len())
    }
}
