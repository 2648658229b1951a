use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::KVError;
use crate::traits::KVStore;

/// MemoryStore keeps every entry in a process-local ordered map.
///
/// Nothing is persisted; a restart starts empty. Used for development
/// servers and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> KVError {
    KVError::Poisoned(e.to_string())
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut results = Vec::new();
        for (key, value) in entries.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.clone(), value.clone()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);

        store.set("a", b"2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"2".to_vec()));

        store.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn scan_is_sorted_and_prefix_bounded() {
        let store = MemoryStore::new();
        store.set("aidiy:otp:verify:b", b"b").unwrap();
        store.set("aidiy:otp:verify:a", b"a").unwrap();
        store.set("aidiy:otp:reset:a", b"r").unwrap();
        store.set("aidiy:user:a", b"u").unwrap();

        let rows = store.scan("aidiy:otp:verify:").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "aidiy:otp:verify:a");
        assert_eq!(rows[1].0, "aidiy:otp:verify:b");

        assert_eq!(store.scan("aidiy:otp:").unwrap().len(), 3);
    }

    #[test]
    fn batch_delete_ignores_missing_keys() {
        let store = MemoryStore::new();
        store.set("x", b"1").unwrap();
        store.batch_delete(&["x", "never-set"]).unwrap();
        assert!(store.is_empty());
    }
}
