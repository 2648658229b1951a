//! Typed document storage on top of a `KVStore`.
//!
//! A model implements `KvStore` to declare its key prefix, key value and
//! hooks. `KvOps<T>` provides the CRUD operations.
//!
//! ```ignore
//! impl KvStore for User {
//!     const KIND: &'static str = "user";
//!     fn kv_prefix() -> &'static str { "aidiy:user:" }
//!     fn key_value(&self) -> String { self.email.clone() }
//! }
//! ```

pub mod kv;

pub use kv::{KvOps, KvStore};
