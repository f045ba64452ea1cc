use std::fmt::Debug;
use std::ops::RangeBounds;

use crate::error::PersistenceError;

pub mod rocks_kv;

/// One transaction scope over the physical key/value store. Record
/// operations are written against this trait so they stay independent of
/// the backing engine; the engine decides whether the scope is a
/// snapshot read or a write transaction.
pub trait KVStore<'a> {
  type Range: Iterator<Item = Self::Entry>;
  type Entry: KVEntry;
  type Value: AsRef<[u8]>;
  type Error: Into<PersistenceError> + Debug;

  /// Get a value by key
  fn get<K: AsRef<[u8]>>(&self, key: K) -> Result<Option<Self::Value>, Self::Error>;

  fn insert<K: AsRef<[u8]>, V: AsRef<[u8]>>(&self, key: K, value: V) -> Result<(), Self::Error>;

  fn remove(&self, key: &[u8]) -> Result<(), Self::Error>;

  /// Return an iterator over the range of keys.
  /// The upper bound itself is not included on the iteration result.
  fn range<K: AsRef<[u8]>, R: RangeBounds<K>>(&self, range: R) -> Result<Self::Range, Self::Error>;
}

/// A key-value entry
pub trait KVEntry {
  fn key(&self) -> &[u8];
  fn value(&self) -> &[u8];
}
