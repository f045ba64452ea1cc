use std::ops;
use std::ops::RangeBounds;
use std::path::Path;
use std::sync::Arc;

use rocksdb::Direction::Forward;
use rocksdb::{
  DBIteratorWithThreadMode, ErrorKind, IteratorMode, Options, ReadOptions, SingleThreaded,
  Transaction, TransactionDB, TransactionDBOptions, TransactionOptions, WriteOptions,
};

use crate::kv::{KVEntry, KVStore};
use crate::PersistenceError;

/// Shared handle to the physical store. Cheap to clone; every record
/// operation acquires its own transaction scope from it and releases
/// the scope on completion, so no scope is ever held across operations.
#[derive(Clone)]
pub struct RocksStore {
  db: Arc<TransactionDB>,
}

impl RocksStore {
  /// Open the database at the given path. With `auto_repair` set, a
  /// corrupted database is repaired and reopened instead of failing.
  pub fn open_opt(path: impl AsRef<Path>, auto_repair: bool) -> Result<Self, PersistenceError> {
    let txn_db_opts = TransactionDBOptions::default();
    let mut db_opts = Options::default();
    db_opts.set_max_background_jobs(2);
    db_opts.set_max_open_files(50);

    db_opts.set_compression_type(rocksdb::DBCompressionType::Zstd);

    // write buffer
    db_opts.set_bytes_per_sync(1024 * 1024);
    db_opts.set_write_buffer_size(2 * 1024 * 1024);
    db_opts.set_max_write_buffer_number(2);

    // log
    db_opts.set_recycle_log_file_num(5);
    db_opts.set_keep_log_file_num(5);
    db_opts.create_if_missing(true);

    let open_result = TransactionDB::<SingleThreaded>::open(&db_opts, &txn_db_opts, &path);
    let db = match open_result {
      Ok(db) => Ok(db),
      Err(e) => {
        tracing::error!("🔴open notebook db error: {:?}", e);
        match e.kind() {
          // Missing or truncated SST files and mismatched file sizes are
          // the corruption classes the repair function can usually fix.
          ErrorKind::Corruption | ErrorKind::Unknown => {
            if auto_repair {
              rocksdb::DB::repair(&db_opts, &path).map_err(|err| {
                PersistenceError::RocksdbRepairFail(format!(
                  "Failed to repair notebook database: {:?}",
                  err
                ))
              })?;
              TransactionDB::<SingleThreaded>::open(&db_opts, &txn_db_opts, &path).map_err(|err| {
                PersistenceError::RocksdbRepairFail(format!(
                  "Failed to repair notebook database: {:?}",
                  err
                ))
              })
            } else {
              Err(PersistenceError::RocksdbCorruption(e.to_string()))
            }
          },
          _ => Err(e.into()),
        }
      },
    }?;

    Ok(Self { db: Arc::new(db) })
  }

  pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
    Self::open_opt(path, false)
  }

  /// Return a read transaction scope backed by a snapshot, so the scope
  /// sees a consistent view of the data regardless of writes committed
  /// by other scopes in the meantime.
  pub fn read_txn(&self) -> RocksKVStoreImpl<'_, TransactionDB> {
    let mut txn_options = TransactionOptions::default();
    txn_options.set_snapshot(true);
    let txn = self
      .db
      .transaction_opt(&WriteOptions::default(), &txn_options);
    RocksKVStoreImpl::new(txn)
  }

  /// Run `f` inside one write transaction. The transaction commits when
  /// `f` returns `Ok` and is dropped (rolled back) on `Err`, so a failed
  /// multi-step operation leaves no partial writes behind.
  pub fn with_write_txn<F, O>(&self, f: F) -> Result<O, PersistenceError>
  where
    F: FnOnce(&RocksKVStoreImpl<'_, TransactionDB>) -> Result<O, PersistenceError>,
  {
    let txn_options = TransactionOptions::default();
    let txn = self
      .db
      .transaction_opt(&WriteOptions::default(), &txn_options);
    let store = RocksKVStoreImpl::new(txn);
    let result = f(&store)?;
    store.0.commit()?;
    Ok(result)
  }
}

/// Implementation of [KVStore] for [RocksStore]. This is a wrapper around [Transaction].
pub struct RocksKVStoreImpl<'a, DB: Send>(Transaction<'a, DB>);

unsafe impl<'a, DB: Send> Send for RocksKVStoreImpl<'a, DB> {}

impl<'a, DB: Send + Sync> RocksKVStoreImpl<'a, DB> {
  pub fn new(txn: Transaction<'a, DB>) -> Self {
    Self(txn)
  }

  pub fn commit_transaction(self) -> Result<(), PersistenceError> {
    self.0.commit()?;
    Ok(())
  }
}

impl<'a, DB: Send + Sync> KVStore<'a> for RocksKVStoreImpl<'a, DB> {
  type Range = RocksDBRange<'a, DB>;
  type Entry = RocksDBEntry;
  type Value = RocksDBVec;
  type Error = PersistenceError;

  fn get<K: AsRef<[u8]>>(&self, key: K) -> Result<Option<Self::Value>, Self::Error> {
    if let Some(value) = self.0.get(key)? {
      Ok(Some(value))
    } else {
      Ok(None)
    }
  }

  fn insert<K: AsRef<[u8]>, V: AsRef<[u8]>>(&self, key: K, value: V) -> Result<(), Self::Error> {
    self.0.put(key, value)?;
    Ok(())
  }

  fn remove(&self, key: &[u8]) -> Result<(), Self::Error> {
    self.0.delete(key)?;
    Ok(())
  }

  fn range<K: AsRef<[u8]>, R: RangeBounds<K>>(&self, range: R) -> Result<Self::Range, Self::Error> {
    let mut opt = ReadOptions::default();
    let mut from: &[u8] = &[];
    let mut to: &[u8] = &[];
    match range.start_bound() {
      ops::Bound::Included(start) | ops::Bound::Excluded(start) => {
        from = start.as_ref();
        opt.set_iterate_lower_bound(start.as_ref());
      },
      ops::Bound::Unbounded => {},
    };

    match range.end_bound() {
      ops::Bound::Included(end) | ops::Bound::Excluded(end) => {
        opt.set_iterate_upper_bound(end.as_ref());
        to = end.as_ref();
      },
      ops::Bound::Unbounded => {},
    };
    let iterator_mode = IteratorMode::From(from, Forward);
    let iter = self.0.iterator_opt(iterator_mode, opt);
    Ok(RocksDBRange {
      // Safe to transmute because the lifetime of the iterator is the same as the lifetime of the
      // transaction.
      inner: unsafe { std::mem::transmute(iter) },
      to: to.to_vec(),
    })
  }
}

pub type RocksDBVec = Vec<u8>;

pub struct RocksDBRange<'a, DB> {
  inner: DBIteratorWithThreadMode<'a, Transaction<'a, DB>>,
  to: Vec<u8>,
}

impl<'a, DB: Send + Sync> Iterator for RocksDBRange<'a, DB> {
  type Item = RocksDBEntry;

  fn next(&mut self) -> Option<Self::Item> {
    let n = self.inner.next()?;
    if let Ok((key, value)) = n {
      if key.as_ref() >= self.to.as_slice() {
        None
      } else {
        Some(RocksDBEntry::new(key.to_vec(), value.to_vec()))
      }
    } else {
      None
    }
  }
}

pub struct RocksDBEntry {
  key: Vec<u8>,
  value: Vec<u8>,
}

impl RocksDBEntry {
  pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
    Self { key, value }
  }
}

impl KVEntry for RocksDBEntry {
  fn key(&self) -> &[u8] {
    self.key.as_ref()
  }

  fn value(&self) -> &[u8] {
    self.value.as_ref()
  }
}
