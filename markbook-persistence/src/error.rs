#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
  /// The database files are held by another live process. Opening again
  /// from this process cannot succeed; the caller has to retry after the
  /// other holder goes away.
  #[error("store is locked by another process: {0}")]
  StoreBlocked(String),

  #[error("rocksdb corruption: {0}")]
  RocksdbCorruption(String),

  #[error("rocksdb repair: {0}")]
  RocksdbRepairFail(String),

  #[error(transparent)]
  Bincode(#[from] bincode::Error),

  /// The record is absent, or it belongs to a different partition. The
  /// two cases are deliberately indistinguishable to callers.
  #[error("record not found in this partition")]
  RecordNotFound,

  /// Id already taken somewhere in the collection. The id space is
  /// global across partitions, not per user.
  #[error("duplicate record id")]
  DuplicateRecordId,

  #[error("invalid data: {0}")]
  InvalidData(String),

  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}

impl From<rocksdb::Error> for PersistenceError {
  fn from(value: rocksdb::Error) -> Self {
    match value.kind() {
      // An IO error at open time means the lock file is held by another
      // process that already opened the database.
      rocksdb::ErrorKind::Busy | rocksdb::ErrorKind::TryAgain | rocksdb::ErrorKind::IOError => {
        PersistenceError::StoreBlocked(value.into_string())
      },
      rocksdb::ErrorKind::Corruption => PersistenceError::RocksdbCorruption(value.into_string()),
      _ => PersistenceError::Internal(value.into()),
    }
  }
}
