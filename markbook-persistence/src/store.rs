use std::path::Path;

use markbook_entity::{timestamp, Book, Note, PartitionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::keys::{make_record_key, make_scan_end_key, make_scan_start_key, make_setting_key};
use crate::keys::{BOOK_SPACE, NOTE_SPACE};
use crate::kv::rocks_kv::RocksStore;
use crate::kv::{KVEntry, KVStore};
use crate::version::{run_version_handshake, SCHEMA_VERSION};
use crate::PersistenceError;

/// Flag set for a partition after its first non-empty [NotebookDb::save_all],
/// so an empty read later means "seeded but empty" rather than "never
/// seeded".
pub const INITIALIZED_FLAG: &str = "initialized";

/// What a bulk read returns: every record of the partition, tags
/// stripped, in no particular order. Ordering is the cache's concern.
#[derive(Debug, Clone, Default)]
pub struct NotebookSnapshot {
  pub books: Vec<Book>,
  pub notes: Vec<Note>,
}

/// The partition tag wrapped around every persisted record. The envelope
/// never leaves this module; callers only ever see the inner record.
#[derive(Serialize, Deserialize)]
struct StoredRecord<T> {
  uid: String,
  record: T,
}

/// A record type the notebook store can persist under a partition tag.
pub trait PartitionRecord: Serialize + DeserializeOwned + Clone {
  const SPACE: u8;

  fn record_id(&self) -> &str;

  fn updated_at(&self) -> i64;

  fn set_updated_at(&mut self, at: i64);

  /// Refresh `updated_at`. Strictly increasing per record even when two
  /// mutations land within the same millisecond.
  fn touch(&mut self) {
    let at = timestamp().max(self.updated_at() + 1);
    self.set_updated_at(at);
  }
}

impl PartitionRecord for Book {
  const SPACE: u8 = BOOK_SPACE;

  fn record_id(&self) -> &str {
    &self.id
  }

  fn updated_at(&self) -> i64 {
    self.updated_at
  }

  fn set_updated_at(&mut self, at: i64) {
    self.updated_at = at;
  }
}

impl PartitionRecord for Note {
  const SPACE: u8 = NOTE_SPACE;

  fn record_id(&self) -> &str {
    &self.id
  }

  fn updated_at(&self) -> i64 {
    self.updated_at
  }

  fn set_updated_at(&mut self, at: i64) {
    self.updated_at = at;
  }
}

/// The durable store for books and notes.
///
/// Three logical collections (books, notes, settings flags) share one
/// physical database partitioned by key space. Every operation takes the
/// partition id explicitly; isolation between users is nothing but the
/// envelope tag plus filtering, so all tagging lives in this one module.
pub struct NotebookDb {
  store: RocksStore,
  schema_version: u32,
}

impl NotebookDb {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
    Self::open_opt(path, false)
  }

  /// Open the database and run the schema version handshake. The
  /// handshake settles on `max(stored, target)`, so a build compiled
  /// against an older schema can open a newer database without
  /// regressing it.
  pub fn open_opt(path: impl AsRef<Path>, auto_repair: bool) -> Result<Self, PersistenceError> {
    let store = RocksStore::open_opt(path, auto_repair)?;
    let schema_version = store.with_write_txn(|txn| run_version_handshake(txn, SCHEMA_VERSION))?;
    tracing::debug!("notebook store opened at schema version {}", schema_version);
    Ok(Self {
      store,
      schema_version,
    })
  }

  /// Schema version settled at open time.
  pub fn schema_version(&self) -> u32 {
    self.schema_version
  }

  pub fn insert_book(&self, uid: &PartitionId, book: Book) -> Result<Book, PersistenceError> {
    self.store.with_write_txn(|txn| insert_record(txn, uid, book))
  }

  pub fn insert_note(&self, uid: &PartitionId, note: Note) -> Result<Note, PersistenceError> {
    self.store.with_write_txn(|txn| insert_record(txn, uid, note))
  }

  pub fn update_book(&self, uid: &PartitionId, book: Book) -> Result<Book, PersistenceError> {
    self.store.with_write_txn(|txn| update_record(txn, uid, book))
  }

  pub fn update_note(&self, uid: &PartitionId, note: Note) -> Result<Note, PersistenceError> {
    self.store.with_write_txn(|txn| update_record(txn, uid, note))
  }

  pub fn get_book_by_id(
    &self,
    uid: &PartitionId,
    id: &str,
  ) -> Result<Option<Book>, PersistenceError> {
    let txn = self.store.read_txn();
    get_owned(&txn, uid, id)
  }

  pub fn get_note_by_id(
    &self,
    uid: &PartitionId,
    id: &str,
  ) -> Result<Option<Note>, PersistenceError> {
    let txn = self.store.read_txn();
    get_owned(&txn, uid, id)
  }

  /// Full scan of both collections filtered to the partition. This is
  /// the bulk seed for the application cache.
  pub fn get_all(&self, uid: &PartitionId) -> Result<NotebookSnapshot, PersistenceError> {
    let txn = self.store.read_txn();
    Ok(NotebookSnapshot {
      books: scan_partition(&txn, uid)?,
      notes: scan_partition(&txn, uid)?,
    })
  }

  /// Bulk replace of the partition: clear everything it owns, insert the
  /// given sets, and mark the partition initialized when the sets are
  /// non-empty. Clear, inserts and flag commit as one transaction, so a
  /// failure between the phases leaves the previous generation intact.
  pub fn save_all(
    &self,
    uid: &PartitionId,
    books: Vec<Book>,
    notes: Vec<Note>,
  ) -> Result<(), PersistenceError> {
    self.store.with_write_txn(|txn| {
      clear_space::<Book, _>(txn, uid)?;
      clear_space::<Note, _>(txn, uid)?;
      let seeded = !(books.is_empty() && notes.is_empty());
      for book in &books {
        put_record(txn, uid, book)?;
      }
      for note in &notes {
        put_record(txn, uid, note)?;
      }
      if seeded {
        write_flag(txn, uid, INITIALIZED_FLAG, true)?;
      }
      tracing::debug!(
        "replaced partition {} with {} books / {} notes",
        uid,
        books.len(),
        notes.len()
      );
      Ok(())
    })
  }

  /// Delete one note. The note must belong to the partition; deleting a
  /// foreign or absent id fails with [PersistenceError::RecordNotFound]
  /// like every other mutator.
  pub fn delete_note_by_id(&self, uid: &PartitionId, id: &str) -> Result<(), PersistenceError> {
    self.store.with_write_txn(|txn| {
      let note: Note = expect_owned(txn, uid, id)?;
      txn.remove(make_record_key(Note::SPACE, note.record_id()).as_ref())?;
      Ok(())
    })
  }

  /// Delete a book and cascade to every note of the partition that
  /// references it, all inside one transaction.
  pub fn delete_book(&self, uid: &PartitionId, id: &str) -> Result<(), PersistenceError> {
    self.store.with_write_txn(|txn| {
      let book: Book = expect_owned(txn, uid, id)?;
      txn.remove(make_record_key(Book::SPACE, book.record_id()).as_ref())?;

      let notes: Vec<Note> = scan_partition(txn, uid)?;
      let mut cascaded = 0usize;
      for note in notes.iter().filter(|note| note.book_id == id) {
        txn.remove(make_record_key(Note::SPACE, &note.id).as_ref())?;
        cascaded += 1;
      }
      tracing::debug!("deleted book {} and {} of its notes", id, cascaded);
      Ok(())
    })
  }

  /// Re-home a note. Both the target book and the note must exist and
  /// belong to the partition; any failed check aborts the transaction
  /// with no observable change.
  pub fn move_note(
    &self,
    uid: &PartitionId,
    note_id: &str,
    target_book_id: &str,
  ) -> Result<Note, PersistenceError> {
    self.store.with_write_txn(|txn| {
      let book: Book = expect_owned(txn, uid, target_book_id)?;
      let mut note: Note = expect_owned(txn, uid, note_id)?;
      note.book_id = book.id;
      note.touch();
      put_record(txn, uid, &note)?;
      Ok(note)
    })
  }

  /// Delete every book and note the partition owns. Settings flags are
  /// kept, so an emptied partition still reads as initialized.
  pub fn clear_partition(&self, uid: &PartitionId) -> Result<(), PersistenceError> {
    self.store.with_write_txn(|txn| {
      clear_space::<Book, _>(txn, uid)?;
      clear_space::<Note, _>(txn, uid)?;
      Ok(())
    })
  }

  pub fn flag(&self, uid: &PartitionId, name: &str) -> Result<bool, PersistenceError> {
    let txn = self.store.read_txn();
    let value = txn.get(make_setting_key(uid.as_str(), name).as_ref())?;
    Ok(matches!(value.as_deref(), Some([1])))
  }

  pub fn set_flag(
    &self,
    uid: &PartitionId,
    name: &str,
    value: bool,
  ) -> Result<(), PersistenceError> {
    self
      .store
      .with_write_txn(|txn| write_flag(txn, uid, name, value))
  }

  pub fn is_initialized(&self, uid: &PartitionId) -> Result<bool, PersistenceError> {
    self.flag(uid, INITIALIZED_FLAG)
  }

  pub fn mark_initialized(&self, uid: &PartitionId) -> Result<(), PersistenceError> {
    self.set_flag(uid, INITIALIZED_FLAG, true)
  }
}

/// Insert a fresh record. The id must be unused anywhere in the
/// collection; the id space is global across partitions, otherwise a
/// colliding id would silently hand one user's record to another.
fn insert_record<'a, T, S>(
  store: &S,
  uid: &PartitionId,
  record: T,
) -> Result<T, PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let key = make_record_key(T::SPACE, record.record_id());
  if store.get(key.as_ref())?.is_some() {
    return Err(PersistenceError::DuplicateRecordId);
  }
  put_record(store, uid, &record)?;
  Ok(record)
}

/// Replace an existing owned record, refreshing `updated_at` from the
/// stored generation so it increases strictly even with a stale payload.
fn update_record<'a, T, S>(
  store: &S,
  uid: &PartitionId,
  mut record: T,
) -> Result<T, PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let stored: T = expect_owned(store, uid, record.record_id())?;
  record.set_updated_at(stored.updated_at());
  record.touch();
  put_record(store, uid, &record)?;
  Ok(record)
}

/// Unconditional tagged write. Shared by inserts, updates and the bulk
/// replace; ownership checks happen in the callers.
fn put_record<'a, T, S>(store: &S, uid: &PartitionId, record: &T) -> Result<(), PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let key = make_record_key(T::SPACE, record.record_id());
  let stored = StoredRecord {
    uid: uid.as_str().to_string(),
    record: record.clone(),
  };
  store.insert(key, bincode::serialize(&stored)?)?;
  Ok(())
}

/// `Ok(None)` covers both "absent" and "someone else's"; callers can not
/// tell the two apart, which is what keeps foreign ids unprobeable.
fn get_owned<'a, T, S>(
  store: &S,
  uid: &PartitionId,
  id: &str,
) -> Result<Option<T>, PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let key = make_record_key(T::SPACE, id);
  match store.get(key.as_ref())? {
    Some(value) => {
      let stored: StoredRecord<T> = bincode::deserialize(value.as_ref())?;
      if stored.uid == uid.as_str() {
        Ok(Some(stored.record))
      } else {
        Ok(None)
      }
    },
    None => Ok(None),
  }
}

fn expect_owned<'a, T, S>(store: &S, uid: &PartitionId, id: &str) -> Result<T, PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  get_owned(store, uid, id)?.ok_or(PersistenceError::RecordNotFound)
}

/// Full scan of one collection filtered to the partition. Records that
/// no longer decode are skipped, not fatal; a broken entry must not take
/// the whole partition down with it.
fn scan_partition<'a, T, S>(store: &S, uid: &PartitionId) -> Result<Vec<T>, PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let from = make_scan_start_key(T::SPACE);
  let to = make_scan_end_key(T::SPACE);
  let mut records = Vec::new();
  for entry in store.range(from..to)? {
    match bincode::deserialize::<StoredRecord<T>>(entry.value()) {
      Ok(stored) if stored.uid == uid.as_str() => records.push(stored.record),
      Ok(_) => {},
      Err(err) => {
        tracing::warn!("skipping undecodable record in space {}: {}", T::SPACE, err);
      },
    }
  }
  Ok(records)
}

/// Remove every record of the partition from one collection.
fn clear_space<'a, T, S>(store: &S, uid: &PartitionId) -> Result<(), PersistenceError>
where
  T: PartitionRecord,
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let from = make_scan_start_key(T::SPACE);
  let to = make_scan_end_key(T::SPACE);
  let mut owned_keys = Vec::new();
  for entry in store.range(from..to)? {
    match bincode::deserialize::<StoredRecord<T>>(entry.value()) {
      Ok(stored) if stored.uid == uid.as_str() => owned_keys.push(entry.key().to_vec()),
      Ok(_) => {},
      Err(err) => {
        tracing::warn!("skipping undecodable record in space {}: {}", T::SPACE, err);
      },
    }
  }
  for key in owned_keys {
    store.remove(&key)?;
  }
  Ok(())
}

fn write_flag<'a, S>(
  store: &S,
  uid: &PartitionId,
  name: &str,
  value: bool,
) -> Result<(), PersistenceError>
where
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let key = make_setting_key(uid.as_str(), name);
  store.insert(key, [value as u8])?;
  Ok(())
}
