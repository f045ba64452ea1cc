use crate::keys::{
  make_collection_marker_key, make_schema_version_key, BOOK_SPACE, NOTE_SPACE, SETTING_SPACE,
};
use crate::kv::KVStore;
use crate::PersistenceError;

/// Schema version this build targets. Bump it together with a new arm in
/// [`migrate`].
pub const SCHEMA_VERSION: u32 = 1;

/// The collections every open must guarantee exist.
pub const COLLECTION_SPACES: [u8; 3] = [BOOK_SPACE, NOTE_SPACE, SETTING_SPACE];

/// Version handshake run inside the opening write transaction.
///
/// Reads the stored schema version (absent means a fresh database),
/// settles on `max(stored, target)` so a stale build with a lower
/// compiled-in target can never regress a newer on-disk schema, runs the
/// migrations between the two versions, and writes the settled version
/// back. Also writes a marker for each declared collection that does not
/// exist yet; re-running is idempotent.
pub fn run_version_handshake<'a, S>(store: &S, target: u32) -> Result<u32, PersistenceError>
where
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  let version_key = make_schema_version_key();
  let stored = match store.get(version_key.as_ref())? {
    Some(value) => decode_version(value.as_ref())?,
    None => 0,
  };
  let effective = stored.max(target);

  migrate(store, stored, effective)?;

  if effective != stored {
    store.insert(version_key, effective.to_be_bytes())?;
  }

  for space in COLLECTION_SPACES {
    let marker = make_collection_marker_key(space);
    if store.get(marker.as_ref())?.is_none() {
      store.insert(marker, [1u8])?;
    }
  }

  Ok(effective)
}

/// Bring a database at `from` up to `to`. Each arm upgrades exactly one
/// version step; version 1 is the initial schema and needs none.
fn migrate<'a, S>(_store: &S, from: u32, to: u32) -> Result<(), PersistenceError>
where
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  for step in from..to {
    match step {
      // 0 -> 1: initial schema, collections are created by the caller.
      0 => {},
      unknown => {
        tracing::warn!("no migration registered for schema step {}", unknown);
      },
    }
  }
  Ok(())
}

fn decode_version(value: &[u8]) -> Result<u32, PersistenceError> {
  let bytes: [u8; 4] = value
    .try_into()
    .map_err(|_| PersistenceError::InvalidData(format!("schema version of {} bytes", value.len())))?;
  Ok(u32::from_be_bytes(bytes))
}

/// Read the stored schema version without touching anything. Absent
/// means the database was never opened by this store.
pub fn read_schema_version<'a, S>(store: &S) -> Result<Option<u32>, PersistenceError>
where
  S: KVStore<'a>,
  PersistenceError: From<S::Error>,
{
  match store.get(make_schema_version_key().as_ref())? {
    Some(value) => Ok(Some(decode_version(value.as_ref())?)),
    None => Ok(None),
  }
}
