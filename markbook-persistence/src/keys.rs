use smallvec::{smallvec, SmallVec};
use std::io::Write;
use std::ops::Deref;

/// Prefix byte shared by every key in the notebook store.
pub const SPACE: u8 = 0;
/// Key space holding the schema version and the collection markers.
pub const META_SPACE: u8 = 0;
/// Key space holding book records.
pub const BOOK_SPACE: u8 = 1;
/// Key space holding note records.
pub const NOTE_SPACE: u8 = 2;
/// Key space holding per-user settings flags.
pub const SETTING_SPACE: u8 = 3;

pub const TERMINATOR: u8 = 0;

pub const TERMINATOR_HI_WATERMARK: u8 = 255;

/// Tag byte within [META_SPACE] identifying the schema version entry.
pub const SCHEMA_VERSION_TAG: u8 = 0;

/// Tag byte within [META_SPACE] identifying a collection marker entry.
pub const COLLECTION_MARKER_TAG: u8 = 1;

/// Record ids are uuid strings, so a record key is
/// `[SPACE, space, ..id, TERMINATOR]` and fits inline in 40 bytes.
pub fn make_record_key(space: u8, id: &str) -> Key<40> {
  let mut v: SmallVec<[u8; 40]> = smallvec![SPACE, space];
  v.write_all(id.as_bytes()).unwrap();
  v.push(TERMINATOR);
  Key(v)
}

/// Records of a collection live within bounds
/// `[SPACE, space]..[SPACE, space, 255]`.
pub fn make_scan_start_key(space: u8) -> Key<3> {
  Key(smallvec![SPACE, space])
}

pub fn make_scan_end_key(space: u8) -> Key<3> {
  Key(smallvec![SPACE, space, TERMINATOR_HI_WATERMARK])
}

pub fn make_schema_version_key() -> Key<3> {
  Key(smallvec![SPACE, META_SPACE, SCHEMA_VERSION_TAG])
}

/// One marker per declared collection, written on first open. Its
/// presence is what "the collection exists" means for this store.
pub fn make_collection_marker_key(space: u8) -> Key<4> {
  Key(smallvec![SPACE, META_SPACE, COLLECTION_MARKER_TAG, space])
}

/// Settings flags are keyed `{uid}_{name}` inside [SETTING_SPACE].
pub fn make_setting_key(uid: &str, name: &str) -> Key<40> {
  let mut v: SmallVec<[u8; 40]> = smallvec![SPACE, SETTING_SPACE];
  v.write_all(uid.as_bytes()).unwrap();
  v.push(b'_');
  v.write_all(name.as_bytes()).unwrap();
  v.push(TERMINATOR);
  Key(v)
}

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key<const N: usize>(SmallVec<[u8; N]>);

impl<const N: usize> Key<N> {
  pub const fn from_const(src: [u8; N]) -> Self {
    Key(SmallVec::from_const(src))
  }
}

impl<const N: usize> Deref for Key<N> {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    self.0.as_ref()
  }
}

impl<const N: usize> AsRef<[u8]> for Key<N> {
  #[inline]
  fn as_ref(&self) -> &[u8] {
    self.0.as_ref()
  }
}

impl<const N: usize> From<Key<N>> for Vec<u8> {
  fn from(key: Key<N>) -> Self {
    key.0.to_vec()
  }
}
