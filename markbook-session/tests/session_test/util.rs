use std::path::PathBuf;
use std::sync::Arc;

use markbook_persistence::NotebookDb;
use markbook_session::{Session, StaticAuth};
use tempfile::TempDir;

use crate::setup_log;

pub struct SessionTest {
  pub session: Session,
  pub db: Arc<NotebookDb>,

  #[allow(dead_code)]
  cleaner: Cleaner,
}

pub fn session_with_uid(uid: &str) -> SessionTest {
  setup_log();
  let tempdir = TempDir::new().unwrap();
  let path = tempdir.into_path();
  let db = Arc::new(NotebookDb::open(path.clone()).unwrap());
  let session = session_over(db.clone(), uid);
  SessionTest {
    session,
    db,
    cleaner: Cleaner::new(path),
  }
}

/// Another session over the same database, e.g. the same user in a new
/// process or a different user on the same device.
pub fn session_over(db: Arc<NotebookDb>, uid: &str) -> Session {
  Session::new(db, Arc::new(StaticAuth::new(uid)))
}

struct Cleaner(PathBuf);

impl Cleaner {
  fn new(dir: PathBuf) -> Self {
    Cleaner(dir)
  }

  fn cleanup(dir: &PathBuf) {
    let _ = std::fs::remove_dir_all(dir);
  }
}

impl Drop for Cleaner {
  fn drop(&mut self) {
    Self::cleanup(&self.0)
  }
}
