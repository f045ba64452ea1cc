use std::path::PathBuf;

use markbook_entity::{timestamp, Book, Note};
use markbook_persistence::NotebookDb;
use tempfile::TempDir;

use crate::setup_log;

pub struct NotebookDbTest {
  pub db: NotebookDb,

  #[allow(dead_code)]
  cleaner: Cleaner,
}

pub fn notebook_db() -> NotebookDbTest {
  setup_log();
  let tempdir = TempDir::new().unwrap();
  let path = tempdir.into_path();
  let db = NotebookDb::open(path.clone()).unwrap();
  NotebookDbTest {
    db,
    cleaner: Cleaner::new(path),
  }
}

pub fn make_test_book(id: &str, name: &str) -> Book {
  let now = timestamp();
  Book {
    id: id.to_string(),
    name: name.to_string(),
    description: None,
    color: None,
    emoji: None,
    created_at: now,
    updated_at: now,
  }
}

pub fn make_test_note(id: &str, book_id: &str, content: &str) -> Note {
  let now = timestamp();
  Note {
    id: id.to_string(),
    book_id: book_id.to_string(),
    content: content.to_string(),
    created_at: now,
    updated_at: now,
  }
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
