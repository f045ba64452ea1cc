use std::collections::HashMap;
use std::sync::Arc;

use markbook_entity::{gen_record_id, Book, BookUpdate, ExportDocument, Note, PartitionId};
use markbook_persistence::{NotebookDb, PersistenceError};
use markbook_state::{reduce, AppState, Command};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::error::SessionError;
use crate::AuthContext;

pub type StateChangeSender = broadcast::Sender<StateChange>;
pub type StateChangeReceiver = broadcast::Receiver<StateChange>;

#[derive(Debug, Clone)]
pub enum StateChange {
  DidLoad,
  DidClear,
  DidAddBook { book: Book },
  DidUpdateBook { book: Book },
  DidDeleteBook { id: String },
  DidAddNote { note: Note },
  DidUpdateNote { note: Note },
  DidDeleteNote { id: String },
  DidMoveNote { note: Note },
}

/// Sequences durable-store operations and cache commands so the two
/// appear to change together. Data-mutating calls hit the store first
/// and touch the cache only after the store confirmed the write; a
/// rejected store call leaves the cache exactly as it was. Selection is
/// pure UI state and skips the store entirely.
pub struct Session {
  db: Arc<NotebookDb>,
  auth: Arc<dyn AuthContext>,
  state: RwLock<AppState>,
  change_tx: StateChangeSender,
}

impl Session {
  pub fn new(db: Arc<NotebookDb>, auth: Arc<dyn AuthContext>) -> Self {
    let (change_tx, _) = broadcast::channel(100);
    Self {
      db,
      auth,
      state: RwLock::new(AppState::default()),
      change_tx,
    }
  }

  pub fn subscribe(&self) -> StateChangeReceiver {
    self.change_tx.subscribe()
  }

  /// Snapshot of the current cache state.
  pub fn state(&self) -> AppState {
    self.state.read().clone()
  }

  pub fn current_uid(&self) -> PartitionId {
    self.auth.current_uid()
  }

  /// Seed the cache with everything the partition owns.
  pub async fn load_all(&self) -> Result<(), SessionError> {
    let uid = self.current_uid();
    let snapshot = self.with_store(move |db| db.get_all(&uid)).await?;
    self.dispatch(Command::LoadAll {
      books: snapshot.books,
      notes: snapshot.notes,
    });
    self.notify(StateChange::DidLoad);
    Ok(())
  }

  /// Whether the partition has ever been seeded with data. Distinguishes
  /// a genuinely new user from one whose notebook is currently empty.
  pub async fn is_initialized(&self) -> Result<bool, SessionError> {
    let uid = self.current_uid();
    self.with_store(move |db| db.is_initialized(&uid)).await
  }

  pub async fn add_book(&self, book: Book) -> Result<Book, SessionError> {
    let uid = self.current_uid();
    let stored = self
      .with_store(move |db| db.insert_book(&uid, book))
      .await?;
    self.dispatch(Command::AddBook {
      book: stored.clone(),
    });
    self.notify(StateChange::DidAddBook {
      book: stored.clone(),
    });
    Ok(stored)
  }

  pub async fn update_book(&self, id: &str, update: BookUpdate) -> Result<Book, SessionError> {
    let uid = self.current_uid();
    let mut book = self
      .state
      .read()
      .book(id)
      .cloned()
      .ok_or_else(|| SessionError::UnknownBook(id.to_string()))?;
    book.apply_update(&update);

    let stored = self.with_store(move |db| db.update_book(&uid, book)).await?;
    self.dispatch(Command::UpdateBook {
      id: stored.id.clone(),
      update,
      updated_at: stored.updated_at,
    });
    self.notify(StateChange::DidUpdateBook {
      book: stored.clone(),
    });
    Ok(stored)
  }

  pub async fn delete_book(&self, id: &str) -> Result<(), SessionError> {
    let uid = self.current_uid();
    let owned_id = id.to_string();
    self
      .with_store(move |db| db.delete_book(&uid, &owned_id))
      .await?;
    self.dispatch(Command::DeleteBook { id: id.to_string() });
    // The durable cascade already removed the book's notes; the cached
    // ones dangle until the next load and every reader filters them.
    self.notify(StateChange::DidDeleteBook { id: id.to_string() });
    Ok(())
  }

  /// Create a note in a book of the loaded partition. The book must be
  /// present in the cache: a note never starts out dangling.
  pub async fn add_note(&self, book_id: &str, content: &str) -> Result<Note, SessionError> {
    if self.state.read().book(book_id).is_none() {
      return Err(SessionError::UnknownBook(book_id.to_string()));
    }
    let uid = self.current_uid();
    let note = Note::new(book_id, content);
    let stored = self.with_store(move |db| db.insert_note(&uid, note)).await?;
    self.dispatch(Command::AddNote {
      note: stored.clone(),
    });
    self.notify(StateChange::DidAddNote {
      note: stored.clone(),
    });
    Ok(stored)
  }

  pub async fn update_note(&self, id: &str, content: &str) -> Result<Note, SessionError> {
    let uid = self.current_uid();
    let mut note = self
      .state
      .read()
      .note(id)
      .cloned()
      .ok_or_else(|| SessionError::UnknownNote(id.to_string()))?;
    note.content = content.to_string();

    let stored = self.with_store(move |db| db.update_note(&uid, note)).await?;
    self.dispatch(Command::UpdateNote {
      id: stored.id.clone(),
      content: stored.content.clone(),
      updated_at: stored.updated_at,
    });
    self.notify(StateChange::DidUpdateNote {
      note: stored.clone(),
    });
    Ok(stored)
  }

  pub async fn delete_note(&self, id: &str) -> Result<(), SessionError> {
    let uid = self.current_uid();
    let owned_id = id.to_string();
    self
      .with_store(move |db| db.delete_note_by_id(&uid, &owned_id))
      .await?;
    self.dispatch(Command::DeleteNote { id: id.to_string() });
    self.notify(StateChange::DidDeleteNote { id: id.to_string() });
    Ok(())
  }

  pub async fn move_note(&self, id: &str, target_book_id: &str) -> Result<Note, SessionError> {
    let uid = self.current_uid();
    let note_id = id.to_string();
    let book_id = target_book_id.to_string();
    let moved = self
      .with_store(move |db| db.move_note(&uid, &note_id, &book_id))
      .await?;
    self.dispatch(Command::MoveNote {
      id: moved.id.clone(),
      book_id: moved.book_id.clone(),
      updated_at: moved.updated_at,
    });
    self.notify(StateChange::DidMoveNote {
      note: moved.clone(),
    });
    Ok(moved)
  }

  /// Selection is navigation state, not data: applied immediately, no
  /// store round trip.
  pub fn select_book(&self, id: Option<String>) {
    self.dispatch(Command::SelectBook { id });
  }

  pub fn select_note(&self, id: Option<String>) {
    self.dispatch(Command::SelectNote { id });
  }

  /// Drop everything the partition owns, durable store first.
  pub async fn clear_all(&self) -> Result<(), SessionError> {
    let uid = self.current_uid();
    self.with_store(move |db| db.clear_partition(&uid)).await?;
    self.dispatch(Command::LoadAll {
      books: vec![],
      notes: vec![],
    });
    self.dispatch(Command::SelectBook { id: None });
    self.dispatch(Command::SelectNote { id: None });
    self.notify(StateChange::DidClear);
    Ok(())
  }

  /// Produce the export document from the durable store, not the cache;
  /// what leaves the app is what was actually persisted.
  pub async fn export_snapshot(&self) -> Result<ExportDocument, SessionError> {
    let uid = self.current_uid();
    let snapshot = self.with_store(move |db| db.get_all(&uid)).await?;
    Ok(ExportDocument::new(snapshot.books, snapshot.notes))
  }

  pub async fn export_json(&self) -> Result<String, SessionError> {
    let doc = self.export_snapshot().await?;
    Ok(serde_json::to_string_pretty(&doc)?)
  }

  /// Bring an export document into the active partition. Both modes
  /// re-identify every record so an import can never collide with ids
  /// already present in the store, and both re-seed the cache from the
  /// store afterwards.
  pub async fn import_snapshot(
    &self,
    doc: ExportDocument,
    mode: ImportMode,
  ) -> Result<(), SessionError> {
    let uid = self.current_uid();
    let (books, notes) = reidentify(doc);
    let snapshot = match mode {
      ImportMode::Replace => {
        self
          .with_store(move |db| {
            db.save_all(&uid, books, notes)?;
            db.get_all(&uid)
          })
          .await?
      },
      ImportMode::Append => {
        self
          .with_store(move |db| {
            for book in books {
              db.insert_book(&uid, book)?;
            }
            for note in notes {
              db.insert_note(&uid, note)?;
            }
            db.get_all(&uid)
          })
          .await?
      },
    };
    self.dispatch(Command::LoadAll {
      books: snapshot.books,
      notes: snapshot.notes,
    });
    self.notify(StateChange::DidLoad);
    Ok(())
  }

  pub async fn import_json(&self, json: &str, mode: ImportMode) -> Result<(), SessionError> {
    let doc: ExportDocument = serde_json::from_str(json)?;
    self.import_snapshot(doc, mode).await
  }

  async fn with_store<T, F>(&self, f: F) -> Result<T, SessionError>
  where
    T: Send + 'static,
    F: FnOnce(&NotebookDb) -> Result<T, PersistenceError> + Send + 'static,
  {
    let db = self.db.clone();
    let result = tokio::task::spawn_blocking(move || f(&db))
      .await
      .map_err(|err| SessionError::Internal(err.into()))?;
    result.map_err(|err| {
      tracing::error!("storage operation failed: {}", err);
      SessionError::from(err)
    })
  }

  fn dispatch(&self, command: Command) {
    let mut state = self.state.write();
    let current = std::mem::take(&mut *state);
    *state = reduce(current, command);
  }

  fn notify(&self, change: StateChange) {
    let _ = self.change_tx.send(change);
  }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ImportMode {
  /// Replace the partition wholesale.
  Replace,
  /// Keep what is there and append the imported records.
  Append,
}

/// Give every imported record a fresh id and rewrite note references to
/// the new book ids. A reference to a book missing from the document is
/// left as-is; it dangles the same way it dangled in the export.
fn reidentify(doc: ExportDocument) -> (Vec<Book>, Vec<Note>) {
  let mut book_ids = HashMap::with_capacity(doc.books.len());
  let books = doc
    .books
    .into_iter()
    .map(|mut book| {
      let fresh = gen_record_id();
      book_ids.insert(std::mem::replace(&mut book.id, fresh.clone()), fresh);
      book
    })
    .collect();
  let notes = doc
    .notes
    .into_iter()
    .map(|mut note| {
      note.id = gen_record_id();
      if let Some(mapped) = book_ids.get(&note.book_id) {
        note.book_id = mapped.clone();
      }
      note
    })
    .collect();
  (books, notes)
}
