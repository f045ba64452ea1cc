use markbook_entity::{Book, Note};
use serde::{Deserialize, Serialize};

/// The in-memory projection of the loaded partition that drives the UI.
/// It only changes through [crate::reduce]; nothing mutates it in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct AppState {
  pub books: Vec<Book>,
  pub notes: Vec<Note>,
  pub selected_book_id: Option<String>,
  pub selected_note_id: Option<String>,
}

impl AppState {
  pub fn book(&self, id: &str) -> Option<&Book> {
    self.books.iter().find(|book| book.id == id)
  }

  pub fn note(&self, id: &str) -> Option<&Note> {
    self.notes.iter().find(|note| note.id == id)
  }

  /// Notes of one book. A note whose `book_id` dangles simply never
  /// shows up anywhere; the cascade on the durable side reclaims it on
  /// the next load.
  pub fn notes_in_book(&self, book_id: &str) -> Vec<&Note> {
    self
      .notes
      .iter()
      .filter(|note| note.book_id == book_id)
      .collect()
  }

  pub fn selected_book(&self) -> Option<&Book> {
    self.selected_book_id.as_deref().and_then(|id| self.book(id))
  }

  pub fn selected_note(&self) -> Option<&Note> {
    self.selected_note_id.as_deref().and_then(|id| self.note(id))
  }
}
