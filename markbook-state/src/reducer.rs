use crate::{AppState, Command};

/// Pure state transition. Takes the state by value and returns the next
/// one; nothing outside the command payload influences the result and
/// no transition performs I/O.
///
/// Total by construction: a command aimed at an id the state does not
/// hold falls through the lookup without touching anything, so the
/// result compares equal to the input and speculative dispatches can
/// never crash the cache.
pub fn reduce(mut state: AppState, command: Command) -> AppState {
  match command {
    Command::LoadAll { books, notes } => {
      state.books = books;
      state.notes = notes;
    },
    Command::LoadNotes { notes } => {
      state.notes = notes;
    },
    Command::AddNote { note } => {
      state.notes.push(note);
    },
    Command::UpdateNote {
      id,
      content,
      updated_at,
    } => {
      if let Some(note) = state.notes.iter_mut().find(|note| note.id == id) {
        note.content = content;
        note.updated_at = updated_at;
      }
    },
    Command::DeleteNote { id } => {
      state.notes.retain(|note| note.id != id);
      if state.selected_note_id.as_deref() == Some(id.as_str()) {
        state.selected_note_id = None;
      }
    },
    Command::SelectNote { id } => {
      state.selected_note_id = id;
    },
    Command::AddBook { book } => {
      state.books.push(book);
    },
    Command::UpdateBook {
      id,
      update,
      updated_at,
    } => {
      if let Some(book) = state.books.iter_mut().find(|book| book.id == id) {
        book.apply_update(&update);
        book.updated_at = updated_at;
      }
    },
    Command::DeleteBook { id } => {
      state.books.retain(|book| book.id != id);
      if state.selected_book_id.as_deref() == Some(id.as_str()) {
        state.selected_book_id = None;
      }
    },
    Command::SelectBook { id } => {
      state.selected_book_id = id;
    },
    Command::MoveNote {
      id,
      book_id,
      updated_at,
    } => {
      if let Some(note) = state.notes.iter_mut().find(|note| note.id == id) {
        note.book_id = book_id;
        note.updated_at = updated_at;
      }
    },
  }
  state
}
