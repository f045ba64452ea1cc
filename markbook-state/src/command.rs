use markbook_entity::{Book, BookUpdate, Note};

/// The commands the application cache accepts. Each carries everything
/// its transition needs, timestamps included; the reducer itself never
/// reads a clock or performs I/O.
#[derive(Debug, Clone)]
pub enum Command {
  /// Replace books and notes wholesale. Dispatched after the initial
  /// bulk read and after an import.
  LoadAll { books: Vec<Book>, notes: Vec<Note> },
  /// Replace the notes only.
  LoadNotes { notes: Vec<Note> },
  AddNote { note: Note },
  UpdateNote {
    id: String,
    content: String,
    updated_at: i64,
  },
  DeleteNote { id: String },
  SelectNote { id: Option<String> },
  AddBook { book: Book },
  UpdateBook {
    id: String,
    update: BookUpdate,
    updated_at: i64,
  },
  DeleteBook { id: String },
  SelectBook { id: Option<String> },
  MoveNote {
    id: String,
    book_id: String,
    updated_at: i64,
  },
}
