use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Book, Note};

/// The JSON document the settings UI exchanges with the outside world.
/// Records carry no partition tag; the importer re-tags them under the
/// active partition with freshly generated ids.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ExportDocument {
  pub books: Vec<Book>,
  pub notes: Vec<Note>,
  pub export_date: String,
}

impl ExportDocument {
  pub fn new(books: Vec<Book>, notes: Vec<Note>) -> Self {
    Self {
      books,
      notes,
      export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
  }
}
