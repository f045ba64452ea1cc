use serde::{Deserialize, Serialize};

use crate::{gen_record_id, timestamp};

/// A markdown note. The note's title is not stored separately, it is
/// whatever the first non-empty line of the content says.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Note {
  pub id: String,
  /// Id of the owning [`crate::Book`]. Only the cascading book delete
  /// keeps this reference consistent, so readers must treat it as
  /// possibly dangling and filter instead of assuming presence.
  pub book_id: String,
  pub content: String,
  pub created_at: i64,
  pub updated_at: i64,
}

impl Note {
  pub fn new<B: Into<String>, C: Into<String>>(book_id: B, content: C) -> Self {
    let now = timestamp();
    Self {
      id: gen_record_id(),
      book_id: book_id.into(),
      content: content.into(),
      created_at: now,
      updated_at: now,
    }
  }

  /// First non-empty line of the content with any leading markdown
  /// heading markers stripped. Empty when the note has no text yet.
  pub fn title(&self) -> &str {
    self
      .content
      .lines()
      .find(|line| !line.trim().is_empty())
      .map(|line| line.trim().trim_start_matches('#').trim())
      .unwrap_or("")
  }
}
