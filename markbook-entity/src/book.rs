use serde::{Deserialize, Serialize};

use crate::{gen_record_id, timestamp};

/// A book groups the notes of one user. Books never nest.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Book {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub color: Option<String>,
  #[serde(default)]
  pub emoji: Option<String>,
  pub created_at: i64,
  pub updated_at: i64,
}

impl Book {
  pub fn new<S: Into<String>>(name: S) -> Self {
    let now = timestamp();
    Self {
      id: gen_record_id(),
      name: name.into(),
      description: None,
      color: None,
      emoji: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_color<S: Into<String>>(mut self, color: S) -> Self {
    self.color = Some(color.into());
    self
  }

  pub fn with_emoji<S: Into<String>>(mut self, emoji: S) -> Self {
    self.emoji = Some(emoji.into());
    self
  }

  /// Merge a partial update into this book. Fields left `None` in the
  /// update keep their current value.
  pub fn apply_update(&mut self, update: &BookUpdate) {
    if let Some(name) = &update.name {
      self.name = name.clone();
    }
    if let Some(description) = &update.description {
      self.description = Some(description.clone());
    }
    if let Some(color) = &update.color {
      self.color = Some(color.clone());
    }
    if let Some(emoji) = &update.emoji {
      self.emoji = Some(emoji.clone());
    }
  }
}

/// Partial update of the mutable book fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct BookUpdate {
  pub name: Option<String>,
  pub description: Option<String>,
  pub color: Option<String>,
  pub emoji: Option<String>,
}

impl BookUpdate {
  pub fn name<S: Into<String>>(mut self, name: S) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn description<S: Into<String>>(mut self, description: S) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn color<S: Into<String>>(mut self, color: S) -> Self {
    self.color = Some(color.into());
    self
  }

  pub fn emoji<S: Into<String>>(mut self, emoji: S) -> Self {
    self.emoji = Some(emoji.into());
    self
  }
}
