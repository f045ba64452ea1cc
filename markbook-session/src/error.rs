use markbook_persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  #[error(transparent)]
  Persistence(#[from] PersistenceError),

  /// The id is not in the loaded cache. Recoverable; the orchestration
  /// pipeline treats it as "nothing to do".
  #[error("book {0} is not in the loaded partition")]
  UnknownBook(String),

  #[error("note {0} is not in the loaded partition")]
  UnknownNote(String),

  #[error("malformed export document: {0}")]
  MalformedExport(#[from] serde_json::Error),

  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}
