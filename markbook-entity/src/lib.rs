pub use book::*;
pub use export::*;
pub use note::*;
pub use partition::*;

mod book;
mod export;
mod note;
mod partition;

/// Current time in milliseconds since the epoch. Every `created_at` and
/// `updated_at` in this workspace is produced by this function.
pub fn timestamp() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// Generate a fresh record id. Ids are globally unique across all
/// partitions of a collection, so generation must be collision resistant.
pub fn gen_record_id() -> String {
  uuid::Uuid::new_v4().to_string()
}
