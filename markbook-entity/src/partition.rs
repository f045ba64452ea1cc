use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The partition key all storage operations are scoped to. It is the
/// current user's id as reported by the authentication collaborator, or
/// the anonymous sentinel when nobody is logged in. The storage layer
/// treats the value as opaque and never validates it.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartitionId(String);

pub const ANONYMOUS_UID: &str = "anonymous";

impl PartitionId {
  pub fn new<S: Into<String>>(uid: S) -> Self {
    Self(uid.into())
  }

  pub fn anonymous() -> Self {
    Self(ANONYMOUS_UID.to_string())
  }

  pub fn is_anonymous(&self) -> bool {
    self.0 == ANONYMOUS_UID
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for PartitionId {
  fn from(uid: &str) -> Self {
    Self(uid.to_string())
  }
}

impl From<String> for PartitionId {
  fn from(uid: String) -> Self {
    Self(uid)
  }
}

impl AsRef<str> for PartitionId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl Display for PartitionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
