use markbook_entity::PartitionId;

/// What the storage layer needs from the authentication subsystem: the
/// current user's id, resolved synchronously. The value is an opaque
/// partition key here; token handling and validation stay on the auth
/// side.
pub trait AuthContext: Send + Sync {
  fn current_uid(&self) -> PartitionId;
}

/// Fixed identity, enough for single-user apps and tests.
pub struct StaticAuth {
  uid: PartitionId,
}

impl StaticAuth {
  pub fn new<U: Into<PartitionId>>(uid: U) -> Self {
    Self { uid: uid.into() }
  }

  pub fn anonymous() -> Self {
    Self {
      uid: PartitionId::anonymous(),
    }
  }
}

impl AuthContext for StaticAuth {
  fn current_uid(&self) -> PartitionId {
    self.uid.clone()
  }
}
