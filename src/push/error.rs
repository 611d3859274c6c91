//! Push-notification error taxonomy.

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("webhook delivery failed: {0}")]
    Delivery(String),

    #[error("webhook endpoint returned client error status {0}")]
    ClientError(u16),
}
