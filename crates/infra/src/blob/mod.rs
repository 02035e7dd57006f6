//! Blob-store collaborator port for ticket artifacts.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod supabase;

pub use memory::InMemoryTicketBucket;
pub use supabase::SupabaseTicketBucket;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("bucket request failed: {0}")]
    Transport(String),
    #[error("bucket returned status {0}")]
    Status(u16),
    #[error("bucket response malformed: {0}")]
    Malformed(String),
}

/// Object storage holding rendered ticket images.
#[async_trait]
pub trait TicketBucket: Send + Sync {
    /// Store `png` at `path`, overwriting any previous object.
    async fn upload(&self, path: &str, png: Vec<u8>) -> Result<(), BlobError>;

    /// Time-limited retrievable reference for an existing object.
    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, BlobError>;

    /// Remove the object (compensating action; missing objects are fine).
    async fn remove(&self, path: &str) -> Result<(), BlobError>;
}
