//! In-memory ticket bucket for dev and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BlobError, TicketBucket};

/// Keeps objects in a map; signed URLs use a `memory://` scheme so tests can
/// assert on them without a network.
#[derive(Debug, Default)]
pub struct InMemoryTicketBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryTicketBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().map(|o| o.contains_key(path)).unwrap_or(false)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TicketBucket for InMemoryTicketBucket {
    async fn upload(&self, path: &str, png: Vec<u8>) -> Result<(), BlobError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BlobError::Transport("lock poisoned".to_string()))?;
        objects.insert(path.to_string(), png);
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, BlobError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| BlobError::Transport("lock poisoned".to_string()))?;
        if !objects.contains_key(path) {
            // Signing a missing object is a pipeline bug; surface it loudly.
            return Err(BlobError::Status(404));
        }
        Ok(format!("memory://{path}?expires_in={expires_in_secs}"))
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BlobError::Transport("lock poisoned".to_string()))?;
        objects.remove(path);
        Ok(())
    }
}
