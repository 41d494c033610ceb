use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::Writer;
use crate::error::ReceiverError;

/// Stores messages in an in-process, ordered list.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    messages: RwLock<Vec<String>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        info!("memory_writer_started");
        Self::default()
    }

    /// All messages written since creation or the last close, in order.
    pub async fn messages(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl Writer for MemoryWriter {
    async fn write(&self, content: String) -> Result<(), ReceiverError> {
        self.messages.write().await.push(content);
        Ok(())
    }

    async fn close(&self) {
        info!("memory_writer_closing");
        self.messages.write().await.clear();
    }
}
