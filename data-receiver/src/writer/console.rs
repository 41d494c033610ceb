use async_trait::async_trait;
use tracing::info;

use super::Writer;
use crate::error::ReceiverError;

/// Writes each message to the operational log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Writer for ConsoleWriter {
    async fn write(&self, content: String) -> Result<(), ReceiverError> {
        info!(content = %content, "message_received");
        Ok(())
    }

    async fn close(&self) {
        info!("console_writer_closing");
    }
}
