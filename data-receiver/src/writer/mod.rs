//! Writers persist or forward a verified message.
//!
//! - [`MemoryWriter`]: keeps messages in process, for tests and inspection
//! - [`ConsoleWriter`]: logs each message
//! - [`FileWriter`]: appends messages to a file from a background task

pub mod console;
pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ReceiverError;
use crate::services::Parameters;

pub use console::ConsoleWriter;
pub use file::FileWriter;
pub use memory::MemoryWriter;

/// Consumes verified messages.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Persist or forward one message.
    async fn write(&self, content: String) -> Result<(), ReceiverError>;

    /// Release resources, waiting for in-flight messages. Calling it twice is
    /// harmless.
    async fn close(&self);
}

/// Build the writer named by `class`.
///
/// Unknown class names fall back to [`ConsoleWriter`].
pub async fn create_writer(
    class: &str,
    params: &Parameters,
) -> Result<Arc<dyn Writer>, ReceiverError> {
    match class {
        "MemoryWriter" => Ok(Arc::new(MemoryWriter::new())),
        "FileWriter" => Ok(Arc::new(FileWriter::from_params(params).await?)),
        "ConsoleWriter" => Ok(Arc::new(ConsoleWriter::new())),
        other => {
            warn!(class = %other, "writer_class_unknown_using_console");
            Ok(Arc::new(ConsoleWriter::new()))
        }
    }
}
