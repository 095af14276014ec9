//! In-process connector backed by a duplex pipe.
//!
//! Used when no resource address is configured, so the service can run
//! without an external dependency.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, DuplexStream};

use crate::resource::{Connection, Connector, ResourceError};

const PIPE_BUFFER: usize = 4096;

#[derive(Debug, Clone, Default)]
pub struct MemoryConnector;

#[async_trait]
impl Connector for MemoryConnector {
    fn target(&self) -> String {
        "memory".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        // Keep one end, drop the other.
        let (ours, _theirs) = tokio::io::duplex(PIPE_BUFFER);
        Ok(Box::new(MemoryConnection { stream: ours }))
    }
}

struct MemoryConnection {
    stream: DuplexStream,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn close(mut self: Box<Self>) -> Result<(), ResourceError> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| ResourceError::Close(e.to_string()))
    }
}
