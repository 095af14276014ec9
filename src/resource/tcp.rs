//! TCP connector.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::resource::{Connection, Connector, ResourceError};

/// Connects to the resource over TCP, bounded by a connect timeout.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    fn target(&self) -> String {
        self.address.clone()
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| ResourceError::ConnectTimeout {
                target: self.address.clone(),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|e| ResourceError::Connect {
                target: self.address.clone(),
                reason: e.to_string(),
            })?;

        let _ = stream.set_nodelay(true);

        Ok(Box::new(TcpConnection { stream }))
    }
}

struct TcpConnection {
    stream: TcpStream,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn close(mut self: Box<Self>) -> Result<(), ResourceError> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| ResourceError::Close(e.to_string()))
    }
}
