//! Handle around one exclusive long-lived connection.

use tokio::sync::Mutex;

use crate::resource::{Connection, Connector, ResourceError};

/// Observable handle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Unopened,
    Open,
    Closed,
}

enum Slot {
    Unopened,
    Open(Box<dyn Connection>),
    Closed,
}

impl Slot {
    fn state(&self) -> ResourceState {
        match self {
            Slot::Unopened => ResourceState::Unopened,
            Slot::Open(_) => ResourceState::Open,
            Slot::Closed => ResourceState::Closed,
        }
    }
}

/// Owns the connection produced by a [`Connector`].
///
/// Transitions only `Unopened → Open` and `Open → Closed`.
pub struct ResourceHandle {
    connector: Box<dyn Connector>,
    slot: Mutex<Slot>,
}

impl ResourceHandle {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            slot: Mutex::new(Slot::Unopened),
        }
    }

    /// Open the connection. A no-op when already open.
    pub async fn open(&self) -> Result<(), ResourceError> {
        let mut slot = self.slot.lock().await;
        match *slot {
            Slot::Open(_) => Ok(()),
            Slot::Closed => Err(ResourceError::Closed),
            Slot::Unopened => {
                let conn = self.connector.connect().await?;
                *slot = Slot::Open(conn);
                tracing::info!(target_addr = %self.connector.target(), "Resource connection established");
                Ok(())
            }
        }
    }

    /// Close the connection.
    ///
    /// Closing an unopened or already closed handle succeeds without doing
    /// anything. A failing close still leaves the handle `Closed`.
    pub async fn close(&self) -> Result<(), ResourceError> {
        let mut slot = self.slot.lock().await;
        let conn = match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Open(conn) => conn,
            unchanged => {
                *slot = unchanged;
                return Ok(());
            }
        };
        drop(slot);

        conn.close().await?;
        tracing::info!(target_addr = %self.connector.target(), "Resource connection closed");
        Ok(())
    }

    pub async fn state(&self) -> ResourceState {
        self.slot.lock().await.state()
    }

    pub fn target(&self) -> String {
        self.connector.target()
    }
}
