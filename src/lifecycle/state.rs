//! Controller state machine.
//!
//! # States
//! ```text
//! Created → Running → Draining → Stopped
//! Created → Stopped            (start failed, or stop before start)
//! ```
//! States only move forward; none is revisited.

use std::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Created = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            2 => LifecycleState::Draining,
            _ => LifecycleState::Stopped,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Monotonic holder for [`LifecycleState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Created as u8))
    }

    pub(crate) fn get(&self) -> LifecycleState {
        self.0.load(Ordering::SeqCst).into()
    }

    /// Move forward to `to`. Returns false if already at or past it.
    pub(crate) fn advance(&self, to: LifecycleState) -> bool {
        let previous = self.0.fetch_max(to as u8, Ordering::SeqCst);
        let moved = previous < to as u8;
        if moved {
            tracing::debug!(from = %LifecycleState::from(previous), to = %to, "Lifecycle state changed");
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_moves_backwards() {
        let cell = StateCell::new();
        assert!(cell.advance(LifecycleState::Running));
        assert!(cell.advance(LifecycleState::Stopped));
        assert!(!cell.advance(LifecycleState::Draining));
        assert!(!cell.advance(LifecycleState::Stopped));
        assert_eq!(cell.get(), LifecycleState::Stopped);
    }
}
