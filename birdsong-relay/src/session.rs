use birdsong_core::models::SessionId;
use tokio::sync::mpsc;

use crate::hub::{BroadcastRelay, Frame};

/// One connected viewer
///
/// Holds the receiving end of the viewer's frame buffer. Dropping the session
/// removes it from the relay, so an early return in a socket handler cannot
/// leak a registration.
pub struct ViewerSession {
    id: SessionId,
    receiver: mpsc::Receiver<Frame>,
    relay: BroadcastRelay,
}

impl ViewerSession {
    pub(crate) const fn new(
        id: SessionId,
        receiver: mpsc::Receiver<Frame>,
        relay: BroadcastRelay,
    ) -> Self {
        Self {
            id,
            receiver,
            relay,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wait for the next frame
    ///
    /// Returns `None` once the session is unregistered and its buffer drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Take a buffered frame without waiting
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Remove this session from the relay; safe to call more than once
    pub fn unregister(&self) -> bool {
        self.relay.unregister(&self.id)
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession").field("id", &self.id).finish()
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.relay.unregister(&self.id);
    }
}
