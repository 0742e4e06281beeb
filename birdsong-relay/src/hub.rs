use birdsong_core::config::RelayConfig;
use birdsong_core::models::{SessionId, TweetEvent, ViewerMessage};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::metrics::{RelayMetrics, RelayMetricsSnapshot};
use crate::session::ViewerSession;

/// Encoded message shared by every session that receives it
pub type Frame = Arc<str>;

/// Per-viewer buffering and admission limits
#[derive(Debug, Clone)]
pub struct RelayLimits {
    /// Frames buffered per viewer; further frames are dropped until it drains
    pub session_buffer: usize,

    /// Maximum concurrent sessions (0 = unlimited)
    pub max_sessions: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            session_buffer: 16,
            max_sessions: 0,
        }
    }
}

impl From<&RelayConfig> for RelayLimits {
    fn from(config: &RelayConfig) -> Self {
        Self {
            session_buffer: config.session_buffer,
            max_sessions: config.max_sessions,
        }
    }
}

/// Outcome of one `publish` call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// Sessions that accepted the frame
    pub delivered: usize,
    /// Sessions whose buffer was full; the frame was shed for them
    pub dropped: usize,
    /// Sessions whose viewer had already gone; they are removed
    pub closed: usize,
}

struct RelayInner {
    sessions: DashMap<SessionId, mpsc::Sender<Frame>>,
    /// Admitted sessions; a slot is reserved here before the session is inserted
    live: AtomicUsize,
    limits: RelayLimits,
    metrics: RelayMetrics,
}

/// Fans each event out to every connected viewer
///
/// Delivery is a single non-blocking attempt per session. A viewer that cannot
/// take a frame right now loses that frame; nobody else waits for it and
/// nothing is retried.
#[derive(Clone)]
pub struct BroadcastRelay {
    inner: Arc<RelayInner>,
}

impl BroadcastRelay {
    #[must_use]
    pub fn new(limits: RelayLimits) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                sessions: DashMap::new(),
                live: AtomicUsize::new(0),
                limits,
                metrics: RelayMetrics::default(),
            }),
        }
    }

    /// Add a viewer to the live set
    ///
    /// The returned session must be kept for as long as the viewer is
    /// connected; dropping it unregisters the viewer.
    pub fn register(&self) -> Result<ViewerSession> {
        let max_sessions = self.inner.limits.max_sessions;
        let reserved = self
            .inner
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (max_sessions == 0 || live < max_sessions).then_some(live + 1)
            });
        if reserved.is_err() {
            warn!(max_sessions, "Rejecting viewer, relay at capacity");
            return Err(RelayError::AtCapacity(max_sessions));
        }

        let (tx, rx) = mpsc::channel(self.inner.limits.session_buffer.max(1));
        let session_id = SessionId::new();

        self.inner.sessions.insert(session_id.clone(), tx);
        self.inner.metrics.record_register();

        info!(
            session_id = %session_id,
            live_sessions = self.inner.sessions.len(),
            "Viewer session registered"
        );

        Ok(ViewerSession::new(session_id, rx, self.clone()))
    }

    /// Remove a viewer from the live set
    ///
    /// Returns whether the session was present. Removing an unknown or
    /// already removed session is a no-op.
    pub fn unregister(&self, session_id: &SessionId) -> bool {
        if self.inner.sessions.remove(session_id).is_some() {
            self.inner.live.fetch_sub(1, Ordering::AcqRel);
            info!(
                session_id = %session_id,
                live_sessions = self.inner.sessions.len(),
                "Viewer session unregistered"
            );
            true
        } else {
            debug!(session_id = %session_id, "Session already unregistered");
            false
        }
    }

    /// Push an event to every session currently registered
    ///
    /// Never waits on a viewer. The only error is failing to encode the
    /// event, which no well-formed `TweetEvent` triggers.
    pub fn publish(&self, event: TweetEvent) -> Result<PublishReport> {
        let frame: Frame = ViewerMessage::Tweet(event).encode()?.into();

        let mut report = PublishReport::default();
        let mut closed_sessions = Vec::new();

        // Shard read guards are held while visiting each shard, so a session
        // whose unregister has returned is never sent to.
        for entry in self.inner.sessions.iter() {
            match entry.value().try_send(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    debug!(
                        session_id = %entry.key(),
                        "Viewer buffer full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    report.closed += 1;
                    closed_sessions.push(entry.key().clone());
                }
            }
        }

        for session_id in closed_sessions {
            self.unregister(&session_id);
        }

        self.inner.metrics.record_publish(&report);

        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "Event broadcast complete"
        );

        Ok(report)
    }

    /// Number of live sessions
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    #[must_use]
    pub fn is_registered(&self, session_id: &SessionId) -> bool {
        self.inner.sessions.contains_key(session_id)
    }

    #[must_use]
    pub fn metrics(&self) -> RelayMetricsSnapshot {
        self.inner.metrics.snapshot(self.inner.sessions.len())
    }
}

impl Default for BroadcastRelay {
    fn default() -> Self {
        Self::new(RelayLimits::default())
    }
}
