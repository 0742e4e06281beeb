use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hub::PublishReport;

/// Lifetime counters for a relay
#[derive(Debug, Default)]
pub(crate) struct RelayMetrics {
    sessions_registered: AtomicU64,
    events_published: AtomicU64,
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    sessions_closed: AtomicU64,
}

impl RelayMetrics {
    pub(crate) fn record_register(&self) {
        self.sessions_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self, report: &PublishReport) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.frames_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.frames_dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
        self.sessions_closed
            .fetch_add(report.closed as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, live_sessions: usize) -> RelayMetricsSnapshot {
        RelayMetricsSnapshot {
            live_sessions,
            sessions_registered: self.sessions_registered.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of relay counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayMetricsSnapshot {
    pub live_sessions: usize,
    pub sessions_registered: u64,
    pub events_published: u64,
    pub frames_delivered: u64,
    /// Frames shed because a viewer's buffer was full
    pub frames_dropped: u64,
    /// Sessions found closed during a publish
    pub sessions_closed: u64,
}
