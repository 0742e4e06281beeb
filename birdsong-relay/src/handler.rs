//! Connects the ingest side to the relay

use birdsong_core::models::TweetEvent;
use birdsong_ingest::{IngestError, SubscriptionHandler};
use tracing::{debug, error, warn};

use crate::hub::BroadcastRelay;

impl SubscriptionHandler for BroadcastRelay {
    fn on_event(&self, event: TweetEvent) {
        match self.publish(event) {
            Ok(report) => debug!(
                delivered = report.delivered,
                dropped = report.dropped,
                closed = report.closed,
                "Event published"
            ),
            Err(e) => error!(error = %e, "Failed to publish event"),
        }
    }

    fn on_error(&self, error: &IngestError) {
        // Viewers are left connected; they simply stop receiving events
        warn!(
            error = %error,
            live_sessions = self.session_count(),
            "Upstream stream lost, viewers stay connected"
        );
    }
}
