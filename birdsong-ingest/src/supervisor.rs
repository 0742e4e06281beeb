//! Reconnection policy layered over the connector
//!
//! A subscription never resumes on its own. The supervisor decides whether a
//! failed one is replaced by a fresh subscription, and how long to wait first.

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use birdsong_core::config::ReconnectConfig;
use birdsong_core::models::TweetEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::connector::{IngestConnector, SubscriptionEnd, SubscriptionHandler};
use crate::error::IngestError;
use crate::filter::StreamFilter;

/// Why `StreamSupervisor::run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The shutdown token fired
    Shutdown,
    /// The policy allowed no further attempts
    GaveUp { attempts: usize },
}

pub struct StreamSupervisor {
    connector: IngestConnector,
    filter: StreamFilter,
    handler: Arc<dyn SubscriptionHandler>,
    policy: ReconnectConfig,
}

impl StreamSupervisor {
    pub fn new(
        connector: IngestConnector,
        filter: StreamFilter,
        handler: Arc<dyn SubscriptionHandler>,
        policy: ReconnectConfig,
    ) -> Self {
        Self {
            connector,
            filter,
            handler,
            policy,
        }
    }

    /// Keep a subscription open until shutdown or until the policy gives up
    ///
    /// `attempts` counts consecutive failed subscriptions. A subscription that
    /// delivered at least one event resets both the count and the backoff.
    pub async fn run(self, shutdown: CancellationToken) -> SupervisorExit {
        let mut backoff = self.backoff();
        let mut attempts = 0usize;

        loop {
            let delivered = Arc::new(AtomicBool::new(false));
            let handler = Arc::new(DeliveryTracker {
                inner: self.handler.clone(),
                delivered: delivered.clone(),
            });

            let subscription =
                self.connector
                    .open_with_cancel(self.filter.clone(), handler, shutdown.child_token());

            if let SubscriptionEnd::Closed = subscription.finished().await {
                return SupervisorExit::Shutdown;
            }

            if delivered.load(Ordering::Acquire) {
                attempts = 0;
                backoff = self.backoff();
            }
            attempts += 1;

            let Some(delay) = backoff.as_mut().and_then(Iterator::next) else {
                error!(attempts, "Upstream stream is down, no further reconnect attempts");
                return SupervisorExit::GaveUp { attempts };
            };

            warn!(
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting to upstream stream after backoff"
            );

            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Stream supervisor cancelled during backoff");
                    return SupervisorExit::Shutdown;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn backoff(&self) -> Option<ExponentialBackoff> {
        match self.policy {
            ReconnectConfig::Never => None,
            ReconnectConfig::Exponential {
                min_delay_ms,
                max_delay_ms,
                max_attempts,
            } => {
                let builder = ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(min_delay_ms))
                    .with_max_delay(Duration::from_millis(max_delay_ms))
                    .with_jitter();
                let builder = if max_attempts == 0 {
                    builder.without_max_times()
                } else {
                    builder.with_max_times(max_attempts)
                };
                Some(builder.build())
            }
        }
    }
}

/// Forwards to the real handler and remembers whether anything arrived
struct DeliveryTracker {
    inner: Arc<dyn SubscriptionHandler>,
    delivered: Arc<AtomicBool>,
}

impl SubscriptionHandler for DeliveryTracker {
    fn on_event(&self, event: TweetEvent) {
        self.delivered.store(true, Ordering::Release);
        self.inner.on_event(event);
    }

    fn on_error(&self, error: &IngestError) {
        self.inner.on_error(error);
    }
}
