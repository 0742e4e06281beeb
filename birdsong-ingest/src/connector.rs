use birdsong_core::models::TweetEvent;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::decode::{decode_line, ControlNotice, StreamLine};
use crate::error::IngestError;
use crate::filter::StreamFilter;
use crate::source::StatusSource;

/// Callbacks wired to a subscription when it is opened
///
/// `on_event` runs inline in the read loop: the next line is not read until
/// it returns, so it must not wait on anything slow.
pub trait SubscriptionHandler: Send + Sync {
    fn on_event(&self, event: TweetEvent);

    /// Called exactly once if the subscription fails; never after a close
    fn on_error(&self, error: &IngestError);
}

/// How a subscription ended
#[derive(Debug)]
pub enum SubscriptionEnd {
    /// Closed by its owner
    Closed,
    /// The upstream stream failed or ended
    Failed(IngestError),
}

/// Opens subscriptions against a status source
#[derive(Clone)]
pub struct IngestConnector {
    source: Arc<dyn StatusSource>,
}

impl IngestConnector {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self { source }
    }

    /// Open a subscription and start reading it in a background task
    pub fn open(&self, filter: StreamFilter, handler: Arc<dyn SubscriptionHandler>) -> Subscription {
        self.open_with_cancel(filter, handler, CancellationToken::new())
    }

    /// Like `open`, closing the subscription when `cancel` fires
    pub fn open_with_cancel(
        &self,
        filter: StreamFilter,
        handler: Arc<dyn SubscriptionHandler>,
        cancel: CancellationToken,
    ) -> Subscription {
        let task = tokio::spawn(run_subscription(
            self.source.clone(),
            filter,
            handler,
            cancel.clone(),
        ));

        Subscription { cancel, task }
    }
}

/// A running subscription
///
/// Terminal after the first transport failure. There is no resume; open a
/// new subscription to read again.
pub struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<SubscriptionEnd>,
}

impl Subscription {
    /// Stop reading; the handler gets no further calls
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the subscription to end
    pub async fn finished(self) -> SubscriptionEnd {
        match self.task.await {
            Ok(end) => end,
            Err(e) => SubscriptionEnd::Failed(IngestError::Transport(format!(
                "subscription task aborted: {e}"
            ))),
        }
    }
}

async fn run_subscription(
    source: Arc<dyn StatusSource>,
    filter: StreamFilter,
    handler: Arc<dyn SubscriptionHandler>,
    cancel: CancellationToken,
) -> SubscriptionEnd {
    let error = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            info!("Upstream subscription closed");
            return SubscriptionEnd::Closed;
        }
        error = read_stream(source.as_ref(), &filter, handler.as_ref()) => error,
    };

    error!(error = %error, "Upstream stream failed, subscription terminated");
    handler.on_error(&error);
    SubscriptionEnd::Failed(error)
}

/// Read until the stream breaks; returns the error that ended it
async fn read_stream(
    source: &dyn StatusSource,
    filter: &StreamFilter,
    handler: &dyn SubscriptionHandler,
) -> IngestError {
    let mut lines = match source.open(filter).await {
        Ok(lines) => lines,
        Err(e) => return e,
    };

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => return e,
        };

        match decode_line(&line) {
            Ok(StreamLine::Status(status)) => handler.on_event(TweetEvent::from(status)),
            Ok(StreamLine::KeepAlive) => {}
            Ok(StreamLine::Notice(notice)) => log_notice(&notice),
            Err(e) => warn!(error = %e, "Skipping malformed stream message"),
        }
    }

    IngestError::Transport("upstream closed the stream".to_string())
}

fn log_notice(notice: &ControlNotice) {
    if notice.kind.is_warning() {
        warn!(kind = notice.kind.as_str(), detail = %notice.detail, "Upstream notice");
    } else {
        debug!(kind = notice.kind.as_str(), detail = %notice.detail, "Upstream notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LineStream;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<TweetEvent>>,
        errors: Mutex<Vec<String>>,
    }

    impl SubscriptionHandler for Recorder {
        fn on_event(&self, event: TweetEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn on_error(&self, error: &IngestError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    struct PendingSource;

    #[async_trait]
    impl StatusSource for PendingSource {
        async fn open(&self, _filter: &StreamFilter) -> crate::Result<LineStream> {
            Ok(futures::stream::pending::<crate::Result<String>>().boxed())
        }
    }

    struct RefusingSource;

    #[async_trait]
    impl StatusSource for RefusingSource {
        async fn open(&self, _filter: &StreamFilter) -> crate::Result<LineStream> {
            Err(IngestError::Rejected {
                status: 401,
                body: "Unauthorized".to_string(),
            })
        }
    }

    fn filter() -> StreamFilter {
        StreamFilter::new(["42"], Vec::<String>::new()).unwrap()
    }

    #[tokio::test]
    async fn test_close_does_not_report_error() {
        let recorder = Arc::new(Recorder::default());
        let connector = IngestConnector::new(Arc::new(PendingSource));

        let subscription = connector.open(filter(), recorder.clone());
        subscription.close();

        assert!(matches!(subscription.finished().await, SubscriptionEnd::Closed));
        assert!(recorder.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_reported_once() {
        let recorder = Arc::new(Recorder::default());
        let connector = IngestConnector::new(Arc::new(RefusingSource));

        let end = connector.open(filter(), recorder.clone()).finished().await;

        match end {
            SubscriptionEnd::Failed(e) => assert!(e.is_transport()),
            SubscriptionEnd::Closed => panic!("expected failure"),
        }
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
