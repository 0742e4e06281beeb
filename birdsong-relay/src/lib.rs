//! In-memory fan-out of upstream events to connected viewers

pub mod error;
pub mod handler;
pub mod hub;
pub mod metrics;
pub mod session;

pub use error::{RelayError, Result};
pub use hub::{BroadcastRelay, Frame, PublishReport, RelayLimits};
pub use metrics::RelayMetricsSnapshot;
pub use session::ViewerSession;
