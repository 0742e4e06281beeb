//! Upstream status stream ingestion
//!
//! - `client`: signed HTTP client for the vendor filter stream
//! - `connector`: turns a line stream into `TweetEvent` callbacks
//! - `supervisor`: optional reconnection layered on top of the connector

pub mod client;
pub mod connector;
pub mod decode;
pub mod error;
pub mod filter;
pub mod oauth;
pub mod source;
pub mod supervisor;

pub use client::TwitterStreamClient;
pub use connector::{IngestConnector, Subscription, SubscriptionEnd, SubscriptionHandler};
pub use error::{IngestError, Result};
pub use filter::StreamFilter;
pub use source::{LineStream, StatusSource};
pub use supervisor::{StreamSupervisor, SupervisorExit};
