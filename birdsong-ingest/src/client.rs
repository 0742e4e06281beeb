//! Filter stream HTTP client
//!
//! Pure HTTP plumbing: opens the long-lived POST, signs it, and hands back
//! the response body as lines. Decoding happens in the connector.

use async_trait::async_trait;
use birdsong_core::config::TwitterConfig;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Client,
};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::filter::StreamFilter;
use crate::oauth::{OAuthCredentials, OAuthSigner};
use crate::source::{lines_from_bytes, LineStream, StatusSource};

/// Upstream sends a keep-alive at least every 30s; three missed ones means
/// the connection has stalled.
const STALL_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TwitterStreamClient {
    client: Client,
    stream_url: String,
    signer: OAuthSigner,
}

impl TwitterStreamClient {
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("birdsong/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(STALL_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            stream_url: config.stream_url.clone(),
            signer: OAuthSigner::new(OAuthCredentials::from_config(config)),
        })
    }

    #[must_use]
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }
}

#[async_trait]
impl StatusSource for TwitterStreamClient {
    async fn open(&self, filter: &StreamFilter) -> Result<LineStream> {
        let params = filter.params();
        let signed_params: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let authorization = self
            .signer
            .authorization("POST", &self.stream_url, &signed_params)?;

        debug!(url = %self.stream_url, "Opening upstream stream");

        let response = self
            .client
            .post(&self.stream_url)
            .header(AUTHORIZATION, HeaderValue::from_str(&authorization)?)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            url = %self.stream_url,
            follow = filter.follow().len(),
            track = filter.track().len(),
            "Upstream stream connected"
        );

        Ok(lines_from_bytes(response.bytes_stream()))
    }
}
