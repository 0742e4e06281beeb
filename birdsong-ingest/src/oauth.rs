//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)
//!
//! The streaming endpoint authenticates every request with a user-context
//! signature built from four credentials:
//! - consumer key/secret identify the application
//! - access token key/secret identify the account
//!
//! The signature covers the method, the base URL, and every request
//! parameter (query string, form body, and the `oauth_*` fields).

use base64::Engine;
use birdsong_core::config::TwitterConfig;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use url::Url;

use crate::error::{IngestError, Result};

/// Everything except RFC 3986 unreserved characters is encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_ALPHABET: [char; 62] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J',
    'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1',
    '2', '3', '4', '5', '6', '7', '8', '9',
];

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// The four credentials a signed request needs
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuthCredentials {
    #[must_use]
    pub fn from_config(config: &TwitterConfig) -> Self {
        Self {
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            token: config.access_token_key.clone(),
            token_secret: config.access_token_secret.clone(),
        }
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Produces `Authorization` header values
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    credentials: OAuthCredentials,
}

impl OAuthSigner {
    #[must_use]
    pub const fn new(credentials: OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// Sign a request with a fresh nonce and the current time
    ///
    /// `params` are the form body parameters; query parameters are read from
    /// `url`.
    pub fn authorization(&self, method: &str, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let nonce = nanoid::nanoid!(32, &NONCE_ALPHABET);
        self.authorization_with(method, url, params, &nonce, Utc::now().timestamp())
    }

    /// Sign a request with a caller-chosen nonce and timestamp
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.credentials.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let signature = self.signature(method, url, params, &oauth_params)?;
        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort_unstable();

        let fields = oauth_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {fields}"))
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String> {
        let base = signature_base_string(method, url, params, oauth_params)?;
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.token_secret)
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
            .map_err(|e| IngestError::Configuration(format!("Failed to create HMAC: {e}")))?;
        mac.update(base.as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&base_url&normalized_params`, each part percent-encoded
fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| IngestError::Configuration(format!("invalid stream url {url}: {e}")))?;

    let mut base_url = parsed.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(params.iter().map(|(k, v)| (encode(k), encode(v))))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url.as_str()),
        encode(&normalized)
    ))
}
