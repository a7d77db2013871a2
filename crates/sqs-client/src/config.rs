//! Client configuration and protocol constants.

use crate::signer::{SignatureMethod, SignatureVersion};
use std::time::Duration;

/// Service root used for requests that are not addressed to a specific queue
pub const DEFAULT_ENDPOINT: &str = "http://queue.amazonaws.com/";

/// Query API version sent as the `Version` parameter
pub const API_VERSION: &str = "2009-02-01";

/// XML namespace of responses for [`API_VERSION`]
pub const XML_NAMESPACE: &str = "http://queue.amazonaws.com/doc/2009-02-01/";

/// Number of retries performed for 5xx responses unless configured otherwise
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Upper bound for the configurable retry count
///
/// At this limit the final backoff delay is `2^16 - 1` ms, a little over a minute.
pub const MAX_RETRY_LIMIT: u32 = 16;

/// Connect timeout applied to every attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Visibility timeout, in seconds, assigned to queues created without one
pub const DEFAULT_VISIBILITY_TIMEOUT: i64 = 30;

/// Configuration for SQS client behavior.
///
/// Controls the endpoint, signing algorithm, retry behavior and timeouts.
///
/// # Examples
///
/// ```
/// use sqs_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_max_retries(3);
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root for queue-manager requests
    pub endpoint: String,
    /// Signing algorithm generation
    pub signature_version: SignatureVersion,
    /// HMAC digest used by signature version 2
    pub signature_method: SignatureMethod,
    /// Maximum number of retries for 5xx responses, at most [`MAX_RETRY_LIMIT`]
    pub max_retries: u32,
    /// Connect timeout for each attempt
    pub connect_timeout: Duration,
    /// User agent string sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            signature_version: SignatureVersion::V2,
            signature_method: SignatureMethod::HmacSha256,
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: format!("sqs-client/{}/{}", env!("CARGO_PKG_VERSION"), API_VERSION),
        }
    }
}

impl ClientConfig {
    /// Set the service root endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the signature version.
    pub fn with_signature_version(mut self, version: SignatureVersion) -> Self {
        self.signature_version = version;
        self
    }

    /// Set the HMAC digest used for signature version 2.
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }

    /// Set the maximum number of retries, clamped to [`MAX_RETRY_LIMIT`].
    ///
    /// Zero disables retries and backoff entirely.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_RETRY_LIMIT);
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
