//! Assembly of signed query API requests.

use crate::account::Account;
use crate::config::API_VERSION;
use crate::error::SqsError;
use crate::signer::Signer;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use url::Url;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Request parameters keyed by name
///
/// Iteration follows byte-wise key order, which is the canonical order used for
/// signing.
pub type Parameters = BTreeMap<String, String>;

/// A fully assembled request, ready to be sent as a form-encoded POST
///
/// Immutable. The transport builds a fresh HTTP request from it on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    url: Url,
    parameters: Parameters,
}

impl SignedRequest {
    /// Target URL, either the service root or a queue URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Signed form parameters
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Value of the `Action` parameter, if present
    pub fn action(&self) -> Option<&str> {
        self.parameters.get("Action").map(String::as_str)
    }
}

/// Merges caller parameters with authentication parameters and signs them
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder {
    signer: Signer,
}

impl RequestBuilder {
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Build a signed request for `target` stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns [`SqsError::InvalidArgument`] if `target` is not an absolute URL.
    pub fn build(
        &self,
        account: &Account,
        parameters: Parameters,
        target: &str,
    ) -> Result<SignedRequest, SqsError> {
        self.build_at(account, parameters, target, Utc::now())
    }

    /// Build a signed request for `target` stamped with `timestamp`
    ///
    /// `AWSAccessKeyId`, `Version` and `Timestamp` are only added when the caller
    /// did not already supply them.
    pub fn build_at(
        &self,
        account: &Account,
        mut parameters: Parameters,
        target: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<SignedRequest, SqsError> {
        let url = Url::parse(target).map_err(|e| {
            SqsError::invalid_argument(format!("invalid request URL '{}': {}", target, e))
        })?;

        parameters
            .entry("AWSAccessKeyId".to_string())
            .or_insert_with(|| account.access_key().to_string());
        parameters
            .entry("Version".to_string())
            .or_insert_with(|| API_VERSION.to_string());
        parameters
            .entry("Timestamp".to_string())
            .or_insert_with(|| format_timestamp(timestamp));

        let parameters = self
            .signer
            .sign(&parameters, account.secret_access_key(), &url);

        Ok(SignedRequest { url, parameters })
    }
}

/// ISO-8601 in UTC with an explicit `+00:00` offset and second precision
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
}
