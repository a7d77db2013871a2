//! Request signing for the SQS query API.
//!
//! Two mutually exclusive algorithms are supported:
//!
//! - **Version 1**: HMAC-SHA1 over the concatenation of every `key + value` pair,
//!   sorted case-insensitively by key, without any encoding. `SignatureVersion=1`
//!   is part of the signed data.
//! - **Version 2**: HMAC-SHA256 (or HMAC-SHA1) over a canonical string built from
//!   the HTTP method, host, path and the RFC 3986 encoded parameters sorted by byte
//!   order.
//!
//! Signing is pure: the caller's parameters are borrowed and a new, signed set is
//! returned.

use crate::request::Parameters;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use std::borrow::Cow;
use std::fmt;
use url::Url;

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Signature algorithm generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureVersion {
    /// Legacy concatenation scheme, always HMAC-SHA1
    V1,
    /// Canonical string-to-sign scheme
    #[default]
    V2,
}

impl SignatureVersion {
    /// Value of the `SignatureVersion` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HMAC digest used by signature version 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMethod {
    #[default]
    HmacSha256,
    /// Fallback for endpoints that do not accept SHA-256 signatures
    HmacSha1,
}

impl SignatureMethod {
    /// Value of the `SignatureMethod` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha256 => "HmacSHA256",
            Self::HmacSha1 => "HmacSHA1",
        }
    }

    /// Compute the raw HMAC digest of `data` keyed with `key`
    pub fn digest(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            Self::HmacSha256 => {
                let mut mac =
                    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signer for query API requests
///
/// # Examples
///
/// ```
/// use sqs_client::{Parameters, SignatureMethod, SignatureVersion, Signer};
/// use url::Url;
///
/// let signer = Signer::new(SignatureVersion::V2, SignatureMethod::HmacSha256);
/// let mut params = Parameters::new();
/// params.insert("Action".to_string(), "ListQueues".to_string());
///
/// let url = Url::parse("http://queue.amazonaws.com/").unwrap();
/// let signed = signer.sign(&params, "secret", &url);
///
/// assert_eq!(signed["SignatureVersion"], "2");
/// assert_eq!(signed["SignatureMethod"], "HmacSHA256");
/// assert!(signed.contains_key("Signature"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signer {
    version: SignatureVersion,
    method: SignatureMethod,
}

impl Signer {
    /// Create a signer for the given algorithm generation and digest
    ///
    /// The digest only applies to version 2. Version 1 always uses HMAC-SHA1.
    pub fn new(version: SignatureVersion, method: SignatureMethod) -> Self {
        Self { version, method }
    }

    /// Signature algorithm generation
    pub fn version(&self) -> SignatureVersion {
        self.version
    }

    /// Sign `parameters` for a POST request to `url`
    ///
    /// Returns a new parameter set with `Signature` and `SignatureVersion` filled in,
    /// plus `SignatureMethod` for version 2.
    pub fn sign(&self, parameters: &Parameters, secret_key: &str, url: &Url) -> Parameters {
        match self.version {
            SignatureVersion::V1 => sign_v1(parameters, secret_key),
            SignatureVersion::V2 => sign_v2(parameters, secret_key, url, self.method),
        }
    }
}

fn sign_v1(parameters: &Parameters, secret_key: &str) -> Parameters {
    let mut signed = parameters.clone();
    signed.remove("Signature");
    signed.remove("SignatureMethod");

    // Without it the service assumes the obsolete version 0
    signed.insert(
        "SignatureVersion".to_string(),
        SignatureVersion::V1.as_str().to_string(),
    );

    let data = v1_string_to_sign(&signed);
    let digest = SignatureMethod::HmacSha1.digest(secret_key.as_bytes(), data.as_bytes());

    signed.insert("Signature".to_string(), STANDARD.encode(digest));
    signed
}

fn sign_v2(
    parameters: &Parameters,
    secret_key: &str,
    url: &Url,
    method: SignatureMethod,
) -> Parameters {
    let mut signed = parameters.clone();
    signed.remove("Signature");
    signed.remove("SignatureVersion");
    signed.remove("SignatureMethod");

    signed.insert(
        "SignatureVersion".to_string(),
        SignatureVersion::V2.as_str().to_string(),
    );
    signed.insert("SignatureMethod".to_string(), method.as_str().to_string());

    let data = v2_string_to_sign(&signed, url);
    let digest = method.digest(secret_key.as_bytes(), data.as_bytes());

    signed.insert("Signature".to_string(), STANDARD.encode(digest));
    signed
}

/// Concatenation of `key + value` pairs sorted case-insensitively by key
///
/// Keys differing only by case are ordered byte-wise so the output is deterministic.
pub(crate) fn v1_string_to_sign(parameters: &Parameters) -> String {
    let mut entries: Vec<(&String, &String)> = parameters
        .iter()
        .filter(|(key, _)| key.as_str() != "Signature")
        .collect();
    entries.sort_by(|(a, _), (b, _)| {
        a.to_ascii_lowercase()
            .cmp(&b.to_ascii_lowercase())
            .then_with(|| a.cmp(b))
    });

    entries
        .into_iter()
        .map(|(key, value)| format!("{}{}", key, value))
        .collect()
}

/// Canonical `POST\n<host>\n<path>\n<encoded parameters>` string
///
/// `Parameters` is ordered by raw key bytes, which is the canonical order.
pub(crate) fn v2_string_to_sign(parameters: &Parameters, url: &Url) -> String {
    let encoded = parameters
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = match url.path() {
        "" => "/",
        path => path,
    };

    format!("POST\n{}\n{}\n{}", host, path, encoded)
}

/// RFC 3986 percent-encoding; only `A-Za-z0-9-._~` are left unescaped
pub fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}
