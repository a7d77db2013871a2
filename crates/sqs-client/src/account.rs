//! Access key credentials.

use crate::error::SqsError;
use std::fmt;

/// AWS access key id and secret access key pair
///
/// Immutable once constructed. The secret is never included in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    access_key: String,
    secret_access_key: String,
}

impl Account {
    /// Create new account credentials
    ///
    /// # Errors
    ///
    /// Returns [`SqsError::InvalidArgument`] if either part is empty.
    pub fn new(
        access_key: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self, SqsError> {
        let access_key = access_key.into();
        let secret_access_key = secret_access_key.into();

        if access_key.is_empty() {
            return Err(SqsError::invalid_argument("access key must be specified"));
        }
        if secret_access_key.is_empty() {
            return Err(SqsError::invalid_argument(
                "if the access key is specified, the secret access key must be specified as well",
            ));
        }

        Ok(Self {
            access_key,
            secret_access_key,
        })
    }

    /// Access key id, sent with every request as `AWSAccessKeyId`
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Secret access key used to sign requests
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}
