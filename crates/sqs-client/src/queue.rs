//! Operations on a single queue.

use crate::client::Client;
use crate::error::SqsError;
use crate::faults::{FaultContext, Operation};
use crate::request::Parameters;
use crate::validation::{validate_permission_label, validate_visibility_timeout};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Largest number of messages a single receive can return
pub const MAX_RECEIVE_COUNT: u32 = 10;

/// A message returned by [`Queue::receive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Service-assigned message id
    pub id: String,
    pub body: String,
    /// Receipt handle used to delete the message or change its visibility
    pub handle: String,
}

/// An account that is granted access to a queue action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// AWS account number, e.g. `123456789012`
    pub account_id: String,
    /// Action name, e.g. `SendMessage` or `*`
    pub action: String,
}

impl Principal {
    pub fn new(account_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            action: action.into(),
        }
    }
}

/// Queue attributes keyed by name
///
/// Values are kept as returned by the service. Typed accessors parse the
/// well-known numeric attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueAttributes {
    values: BTreeMap<String, String>,
}

impl QueueAttributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }

    /// Default visibility timeout, in seconds
    pub fn visibility_timeout(&self) -> Option<i64> {
        self.get("VisibilityTimeout")?.parse().ok()
    }

    pub fn approximate_number_of_messages(&self) -> Option<u64> {
        self.get("ApproximateNumberOfMessages")?.parse().ok()
    }

    pub fn created_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp("CreatedTimestamp")
    }

    pub fn last_modified_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp("LastModifiedTimestamp")
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let seconds = self.get(name)?.parse::<i64>().ok()?;
        DateTime::from_timestamp(seconds, 0)
    }
}

impl FromIterator<(String, String)> for QueueAttributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A queue, identified by the URL the service assigned to it
///
/// The URL is opaque. It is sent back to the service exactly as received and
/// `Display` prints it unchanged.
#[derive(Debug, Clone)]
pub struct Queue {
    url: String,
    client: Client,
}

impl Queue {
    pub(crate) fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a message, returning its message id
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidMessage`] if the body is too long or contains
    ///   characters the service does not accept
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    /// - [`SqsError::Checksum`] if the MD5 digest reported by the service does not
    ///   match the sent body
    pub async fn send(&self, body: &str) -> Result<String, SqsError> {
        let mut parameters = Parameters::new();
        parameters.insert("MessageBody".to_string(), body.to_string());

        let document = self
            .client
            .invoke(
                Operation::SendMessage,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_body(body),
            )
            .await?;

        let id = document.text_of("MessageId").unwrap_or_default();
        let received = document.text_of("MD5OfMessageBody").unwrap_or_default();
        let expected = hex::encode(Md5::digest(body.as_bytes()));

        if received != expected {
            return Err(SqsError::Checksum {
                message: format!(
                    "Message body was not received by Amazon correctly. Expected MD5 was: \
                     \"{}\", but received MD5 was: \"{}\".",
                    expected, received
                ),
                message_id: id.to_string(),
            });
        }

        Ok(id.to_string())
    }

    /// Receive up to `count` messages
    ///
    /// `count` is clamped to `1..=10`. Received messages stay hidden for `timeout`
    /// seconds, or for the queue's default visibility timeout when `None`.
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidTimeout`] if `timeout` is outside `0..=7200`; no request
    ///   is made
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    pub async fn receive(
        &self,
        count: u32,
        timeout: Option<i64>,
    ) -> Result<Vec<Message>, SqsError> {
        if let Some(timeout) = timeout {
            validate_visibility_timeout(timeout)?;
        }

        let count = count.clamp(1, MAX_RECEIVE_COUNT);

        let mut parameters = Parameters::new();
        parameters.insert("MaxNumberOfMessages".to_string(), count.to_string());
        if let Some(timeout) = timeout {
            parameters.insert("VisibilityTimeout".to_string(), timeout.to_string());
        }

        let document = self
            .client
            .invoke(
                Operation::ReceiveMessage,
                parameters,
                &self.url,
                FaultContext::queue(&self.url),
            )
            .await?;

        let messages = document
            .find_all("Message")
            .into_iter()
            .map(|node| Message {
                id: node.child_text("MessageId").unwrap_or_default().to_string(),
                body: node.child_text("Body").unwrap_or_default().to_string(),
                handle: node.child_text("ReceiptHandle").unwrap_or_default().to_string(),
            })
            .collect();

        Ok(messages)
    }

    /// Delete a received message by its receipt handle
    pub async fn delete(&self, handle: &str) -> Result<(), SqsError> {
        let mut parameters = Parameters::new();
        parameters.insert("ReceiptHandle".to_string(), handle.to_string());

        self.client
            .invoke(
                Operation::DeleteMessage,
                parameters,
                &self.url,
                FaultContext::queue(&self.url),
            )
            .await?;

        Ok(())
    }

    /// Change how long a received message stays hidden
    ///
    /// The timeout is not checked locally. The service accepts `0..=43200` and an
    /// out-of-range value is reported as [`SqsError::InvalidTimeout`].
    pub async fn change_message_visibility(
        &self,
        handle: &str,
        timeout: i64,
    ) -> Result<(), SqsError> {
        let mut parameters = Parameters::new();
        parameters.insert("ReceiptHandle".to_string(), handle.to_string());
        parameters.insert("VisibilityTimeout".to_string(), timeout.to_string());

        self.client
            .invoke(
                Operation::ChangeMessageVisibility,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_timeout(timeout),
            )
            .await?;

        Ok(())
    }

    /// Get the named attributes
    ///
    /// An empty slice requests every attribute, the same as
    /// [`get_all_attributes`](Self::get_all_attributes).
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidAttribute`] if a name is not a known attribute
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    pub async fn get_attributes(&self, names: &[&str]) -> Result<QueueAttributes, SqsError> {
        let names: &[&str] = if names.is_empty() { &["All"] } else { names };

        let mut parameters = Parameters::new();
        if let [name] = names {
            parameters.insert("AttributeName".to_string(), name.to_string());
        } else {
            for (index, name) in names.iter().enumerate() {
                parameters.insert(format!("AttributeName.{}", index + 1), name.to_string());
            }
        }

        let joined = names.join(",");
        let document = self
            .client
            .invoke(
                Operation::GetQueueAttributes,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_attribute(&joined),
            )
            .await?;

        let attributes = document
            .find_all("Attribute")
            .into_iter()
            .map(|node| {
                (
                    node.child_text("Name").unwrap_or_default().to_string(),
                    node.child_text("Value").unwrap_or_default().to_string(),
                )
            })
            .collect();

        Ok(attributes)
    }

    /// Get every attribute of the queue
    pub async fn get_all_attributes(&self) -> Result<QueueAttributes, SqsError> {
        self.get_attributes(&["All"]).await
    }

    /// Set a queue attribute
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidAttribute`] if `name` is not a settable attribute
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    pub async fn set_attribute(&self, name: &str, value: &str) -> Result<(), SqsError> {
        let mut parameters = Parameters::new();
        parameters.insert("Attribute.Name".to_string(), name.to_string());
        parameters.insert("Attribute.Value".to_string(), value.to_string());

        self.client
            .invoke(
                Operation::SetQueueAttributes,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_attribute(name),
            )
            .await?;

        Ok(())
    }

    /// Grant `principals` access to this queue under `label`
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidPermissionLabel`] if the label is malformed or already
    ///   in use
    /// - [`SqsError::InvalidArgument`] if `principals` is empty or has empty fields
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    pub async fn add_permission(
        &self,
        label: &str,
        principals: &[Principal],
    ) -> Result<(), SqsError> {
        validate_permission_label(label)?;

        if principals.is_empty() {
            return Err(SqsError::invalid_argument(
                "at least one principal must be specified",
            ));
        }
        if principals
            .iter()
            .any(|p| p.account_id.is_empty() || p.action.is_empty())
        {
            return Err(SqsError::invalid_argument(
                "each principal must have an account id and an action",
            ));
        }

        let mut parameters = Parameters::new();
        parameters.insert("Label".to_string(), label.to_string());
        for (index, principal) in principals.iter().enumerate() {
            let n = index + 1;
            parameters.insert(format!("AWSAccountId.{}", n), principal.account_id.clone());
            parameters.insert(format!("ActionName.{}", n), principal.action.clone());
        }

        self.client
            .invoke(
                Operation::AddPermission,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_label(label),
            )
            .await?;

        Ok(())
    }

    /// Revoke the permission granted under `label`
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidPermissionLabel`] if the label is malformed or unknown
    /// - [`SqsError::InvalidQueue`] if the queue does not exist
    pub async fn remove_permission(&self, label: &str) -> Result<(), SqsError> {
        validate_permission_label(label)?;

        let mut parameters = Parameters::new();
        parameters.insert("Label".to_string(), label.to_string());

        self.client
            .invoke(
                Operation::RemovePermission,
                parameters,
                &self.url,
                FaultContext::queue(&self.url).with_label(label),
            )
            .await?;

        Ok(())
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for Queue {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Queue {}
