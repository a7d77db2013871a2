//! Queue creation, deletion and listing.

use crate::client::Client;
use crate::config::DEFAULT_VISIBILITY_TIMEOUT;
use crate::error::SqsError;
use crate::faults::{FaultContext, Operation};
use crate::queue::Queue;
use crate::request::Parameters;
use crate::validation::{validate_queue_name, validate_visibility_timeout};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

/// Account-level queue operations, sent to the configured endpoint
#[derive(Debug, Clone)]
pub struct QueueManager {
    client: Client,
}

impl QueueManager {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    fn endpoint(&self) -> &str {
        &self.client.config().endpoint
    }

    /// Create a queue, or return the existing queue of the same name
    ///
    /// New queues get a default visibility timeout of `timeout` seconds, or 30
    /// seconds when `None`.
    ///
    /// # Errors
    ///
    /// - [`SqsError::InvalidQueue`] if the name is malformed, was deleted in the
    ///   last 60 seconds, or exists with a different visibility timeout
    /// - [`SqsError::InvalidTimeout`] if `timeout` is outside `0..=7200`
    ///
    /// Validation errors are returned before any request is made.
    pub async fn create_queue(&self, name: &str, timeout: Option<i64>) -> Result<Queue, SqsError> {
        validate_queue_name(name)?;
        if let Some(timeout) = timeout {
            validate_visibility_timeout(timeout)?;
        }

        let mut parameters = Parameters::new();
        parameters.insert("QueueName".to_string(), name.to_string());
        parameters.insert(
            "DefaultVisibilityTimeout".to_string(),
            timeout.unwrap_or(DEFAULT_VISIBILITY_TIMEOUT).to_string(),
        );

        let document = self
            .client
            .invoke(
                Operation::CreateQueue,
                parameters,
                self.endpoint(),
                FaultContext::queue(name),
            )
            .await?;

        let url = document.text_of("QueueUrl").unwrap_or_default();
        Ok(self.client.queue(url))
    }

    /// Delete a queue and every message in it
    ///
    /// Accepts either a [`Queue`] or a queue URL.
    pub async fn delete_queue(&self, queue: impl AsRef<str>) -> Result<(), SqsError> {
        let url = queue.as_ref();

        self.client
            .invoke(
                Operation::DeleteQueue,
                Parameters::new(),
                url,
                FaultContext::queue(url),
            )
            .await?;

        Ok(())
    }

    /// List queues, optionally only those whose names start with `prefix`
    ///
    /// Queues are returned in the order the service lists them.
    pub async fn list_queues(&self, prefix: Option<&str>) -> Result<Vec<Queue>, SqsError> {
        let mut parameters = Parameters::new();
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            parameters.insert("QueueNamePrefix".to_string(), prefix.to_string());
        }

        let document = self
            .client
            .invoke(
                Operation::ListQueues,
                parameters,
                self.endpoint(),
                FaultContext::default(),
            )
            .await?;

        let queues = document
            .find_all("QueueUrl")
            .into_iter()
            .map(|node| self.client.queue(node.text()))
            .collect();

        Ok(queues)
    }
}
