//! Mapping of service error codes to domain errors.
//!
//! Each [`Operation`] owns a static list of [`FaultRule`]s. A generic
//! [`ServiceError`] is classified against that list once and the first matching
//! rule decides the domain error. Errors that match no rule are returned as
//! [`SqsError::Service`] unchanged.
//!
//! Some rules match on a substring of the service message because the service
//! reports several distinct conditions under `InvalidParameterValue`. Those rules
//! break if the service rewords its messages.

use crate::error::{ServiceError, SqsError};
use tracing::debug;

#[cfg(test)]
#[path = "faults_tests.rs"]
mod tests;

pub const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";
pub const QUEUE_DELETED_RECENTLY: &str = "AWS.SimpleQueueService.QueueDeletedRecently";
pub const QUEUE_NAME_EXISTS: &str = "AWS.SimpleQueueService.QueueNameExists";
pub const QUEUE_ALREADY_EXISTS: &str = "QueueAlreadyExists";
pub const INVALID_ATTRIBUTE_NAME: &str = "InvalidAttributeName";
pub const INVALID_MESSAGE_CONTENTS: &str = "InvalidMessageContents";
pub const MESSAGE_TOO_LONG: &str = "MessageTooLong";
pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";

/// Query API action that can fail with a service error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateQueue,
    DeleteQueue,
    ListQueues,
    SendMessage,
    ReceiveMessage,
    DeleteMessage,
    ChangeMessageVisibility,
    GetQueueAttributes,
    SetQueueAttributes,
    AddPermission,
    RemovePermission,
}

impl Operation {
    /// Value of the `Action` parameter
    pub fn action(&self) -> &'static str {
        match self {
            Self::CreateQueue => "CreateQueue",
            Self::DeleteQueue => "DeleteQueue",
            Self::ListQueues => "ListQueues",
            Self::SendMessage => "SendMessage",
            Self::ReceiveMessage => "ReceiveMessage",
            Self::DeleteMessage => "DeleteMessage",
            Self::ChangeMessageVisibility => "ChangeMessageVisibility",
            Self::GetQueueAttributes => "GetQueueAttributes",
            Self::SetQueueAttributes => "SetQueueAttributes",
            Self::AddPermission => "AddPermission",
            Self::RemovePermission => "RemovePermission",
        }
    }

    /// Rules consulted, in order, when this operation fails
    pub fn rules(&self) -> &'static [FaultRule] {
        match self {
            Self::CreateQueue => CREATE_QUEUE_RULES,
            Self::DeleteQueue | Self::ListQueues => &[],
            Self::SendMessage => SEND_MESSAGE_RULES,
            Self::ReceiveMessage | Self::DeleteMessage => QUEUE_RULES,
            Self::ChangeMessageVisibility => CHANGE_VISIBILITY_RULES,
            Self::GetQueueAttributes | Self::SetQueueAttributes => ATTRIBUTE_RULES,
            Self::AddPermission => ADD_PERMISSION_RULES,
            Self::RemovePermission => REMOVE_PERMISSION_RULES,
        }
    }
}

/// A single `(code, message substring) -> fault` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRule {
    pub code: &'static str,
    /// Substring the service message must contain, if any
    pub message_contains: Option<&'static str>,
    pub fault: Fault,
}

impl FaultRule {
    const fn code(code: &'static str, fault: Fault) -> Self {
        Self {
            code,
            message_contains: None,
            fault,
        }
    }

    const fn message(code: &'static str, contains: &'static str, fault: Fault) -> Self {
        Self {
            code,
            message_contains: Some(contains),
            fault,
        }
    }

    pub fn matches(&self, error: &ServiceError) -> bool {
        self.code == error.code()
            && self
                .message_contains
                .map_or(true, |needle| error.message().contains(needle))
    }
}

/// Domain condition recognized from a service error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    NonExistentQueue,
    QueueDeletedRecently,
    QueueAlreadyExists,
    InvalidAttributeName,
    VisibilityTimeoutOutOfRange,
    InvalidMessageContents,
    MessageTooLong,
    PermissionLabelExists,
    PermissionLabelMissing,
}

const NON_EXISTENT_QUEUE_RULE: FaultRule =
    FaultRule::code(NON_EXISTENT_QUEUE, Fault::NonExistentQueue);

const CREATE_QUEUE_RULES: &[FaultRule] = &[
    FaultRule::code(QUEUE_DELETED_RECENTLY, Fault::QueueDeletedRecently),
    FaultRule::code(QUEUE_NAME_EXISTS, Fault::QueueAlreadyExists),
    FaultRule::code(QUEUE_ALREADY_EXISTS, Fault::QueueAlreadyExists),
];

const SEND_MESSAGE_RULES: &[FaultRule] = &[
    FaultRule::code(INVALID_MESSAGE_CONTENTS, Fault::InvalidMessageContents),
    FaultRule::code(MESSAGE_TOO_LONG, Fault::MessageTooLong),
    FaultRule::message(
        INVALID_PARAMETER_VALUE,
        "Message body must be shorter than",
        Fault::MessageTooLong,
    ),
    NON_EXISTENT_QUEUE_RULE,
];

const QUEUE_RULES: &[FaultRule] = &[NON_EXISTENT_QUEUE_RULE];

const CHANGE_VISIBILITY_RULES: &[FaultRule] = &[
    FaultRule::message(
        INVALID_PARAMETER_VALUE,
        "parameter VisibilityTimeout",
        Fault::VisibilityTimeoutOutOfRange,
    ),
    NON_EXISTENT_QUEUE_RULE,
];

const ATTRIBUTE_RULES: &[FaultRule] = &[
    FaultRule::code(INVALID_ATTRIBUTE_NAME, Fault::InvalidAttributeName),
    NON_EXISTENT_QUEUE_RULE,
];

const ADD_PERMISSION_RULES: &[FaultRule] = &[
    FaultRule::message(
        INVALID_PARAMETER_VALUE,
        "Reason: Already exists",
        Fault::PermissionLabelExists,
    ),
    NON_EXISTENT_QUEUE_RULE,
];

const REMOVE_PERMISSION_RULES: &[FaultRule] = &[
    FaultRule::message(
        INVALID_PARAMETER_VALUE,
        "Reason: Does not exist",
        Fault::PermissionLabelMissing,
    ),
    NON_EXISTENT_QUEUE_RULE,
];

/// First fault whose rule matches `error` for `operation`
pub fn classify(operation: Operation, error: &ServiceError) -> Option<Fault> {
    operation
        .rules()
        .iter()
        .find(|rule| rule.matches(error))
        .map(|rule| rule.fault)
}

/// Values of the failed call used to fill in domain errors
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultContext<'a> {
    /// Queue URL, or queue name for `CreateQueue`
    pub queue: &'a str,
    pub attribute: &'a str,
    pub timeout: i64,
    pub body: &'a str,
    pub label: &'a str,
}

impl<'a> FaultContext<'a> {
    pub fn queue(queue: &'a str) -> Self {
        Self {
            queue,
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, attribute: &'a str) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn with_timeout(mut self, timeout: i64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_body(mut self, body: &'a str) -> Self {
        self.body = body;
        self
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }
}

impl Fault {
    /// Build the domain error for this fault
    pub fn into_error(self, context: &FaultContext<'_>) -> SqsError {
        match self {
            Self::NonExistentQueue => SqsError::InvalidQueue {
                message: format!("The queue \"{}\" does not exist.", context.queue),
                name: context.queue.to_string(),
            },
            Self::QueueDeletedRecently => SqsError::InvalidQueue {
                message: format!(
                    "The queue \"{}\" was deleted recently. Please wait 60 seconds after \
                     deleting a queue before creating a queue of the same name.",
                    context.queue
                ),
                name: context.queue.to_string(),
            },
            Self::QueueAlreadyExists => SqsError::InvalidQueue {
                message: format!(
                    "The queue \"{}\" already exists. To set a different visibility \
                     timeout, use the Queue::set_attribute() method.",
                    context.queue
                ),
                name: context.queue.to_string(),
            },
            Self::InvalidAttributeName => SqsError::InvalidAttribute {
                message: format!(
                    "The attribute name \"{}\" is not a valid attribute name.",
                    context.attribute
                ),
                name: context.attribute.to_string(),
            },
            Self::VisibilityTimeoutOutOfRange => SqsError::InvalidTimeout {
                message: format!(
                    "The specified timeout {} falls outside the allowable range (0-43200)",
                    context.timeout
                ),
                timeout: context.timeout,
            },
            Self::InvalidMessageContents => SqsError::InvalidMessage {
                message: "The message contains characters outside the allowed set."
                    .to_string(),
                body: context.body.to_string(),
            },
            Self::MessageTooLong => SqsError::InvalidMessage {
                message: "The message size can not exceed 8192 bytes.".to_string(),
                body: context.body.to_string(),
            },
            Self::PermissionLabelExists => SqsError::InvalidPermissionLabel {
                message: format!(
                    "The permission label \"{}\" already exists.",
                    context.label
                ),
                label: context.label.to_string(),
            },
            Self::PermissionLabelMissing => SqsError::InvalidPermissionLabel {
                message: format!(
                    "The permission label \"{}\" does not exist.",
                    context.label
                ),
                label: context.label.to_string(),
            },
        }
    }
}

/// Convert a service error raised by `operation` into the matching domain error
pub fn map_service_error(
    operation: Operation,
    error: ServiceError,
    context: &FaultContext<'_>,
) -> SqsError {
    match classify(operation, &error) {
        Some(fault) => {
            debug!(
                action = operation.action(),
                code = error.code(),
                fault = ?fault,
                "Mapped service error to domain error"
            );
            fault.into_error(context)
        }
        None => SqsError::Service(error),
    }
}
