//! Client-side argument checks performed before any request is sent.

use crate::error::SqsError;
use regex::Regex;
use std::sync::OnceLock;

/// Smallest visibility timeout accepted by `receive` and `create_queue`
pub(crate) const MIN_VISIBILITY_TIMEOUT: i64 = 0;

/// Largest visibility timeout accepted by `receive` and `create_queue`
pub(crate) const MAX_VISIBILITY_TIMEOUT: i64 = 7200;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]{1,80}$").expect("identifier pattern is a valid regex")
    })
}

/// Check that `value` is 1-80 characters of `A-Za-z0-9_-`
pub(crate) fn is_valid_identifier(value: &str) -> bool {
    identifier_pattern().is_match(value)
}

pub(crate) fn validate_queue_name(name: &str) -> Result<(), SqsError> {
    if is_valid_identifier(name) {
        return Ok(());
    }
    Err(SqsError::InvalidQueue {
        message: format!(
            "The queue name \"{}\" is not a valid queue name. Queue names must be 1-80 \
             characters long and must consist only of alphanumeric characters, dashes \
             or underscores.",
            name
        ),
        name: name.to_string(),
    })
}

pub(crate) fn validate_permission_label(label: &str) -> Result<(), SqsError> {
    if is_valid_identifier(label) {
        return Ok(());
    }
    Err(SqsError::InvalidPermissionLabel {
        message: format!(
            "The permission label \"{}\" is not a valid label. Permission labels must be \
             1-80 characters long and must consist only of alphanumeric characters, \
             dashes or underscores.",
            label
        ),
        label: label.to_string(),
    })
}

pub(crate) fn validate_visibility_timeout(timeout: i64) -> Result<(), SqsError> {
    if (MIN_VISIBILITY_TIMEOUT..=MAX_VISIBILITY_TIMEOUT).contains(&timeout) {
        return Ok(());
    }
    Err(SqsError::InvalidTimeout {
        message: format!(
            "The specified timeout falls outside the allowable range ({}-{})",
            MIN_VISIBILITY_TIMEOUT, MAX_VISIBILITY_TIMEOUT
        ),
        timeout,
    })
}
