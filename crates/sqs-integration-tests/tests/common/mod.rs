//! Common test utilities for sqs-client integration tests
//!
//! This module provides:
//! - An in-memory SQS fake that answers signed form requests with XML
//! - Helpers for building a client pointed at a mock server

use md5::{Digest, Md5};
use sqs_client::{Account, Client, ClientConfig, XML_NAMESPACE};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ACCESS_KEY: &str = "123456789ABCDEFGHIJK";
pub const SECRET_ACCESS_KEY: &str = "abcdefghijklmnopqrstuzwxyz/ABCDEFGHIJKLM";

// ============================================================================
// Client Helpers
// ============================================================================

/// Client that sends every request to `server` with the given retry budget
#[allow(dead_code)]
pub fn client_for(server: &MockServer, max_retries: u32) -> Client {
    let account = Account::new(ACCESS_KEY, SECRET_ACCESS_KEY).expect("valid test credentials");
    Client::builder(account)
        .config(
            ClientConfig::default()
                .with_endpoint(format!("{}/", server.uri()))
                .with_max_retries(max_retries),
        )
        .build()
        .expect("client should build")
}

/// Start a mock server backed by a fresh [`FakeSqs`]
#[allow(dead_code)]
pub async fn start_fake_sqs() -> (MockServer, FakeSqs) {
    let server = MockServer::start().await;
    let fake = FakeSqs::new(server.uri());
    Mock::given(method("POST"))
        .respond_with(fake.clone())
        .mount(&server)
        .await;
    (server, fake)
}

// ============================================================================
// Fake Service
// ============================================================================

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    body: String,
    handle: Option<String>,
}

#[derive(Debug, Default)]
struct FakeQueue {
    visibility_timeout: i64,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
struct State {
    queues: BTreeMap<String, FakeQueue>,
    sequence: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}-{:08}", prefix, self.sequence)
    }
}

/// Minimal stateful stand-in for the queue service
///
/// Messages become invisible once received and never reappear; deleting a
/// message requires the receipt handle issued by the last receive.
#[derive(Clone)]
pub struct FakeSqs {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl FakeSqs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Number of stored messages, visible or not, in queue `name`
    #[allow(dead_code)]
    pub fn stored_messages(&self, name: &str) -> Option<usize> {
        let state = self.state.lock().unwrap();
        state.queues.get(name).map(|q| q.messages.len())
    }

    fn queue_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn handle(&self, request: &Request) -> ResponseTemplate {
        let params: BTreeMap<String, String> = url::form_urlencoded::parse(&request.body)
            .into_owned()
            .collect();
        let action = params.get("Action").map(String::as_str).unwrap_or("");
        let queue_name = request.url.path().trim_start_matches('/').to_string();
        let mut state = self.state.lock().unwrap();

        match action {
            "CreateQueue" => {
                let name = params.get("QueueName").cloned().unwrap_or_default();
                let timeout = params
                    .get("DefaultVisibilityTimeout")
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30);
                match state.queues.get(&name).map(|q| q.visibility_timeout) {
                    Some(existing) if existing != timeout => {
                        return error(
                            "QueueAlreadyExists",
                            "A queue already exists with this name.",
                        );
                    }
                    Some(_) => {}
                    None => {
                        state.queues.insert(
                            name.clone(),
                            FakeQueue {
                                visibility_timeout: timeout,
                                messages: Vec::new(),
                            },
                        );
                    }
                }
                success(
                    "CreateQueue",
                    &format!("<QueueUrl>{}</QueueUrl>", self.queue_url(&name)),
                )
            }
            "ListQueues" => {
                let prefix = params.get("QueueNamePrefix").cloned().unwrap_or_default();
                let urls: String = state
                    .queues
                    .keys()
                    .filter(|name| name.starts_with(&prefix))
                    .map(|name| format!("<QueueUrl>{}</QueueUrl>", self.queue_url(name)))
                    .collect();
                success("ListQueues", &urls)
            }
            "DeleteQueue" => match state.queues.remove(&queue_name) {
                Some(_) => empty("DeleteQueue"),
                None => non_existent_queue(),
            },
            "SendMessage" => {
                let body = params.get("MessageBody").cloned().unwrap_or_default();
                let id = state.next_id("message");
                let Some(queue) = state.queues.get_mut(&queue_name) else {
                    return non_existent_queue();
                };
                queue.messages.push(StoredMessage {
                    id: id.clone(),
                    body: body.clone(),
                    handle: None,
                });
                success(
                    "SendMessage",
                    &format!(
                        "<MD5OfMessageBody>{}</MD5OfMessageBody><MessageId>{}</MessageId>",
                        md5_hex(&body),
                        id
                    ),
                )
            }
            "ReceiveMessage" => {
                let count: usize = params
                    .get("MaxNumberOfMessages")
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(1);
                let handle_base = state.next_id("handle");
                let Some(queue) = state.queues.get_mut(&queue_name) else {
                    return non_existent_queue();
                };
                let mut messages = String::new();
                for (index, message) in queue
                    .messages
                    .iter_mut()
                    .filter(|m| m.handle.is_none())
                    .take(count)
                    .enumerate()
                {
                    let handle = format!("{}-{}", handle_base, index);
                    messages.push_str(&format!(
                        "<Message><MessageId>{}</MessageId><ReceiptHandle>{}</ReceiptHandle>\
                         <MD5OfBody>{}</MD5OfBody><Body>{}</Body></Message>",
                        message.id,
                        handle,
                        md5_hex(&message.body),
                        escape(&message.body)
                    ));
                    message.handle = Some(handle);
                }
                success("ReceiveMessage", &messages)
            }
            "DeleteMessage" => {
                let handle = params.get("ReceiptHandle").cloned().unwrap_or_default();
                let Some(queue) = state.queues.get_mut(&queue_name) else {
                    return non_existent_queue();
                };
                queue
                    .messages
                    .retain(|m| m.handle.as_deref() != Some(handle.as_str()));
                empty("DeleteMessage")
            }
            "GetQueueAttributes" => {
                let Some(queue) = state.queues.get(&queue_name) else {
                    return non_existent_queue();
                };
                let visible = queue.messages.iter().filter(|m| m.handle.is_none()).count();
                success(
                    "GetQueueAttributes",
                    &format!(
                        "{}{}",
                        attribute("VisibilityTimeout", &queue.visibility_timeout.to_string()),
                        attribute("ApproximateNumberOfMessages", &visible.to_string())
                    ),
                )
            }
            "SetQueueAttributes" => {
                let Some(queue) = state.queues.get_mut(&queue_name) else {
                    return non_existent_queue();
                };
                if params.get("Attribute.Name").map(String::as_str) == Some("VisibilityTimeout") {
                    if let Some(timeout) =
                        params.get("Attribute.Value").and_then(|v| v.parse().ok())
                    {
                        queue.visibility_timeout = timeout;
                    }
                }
                empty("SetQueueAttributes")
            }
            other => error(
                "InvalidAction",
                &format!("The action {} is not valid for this endpoint.", other),
            ),
        }
    }
}

impl Respond for FakeSqs {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.handle(request)
    }
}

// ============================================================================
// Response Builders
// ============================================================================

fn success(action: &str, result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"<{action}Response xmlns="{XML_NAMESPACE}"><{action}Result>{result}</{action}Result><ResponseMetadata><RequestId>fake</RequestId></ResponseMetadata></{action}Response>"#
    ))
}

fn empty(action: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"<{action}Response xmlns="{XML_NAMESPACE}"><ResponseMetadata><RequestId>fake</RequestId></ResponseMetadata></{action}Response>"#
    ))
}

fn error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_string(format!(
        r#"<ErrorResponse xmlns="{XML_NAMESPACE}"><Error><Type>Sender</Type><Code>{code}</Code><Message>{}</Message></Error><RequestId>fake</RequestId></ErrorResponse>"#,
        escape(message)
    ))
}

fn non_existent_queue() -> ResponseTemplate {
    error(
        "AWS.SimpleQueueService.NonExistentQueue",
        "The specified queue does not exist for this wsdl version.",
    )
}

fn attribute(name: &str, value: &str) -> String {
    format!("<Attribute><Name>{name}</Name><Value>{value}</Value></Attribute>")
}

fn md5_hex(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
