//! End-to-end tests for the `sqs` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NAMESPACE: &str = "http://queue.amazonaws.com/doc/2009-02-01/";

/// `sqs` command isolated from any configuration in the calling environment
fn sqs() -> Command {
    let mut cmd = Command::cargo_bin("sqs").unwrap();
    for var in [
        "SQS_CONFIG",
        "SQS_ACCESS_KEY",
        "SQS_SECRET_ACCESS_KEY",
        "SQS_ENDPOINT",
        "SQS_MAX_RETRIES",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config_for(server: &MockServer) -> NamedTempFile {
    config_file(&format!(
        "access_key = 123456789ABCDEFGHIJK\n\
         secret_access_key = abcdefghijklmnopqrstuzwxyz/ABCDEFGHIJKLM\n\
         endpoint = {}/\n\
         max_retries = 0\n",
        server.uri()
    ))
}

#[test]
fn unknown_command_fails() {
    sqs()
        .arg("something")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn unknown_command_exits_with_one() {
    sqs().arg("bogus").assert().code(1);
}

#[test]
fn missing_argument_exits_with_one() {
    sqs()
        .arg("create")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("<QUEUE_NAME>"));
}

#[test]
fn help_exits_with_zero() {
    sqs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_exits_with_zero() {
    sqs()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_needs_no_configuration() {
    sqs()
        .args(["--config", "/nonexistent/sqs.ini", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_configuration_file_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("sqs.ini");

    sqs()
        .arg("--config")
        .arg(&missing)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("was not found"));
}

#[test]
fn incomplete_configuration_exits_with_one() {
    let file = config_file("access_key = 123456789ABCDEFGHIJK\n");

    sqs()
        .arg("--config")
        .arg(file.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("secret_access_key"));
}

#[test]
fn configuration_path_from_environment() {
    let file = config_file("secret_access_key = secret\n");

    sqs()
        .env("SQS_CONFIG", file.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("access_key"));
}

#[test]
fn invalid_queue_name_fails_before_any_request() {
    let file = config_file(
        "access_key = AKID\nsecret_access_key = secret\nendpoint = http://127.0.0.1:1/\n",
    );

    sqs()
        .arg("--config")
        .arg(file.path())
        .args(["create", "invalid queue"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not a valid queue name"));
}

#[tokio::test]
async fn create_prints_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=CreateQueue"))
        .and(body_string_contains("QueueName=example"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<CreateQueueResponse xmlns="{NAMESPACE}"><CreateQueueResult><QueueUrl>{}/example</QueueUrl></CreateQueueResult></CreateQueueResponse>"#,
            server.uri()
        )))
        .expect(1)
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .args(["create", "example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New queue has been added."));
}

#[tokio::test]
async fn list_prints_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=ListQueues"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<ListQueuesResponse xmlns="{NAMESPACE}"><ListQueuesResult><QueueUrl>{}/example</QueueUrl></ListQueuesResult></ListQueuesResponse>"#,
            server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/example"))
        .and(body_string_contains("Action=GetQueueAttributes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<GetQueueAttributesResponse xmlns="{NAMESPACE}"><GetQueueAttributesResult><Attribute><Name>VisibilityTimeout</Name><Value>30</Value></Attribute><Attribute><Name>ApproximateNumberOfMessages</Name><Value>4</Value></Attribute></GetQueueAttributesResult></GetQueueAttributesResponse>"#
        )))
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("QUEUE NAME")
                .and(predicate::str::contains(format!("{}/example", server.uri())))
                .and(predicate::str::contains("4 ")),
        );
}

#[tokio::test]
async fn list_without_queues_reports_on_stderr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<ListQueuesResponse xmlns="{NAMESPACE}"><ListQueuesResult/></ListQueuesResponse>"#
        )))
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No queues available."));
}

#[tokio::test]
async fn send_reads_body_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/example"))
        .and(body_string_contains("MessageBody=Services_Amazon_SQS+Unit+Test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<SendMessageResponse xmlns="{NAMESPACE}"><SendMessageResult><MD5OfMessageBody>8b25734299a8efa7eeb74bf261bdc72d</MD5OfMessageBody><MessageId>90b160de-132b-45c6-afea-4679b27a485d</MessageId></SendMessageResult></SendMessageResponse>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .arg("send")
        .arg(format!("{}/example", server.uri()))
        .write_stdin("Services_Amazon_SQS Unit Test")
        .assert()
        .success()
        .stdout("90b160de-132b-45c6-afea-4679b27a485d\n");
}

#[tokio::test]
async fn receive_with_delete_prints_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=ReceiveMessage"))
        .and(body_string_contains("VisibilityTimeout=30"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<ReceiveMessageResponse xmlns="{NAMESPACE}"><ReceiveMessageResult><Message><MessageId>id-1</MessageId><ReceiptHandle>handle-1</ReceiptHandle><Body>hello</Body></Message></ReceiveMessageResult></ReceiveMessageResponse>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=DeleteMessage"))
        .and(body_string_contains("ReceiptHandle=handle-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<DeleteMessageResponse xmlns="{NAMESPACE}"/>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .args(["receive", "--delete"])
        .arg(format!("{}/example", server.uri()))
        .assert()
        .success()
        .stdout("hello");
}

#[tokio::test]
async fn service_error_exits_with_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(format!(
            r#"<ErrorResponse xmlns="{NAMESPACE}"><Error><Code>AWS.SimpleQueueService.NonExistentQueue</Code><Message>gone</Message></Error></ErrorResponse>"#
        )))
        .mount(&server)
        .await;
    let file = config_for(&server);

    sqs()
        .arg("--config")
        .arg(file.path())
        .arg("receive")
        .arg(format!("{}/missing", server.uri()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}
