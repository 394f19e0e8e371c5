//! The HTTP mail adapter against a mock relay.

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use workspace_access::config::MailConfig;
use workspace_access::domain::ports::{MailMessage, MailSender, MailTemplate};
use workspace_access::infra::mail::{build_mail_sender, HttpMailSender};

fn invitation_mail() -> MailMessage {
    MailMessage::new(MailTemplate::WorkspaceInvitation, "bob@example.com")
        .var("workspace_name", "Design")
        .var("accept_url", "http://localhost:8087/invite/abc")
}

#[tokio::test]
async fn posts_message_as_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/send")
            .header("content-type", "application/json")
            .json_body(json!({
                "template": "workspace_invitation",
                "from": "no-reply@workhub.local",
                "to": "bob@example.com",
                "variables": {
                    "accept_url": "http://localhost:8087/invite/abc",
                    "workspace_name": "Design"
                }
            }));
        then.status(202);
    });

    let endpoint = Url::parse(&server.url("/send")).unwrap();
    let sender: Arc<dyn MailSender> = Arc::new(HttpMailSender::new(
        reqwest::Client::new(),
        endpoint,
        "no-reply@workhub.local",
    ));

    let result = sender.send(invitation_mail()).await;

    mock.assert();
    assert!(result.is_ok());
}

#[tokio::test]
async fn relay_error_status_is_an_error() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(POST).path("/send");
        then.status(503);
    });

    let cfg = MailConfig {
        relay_url: Some(server.url("/send")),
        ..MailConfig::default()
    };
    let sender = build_mail_sender(&cfg).unwrap();

    let err = sender.send(invitation_mail()).await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn without_relay_mail_is_logged_only() {
    let sender = build_mail_sender(&MailConfig::default()).unwrap();
    assert!(sender.send(invitation_mail()).await.is_ok());
}

#[test]
fn malformed_relay_url_is_rejected() {
    let cfg = MailConfig {
        relay_url: Some("not a url".into()),
        ..MailConfig::default()
    };
    assert!(build_mail_sender(&cfg).is_err());
}
