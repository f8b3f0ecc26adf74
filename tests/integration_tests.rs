//! End-to-end tests for building and sending messages

use quillmail::{
    ChannelTransport, Email, EmailError, ErrorKind, MAIL_HOST, MailSession, MimeMessage,
    Transport, TransportError,
};
use std::cell::Cell;
use std::sync::mpsc;
use std::time::Duration;

struct FailingTransport {
    attempts: Cell<usize>,
}

impl Transport for FailingTransport {
    fn send(&self, _session: &MailSession, _message: &MimeMessage) -> Result<(), TransportError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(TransportError::Other("connection refused".to_string()))
    }
}

fn configured_email() -> Email {
    let mut email = Email::new();
    email
        .set_host_name("mail.host")
        .set_from("from@example.com")
        .set_subject("Quarterly report");
    email.add_to("to@example.com").unwrap();
    email
}

#[test]
fn test_build_with_headers_and_cc() {
    let mut email = Email::new();
    email.set_host_name("mail.host").set_from("from@example.com");
    email.add_to("to@example.com").unwrap();
    email.add_cc("cc@example.com").unwrap();
    email.add_header("Testing", "Big test").unwrap();

    let message = email.build().unwrap();
    assert_eq!(message.headers().len(), 1);
    assert_eq!(message.cc().len(), 1);

    assert_eq!(email.headers().len(), 1);
    assert_eq!(email.cc_addresses().len(), 1);
}

#[test]
fn test_send_delivers_once() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = configured_email();
    email.add_cc("Carol <cc@example.com>").unwrap();
    email.add_bcc("hidden@example.com").unwrap();
    email.set_content("<p>Hi</p>", "text/html").set_charset("UTF-8");

    let message_id = email.send(&transport).unwrap();

    let delivery = rx.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(delivery.message_id, message_id);
    assert_eq!(delivery.host.as_deref(), Some("mail.host"));
    assert_eq!(delivery.port, Some(25));
    assert!(!delivery.ssl_on_connect);
    assert!(delivery.is_from_sender("from@example.com"));
    assert_eq!(
        delivery.to,
        vec!["to@example.com", "cc@example.com", "hidden@example.com"]
    );
    assert_eq!(delivery.get_subject(), Some("Quarterly report"));
    assert_eq!(delivery.get_header("Cc"), Some("\"Carol\" <cc@example.com>"));
    assert_eq!(
        delivery.get_header("Content-Type"),
        Some("text/html; charset=UTF-8")
    );
    assert_eq!(delivery.get_body(), Some("<p>Hi</p>"));
    assert!(!delivery.contains_text("hidden@example.com"));

    assert!(rx.try_recv().is_err());
}

#[test]
fn test_send_twice_is_fatal() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = configured_email();

    email.send(&transport).unwrap();
    let err = email.send(&transport).unwrap_err();

    assert!(matches!(err, EmailError::AlreadyBuilt));
    assert_eq!(err.kind(), ErrorKind::Fatal);
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn test_send_without_host_keeps_builder_buildable() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = Email::new();
    email.set_from("from@example.com");
    email.add_to("to@example.com").unwrap();

    let err = email.send(&transport).unwrap_err();
    assert!(matches!(err, EmailError::MissingHostName));
    assert!(!email.is_built());

    email.set_host_name("mail.host");
    email.send(&transport).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_ok());
}

#[test]
fn test_send_through_supplied_session() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = configured_email();
    email.set_mail_session(MailSession::from_properties([
        (MAIL_HOST, "relay.example.com"),
        ("mail.smtp.port", "587"),
    ]));

    email.send(&transport).unwrap();

    let delivery = rx.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(delivery.host.as_deref(), Some("relay.example.com"));
    assert_eq!(delivery.port, Some(587));
}

#[test]
fn test_ssl_on_connect_uses_ssl_port() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = configured_email();
    email.set_ssl_on_connect(true).set_ssl_smtp_port(4650);

    email.send(&transport).unwrap();

    let delivery = rx.recv_timeout(Duration::from_millis(100)).unwrap();
    assert!(delivery.ssl_on_connect);
    assert_eq!(delivery.port, Some(4650));
}

#[test]
fn test_transport_failure_is_not_retried() {
    let transport = FailingTransport {
        attempts: Cell::new(0),
    };
    let mut email = configured_email();

    let err = email.send(&transport).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.to_string(), "Transport error: connection refused");
    assert_eq!(transport.attempts.get(), 1);
    assert!(email.is_built());
}

#[test]
fn test_closed_channel() {
    let (tx, rx) = mpsc::channel();
    drop(rx);
    let transport = ChannelTransport::new(tx);
    let mut email = configured_email();

    let err = email.send(&transport).unwrap_err();
    assert!(matches!(
        err,
        EmailError::Transport(TransportError::ChannelClosed)
    ));
}

#[test]
fn test_formatted_message_order() {
    let mut email = configured_email();
    email.add_reply_to_named("help@example.com", "Support").unwrap();
    email.add_header("X-Priority", "1").unwrap();
    email.add_header("X-Mailer", "quillmail").unwrap();
    email.set_msg("first\nsecond");

    let raw = email.build().unwrap().formatted();

    let reply_to = raw.find("Reply-To: \"Support\" <help@example.com>").unwrap();
    let to = raw.find("To: to@example.com").unwrap();
    let priority = raw.find("X-Priority: 1").unwrap();
    let mailer = raw.find("X-Mailer: quillmail").unwrap();
    assert!(reply_to < to);
    assert!(priority < mailer);
    assert!(raw.ends_with("\r\n\r\nfirst\r\nsecond"));
}

#[test]
fn test_line_breaks_cannot_inject_headers() {
    let (transport, rx) = ChannelTransport::channel();
    let mut email = configured_email();
    email.set_subject("Hi\r\nBcc: leak@evil.com");
    email.add_to_named("eve@example.com", "Eve\nX-Injected: yes").unwrap();

    let err = email.add_header("X-Tag", "v\r\nX-Injected: yes").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);

    email.send(&transport).unwrap();

    let delivery = rx.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(delivery.get_header("Bcc"), None);
    assert_eq!(delivery.get_header("X-Injected"), None);
    assert_eq!(delivery.get_subject(), Some("Hi Bcc: leak@evil.com"));
}
