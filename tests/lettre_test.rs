use lettre::message::Mailbox;
use quillmail::{Address, ChannelTransport, Email, Transport};
use std::error::Error;
use std::time::Duration;

#[test]
fn addresses_agree_with_lettre_mailbox() -> Result<(), Box<dyn Error>> {
    for raw in [
        "hanako@example.com",
        "Hanako <hanako@example.com>",
        "\"Tarou Yamada\" <tarou@example.com>",
    ] {
        let ours = Address::parse(raw)?;
        let theirs = raw.parse::<Mailbox>()?;

        assert_eq!(ours.email(), theirs.email.to_string());
        assert_eq!(ours.name(), theirs.name.as_deref());
    }

    Ok(())
}

#[test]
fn envelope_is_usable_by_lettre() -> Result<(), Box<dyn Error>> {
    let (transport, rx) = ChannelTransport::channel();

    let mut email = Email::new();
    email
        .set_host_name("localhost")
        .set_from("Hanako <hanako@example.com>")
        .set_subject("Subject");
    email.add_to("Tarou <tarou@example.com>")?;
    email.add_bcc("archive@example.com")?;

    let message = email.build()?.clone();
    let envelope = message.envelope()?;

    assert_eq!(
        envelope.from().map(|a| a.to_string()),
        Some("hanako@example.com".to_string())
    );
    assert_eq!(envelope.to().len(), 2);

    transport.send(email.mail_session()?, &message)?;
    let delivery = rx.recv_timeout(Duration::from_millis(100))?;
    assert_eq!(delivery.from, "hanako@example.com");
    assert_eq!(delivery.to, vec!["tarou@example.com", "archive@example.com"]);

    Ok(())
}
