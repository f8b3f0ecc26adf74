//! # QuillMail
//!
//! QuillMail builds validated email messages and hands them to a transport.
//!
//! Addresses are checked as they are added, headers are checked for empty
//! names and values, and the finished message is frozen exactly once.
//!
//! ## Quick Start
//!
//! ```rust
//! use quillmail::{ChannelTransport, Email};
//! use std::time::Duration;
//!
//! let (transport, rx) = ChannelTransport::channel();
//!
//! let mut email = Email::new();
//! email
//!     .set_host_name("mail.example.com")
//!     .set_from("Sender <from@example.com>")
//!     .set_subject("Hello")
//!     .set_msg("Hello World");
//! email.add_to("to@example.com")?;
//! email.add_header("X-Mailer", "quillmail")?;
//!
//! let message_id = email.send(&transport)?;
//!
//! let delivery = rx.recv_timeout(Duration::from_millis(100))?;
//! assert_eq!(delivery.message_id, message_id);
//! assert_eq!(delivery.get_subject(), Some("Hello"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Lifecycle
//!
//! An [`Email`] starts empty, accepts any number of setter and `add_*` calls,
//! and is then built once with [`Email::build`] (or [`Email::send`]). A
//! second build fails with [`EmailError::AlreadyBuilt`].
//!
//! ## Errors
//!
//! Every [`EmailError`] belongs to one [`ErrorKind`]:
//!
//! - `Argument` - an empty header name or value
//! - `Validation` - bad addresses, missing sender or receivers, no host name
//! - `Fatal` - building a message twice
//! - `Transport` - the transport provider failed
//!
//! ## Sessions
//!
//! [`Email::mail_session`] derives a [`MailSession`] from the host name,
//! ports, SSL flag and timeouts. A session installed with
//! [`Email::set_mail_session`] takes precedence, and [`Email::host_name`]
//! then reports that session's host rather than the builder's own.
//!
//! ## Notes
//!
//! - No network delivery is performed; implement [`Transport`] to send.
//! - Bcc recipients are part of the envelope only and never rendered.
//! - Attachments and internationalized addresses are not supported.

mod mail;

pub use mail::session::{
    MAIL_HOST, MAIL_PORT, MAIL_SMTP_CONNECTIONTIMEOUT, MAIL_SMTP_SOCKET_FACTORY_PORT,
    MAIL_SMTP_SSL_ENABLE, MAIL_SMTP_TIMEOUT, MAIL_TRANSPORT_PROTOCOL,
};
pub use mail::{
    Address, AddressError, AddressLimits, BuilderState, ChannelTransport, Delivery, Email,
    EmailError, ErrorKind, MailSession, MimeMessage, Transport, TransportError,
};
pub use mail::builder::{DEFAULT_SMTP_PORT, DEFAULT_SOCKET_TIMEOUT, DEFAULT_SSL_SMTP_PORT};
