//! Message builder with validated recipient lists

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::mail::address::Address;
use crate::mail::error::EmailError;
use crate::mail::message::MimeMessage;
use crate::mail::session::{
    MAIL_HOST, MAIL_PORT, MAIL_SMTP_CONNECTIONTIMEOUT, MAIL_SMTP_SOCKET_FACTORY_PORT,
    MAIL_SMTP_SSL_ENABLE, MAIL_SMTP_TIMEOUT, MAIL_TRANSPORT_PROTOCOL, MailSession,
};
use crate::mail::transport::Transport;

/// Default plain SMTP port
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Default implicit TLS port
pub const DEFAULT_SSL_SMTP_PORT: u16 = 465;

/// Default socket connection and read timeout
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Lifecycle of an [`Email`] builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing has been set yet
    Empty,
    /// At least one setter or add call has run
    Configured,
    /// The message was built; building again is an error
    Built,
}

#[derive(Debug, Clone, Copy)]
enum AddressList {
    To,
    Cc,
    Bcc,
    ReplyTo,
}

impl AddressList {
    fn as_str(self) -> &'static str {
        match self {
            AddressList::To => "to",
            AddressList::Cc => "cc",
            AddressList::Bcc => "bcc",
            AddressList::ReplyTo => "reply_to",
        }
    }
}

/// Where the builder's session came from
#[derive(Debug, Clone)]
enum SessionSource {
    None,
    /// Built from the builder's own settings; dropped when they change
    Derived(MailSession),
    /// Installed by the caller; never rebuilt
    Supplied(MailSession),
}

/// Accumulates sender, recipients, headers and content, then freezes them
/// into a [`MimeMessage`] exactly once.
///
/// Every address is validated when it is added, and a bulk add either commits
/// all of its addresses or none. The from-address is only checked by
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct Email {
    /// Lifecycle state
    state: BuilderState,

    /// SMTP host used to derive a session
    host_name: Option<String>,

    /// Plain SMTP port
    smtp_port: u16,

    /// Port used with implicit TLS
    ssl_smtp_port: u16,

    /// Whether to connect with implicit TLS
    ssl_on_connect: bool,

    /// Socket connection timeout
    socket_connection_timeout: Duration,

    /// Socket read timeout
    socket_timeout: Duration,

    /// Derived or supplied session
    session: SessionSource,

    /// Explicit sent date; `None` means "now"
    sent_date: Option<DateTime<Utc>>,

    /// Sender as set, parsed at build time
    from: Option<String>,

    /// Subject line
    subject: Option<String>,

    /// Message body
    content: Option<String>,

    /// Content type of the body
    content_type: Option<String>,

    /// Charset appended to the content type
    charset: Option<String>,

    /// Primary recipients
    to: Vec<Address>,

    /// Carbon copy recipients
    cc: Vec<Address>,

    /// Blind carbon copy recipients
    bcc: Vec<Address>,

    /// Reply-to addresses
    reply_to: Vec<Address>,

    /// Custom headers in first-insertion order
    headers: Vec<(String, String)>,

    /// The frozen message once built
    message: Option<MimeMessage>,
}

impl Default for Email {
    fn default() -> Self {
        Self::new()
    }
}

impl Email {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            state: BuilderState::Empty,
            host_name: None,
            smtp_port: DEFAULT_SMTP_PORT,
            ssl_smtp_port: DEFAULT_SSL_SMTP_PORT,
            ssl_on_connect: false,
            socket_connection_timeout: DEFAULT_SOCKET_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            session: SessionSource::None,
            sent_date: None,
            from: None,
            subject: None,
            content: None,
            content_type: None,
            charset: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            headers: Vec::new(),
            message: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Whether the one allowed build already happened
    pub fn is_built(&self) -> bool {
        self.state == BuilderState::Built
    }

    fn touch(&mut self) {
        if self.state == BuilderState::Empty {
            self.state = BuilderState::Configured;
        }
    }

    /// Forget a session derived from settings that just changed
    fn invalidate_session(&mut self) {
        if matches!(self.session, SessionSource::Derived(_)) {
            self.session = SessionSource::None;
        }
    }

    // Recipients

    /// Add a primary recipient, e.g. `user@example.com` or `Name <user@example.com>`
    pub fn add_to(&mut self, address: &str) -> Result<&mut Self, EmailError> {
        let address = Address::parse(address)?;
        self.push(AddressList::To, vec![address]);
        Ok(self)
    }

    /// Add a primary recipient with an explicit display name
    pub fn add_to_named(&mut self, address: &str, name: &str) -> Result<&mut Self, EmailError> {
        let address = Address::with_name(address, name)?;
        self.push(AddressList::To, vec![address]);
        Ok(self)
    }

    /// Add several primary recipients; nothing is added unless all of them parse
    pub fn add_to_list<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_list(addresses)?;
        self.push(AddressList::To, addresses);
        Ok(self)
    }

    /// Replace the primary recipients
    pub fn set_to<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.to = parse_list(addresses)?;
        self.touch();
        Ok(self)
    }

    /// Add a carbon copy recipient
    pub fn add_cc(&mut self, address: &str) -> Result<&mut Self, EmailError> {
        let address = Address::parse(address)?;
        self.push(AddressList::Cc, vec![address]);
        Ok(self)
    }

    /// Add a carbon copy recipient with an explicit display name
    pub fn add_cc_named(&mut self, address: &str, name: &str) -> Result<&mut Self, EmailError> {
        let address = Address::with_name(address, name)?;
        self.push(AddressList::Cc, vec![address]);
        Ok(self)
    }

    /// Add several carbon copy recipients; nothing is added unless all of them parse
    pub fn add_cc_list<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_list(addresses)?;
        self.push(AddressList::Cc, addresses);
        Ok(self)
    }

    /// Replace the carbon copy recipients
    pub fn set_cc<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cc = parse_list(addresses)?;
        self.touch();
        Ok(self)
    }

    /// Add a blind carbon copy recipient
    pub fn add_bcc(&mut self, address: &str) -> Result<&mut Self, EmailError> {
        let address = Address::parse(address)?;
        self.push(AddressList::Bcc, vec![address]);
        Ok(self)
    }

    /// Add a blind carbon copy recipient with an explicit display name
    pub fn add_bcc_named(&mut self, address: &str, name: &str) -> Result<&mut Self, EmailError> {
        let address = Address::with_name(address, name)?;
        self.push(AddressList::Bcc, vec![address]);
        Ok(self)
    }

    /// Add several blind carbon copy recipients; nothing is added unless all of them parse
    pub fn add_bcc_list<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_list(addresses)?;
        self.push(AddressList::Bcc, addresses);
        Ok(self)
    }

    /// Replace the blind carbon copy recipients
    pub fn set_bcc<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bcc = parse_list(addresses)?;
        self.touch();
        Ok(self)
    }

    /// Add a reply-to address
    pub fn add_reply_to(&mut self, address: &str) -> Result<&mut Self, EmailError> {
        let address = Address::parse(address)?;
        self.push(AddressList::ReplyTo, vec![address]);
        Ok(self)
    }

    /// Add a reply-to address with an explicit display name
    pub fn add_reply_to_named(
        &mut self,
        address: &str,
        name: &str,
    ) -> Result<&mut Self, EmailError> {
        let address = Address::with_name(address, name)?;
        self.push(AddressList::ReplyTo, vec![address]);
        Ok(self)
    }

    /// Add several reply-to addresses; nothing is added unless all of them parse
    pub fn add_reply_to_list<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_list(addresses)?;
        self.push(AddressList::ReplyTo, addresses);
        Ok(self)
    }

    /// Replace the reply-to addresses
    pub fn set_reply_to<I, S>(&mut self, addresses: I) -> Result<&mut Self, EmailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reply_to = parse_list(addresses)?;
        self.touch();
        Ok(self)
    }

    fn push(&mut self, list: AddressList, addresses: Vec<Address>) {
        debug!(list = list.as_str(), added = addresses.len(), "Adding addresses");
        let target = match list {
            AddressList::To => &mut self.to,
            AddressList::Cc => &mut self.cc,
            AddressList::Bcc => &mut self.bcc,
            AddressList::ReplyTo => &mut self.reply_to,
        };
        target.extend(addresses);
        self.touch();
    }

    /// Primary recipients in insertion order
    pub fn to_addresses(&self) -> &[Address] {
        &self.to
    }

    /// Carbon copy recipients in insertion order
    pub fn cc_addresses(&self) -> &[Address] {
        &self.cc
    }

    /// Blind carbon copy recipients in insertion order
    pub fn bcc_addresses(&self) -> &[Address] {
        &self.bcc
    }

    /// Reply-to addresses in insertion order
    pub fn reply_to_addresses(&self) -> &[Address] {
        &self.reply_to
    }

    // Headers

    /// Set a custom header; a repeated name replaces the earlier value in place.
    ///
    /// Names must be printable ASCII without `:` and values must fit on one
    /// line. A name matching a standard header (`Subject`, `Content-Type`,
    /// ...) replaces that header when the message is rendered.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self, EmailError> {
        if name.is_empty() {
            return Err(EmailError::InvalidArgument("name can not be null or empty"));
        }
        if !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(EmailError::InvalidArgument(
                "name must be printable ASCII without ':'",
            ));
        }
        if value.is_empty() {
            return Err(EmailError::InvalidArgument("value can not be null or empty"));
        }
        if value.contains(['\r', '\n']) {
            return Err(EmailError::InvalidArgument("value can not contain line breaks"));
        }

        match self.headers.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        debug!(name, "Header set");
        self.touch();
        Ok(self)
    }

    /// Custom headers in emission order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the custom header called `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    // Sender, subject, content

    /// Set the sender; the address is validated by [`build`](Self::build)
    pub fn set_from(&mut self, address: impl Into<String>) -> &mut Self {
        self.from = Some(address.into());
        self.touch();
        self
    }

    /// The sender exactly as it was set
    pub fn from_address(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Set the subject line
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self.touch();
        self
    }

    /// The subject line, if set
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Set the body and its content type
    pub fn set_content(
        &mut self,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> &mut Self {
        self.content = Some(content.into());
        self.content_type = Some(content_type.into());
        self.touch();
        self
    }

    /// Set a plain text body
    pub fn set_msg(&mut self, text: impl Into<String>) -> &mut Self {
        self.set_content(text, "text/plain")
    }

    /// The body, if set
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// The content type exactly as it was set
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Set the charset appended to the content type
    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self.touch();
        self
    }

    /// The charset, if set
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Set or clear the sent date
    pub fn set_sent_date(&mut self, date: Option<DateTime<Utc>>) -> &mut Self {
        self.sent_date = date;
        self.touch();
        self
    }

    /// The sent date, or the current time when none is stored.
    ///
    /// The fallback is read from the clock on every call and never stored.
    pub fn sent_date(&self) -> DateTime<Utc> {
        self.sent_date.unwrap_or_else(Utc::now)
    }

    // Session configuration

    /// Set the SMTP host used to derive a session
    pub fn set_host_name(&mut self, host_name: impl Into<String>) -> &mut Self {
        self.host_name = Some(host_name.into());
        self.invalidate_session();
        self.touch();
        self
    }

    /// The host the message would be sent through.
    ///
    /// A session installed with [`set_mail_session`](Self::set_mail_session)
    /// wins: its `mail.smtp.host` property is returned even when unset, and
    /// the builder's own host name is ignored.
    pub fn host_name(&self) -> Option<&str> {
        match &self.session {
            SessionSource::Supplied(session) => session.host(),
            _ => self.host_name.as_deref().filter(|h| !h.is_empty()),
        }
    }

    /// Set the plain SMTP port
    pub fn set_smtp_port(&mut self, port: u16) -> &mut Self {
        self.smtp_port = port;
        self.invalidate_session();
        self.touch();
        self
    }

    /// The plain SMTP port
    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
    }

    /// Set the port used with implicit TLS
    pub fn set_ssl_smtp_port(&mut self, port: u16) -> &mut Self {
        self.ssl_smtp_port = port;
        self.invalidate_session();
        self.touch();
        self
    }

    /// The port used with implicit TLS
    pub fn ssl_smtp_port(&self) -> u16 {
        self.ssl_smtp_port
    }

    /// Connect with implicit TLS instead of plain SMTP
    pub fn set_ssl_on_connect(&mut self, ssl_on_connect: bool) -> &mut Self {
        self.ssl_on_connect = ssl_on_connect;
        self.invalidate_session();
        self.touch();
        self
    }

    /// Whether implicit TLS is requested
    pub fn is_ssl_on_connect(&self) -> bool {
        self.ssl_on_connect
    }

    /// Set the socket connection timeout
    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.socket_connection_timeout = timeout;
        self.invalidate_session();
        self.touch();
        self
    }

    /// The socket connection timeout (60 seconds unless set)
    pub fn socket_connection_timeout(&self) -> Duration {
        self.socket_connection_timeout
    }

    /// Set the socket read timeout
    pub fn set_socket_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.socket_timeout = timeout;
        self.invalidate_session();
        self.touch();
        self
    }

    /// The socket read timeout (60 seconds unless set)
    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    /// Install an externally configured session
    pub fn set_mail_session(&mut self, session: MailSession) -> &mut Self {
        self.session = SessionSource::Supplied(session);
        self.touch();
        self
    }

    /// Return the session, deriving and caching one from the builder's
    /// settings when none exists yet
    pub fn mail_session(&mut self) -> Result<&MailSession, EmailError> {
        if let SessionSource::None = self.session {
            let session = self.derive_session()?;
            debug!(host = ?session.host(), port = ?session.port(), "Mail session created");
            self.session = SessionSource::Derived(session);
        }

        match &self.session {
            SessionSource::Derived(session) | SessionSource::Supplied(session) => Ok(session),
            SessionSource::None => Err(EmailError::MissingHostName),
        }
    }

    fn derive_session(&self) -> Result<MailSession, EmailError> {
        let host = self
            .host_name
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(EmailError::MissingHostName)?;

        let mut session = MailSession::new();
        session.set_property(MAIL_TRANSPORT_PROTOCOL, "smtp");
        session.set_property(MAIL_HOST, host);
        session.set_property(
            MAIL_SMTP_CONNECTIONTIMEOUT,
            self.socket_connection_timeout.as_millis().to_string(),
        );
        session.set_property(MAIL_SMTP_TIMEOUT, self.socket_timeout.as_millis().to_string());

        if self.ssl_on_connect {
            session.set_property(MAIL_PORT, self.ssl_smtp_port.to_string());
            session.set_property(MAIL_SMTP_SOCKET_FACTORY_PORT, self.ssl_smtp_port.to_string());
            session.set_property(MAIL_SMTP_SSL_ENABLE, "true");
        } else {
            session.set_property(MAIL_PORT, self.smtp_port.to_string());
        }

        Ok(session)
    }

    // Build and send

    /// Freeze the builder into a [`MimeMessage`].
    ///
    /// Checks run in a fixed order: already built, missing sender, invalid
    /// sender, missing receivers. A failed build leaves the builder
    /// untouched, so it can be fixed and built again.
    pub fn build(&mut self) -> Result<&MimeMessage, EmailError> {
        if self.state == BuilderState::Built {
            return Err(EmailError::AlreadyBuilt);
        }

        let from = self.from.as_deref().ok_or(EmailError::MissingFrom)?;
        let from = Address::parse(from)?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(EmailError::MissingReceiver);
        }

        let message = MimeMessage {
            message_id: format!("{}@{}", Uuid::new_v4(), from.domain()),
            sent_date: self.sent_date(),
            from,
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            reply_to: self.reply_to.clone(),
            subject: self.subject.clone(),
            content: self.content.clone(),
            content_type: self.content_type.clone(),
            charset: self.charset.clone(),
            headers: self.headers.clone(),
        };

        info!(
            message_id = %message.message_id,
            to = message.to.len(),
            cc = message.cc.len(),
            bcc = message.bcc.len(),
            "Message built"
        );

        self.state = BuilderState::Built;
        Ok(self.message.insert(message))
    }

    /// The built message, once [`build`](Self::build) succeeded
    pub fn mime_message(&self) -> Option<&MimeMessage> {
        self.message.as_ref()
    }

    /// Build the message and hand it to `transport`, returning its message id.
    ///
    /// The session is resolved before building, so a missing host name does
    /// not consume the one allowed build.
    pub fn send<T: Transport + ?Sized>(&mut self, transport: &T) -> Result<String, EmailError> {
        let session = self.mail_session()?.clone();
        let message = self.build()?.clone();

        transport.send(&session, &message)?;

        info!(
            message_id = %message.message_id(),
            host = ?session.host(),
            "Message sent"
        );
        Ok(message.message_id().to_string())
    }
}

/// Parse every address, failing on the first bad one or on an empty input
fn parse_list<I, S>(addresses: I) -> Result<Vec<Address>, EmailError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = addresses
        .into_iter()
        .map(|a| Address::parse(a.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if parsed.is_empty() {
        return Err(EmailError::InvalidAddressList);
    }

    Ok(parsed)
}
