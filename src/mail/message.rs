//! The frozen message produced by a successful build

use chrono::{DateTime, Utc};
use lettre::address::Envelope;

use crate::mail::address::Address;
use crate::mail::error::TransportError;

/// Content type used when the builder never had content set
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// An immutable message ready to be handed to a transport.
///
/// Created only by [`Email::build`](crate::Email::build). Headers keep the
/// order in which they were first added to the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct MimeMessage {
    /// Identifier without angle brackets
    pub(crate) message_id: String,

    /// Value of the `Date` header
    pub(crate) sent_date: DateTime<Utc>,

    /// Sender
    pub(crate) from: Address,

    /// Primary recipients
    pub(crate) to: Vec<Address>,

    /// Carbon copy recipients
    pub(crate) cc: Vec<Address>,

    /// Blind carbon copy recipients, envelope only
    pub(crate) bcc: Vec<Address>,

    /// Reply-to addresses
    pub(crate) reply_to: Vec<Address>,

    /// Subject line
    pub(crate) subject: Option<String>,

    /// Message body
    pub(crate) content: Option<String>,

    /// Content type as set on the builder
    pub(crate) content_type: Option<String>,

    /// Charset appended to the content type
    pub(crate) charset: Option<String>,

    /// Custom headers in emission order
    pub(crate) headers: Vec<(String, String)>,
}

impl MimeMessage {
    /// Message identifier without angle brackets
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Date written to the `Date` header
    pub fn sent_date(&self) -> DateTime<Utc> {
        self.sent_date
    }

    /// The sender
    pub fn from(&self) -> &Address {
        &self.from
    }

    /// Primary recipients
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Carbon copy recipients
    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    /// Blind carbon copy recipients
    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    /// Reply-to addresses
    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    /// The subject line, if any
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The body, if any
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// The content type exactly as it was set on the builder
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The charset, if any
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
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

    /// All envelope recipients: to, then cc, then bcc
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    /// SMTP envelope for this message (reverse path plus every recipient)
    pub fn envelope(&self) -> Result<Envelope, TransportError> {
        let forward_path = self.recipients().map(|a| a.as_lettre().clone()).collect();

        Envelope::new(Some(self.from.as_lettre().clone()), forward_path)
            .map_err(|e| TransportError::Envelope(e.to_string()))
    }

    /// Full `Content-Type` header value, including the charset when set
    pub fn content_type_header(&self) -> String {
        let content_type = self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        match &self.charset {
            Some(charset) if !content_type.contains("charset=") => {
                format!("{content_type}; charset={charset}")
            }
            _ => content_type.to_string(),
        }
    }

    /// Render the message as RFC 5322 text with CRLF line endings.
    ///
    /// Bcc recipients appear only in the envelope, never in the headers. A
    /// custom header named like a standard one (`Subject`, `Content-Type`,
    /// ...) replaces it. Line breaks inside header values are folded into
    /// single spaces.
    pub fn formatted(&self) -> String {
        let mut standard = vec![
            ("Date", self.sent_date.to_rfc2822()),
            ("From", self.from.to_string()),
        ];
        if let Some(reply_to) = address_list(&self.reply_to) {
            standard.push(("Reply-To", reply_to));
        }
        if let Some(to) = address_list(&self.to) {
            standard.push(("To", to));
        }
        if let Some(cc) = address_list(&self.cc) {
            standard.push(("Cc", cc));
        }
        standard.push(("Message-ID", format!("<{}>", self.message_id)));
        if let Some(subject) = &self.subject {
            standard.push(("Subject", subject.clone()));
        }
        standard.push(("MIME-Version", "1.0".to_string()));
        standard.push(("Content-Type", self.content_type_header()));

        let mut raw = String::new();

        for (name, value) in &standard {
            if !self.has_custom_header(name) {
                push_header(&mut raw, name, value);
            }
        }

        for (name, value) in &self.headers {
            push_header(&mut raw, name, value);
        }

        raw.push_str("\r\n");

        if let Some(content) = &self.content {
            let body = content
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\r\n");
            raw.push_str(&body);
        }

        raw
    }

    fn has_custom_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

/// Replace every run of CR/LF characters with a single space
pub(crate) fn fold_line_breaks(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_header(raw: &mut String, name: &str, value: &str) {
    raw.push_str(name);
    raw.push_str(": ");
    if value.contains(['\r', '\n']) {
        raw.push_str(&fold_line_breaks(value));
    } else {
        raw.push_str(value);
    }
    raw.push_str("\r\n");
}

fn address_list(addresses: &[Address]) -> Option<String> {
    if addresses.is_empty() {
        return None;
    }

    let value = addresses
        .iter()
        .map(Address::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(value)
}
