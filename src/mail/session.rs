//! Mail session configuration handed to transport providers

use std::collections::BTreeMap;
use std::time::Duration;

/// Transport protocol property
pub const MAIL_TRANSPORT_PROTOCOL: &str = "mail.transport.protocol";
/// SMTP host property
pub const MAIL_HOST: &str = "mail.smtp.host";
/// SMTP port property
pub const MAIL_PORT: &str = "mail.smtp.port";
/// Socket connection timeout property, in milliseconds
pub const MAIL_SMTP_CONNECTIONTIMEOUT: &str = "mail.smtp.connectiontimeout";
/// Socket read timeout property, in milliseconds
pub const MAIL_SMTP_TIMEOUT: &str = "mail.smtp.timeout";
/// Implicit TLS property
pub const MAIL_SMTP_SSL_ENABLE: &str = "mail.smtp.ssl.enable";
/// Port used for implicit TLS connections
pub const MAIL_SMTP_SOCKET_FACTORY_PORT: &str = "mail.smtp.socketFactory.port";

/// A property-bag session consumed by a [`Transport`](crate::Transport).
///
/// Sessions are either derived by [`Email::mail_session`](crate::Email::mail_session)
/// from the builder's host and connection settings, or supplied from outside
/// via [`Email::set_mail_session`](crate::Email::set_mail_session). Typed
/// accessors read the well-known properties; unknown keys are carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailSession {
    properties: BTreeMap<String, String>,
}

impl MailSession {
    /// Create an empty session with no properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from an existing property bag
    pub fn from_properties<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a raw property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Set a raw property, replacing any previous value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Iterate over all properties in key order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The SMTP host, if the session names one
    pub fn host(&self) -> Option<&str> {
        self.property(MAIL_HOST).filter(|h| !h.is_empty())
    }

    /// The SMTP port, if set and numeric
    pub fn port(&self) -> Option<u16> {
        self.property(MAIL_PORT).and_then(|p| p.trim().parse().ok())
    }

    /// Whether implicit TLS is enabled
    pub fn is_ssl_on_connect(&self) -> bool {
        self.property(MAIL_SMTP_SSL_ENABLE)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Socket connection timeout, if set
    pub fn connection_timeout(&self) -> Option<Duration> {
        self.millis(MAIL_SMTP_CONNECTIONTIMEOUT)
    }

    /// Socket read timeout, if set
    pub fn timeout(&self) -> Option<Duration> {
        self.millis(MAIL_SMTP_TIMEOUT)
    }

    fn millis(&self, key: &str) -> Option<Duration> {
        self.property(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_has_no_host() {
        let session = MailSession::new();

        assert_eq!(session.host(), None);
        assert_eq!(session.port(), None);
        assert!(!session.is_ssl_on_connect());
        assert_eq!(session.properties().count(), 0);
    }

    #[test]
    fn test_typed_accessors() {
        let session = MailSession::from_properties([
            (MAIL_HOST, "smtp.example.com"),
            (MAIL_PORT, "465"),
            (MAIL_SMTP_SSL_ENABLE, "TRUE"),
            (MAIL_SMTP_CONNECTIONTIMEOUT, "1500"),
            (MAIL_SMTP_TIMEOUT, "not-a-number"),
        ]);

        assert_eq!(session.host(), Some("smtp.example.com"));
        assert_eq!(session.port(), Some(465));
        assert!(session.is_ssl_on_connect());
        assert_eq!(
            session.connection_timeout(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(session.timeout(), None);
    }

    #[test]
    fn test_set_property_overwrites() {
        let mut session = MailSession::new();
        session.set_property(MAIL_HOST, "first");
        session.set_property(MAIL_HOST, "second");
        session.set_property("x.custom", "kept");

        assert_eq!(session.host(), Some("second"));
        assert_eq!(session.property("x.custom"), Some("kept"));
        assert_eq!(session.properties().count(), 2);
    }
}
