//! Transport provider seam

use std::sync::mpsc;
use std::time::SystemTime;

use tracing::debug;

use crate::mail::delivery::Delivery;
use crate::mail::error::TransportError;
use crate::mail::message::MimeMessage;
use crate::mail::session::MailSession;

/// An external provider that delivers built messages.
///
/// Implementations receive the resolved [`MailSession`] alongside the frozen
/// message and own any retry policy; [`Email::send`](crate::Email::send)
/// never retries.
pub trait Transport {
    fn send(&self, session: &MailSession, message: &MimeMessage) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, session: &MailSession, message: &MimeMessage) -> Result<(), TransportError> {
        (**self).send(session, message)
    }
}

/// Transport that hands every message to an mpsc channel.
///
/// Useful for tests and for embedding: the receiving side gets a
/// [`Delivery`] per message and can use `recv_timeout()` to wait for it.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Delivery>,
}

impl ChannelTransport {
    /// Create a transport that sends into `tx`
    pub fn new(tx: mpsc::Sender<Delivery>) -> Self {
        Self { tx }
    }

    /// Create a transport together with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, session: &MailSession, message: &MimeMessage) -> Result<(), TransportError> {
        let envelope = message.envelope()?;

        let delivery = Delivery {
            host: session.host().map(str::to_string),
            port: session.port(),
            ssl_on_connect: session.is_ssl_on_connect(),
            message_id: message.message_id().to_string(),
            from: envelope
                .from()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            to: envelope.to().iter().map(|a| a.to_string()).collect(),
            data: message.formatted(),
            timestamp: SystemTime::now(),
        };

        debug!(
            message_id = %delivery.message_id,
            recipients = delivery.to.len(),
            "Handing message to channel"
        );

        self.tx
            .send(delivery)
            .map_err(|_| TransportError::ChannelClosed)
    }
}
