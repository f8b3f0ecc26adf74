//! Error types for message building

use thiserror::Error;

use crate::mail::address::AddressError;

/// Errors produced while assembling or sending a message.
///
/// Every variant belongs to exactly one [`ErrorKind`]; callers that need to
/// tell programmer mistakes apart from bad data should match on
/// [`EmailError::kind`] rather than on the message text.
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("Address List provided was invalid")]
    InvalidAddressList,

    #[error(transparent)]
    AddressParse(#[from] AddressError),

    #[error("From address required")]
    MissingFrom,

    #[error("At least one receiver address required")]
    MissingReceiver,

    #[error("Cannot find valid hostname for mail session")]
    MissingHostName,

    #[error("The MimeMessage is already built.")]
    AlreadyBuilt,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delivery channel closed")]
    ChannelClosed,

    #[error("Envelope rejected: {0}")]
    Envelope(String),

    #[error("{0}")]
    Other(String),
}

/// Category of an [`EmailError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller broke an argument contract (empty header name or value)
    Argument,
    /// Input data failed a business rule
    Validation,
    /// The builder was misused; retrying cannot succeed
    Fatal,
    /// The transport provider failed to deliver
    Transport,
}

/// Address size limits as defined in RFC 5321
pub struct AddressLimits;

impl AddressLimits {
    /// Maximum length of the local part
    pub const LOCAL_PART_MAX_LENGTH: usize = 64;

    /// Maximum length of a domain name
    pub const DOMAIN_MAX_LENGTH: usize = 255;
}

impl EmailError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmailError::InvalidArgument(_) => ErrorKind::Argument,
            EmailError::InvalidAddressList => ErrorKind::Validation,
            EmailError::AddressParse(_) => ErrorKind::Validation,
            EmailError::MissingFrom => ErrorKind::Validation,
            EmailError::MissingReceiver => ErrorKind::Validation,
            EmailError::MissingHostName => ErrorKind::Validation,
            EmailError::AlreadyBuilt => ErrorKind::Fatal,
            EmailError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Whether this error signals builder misuse rather than bad input
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}
