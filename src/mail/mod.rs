//! Message building, session configuration and transport seam

pub mod address;
pub mod builder;
pub mod delivery;
pub mod error;
pub mod message;
pub mod session;
pub mod transport;

pub use address::{Address, AddressError};
pub use builder::{BuilderState, Email};
pub use delivery::Delivery;
pub use error::{AddressLimits, EmailError, ErrorKind, TransportError};
pub use message::MimeMessage;
pub use session::MailSession;
pub use transport::{ChannelTransport, Transport};
