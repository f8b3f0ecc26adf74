//! Delivery records handed to in-process transports

use std::time::SystemTime;

/// A message as seen by a transport: SMTP envelope plus rendered data
#[derive(Debug, Clone)]
pub struct Delivery {
    /// SMTP host taken from the session
    pub host: Option<String>,

    /// SMTP port taken from the session
    pub port: Option<u16>,

    /// Whether the session asked for implicit TLS
    pub ssl_on_connect: bool,

    /// Message identifier without angle brackets
    pub message_id: String,

    /// Envelope sender address
    pub from: String,

    /// Envelope recipients (to, cc and bcc)
    pub to: Vec<String>,

    /// The rendered message including headers and body
    pub data: String,

    /// When the transport accepted the message
    pub timestamp: SystemTime,
}

impl Delivery {
    /// Check if this delivery goes to a specific recipient
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    /// Check if this delivery was sent from a specific sender
    pub fn is_from_sender(&self, sender: &str) -> bool {
        self.from == sender
    }

    /// Get the size of the rendered data in bytes
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Get the value of the first header called `name` (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        for line in self.data.lines() {
            if line.is_empty() {
                // End of headers
                break;
            }
            if let Some((key, value)) = line.split_once(": ") {
                if key.eq_ignore_ascii_case(name) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Get the subject line from the rendered headers (if present)
    pub fn get_subject(&self) -> Option<&str> {
        self.get_header("Subject")
    }

    /// Get the message body (content after the first empty line)
    pub fn get_body(&self) -> Option<&str> {
        let (_, body) = self.data.split_once("\r\n\r\n")?;
        (!body.is_empty()).then_some(body)
    }

    /// Check if the rendered data contains a specific text
    pub fn contains_text(&self, text: &str) -> bool {
        self.data.contains(text)
    }
}
