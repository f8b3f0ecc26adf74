//! Mail address parsing and validation

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::mail::error::AddressLimits;
use crate::mail::message::fold_line_breaks;

/// Syntax diagnostic for a string that is not a valid mail address.
///
/// The rendered message always names the offending input, for example
/// `Missing final '@domain' in string ``invalid-email''`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Illegal address in string ``{0}''")]
    Illegal(String),

    #[error("Missing final '@domain' in string ``{0}''")]
    MissingDomain(String),

    #[error("Local address too long (max {max} characters) in string ``{input}''")]
    LocalPartTooLong { max: usize, input: String },

    #[error("Domain name too long (max {max} characters) in string ``{input}''")]
    DomainTooLong { max: usize, input: String },

    #[error("{reason} in string ``{input}''")]
    Syntax { reason: String, input: String },
}

impl AddressError {
    fn syntax(reason: impl Into<String>, input: &str) -> Self {
        AddressError::Syntax {
            reason: reason.into(),
            input: input.to_string(),
        }
    }
}

/// A validated mail endpoint with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    email: lettre::Address,
    name: Option<String>,
}

impl Address {
    /// Parse `user@domain` or `Display Name <user@domain>`
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Illegal(raw.to_string()));
        }

        let (name, spec) = split_display_name(trimmed, raw)?;
        let email = parse_addr_spec(spec, raw)?;

        Ok(Self { email, name })
    }

    /// Parse an address and attach `name` as its display name.
    ///
    /// A non-empty `name` overrides any display name embedded in `raw`.
    pub fn with_name(raw: &str, name: &str) -> Result<Self, AddressError> {
        let mut address = Self::parse(raw)?;
        let name = name.trim();
        if !name.is_empty() {
            address.name = Some(name.to_string());
        }
        Ok(address)
    }

    /// The bare `user@domain` form
    pub fn email(&self) -> &str {
        self.email.as_ref()
    }

    /// Display name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local part before the `@`
    pub fn user(&self) -> &str {
        self.email.user()
    }

    /// Domain after the `@`
    pub fn domain(&self) -> &str {
        self.email.domain()
    }

    /// The underlying addr-spec, as consumed by SMTP envelopes
    pub fn as_lettre(&self) -> &lettre::Address {
        &self.email
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                let escaped = fold_line_breaks(name)
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.email)
            }
            None => write!(f, "{}", self.email),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `Name <spec>` into its parts; a bare spec has no name
fn split_display_name<'a>(
    trimmed: &'a str,
    raw: &str,
) -> Result<(Option<String>, &'a str), AddressError> {
    if let Some(inner) = trimmed.strip_suffix('>') {
        let Some(open) = inner.rfind('<') else {
            return Err(AddressError::syntax("Missing '<'", raw));
        };

        let name = inner[..open].trim();
        let name = name
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .unwrap_or(name)
            .trim();

        let name = (!name.is_empty()).then(|| name.to_string());
        return Ok((name, inner[open + 1..].trim()));
    }

    if trimmed.contains('<') {
        return Err(AddressError::syntax("Missing '>'", raw));
    }

    Ok((None, trimmed))
}

/// Validate a bare `user@domain`
fn parse_addr_spec(spec: &str, raw: &str) -> Result<lettre::Address, AddressError> {
    if spec.is_empty() {
        return Err(AddressError::Illegal(raw.to_string()));
    }

    let Some(at_pos) = spec.rfind('@') else {
        return Err(AddressError::MissingDomain(raw.to_string()));
    };

    let user_part = &spec[..at_pos];
    let domain_part = &spec[at_pos + 1..];

    if domain_part.is_empty() {
        return Err(AddressError::MissingDomain(raw.to_string()));
    }

    if user_part.is_empty() {
        return Err(AddressError::syntax("Missing local name", raw));
    }

    if user_part.len() > AddressLimits::LOCAL_PART_MAX_LENGTH {
        return Err(AddressError::LocalPartTooLong {
            max: AddressLimits::LOCAL_PART_MAX_LENGTH,
            input: raw.to_string(),
        });
    }

    if domain_part.len() > AddressLimits::DOMAIN_MAX_LENGTH {
        return Err(AddressError::DomainTooLong {
            max: AddressLimits::DOMAIN_MAX_LENGTH,
            input: raw.to_string(),
        });
    }

    spec.parse::<lettre::Address>()
        .map_err(|e| AddressError::syntax(e.to_string(), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let address = Address::parse("test@example.com").unwrap();

        assert_eq!(address.email(), "test@example.com");
        assert_eq!(address.user(), "test");
        assert_eq!(address.domain(), "example.com");
        assert_eq!(address.name(), None);
        assert_eq!(address.to_string(), "test@example.com");
    }

    #[test]
    fn test_parse_display_name() {
        let address = Address::parse("Bob <bob@example.com>").unwrap();
        assert_eq!(address.email(), "bob@example.com");
        assert_eq!(address.name(), Some("Bob"));

        let quoted = Address::parse("\"Smith, Jane\" <jane@example.com>").unwrap();
        assert_eq!(quoted.name(), Some("Smith, Jane"));
        assert_eq!(quoted.to_string(), "\"Smith, Jane\" <jane@example.com>");

        let bracketed = Address::parse("<anon@example.com>").unwrap();
        assert_eq!(bracketed.name(), None);
        assert_eq!(bracketed.email(), "anon@example.com");
    }

    #[test]
    fn test_with_name_overrides() {
        let address = Address::with_name("test@example.com", "Bob").unwrap();
        assert_eq!(address.name(), Some("Bob"));

        let address = Address::with_name("Old <test@example.com>", "New").unwrap();
        assert_eq!(address.name(), Some("New"));

        let address = Address::with_name("Old <test@example.com>", "").unwrap();
        assert_eq!(address.name(), Some("Old"));
    }

    #[test]
    fn test_missing_domain() {
        let err = Address::parse("invalid-email").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing final '@domain' in string ``invalid-email''"
        );

        assert!(matches!(
            Address::parse("user@"),
            Err(AddressError::MissingDomain(_))
        ));
    }

    #[test]
    fn test_empty_address_is_illegal() {
        let err = Address::parse("").unwrap_err();
        assert_eq!(err.to_string(), "Illegal address in string ``''");

        assert!(matches!(Address::parse("   "), Err(AddressError::Illegal(_))));
        assert!(matches!(Address::parse("<>"), Err(AddressError::Illegal(_))));
    }

    #[test]
    fn test_malformed_addresses() {
        assert!(matches!(
            Address::parse("@example.com"),
            Err(AddressError::Syntax { .. })
        ));
        assert!(matches!(
            Address::parse("Bob <bob@example.com"),
            Err(AddressError::Syntax { .. })
        ));
        assert!(Address::parse("bad user@example.com").is_err());
    }

    #[test]
    fn test_size_limits() {
        let long_user = "a".repeat(AddressLimits::LOCAL_PART_MAX_LENGTH + 1) + "@example.com";
        assert!(matches!(
            Address::parse(&long_user),
            Err(AddressError::LocalPartTooLong { .. })
        ));

        let long_domain = "user@".to_string() + &"a".repeat(AddressLimits::DOMAIN_MAX_LENGTH + 1);
        assert!(matches!(
            Address::parse(&long_domain),
            Err(AddressError::DomainTooLong { .. })
        ));
    }
}
