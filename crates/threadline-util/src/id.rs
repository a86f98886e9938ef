//! ULID-based identifiers with a type prefix.
//!
//! Identifiers look like `msg_01hqxyz...`. The ULID body is lowercased so that
//! plain string comparison orders identifiers by creation time, which is what
//! the message store relies on for its sorted insert.

use ulid::Ulid;

/// Known identifier prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Session,
    Message,
    Part,
    Permission,
}

impl IdPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Session => "ses",
            IdPrefix::Message => "msg",
            IdPrefix::Part => "prt",
            IdPrefix::Permission => "per",
        }
    }

    /// Parse a prefix from its short form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ses" => Some(IdPrefix::Session),
            "msg" => Some(IdPrefix::Message),
            "prt" => Some(IdPrefix::Part),
            "per" => Some(IdPrefix::Permission),
            _ => None,
        }
    }
}

/// Identifier generation and parsing.
pub struct Identifier;

impl Identifier {
    /// Generate an ascending identifier (newer sorts after older).
    pub fn ascending(prefix: IdPrefix) -> String {
        Self::with_ulid(prefix, Ulid::new())
    }

    /// Build an identifier from a known ULID.
    pub fn with_ulid(prefix: IdPrefix, ulid: Ulid) -> String {
        format!("{}_{}", prefix.as_str(), ulid.to_string().to_lowercase())
    }

    /// Split an identifier into prefix and ULID.
    pub fn parse(id: &str) -> Option<(IdPrefix, Ulid)> {
        let (prefix, body) = id.split_once('_')?;
        let prefix = IdPrefix::parse(prefix)?;
        let ulid = Ulid::from_string(body).ok()?;
        Some((prefix, ulid))
    }

    pub fn has_prefix(id: &str, prefix: IdPrefix) -> bool {
        id.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }

    /// Message IDs are generated client side for optimistic sends.
    pub fn message() -> String {
        Self::ascending(IdPrefix::Message)
    }

    pub fn part() -> String {
        Self::ascending(IdPrefix::Part)
    }
}
