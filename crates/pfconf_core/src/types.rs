//! Core type definitions for pfconf.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Entry kind of LDAP authentication servers.
pub const LDAP_KIND: &str = "ldap";

/// Identity of an entry among its siblings: name plus entry kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Entry name.
    pub name: String,
    /// Entry kind discriminator, stored as `type`.
    pub kind: String,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Creates the identity of an LDAP authentication server.
    #[must_use]
    pub fn ldap(name: impl Into<String>) -> Self {
        Self::new(name, LDAP_KIND)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A value that is not one of an enumeration's accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what} '{value}', expected one of: {expected}")]
pub struct ParseValueError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

/// Connection transport of an LDAP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Plain TCP.
    Tcp,
    /// TCP upgraded with STARTTLS.
    StartTls,
    /// LDAPS.
    Ssl,
}

impl Transport {
    /// Returns the label stored in the configuration.
    #[must_use]
    pub const fn url_type(self) -> &'static str {
        match self {
            Self::Tcp => "TCP - Standard",
            Self::StartTls => "TCP - STARTTLS",
            Self::Ssl => "SSL - Encrypted",
        }
    }

    /// Returns `true` if the transport needs a certificate authority.
    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        !matches!(self, Self::Tcp)
    }

    /// Returns the short name accepted on input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::StartTls => "starttls",
            Self::Ssl => "ssl",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "starttls" => Ok(Self::StartTls),
            "ssl" => Ok(Self::Ssl),
            _ => Err(ParseValueError {
                what: "transport",
                value: s.to_string(),
                expected: "tcp, starttls, ssl",
            }),
        }
    }
}

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// One level below the base DN.
    One,
    /// The entire subtree.
    Subtree,
}

impl SearchScope {
    /// Returns the stored spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Subtree => "subtree",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" => Ok(Self::One),
            "subtree" => Ok(Self::Subtree),
            _ => Err(ParseValueError {
                what: "scope",
                value: s.to_string(),
                expected: "one, subtree",
            }),
        }
    }
}

/// LDAP protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// LDAPv2.
    V2,
    /// LDAPv3.
    #[default]
    V3,
}

impl ProtocolVersion {
    /// Returns the stored spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "2",
            Self::V3 => "3",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(Self::V2),
            "3" => Ok(Self::V3),
            _ => Err(ParseValueError {
                what: "protocol version",
                value: s.to_string(),
                expected: "2, 3",
            }),
        }
    }
}
