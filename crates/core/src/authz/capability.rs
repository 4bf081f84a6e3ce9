//! Capabilities and capability sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AccessError;

/// A single permission on a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Manage the book itself, its chart of accounts, and its grants.
    Admin,
    /// Read the book, account titles, and transactions.
    Read,
    /// Create transactions.
    Write,
    /// Edit the book, account titles, and transactions.
    Update,
    /// Delete transactions.
    Delete,
}

impl Capability {
    /// Every capability, in authority-string order.
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Read,
        Self::Write,
        Self::Update,
        Self::Delete,
    ];

    /// Name used in authority strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Read => "read",
            Self::Write => "write",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Admin => 1,
            Self::Read => 1 << 1,
            Self::Write => 1 << 2,
            Self::Update => 1 << 3,
            Self::Delete => 1 << 4,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| AccessError::UnknownCapability(s.to_string()))
    }
}

/// A set of capabilities held by one user on one book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Every capability; what a book's creator receives.
    pub const FULL: Self = Self(0b1_1111);

    /// Parses a comma-joined authority string.
    ///
    /// Whitespace around names and empty segments are ignored, so `""` parses
    /// to the empty set.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::UnknownCapability` for an unrecognised name.
    pub fn parse(authority: &str) -> Result<Self, AccessError> {
        authority
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .try_fold(Self::NONE, |set, segment| {
                Ok(set.with(segment.parse::<Capability>()?))
            })
    }

    /// Renders the set as a comma-joined authority string in canonical order.
    #[must_use]
    pub fn to_authority_string(self) -> String {
        self.iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns the set with `cap` added.
    #[must_use]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Returns true if the set holds `cap`.
    #[must_use]
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the held capabilities in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |cap| self.contains(*cap))
    }

    /// Fails unless the set holds `cap`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MissingCapability` when `cap` is absent.
    pub const fn require(self, cap: Capability) -> Result<(), AccessError> {
        if self.contains(cap) {
            Ok(())
        } else {
            Err(AccessError::MissingCapability(cap))
        }
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_authority_string())
    }
}
