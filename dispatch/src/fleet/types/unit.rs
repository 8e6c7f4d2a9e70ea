//! Unit addressing types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier used in endpoint paths to address every known unit at once.
pub const BROADCAST_SENTINEL: &str = "$broadcast";

const MAX_UNIT_NAME_LEN: usize = 63;

/// Error type for unit name validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitNameError {
    /// The name is empty or contains only whitespace.
    #[error("Unit name cannot be empty")]
    Empty,
    /// The broadcast sentinel was used where a concrete unit is required.
    #[error("'$broadcast' addresses every unit and is not a unit name")]
    Broadcast,
    /// The name is longer than a hostname label allows.
    #[error("Unit name '{0}' exceeds 63 characters")]
    TooLong(String),
    /// The name contains characters outside the hostname alphabet.
    #[error("Unit name '{0}' contains invalid characters")]
    InvalidCharacters(String),
}

/// Name of one concrete device in the fleet.
///
/// Names follow hostname-label syntax: ASCII alphanumerics, `-` and `_`,
/// starting with an alphanumeric character. The broadcast sentinel is never
/// a valid `UnitName`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName(String);

impl UnitName {
    /// Creates a `UnitName`, validating its syntax.
    ///
    /// # Errors
    /// Returns `UnitNameError` if the name is empty, is the broadcast sentinel,
    /// is too long, or contains characters outside the hostname alphabet.
    pub fn new(name: &str) -> Result<Self, UnitNameError> {
        if name.trim().is_empty() {
            return Err(UnitNameError::Empty);
        }
        if name == BROADCAST_SENTINEL {
            return Err(UnitNameError::Broadcast);
        }
        if name.len() > MAX_UNIT_NAME_LEN {
            return Err(UnitNameError::TooLong(name.to_string()));
        }
        let mut chars = name.chars();
        let starts_alphanumeric = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !starts_alphanumeric || !rest_valid {
            return Err(UnitNameError::InvalidCharacters(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Returns true if `name` would be accepted by [`UnitName::new`].
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        Self::new(name).is_ok()
    }

    /// Returns the string representation of this `UnitName`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnitName {
    type Err = UnitNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UnitName {
    type Error = UnitNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<UnitName> for String {
    fn from(value: UnitName) -> Self {
        value.0
    }
}

/// Addressee of a command or query: one unit or the whole fleet.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum UnitTarget {
    /// Every currently known unit; fanned out server-side.
    Broadcast,
    /// A single concrete unit.
    Unit(UnitName),
}

impl UnitTarget {
    /// Parses a target, recognizing the broadcast sentinel before anything else.
    ///
    /// # Errors
    /// Returns `UnitNameError` if `s` is neither the sentinel nor a valid unit name.
    pub fn parse(s: &str) -> Result<Self, UnitNameError> {
        if s == BROADCAST_SENTINEL {
            return Ok(Self::Broadcast);
        }
        UnitName::new(s).map(Self::Unit)
    }

    /// Returns the identifier used in endpoint paths.
    #[must_use]
    pub fn path_segment(&self) -> &str {
        match self {
            Self::Broadcast => BROADCAST_SENTINEL,
            Self::Unit(name) => name.as_str(),
        }
    }

    /// Returns true if this target addresses the whole fleet.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Broadcast)
    }
}

impl fmt::Display for UnitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for UnitTarget {
    type Err = UnitNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<UnitName> for UnitTarget {
    fn from(name: UnitName) -> Self {
        Self::Unit(name)
    }
}
