//! API scope catalogue.
//!
//! Scopes are a closed set fixed at build time. Each identifier has the form
//! `resource:action` with lower-kebab segments. There is no hierarchy and no
//! wildcard: two scopes match only when their strings are equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AuthError;

/// API scopes understood by the device and location APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// `device-identifier:retrieve-identifier`
    DeviceIdentifierRetrieveIdentifier,
    /// `device-identifier:retrieve-type`
    DeviceIdentifierRetrieveType,
    /// `device-identifier:retrieve-ppid`
    DeviceIdentifierRetrievePpid,
    /// `location-retrieval:read`
    LocationRetrievalRead,
    /// `location-verification:verify`
    LocationVerificationVerify,
}

impl Scope {
    /// Every scope, in catalogue order.
    pub const ALL: [Scope; 5] = [
        Self::DeviceIdentifierRetrieveIdentifier,
        Self::DeviceIdentifierRetrieveType,
        Self::DeviceIdentifierRetrievePpid,
        Self::LocationRetrievalRead,
        Self::LocationVerificationVerify,
    ];

    /// Returns the wire identifier of the scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceIdentifierRetrieveIdentifier => "device-identifier:retrieve-identifier",
            Self::DeviceIdentifierRetrieveType => "device-identifier:retrieve-type",
            Self::DeviceIdentifierRetrievePpid => "device-identifier:retrieve-ppid",
            Self::LocationRetrievalRead => "location-retrieval:read",
            Self::LocationVerificationVerify => "location-verification:verify",
        }
    }

    /// Parses a space-separated scope list.
    ///
    /// Order and duplicates are kept as given.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidScope` naming every unknown identifier.
    pub fn parse_list(scope: &str) -> Result<Vec<Scope>, AuthError> {
        let mut scopes = Vec::new();
        let mut unknown = Vec::new();

        for raw in scope.split_whitespace() {
            match raw.parse::<Scope>() {
                Ok(s) => scopes.push(s),
                Err(_) => unknown.push(raw),
            }
        }

        if !unknown.is_empty() {
            return Err(AuthError::invalid_scope(format!(
                "Invalid scopes: {}",
                unknown.join(", ")
            )));
        }

        Ok(scopes)
    }

    /// Joins scopes into the space-separated form used in token responses.
    #[must_use]
    pub fn join(scopes: &[Scope]) -> String {
        scopes
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a catalogued scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
