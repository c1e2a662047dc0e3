//! Caller identity.
//!
//! The identity context that authenticates callers lives outside this crate.
//! What reaches the core is an opaque, immutable principal string: the core
//! compares principals for equality and never looks inside them.
//!
//! # Properties
//!
//! - **Opaque**: no structure is assumed (addresses, usernames, key hashes
//!   all work)
//! - **Exact**: two principals are the same caller iff their bytes match
//! - **Non-empty**: an empty principal can never be the owner or a voter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier of the entity making a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

/// Principal parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Empty or whitespace-only identifier.
    #[error("Invalid principal: identifier cannot be empty")]
    InvalidPrincipal,
}

impl Principal {
    /// Creates a principal from an identifier supplied by the identity context.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdentityError::InvalidPrincipal);
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
