use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The identifier of an [`Item`](crate::Item).
///
/// Identifiers are either integers or strings. The two spaces are disjoint:
/// `ItemId::Int(1)` and `ItemId::Str("1")` are different identifiers.
///
/// On the wire an identifier is a bare JSON/YAML number or string. Integer
/// identifiers must fit in an `i64`; larger or fractional numbers are
/// rejected when loading. Quote such values to use them as string
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// An integer identifier, in the `i64` range.
    Int(i64),
    /// A string identifier.
    Str(String),
}

impl ItemId {
    /// Returns the integer value, if this is an integer identifier.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(_) => None,
        }
    }

    /// Returns the string value, if this is a string identifier.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Str(value) => Some(value),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

/// Parses an identifier from command-line style text.
///
/// Anything that parses as an `i64` becomes [`ItemId::Int`], everything else
/// becomes [`ItemId::Str`]. This never fails.
impl FromStr for ItemId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map_or_else(|_| Self::Str(s.to_string()), Self::Int))
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ItemId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}
