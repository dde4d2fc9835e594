//! Sorting types for listings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// A listing attribute that entries can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Display name, case-insensitive.
    #[default]
    Name,
    /// Size in bytes.
    Size,
    /// MIME type, case-insensitive.
    Type,
    /// Creation timestamp.
    CreatedAt,
    /// Last modification timestamp.
    ModifiedAt,
}

impl SortField {
    /// Return the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Type => "type",
            Self::CreatedAt => "created_at",
            Self::ModifiedAt => "modified_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "type" => Ok(Self::Type),
            "created_at" => Ok(Self::CreatedAt),
            "modified_at" => Ok(Self::ModifiedAt),
            other => Err(format!("unknown sort field '{other}'")),
        }
    }
}
