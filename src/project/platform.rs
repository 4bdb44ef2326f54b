//! Build platforms

use crate::error::QuarryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A platform a dependency can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "Mac", alias = "macOS")]
    Mac,
    #[serde(rename = "iOS")]
    IOS,
    #[serde(rename = "watchOS")]
    WatchOS,
    #[serde(rename = "tvOS")]
    TvOS,
}

impl Platform {
    /// All known platforms
    pub fn all() -> &'static [Self] {
        &[Self::Mac, Self::IOS, Self::WatchOS, Self::TvOS]
    }

    /// Directory name under the build folder; also the scheme suffix
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mac => "Mac",
            Self::IOS => "iOS",
            Self::WatchOS => "watchOS",
            Self::TvOS => "tvOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Platform {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mac" | "macos" | "osx" => Ok(Self::Mac),
            "ios" => Ok(Self::IOS),
            "watchos" => Ok(Self::WatchOS),
            "tvos" => Ok(Self::TvOS),
            _ => Err(QuarryError::User(format!(
                "Unknown platform '{}'. Expected one of: Mac, iOS, watchOS, tvOS",
                s
            ))),
        }
    }
}
