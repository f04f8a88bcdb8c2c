//! Renderer vendor classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::utils::contains_ignore_ascii_case;

/// TV vendor, as far as playback metadata is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Samsung,
    Lg,
    Sony,
    Philips,
    #[default]
    Generic,
}

impl Vendor {
    /// Classification order: the first manufacturer substring that matches wins.
    const MATCH_ORDER: [(&'static str, Vendor); 4] = [
        ("samsung", Vendor::Samsung),
        ("lg", Vendor::Lg),
        ("sony", Vendor::Sony),
        ("philips", Vendor::Philips),
    ];

    /// Classifies a descriptor `<manufacturer>` string (case-insensitive).
    #[must_use]
    pub fn from_manufacturer(manufacturer: &str) -> Self {
        Self::MATCH_ORDER
            .iter()
            .find(|(needle, _)| contains_ignore_ascii_case(manufacturer, needle))
            .map_or(Vendor::Generic, |(_, vendor)| *vendor)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Samsung => "samsung",
            Self::Lg => "lg",
            Self::Sony => "sony",
            Self::Philips => "philips",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "samsung" => Ok(Self::Samsung),
            "lg" => Ok(Self::Lg),
            "sony" => Ok(Self::Sony),
            "philips" => Ok(Self::Philips),
            "generic" | "" => Ok(Self::Generic),
            other => Err(format!("unknown vendor '{}'", other)),
        }
    }
}
