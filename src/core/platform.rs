//! Platforms and deployment targets.
//!
//! A Platform is the OS family a target is built for. A deployment target is
//! the minimum OS version a built product must support.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::declaration::DeclarationError;

/// An Apple platform a target or product can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "iOS")]
    Ios,
    #[serde(alias = "macOS", alias = "osx")]
    Macos,
    #[serde(alias = "tvOS")]
    Tvos,
    #[serde(alias = "watchOS")]
    Watchos,
}

impl Platform {
    /// All supported platforms, in declaration order.
    pub const ALL: [Platform; 4] = [
        Platform::Ios,
        Platform::Macos,
        Platform::Tvos,
        Platform::Watchos,
    ];

    /// The lowercase name used by `swift package dump-package` (`platformName`).
    pub fn package_name(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Macos => "macos",
            Platform::Tvos => "tvos",
            Platform::Watchos => "watchos",
        }
    }

    /// Parse the `platformName` emitted by the package manager.
    ///
    /// Platforms quay does not generate projects for (linux, maccatalyst,
    /// driverkit, ...) map to `None`.
    pub fn from_package_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "macos" | "osx" => Some(Platform::Macos),
            "tvos" => Some(Platform::Tvos),
            "watchos" => Some(Platform::Watchos),
            _ => None,
        }
    }

    /// Minimum deployment target the package manager assumes when a package
    /// does not declare one.
    pub fn default_deployment_target(&self) -> OsVersion {
        match self {
            Platform::Ios => OsVersion::new(9, 0, 0),
            Platform::Macos => OsVersion::new(10, 10, 0),
            Platform::Tvos => OsVersion::new(9, 0, 0),
            Platform::Watchos => OsVersion::new(2, 0, 0),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "iOS"),
            Platform::Macos => write!(f, "macOS"),
            Platform::Tvos => write!(f, "tvOS"),
            Platform::Watchos => write!(f, "watchOS"),
        }
    }
}

impl FromStr for Platform {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::from_package_name(s).ok_or_else(|| DeclarationError::UnknownPlatform {
            platform: s.to_string(),
        })
    }
}

/// An OS version such as `13.0` or `10.15.4`.
///
/// Backed by a semver version so comparison is numeric per component;
/// missing minor/patch components are zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsVersion(Version);

impl OsVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        OsVersion(Version::new(major, minor, patch))
    }

    /// The larger of two versions. Deployment targets are only ever raised.
    pub fn max_of(a: &OsVersion, b: &OsVersion) -> OsVersion {
        if a >= b {
            a.clone()
        } else {
            b.clone()
        }
    }
}

impl FromStr for OsVersion {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeclarationError::InvalidDeploymentTarget {
            value: s.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(OsVersion::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.patch == 0 {
            write!(f, "{}.{}", self.0.major, self.0.minor)
        } else {
            write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
        }
    }
}

impl Serialize for OsVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OsVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
