//! Lockfile encoding and decoding.
//!
//! `Package.resolved` is the package manager's lockfile. quay never rewrites
//! it: a loaded lockfile keeps its original text, and `contents()` returns
//! those exact bytes. Both the v1 (`object.pins`) and the v2+ (`pins`)
//! layouts are read.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::declaration::{identity_from_location, Dependencies};
use crate::util::hash::sha256_str;

/// Errors reading a `Package.resolved` file.
#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("failed to parse lockfile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported lockfile version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("package `{identity}` is pinned more than once")]
    DuplicatePin { identity: String },
}

/// The resolved state of a pinned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    pub revision: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PinState {
    /// The most specific human-readable reference for this state.
    pub fn reference(&self) -> &str {
        self.version
            .as_deref()
            .or(self.branch.as_deref())
            .unwrap_or(&self.revision)
    }
}

/// A single lockfile entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub identity: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    pub location: String,

    pub state: PinState,
}

fn default_kind() -> String {
    "remoteSourceControl".to_string()
}

impl Pin {
    pub fn new(identity: impl Into<String>, location: impl Into<String>, state: PinState) -> Self {
        Pin {
            identity: identity.into(),
            kind: default_kind(),
            location: location.into(),
            state,
        }
    }
}

/// v1 layout: `{"object": {"pins": [...]}, "version": 1}`
#[derive(Deserialize)]
struct V1Lockfile {
    object: V1Object,
}

#[derive(Deserialize)]
struct V1Object {
    #[serde(default)]
    pins: Vec<V1Pin>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Pin {
    #[serde(rename = "repositoryURL")]
    repository_url: String,
    state: PinState,
}

/// v2 and later: `{"pins": [...], "version": 2}`
#[derive(Serialize, Deserialize)]
struct V2Lockfile {
    #[serde(default)]
    pins: Vec<Pin>,
    version: u32,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

/// A parsed `Package.resolved`.
///
/// Equality compares the format version and the pins, not the raw text.
#[derive(Debug, Clone)]
pub struct Lockfile {
    version: u32,
    pins: Vec<Pin>,
    raw: String,
}

impl PartialEq for Lockfile {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.pins == other.pins
    }
}

impl Eq for Lockfile {}

impl Lockfile {
    /// Parse lockfile text, keeping the original bytes.
    pub fn parse(raw: &str) -> Result<Self, LockfileError> {
        let header: Header = serde_json::from_str(raw)?;

        let pins = match header.version {
            1 => {
                let v1: V1Lockfile = serde_json::from_str(raw)?;
                v1.object
                    .pins
                    .into_iter()
                    .map(|p| Pin::new(identity_from_location(&p.repository_url), p.repository_url, p.state))
                    .collect()
            }
            2 | 3 => {
                let v2: V2Lockfile = serde_json::from_str(raw)?;
                v2.pins
            }
            version => return Err(LockfileError::UnsupportedVersion { version }),
        };

        let mut seen = BTreeSet::new();
        for pin in &pins {
            if !seen.insert(pin.identity.as_str()) {
                return Err(LockfileError::DuplicatePin {
                    identity: pin.identity.clone(),
                });
            }
        }

        Ok(Lockfile {
            version: header.version,
            pins,
            raw: raw.to_string(),
        })
    }

    /// Build a v2 lockfile from pins, in the given order.
    pub fn from_pins(pins: Vec<Pin>) -> Result<Self, LockfileError> {
        let body = V2Lockfile { pins, version: 2 };
        let mut raw = serde_json::to_string_pretty(&body)?;
        raw.push('\n');
        Self::parse(&raw)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Pins in file order.
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Look up the pin for a package identity.
    pub fn pin(&self, identity: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.identity == identity)
    }

    pub fn identities(&self) -> BTreeSet<&str> {
        self.pins.iter().map(|p| p.identity.as_str()).collect()
    }

    /// The exact text this lockfile was read from.
    pub fn contents(&self) -> &str {
        &self.raw
    }

    /// SHA-256 of the lockfile bytes, hex encoded.
    pub fn digest(&self) -> String {
        sha256_str(&self.raw)
    }

    /// Check whether this lockfile no longer matches the declarations.
    ///
    /// Stale when a declared remote package has no pin, or a pin exists for a
    /// package that is no longer declared. Local packages are never pinned.
    pub fn is_stale_for(&self, dependencies: &Dependencies) -> bool {
        let declared = dependencies.remote_identities();
        let pinned = self.identities();

        declared.iter().any(|id| !pinned.contains(id.as_str()))
            || pinned.iter().any(|id| !declared.contains(*id))
    }
}
