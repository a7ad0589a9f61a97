//! Host facts consulted by conditions
//!
//! File-state and version conditions are answered by the mod manager hosting
//! the installer. The engine only sees these two traits; `StaticHost` is a
//! plain value implementation used by the CLI and the tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::condition::Version;
use crate::types::{FileState, VersionKind};

/// Reports whether a target file (usually a game plugin) is installed and active
pub trait FileStateOracle {
    fn lookup_state(&self, file_key: &str) -> FileState;
}

/// Reports the versions version conditions compare against
pub trait VersionOracle {
    fn lookup_version(&self, kind: VersionKind) -> Version;
}

/// Everything the engine needs from its host
pub trait Host: FileStateOracle + VersionOracle {}

impl<T: FileStateOracle + VersionOracle> Host for T {}

/// Mod-manager compatibility version reported for host version conditions
pub const DEFAULT_HOST_VERSION: Version = Version::new(0, 13, 21, 0);

fn default_host_version() -> Version {
    DEFAULT_HOST_VERSION
}

/// Host facts given up front.
///
/// File lookups are case-insensitive; files that are not listed are `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticHost {
    #[serde(default)]
    pub game_version: Version,
    #[serde(default = "default_host_version")]
    pub host_version: Version,
    #[serde(default)]
    pub extender_version: Version,
    #[serde(default)]
    pub file_states: HashMap<String, FileState>,
}

impl Default for StaticHost {
    fn default() -> Self {
        Self {
            game_version: Version::default(),
            host_version: DEFAULT_HOST_VERSION,
            extender_version: Version::default(),
            file_states: HashMap::new(),
        }
    }
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<String>, state: FileState) -> Self {
        self.file_states.insert(file.into().to_lowercase(), state);
        self
    }

    pub fn with_version(mut self, kind: VersionKind, version: &str) -> Self {
        let version = Version::parse(version);
        match kind {
            VersionKind::Game => self.game_version = version,
            VersionKind::Host => self.host_version = version,
            VersionKind::Extender => self.extender_version = version,
        }
        self
    }

    /// Load host facts from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read host facts from {:?}", path.as_ref()))?;

        let mut host: Self =
            serde_json::from_str(&content).context("Failed to parse host facts JSON")?;

        // Keys are matched case-insensitively.
        host.file_states = host
            .file_states
            .into_iter()
            .map(|(file, state)| (file.to_lowercase(), state))
            .collect();
        Ok(host)
    }
}

impl FileStateOracle for StaticHost {
    fn lookup_state(&self, file_key: &str) -> FileState {
        self.file_states
            .get(&file_key.to_lowercase())
            .copied()
            .unwrap_or(FileState::Missing)
    }
}

impl VersionOracle for StaticHost {
    fn lookup_version(&self, kind: VersionKind) -> Version {
        match kind {
            VersionKind::Game => self.game_version,
            VersionKind::Host => self.host_version,
            VersionKind::Extender => self.extender_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unknown_files_are_missing() {
        let host = StaticHost::new().with_file("Skyrim.esm", FileState::Active);
        assert_eq!(host.lookup_state("skyrim.ESM"), FileState::Active);
        assert_eq!(host.lookup_state("Dawnguard.esm"), FileState::Missing);
    }

    #[test]
    fn test_default_host_version() {
        let host = StaticHost::default();
        assert_eq!(host.lookup_version(VersionKind::Host), Version::parse("0.13.21"));
        assert_eq!(host.lookup_version(VersionKind::Game), Version::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"game_version":"1.6.640","file_states":{{"Update.ESM":"Inactive"}}}}"#
        )
        .unwrap();

        let host = StaticHost::load_from_file(file.path()).expect("valid host file"); // test: known-good input
        assert_eq!(host.lookup_version(VersionKind::Game), Version::new(1, 6, 640, 0));
        assert_eq!(host.lookup_version(VersionKind::Host), DEFAULT_HOST_VERSION);
        assert_eq!(host.lookup_state("update.esm"), FileState::Inactive);
    }
}
