use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for a [`TreeStore`](crate::TreeStore).
///
/// The defaults reproduce the store's permissive behaviour: parent
/// references are not checked, and a label-only update moves the item to the
/// end of its sibling list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether a label change alone re-appends the item to its parent's
    /// children list.
    ///
    /// When `true` (default), updating only the label moves the item to the
    /// end of its sibling list. When `false`, sibling order only changes when
    /// the parent changes.
    pub reorder_on_label_change: bool,

    /// Whether mutations check parent references.
    ///
    /// When `true`, adding an item whose parent is not present fails, and
    /// re-parenting an item under itself or one of its descendants fails.
    /// Bulk construction and replacement are never checked.
    pub enforce_parent_integrity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reorder_on_label_change: true,
            enforce_parent_integrity: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// A configuration with parent-integrity checks switched on.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            enforce_parent_integrity: true,
            ..Self::default()
        }
    }
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_true")]
        reorder_on_label_change: bool,

        #[serde(default)]
        enforce_parent_integrity: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                reorder_on_label_change,
                enforce_parent_integrity,
            } => Self {
                reorder_on_label_change,
                enforce_parent_integrity,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            reorder_on_label_change: config.reorder_on_label_change,
            enforce_parent_integrity: config.enforce_parent_integrity,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nreorder_on_label_change = false\nenforce_parent_integrity = true\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(!config.reorder_on_label_change);
        assert!(config.enforce_parent_integrity);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nreorder_on_label_change = \"yes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        Config::strict().save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::strict());
    }
}
