//! Model file handling for saving and loading package descriptions.
//!
//! The package description is plain JSON of [`ModuleConfig`]. Keywords are
//! type-safe enums, so a typo in a group type or plugin type is rejected at
//! load time instead of surfacing halfway through a wizard.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::model::{InstallerModel, ModuleConfig};

impl ModuleConfig {
    /// Save the package description to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize package description to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write package description to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load a package description from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read package description from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse package description JSON")?;

        Ok(config)
    }
}

/// Load and normalize a package description
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<InstallerModel> {
    let config = ModuleConfig::load_from_file(&path)?;
    let model = InstallerModel::build(config)
        .with_context(|| format!("Invalid package description in {:?}", path.as_ref()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileDirective, Group, Plugin, Step};
    use crate::types::{GroupType, PluginType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_config() -> ModuleConfig {
        ModuleConfig::new("Sample")
            .with_required_file(FileDirective::folder("core", ""))
            .with_step(Step::new(
                "Main",
                vec![Group::new(
                    "Textures",
                    GroupType::SelectExactlyOne,
                    vec![
                        Plugin::new("2K").with_type(PluginType::Recommended),
                        Plugin::new("4K"),
                    ],
                )],
            ))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let config = sample_config();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = ModuleConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ModuleConfig::load_from_file(Path::new("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();

        assert!(ModuleConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_unknown_group_type_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"{"steps":[{"name":"s","groups":[{"name":"g","type":"SelectSome","plugins":[{"name":"p"}]}]}]}"#,
            )
            .unwrap();
        temp_file.flush().unwrap();

        let err = ModuleConfig::load_from_file(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("SelectSome"));
    }

    #[test]
    fn test_load_model_reports_empty_group() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{"steps":[{"name":"s","groups":[{"name":"g","type":"SelectAny","plugins":[]}]}]}"#)
            .unwrap();
        temp_file.flush().unwrap();

        let err = load_model(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("has no plugins"));
    }
}
