//! Runtime configuration loaded from `kgqa.toml`.
//!
//! Every key is optional. Relative paths are resolved against the directory
//! holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::KgqaError;

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kgqa.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub schema_path: PathBuf,
    pub templates_path: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    /// Result columns decoded as relationship-type lists.
    pub relationship_fields: Vec<String>,
    /// Compiled size limit of one category's mention matcher, in bytes.
    pub mention_size_limit: usize,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Words that, found inside a `（…）` suffix, become the entity's label.
    pub labels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("kg_schema.json"),
            templates_path: PathBuf::from("question_templates.csv"),
            database_path: PathBuf::from("kg.db"),
            log_level: "warn".to_string(),
            relationship_fields: vec!["REL".to_string()],
            mention_size_limit: 64 * (1 << 20),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            labels: ["歌曲", "专辑", "电影", "电视剧"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Parse a config from TOML text. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Config`] on invalid TOML or unknown keys.
    pub fn from_toml(src: &str) -> Result<Self, KgqaError> {
        toml::from_str(src).map_err(|e| KgqaError::Config(e.to_string()))
    }

    /// Load a config file, resolving relative paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, KgqaError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KgqaError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_toml(&raw)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Load `explicit` if given, else `./kgqa.toml` if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn discover(explicit: Option<&Path>) -> Result<Self, KgqaError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.schema_path,
            &mut self.templates_path,
            &mut self.database_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.relationship_fields, vec!["REL"]);
        assert_eq!(config.ingest.labels.len(), 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml("shcema_path = 'x.json'").unwrap_err();
        assert!(matches!(err, KgqaError::Config(_)));
    }

    #[test]
    fn load_resolves_paths_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgqa.toml");
        std::fs::write(
            &path,
            "schema_path = 'data/kg_schema.json'\ndatabase_path = '/abs/kg.db'\n\n[ingest]\nlabels = ['歌曲']\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.schema_path, dir.path().join("data/kg_schema.json"));
        assert_eq!(config.database_path, PathBuf::from("/abs/kg.db"));
        assert_eq!(config.templates_path, dir.path().join("question_templates.csv"));
        assert_eq!(config.ingest.labels, vec!["歌曲"]);
    }

    #[test]
    fn discover_with_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
