//! Configuration file loading
//!
//! Settings come from the first source that exists:
//! an explicit `--config` path, a `nosync.yaml` in the working directory or
//! one of its parents, the user config at `~/.config/nosync/config.yaml`,
//! and finally the built-in defaults. Command-line flags are applied on top
//! by the binary.

use crate::error::{Error, Result};
use crate::package::PackageManager;
use crate::repo::Layout;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["nosync.yaml", "nosync.yml"];

/// Default manifest file
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";

/// Default dependency cache folder
pub const DEFAULT_CACHE_DIR: &str = "node_modules";

/// Suffix that sync tools (iCloud Drive in particular) skip
pub const DEFAULT_NOSYNC_SUFFIX: &str = ".nosync";

/// Bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Package manager used for install and init
    pub package_manager: PackageManager,

    /// Project folder layout under the working directory
    pub layout: Layout,

    /// File whose presence means the project is already initialized
    pub manifest_file: String,

    /// Dependency cache folder inside the project
    pub cache_dir: String,

    /// Suffix appended to the cache folder for the no-sync sibling
    pub nosync_suffix: String,

    /// Treat non-zero install/init exits as fatal
    pub strict_exit_codes: bool,

    /// Options passed to `git clone`
    pub clone: CloneConfig,
}

/// Options for `git clone`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloneConfig {
    /// Shallow clone with specified depth
    pub depth: Option<u32>,
    /// Branch to checkout after clone
    pub branch: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_manager: PackageManager::default(),
            layout: Layout::default(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            nosync_suffix: DEFAULT_NOSYNC_SUFFIX.to_string(),
            strict_exit_codes: true,
            clone: CloneConfig::default(),
        }
    }
}

/// Loaded configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when the built-in defaults were used
    pub source: Option<Utf8PathBuf>,
}

impl Config {
    /// Load configuration from the specified path or search for it
    ///
    /// `start_dir` is where the upward search for `nosync.yaml` begins.
    pub fn load(path: Option<&Utf8Path>, start_dir: &Utf8Path) -> Result<LoadedConfig> {
        let found = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                Some((p.to_owned(), content))
            }
            None => match Self::find_config(start_dir)? {
                Some(found) => Some(found),
                None => Self::user_config()?,
            },
        };

        let Some((source, content)) = found else {
            debug!("No configuration file found, using defaults");
            return Ok(LoadedConfig {
                config: Self::default(),
                source: None,
            });
        };

        debug!("Loading configuration from {}", source);
        let config = Self::from_yaml(&content)?;
        Ok(LoadedConfig {
            config,
            source: Some(source),
        })
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to an empty map
        let config: Config = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        validate_component("manifest_file", &self.manifest_file)?;
        validate_component("cache_dir", &self.cache_dir)?;

        if self.nosync_suffix.is_empty() {
            return Err(Error::invalid_config("nosync_suffix must not be empty"));
        }
        if self.nosync_suffix.contains(['/', '\\']) {
            return Err(Error::invalid_config(format!(
                "nosync_suffix '{}' must not contain a path separator",
                self.nosync_suffix
            )));
        }
        if self.clone.depth == Some(0) {
            return Err(Error::invalid_config("clone.depth must be at least 1"));
        }
        Ok(())
    }

    /// Name of the no-sync sibling folder, e.g. `node_modules.nosync`
    pub fn nosync_dir_name(&self) -> String {
        format!("{}{}", self.cache_dir, self.nosync_suffix)
    }

    fn find_config(start_dir: &Utf8Path) -> Result<Option<(Utf8PathBuf, String)>> {
        let mut current = start_dir;

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok(Some((path, content)));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    fn user_config() -> Result<Option<(Utf8PathBuf, String)>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        let Ok(dir) = Utf8PathBuf::try_from(dir) else {
            debug!("User config directory is not valid UTF-8, skipping");
            return Ok(None);
        };

        let path = dir.join("nosync").join("config.yaml");
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some((path, content)))
    }
}

fn validate_component(field: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Error::invalid_config(format!(
            "{} '{}' must be a single file or folder name",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.package_manager, PackageManager::Yarn);
        assert_eq!(config.layout, Layout::Flat);
        assert_eq!(config.manifest_file, "package.json");
        assert_eq!(config.cache_dir, "node_modules");
        assert_eq!(config.nosync_dir_name(), "node_modules.nosync");
        assert!(config.strict_exit_codes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("package_manager: pnpm\nclone:\n  depth: 1\n").unwrap();
        assert_eq!(config.package_manager, PackageManager::Pnpm);
        assert_eq!(config.clone.depth, Some(1));
        assert_eq!(config.cache_dir, "node_modules");
        assert!(config.strict_exit_codes);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_yaml("pakage_manager: npm\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_validate_rejects_nested_cache_dir() {
        let err = Config::from_yaml("cache_dir: deps/node_modules\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = Config::from_yaml("nosync_suffix: \"\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = Config::from_yaml("clone:\n  depth: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let path = root.join("custom.yaml");
        fs::write(&path, "layout: owner\n").unwrap();

        let loaded = Config::load(Some(&path), &root).unwrap();
        assert_eq!(loaded.config.layout, Layout::Owner);
        assert_eq!(loaded.source, Some(path));
    }

    #[test]
    fn test_load_explicit_path_missing() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let err = Config::load(Some(&root.join("missing.yaml")), &root).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        fs::write(root.join("nosync.yml"), "package_manager: npm\n").unwrap();
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let loaded = Config::load(None, &nested).unwrap();
        assert_eq!(loaded.config.package_manager, PackageManager::Npm);
        assert_eq!(loaded.source, Some(root.join("nosync.yml")));
    }
}
