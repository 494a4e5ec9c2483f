//! Package manager command selection

use crate::error::{Error, Result};
use crate::process::CommandSpec;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported package managers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Yarn,
    Npm,
    Pnpm,
}

impl PackageManager {
    /// All supported package managers
    pub const ALL: [PackageManager; 3] = [Self::Yarn, Self::Npm, Self::Pnpm];

    /// Executable name
    pub fn program(&self) -> &'static str {
        match self {
            Self::Yarn => "yarn",
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
        }
    }

    /// Install dependencies declared by the manifest in `project_dir`
    pub fn install_command(&self, project_dir: &Utf8Path) -> CommandSpec {
        CommandSpec::new(self.program())
            .arg("install")
            .current_dir(project_dir)
    }

    /// Create a manifest in `project_dir` without prompting
    pub fn init_command(&self, project_dir: &Utf8Path) -> CommandSpec {
        let cmd = CommandSpec::new(self.program())
            .arg("init")
            .current_dir(project_dir);
        match self {
            // pnpm init never prompts and rejects -y on older releases
            Self::Pnpm => cmd,
            Self::Yarn | Self::Npm => cmd.arg("-y"),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for PackageManager {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yarn" => Ok(Self::Yarn),
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            other => Err(Error::invalid_config(format!(
                "unknown package manager '{}', expected one of: yarn, npm, pnpm",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_commands() {
        let dir = Utf8Path::new("/work/widget");
        for pm in PackageManager::ALL {
            let cmd = pm.install_command(dir);
            assert_eq!(cmd.program, pm.program());
            assert_eq!(cmd.args, vec!["install"]);
            assert_eq!(cmd.current_dir.as_deref(), Some(dir));
        }
    }

    #[test]
    fn test_init_commands_are_non_interactive() {
        let dir = Utf8Path::new("widget");
        assert_eq!(
            PackageManager::Yarn.init_command(dir).args,
            vec!["init", "-y"]
        );
        assert_eq!(PackageManager::Npm.init_command(dir).args, vec!["init", "-y"]);
        assert_eq!(PackageManager::Pnpm.init_command(dir).args, vec!["init"]);
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for pm in PackageManager::ALL {
            assert_eq!(pm.to_string().parse::<PackageManager>().unwrap(), pm);
        }
        assert!("bun".parse::<PackageManager>().is_err());
    }
}
