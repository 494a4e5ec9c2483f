//! Error types for nosync-core

use thiserror::Error;

/// Result type alias using nosync-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Where to create a new remote repository when none was given
pub const NEW_REPO_URL: &str = "https://github.com/new";

/// Bootstrap error types
#[derive(Error, Debug)]
pub enum Error {
    /// No repository reference on the command line
    #[error("No repository provided")]
    MissingArgument,

    /// Repository reference could not be parsed
    #[error("Invalid repository reference '{input}': {reason}")]
    InvalidRepoRef { input: String, reason: String },

    /// Clone target already exists
    #[error("Project folder already exists: {path}")]
    ProjectExists { path: String },

    /// Clone failed
    #[error("Failed to clone repository: {message}")]
    CloneFailed { message: String },

    /// Manifest could not be checked (e.g. permission denied)
    #[error("Could not check for manifest at {path}")]
    ManifestProbe {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Package install exited non-zero
    #[error("Package install failed{}", exit_suffix(*code))]
    InstallFailed { code: Option<i32> },

    /// Project init exited non-zero
    #[error("Project initialization failed{}", exit_suffix(*code))]
    InitFailed { code: Option<i32> },

    /// Moving, creating, or linking the dependency cache failed
    #[error("Failed to relocate {path}: {message}")]
    RelocationFailed { path: String, message: String },

    /// External program is not installed
    #[error("Required command not found: {program}")]
    ToolNotFound { program: String },

    /// Process execution error
    #[error("Process execution failed: {0}")]
    ProcessExecution(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {})", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create an invalid repository reference error
    pub fn invalid_repo_ref(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepoRef {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a project exists error
    pub fn project_exists(path: impl Into<String>) -> Self {
        Self::ProjectExists { path: path.into() }
    }

    /// Create a clone failed error
    pub fn clone_failed(message: impl Into<String>) -> Self {
        Self::CloneFailed {
            message: message.into(),
        }
    }

    /// Create a manifest probe error
    pub fn manifest_probe(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ManifestProbe {
            path: path.into(),
            source,
        }
    }

    /// Create a relocation failed error
    pub fn relocation_failed(path: impl Into<String>, message: impl ToString) -> Self {
        Self::RelocationFailed {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a tool not found error
    pub fn tool_not_found(program: impl Into<String>) -> Self {
        Self::ToolNotFound {
            program: program.into(),
        }
    }

    /// Create a process execution error
    pub fn process_execution(message: impl Into<String>) -> Self {
        Self::ProcessExecution(message.into())
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Remediation shown under the error, if the user can act on it
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingArgument => Some(format!("Create one here: {}.", NEW_REPO_URL)),
            Self::InvalidRepoRef { .. } => Some(format!(
                "Expected something like {} or {}",
                "https://github.com/owner/repo.git", "git@github.com:owner/repo.git"
            )),
            Self::ProjectExists { .. } => {
                Some("Remove the folder or run from a different directory".to_string())
            }
            Self::ToolNotFound { program } => {
                Some(format!("Install '{}' and make sure it is on your PATH", program))
            }
            Self::InstallFailed { .. } | Self::InitFailed { .. } => Some(
                "Re-run with --no-strict to continue past package manager failures".to_string(),
            ),
            _ => None,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingArgument | Self::InvalidRepoRef { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_hint() {
        let err = Error::MissingArgument;
        assert_eq!(err.to_string(), "No repository provided");
        assert_eq!(
            err.hint().as_deref(),
            Some("Create one here: https://github.com/new.")
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_install_failed_display() {
        assert_eq!(
            Error::InstallFailed { code: Some(1) }.to_string(),
            "Package install failed (exit code 1)"
        );
        assert_eq!(
            Error::InitFailed { code: None }.to_string(),
            "Project initialization failed (terminated by signal)"
        );
    }

    #[test]
    fn test_exit_codes_are_non_zero() {
        assert_eq!(Error::clone_failed("boom").exit_code(), 1);
        assert_eq!(Error::relocation_failed("x", "y").exit_code(), 1);
        assert_eq!(Error::invalid_repo_ref("x", "y").exit_code(), 2);
    }

    #[test]
    fn test_wrapped_errors_keep_cause_as_source() {
        use std::error::Error as _;

        let yaml = serde_yaml_ng::from_str::<u32>("[").unwrap_err();
        let cause = yaml.to_string();
        let err = Error::from(yaml);
        assert_eq!(err.to_string(), "YAML parsing error");
        assert_eq!(err.source().map(|s| s.to_string()), Some(cause));

        let err = Error::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "IO error");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }
}
