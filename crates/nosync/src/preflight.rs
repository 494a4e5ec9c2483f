//! Check that required tools are installed before touching anything

use nosync_core::config::Config;
use nosync_core::Error;
use tracing::debug;

/// Programs a bootstrap with this config will run
pub fn required_tools(config: &Config) -> Vec<&'static str> {
    vec!["git", config.package_manager.program()]
}

/// Fail with [`Error::ToolNotFound`] for the first missing tool
pub fn check(config: &Config) -> Result<(), Error> {
    check_with(config, |tool| which::which(tool).is_ok())
}

fn check_with(config: &Config, is_available: impl Fn(&str) -> bool) -> Result<(), Error> {
    for tool in required_tools(config) {
        if !is_available(tool) {
            return Err(Error::tool_not_found(tool));
        }
        debug!("Found {}", tool);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosync_core::package::PackageManager;

    #[test]
    fn test_required_tools_follow_package_manager() {
        let mut config = Config::default();
        assert_eq!(required_tools(&config), vec!["git", "yarn"]);
        config.package_manager = PackageManager::Pnpm;
        assert_eq!(required_tools(&config), vec!["git", "pnpm"]);
    }

    #[test]
    fn test_reports_first_missing_tool() {
        let config = Config::default();
        let err = check_with(&config, |tool| tool == "git").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { ref program } if program == "yarn"));

        assert!(check_with(&config, |_| true).is_ok());
    }
}
