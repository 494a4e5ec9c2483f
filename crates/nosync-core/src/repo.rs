//! Repository reference parsing
//!
//! A repository reference is whatever the user passed on the command line.
//! Three forms are understood:
//!
//! - URLs: `https://github.com/acme/widget.git`, `ssh://git@host:22/acme/widget`
//! - scp-like remotes: `git@github.com:acme/widget.git`
//! - local paths: `../mirrors/widget.git`
//!
//! The last path segment names the project. Its final extension (usually
//! `.git`) is split off, and the segment before it, when present, is the owner.

use crate::error::{Error, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// How a reference was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoScheme {
    Https,
    Http,
    Ssh,
    Git,
    File,
    /// `user@host:path` remote
    Scp,
    /// Plain filesystem path
    Local,
}

/// How the project folder is laid out under the working directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `<name>`, the same folder `git clone` picks on its own
    #[default]
    Flat,
    /// `<owner>/<name>`
    Owner,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "owner" => Ok(Self::Owner),
            other => Err(Error::invalid_config(format!(
                "unknown layout '{}', expected 'flat' or 'owner'",
                other
            ))),
        }
    }
}

/// A parsed repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Reference exactly as given (trimmed), passed through to `git clone`
    pub raw: String,
    pub scheme: RepoScheme,
    pub host: Option<String>,
    pub owner: Option<String>,
    /// Project folder name
    pub name: String,
    /// Suffix split off the last segment, without the dot
    pub extension: Option<String>,
}

impl RepoRef {
    /// Parse a repository reference
    ///
    /// # Errors
    /// Returns [`Error::InvalidRepoRef`] when the input is blank, has no `/`,
    /// uses an unsupported URL scheme, or does not end in a usable name.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(Error::invalid_repo_ref(input, "reference is empty"));
        }
        if !raw.contains('/') {
            return Err(Error::invalid_repo_ref(
                raw,
                "expected a path containing '/', such as owner/repo",
            ));
        }

        let (scheme, host, path) = if raw.contains("://") {
            parse_url(raw)?
        } else if let Some((host, path)) = split_scp(raw) {
            (RepoScheme::Scp, Some(host), path)
        } else {
            (RepoScheme::Local, None, raw.to_string())
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments
            .last()
            .ok_or_else(|| Error::invalid_repo_ref(raw, "no repository name in path"))?;

        let (name, extension) = split_extension(last);
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::invalid_repo_ref(
                raw,
                format!("'{}' is not a usable folder name", last),
            ));
        }

        let owner = segments
            .len()
            .checked_sub(2)
            .map(|i| segments[i])
            .filter(|o| *o != "." && *o != "..")
            .map(str::to_string);

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            host,
            owner,
            name: name.to_string(),
            extension: extension.map(str::to_string),
        })
    }

    /// Project folder relative to the working directory
    pub fn project_dir(&self, layout: Layout) -> Utf8PathBuf {
        match (layout, &self.owner) {
            (Layout::Owner, Some(owner)) => Utf8PathBuf::from(owner).join(&self.name),
            _ => Utf8PathBuf::from(&self.name),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_url(raw: &str) -> Result<(RepoScheme, Option<String>, String)> {
    let url = Url::parse(raw).map_err(|e| Error::invalid_repo_ref(raw, e.to_string()))?;
    let scheme = match url.scheme() {
        "https" => RepoScheme::Https,
        "http" => RepoScheme::Http,
        "ssh" | "git+ssh" => RepoScheme::Ssh,
        "git" => RepoScheme::Git,
        "file" => RepoScheme::File,
        other => {
            return Err(Error::invalid_repo_ref(
                raw,
                format!("unsupported scheme '{}'", other),
            ))
        }
    };
    Ok((
        scheme,
        url.host_str().map(str::to_string),
        url.path().to_string(),
    ))
}

/// Split `[user@]host:path` into host and path
///
/// Only applies when the colon comes before the first slash. A single
/// letter before the colon is a Windows drive, not a host.
fn split_scp(raw: &str) -> Option<(String, String)> {
    let colon = raw.find(':')?;
    let slash = raw.find('/')?;
    if colon > slash {
        return None;
    }
    let authority = &raw[..colon];
    let host = authority.rsplit('@').next().unwrap_or(authority);
    if host.is_empty() || (host.len() == 1 && host.chars().all(|c| c.is_ascii_alphabetic())) {
        return None;
    }
    Some((host.to_string(), raw[colon + 1..].to_string()))
}

fn split_extension(segment: &str) -> (&str, Option<&str>) {
    match segment.rfind('.') {
        Some(i) if i > 0 => {
            let ext = &segment[i + 1..];
            (&segment[..i], (!ext.is_empty()).then_some(ext))
        }
        _ => (segment, None),
    }
}
