//! # nosync-core
//!
//! Library behind the `nosync` CLI:
//! - Repository reference parsing and project folder derivation
//! - External command execution with streamed output
//! - Package install / project init selection
//! - Relocating `node_modules` to a `.nosync` sibling behind a symlink
//!
//! # Example
//!
//! ```no_run
//! use nosync_core::bootstrap::Bootstrapper;
//! use nosync_core::config::Config;
//! use nosync_core::output::MemorySink;
//! use nosync_core::process::SystemRunner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let sink = MemorySink::new();
//! let mut bootstrapper = Bootstrapper::new(&config, &SystemRunner, &sink, "/tmp/projects");
//! let outcome = bootstrapper
//!     .run(Some("https://github.com/acme/widget.git"))
//!     .await?;
//! println!("Ready in {}", outcome.project_dir);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod output;
pub mod package;
pub mod process;
pub mod relocate;
pub mod repo;

pub use error::{Error, Result};

pub use bootstrap::{Bootstrapper, Outcome, Plan, SetupKind, Stage};
pub use config::Config;
pub use repo::{Layout, RepoRef};
