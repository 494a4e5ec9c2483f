//! Project bootstrap workflow
//!
//! A bootstrap is a fixed chain of steps:
//!
//! ```text
//! Start -> RepoParsed -> Cloned -> Installed | Initialized -> Relocated -> Done
//! ```
//!
//! Any step can fail, which ends the run in [`Stage::Failed`]. Nothing is
//! rolled back: a repository that was cloned stays on disk.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{Message, OutputSink};
use crate::process::{CommandRunner, CommandSpec, StreamLine};
use crate::relocate::{relocate_cache, Relocation};
use crate::repo::RepoRef;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use tracing::{debug, info, warn};

/// Progress through the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    RepoParsed,
    Cloned,
    Installed,
    Initialized,
    Relocated,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::RepoParsed => "repo-parsed",
            Self::Cloned => "cloned",
            Self::Installed => "installed",
            Self::Initialized => "initialized",
            Self::Relocated => "relocated",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Which dependency step ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupKind {
    /// A manifest existed and packages were installed
    Installed,
    /// No manifest existed and a new project was initialized
    Initialized,
}

/// Everything a run will touch, computed before anything runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub repo: RepoRef,
    /// Project folder relative to the working directory
    pub project_dir: Utf8PathBuf,
    /// Project folder joined onto the working directory
    pub project_path: Utf8PathBuf,
    pub manifest: Utf8PathBuf,
    pub cache_dir: Utf8PathBuf,
    pub nosync_dir: Utf8PathBuf,
    pub clone: CommandSpec,
    pub install: CommandSpec,
    pub init: CommandSpec,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub project_dir: Utf8PathBuf,
    pub setup: SetupKind,
    pub relocation: Relocation,
}

/// Clones a repository and prepares its dependencies
pub struct Bootstrapper<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    sink: &'a dyn OutputSink,
    workdir: Utf8PathBuf,
    stages: Vec<Stage>,
}

impl<'a> Bootstrapper<'a> {
    /// `workdir` is where the project folder is created; it should be absolute
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        sink: &'a dyn OutputSink,
        workdir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
            workdir: workdir.into(),
            stages: vec![Stage::Start],
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    /// Every stage reached, in order
    pub fn history(&self) -> &[Stage] {
        &self.stages
    }

    /// Run the whole workflow for the given command-line argument
    pub async fn run(&mut self, reference: Option<&str>) -> Result<Outcome> {
        let plan = self.prepare(reference)?;
        self.execute(&plan).await
    }

    /// Parse the reference and build the plan without running anything
    pub fn prepare(&mut self, reference: Option<&str>) -> Result<Plan> {
        let result = extract_reference(reference)
            .and_then(RepoRef::parse)
            .map(|repo| {
                debug!("Parsed repository reference: {:?}", repo);
                self.plan(repo)
            });
        self.track(result, Stage::RepoParsed)
    }

    /// Build the plan for a parsed reference
    pub fn plan(&self, repo: RepoRef) -> Plan {
        let project_dir = repo.project_dir(self.config.layout);
        let project_path = self.workdir.join(&project_dir);

        let mut clone = CommandSpec::new("git").arg("clone");
        if let Some(depth) = self.config.clone.depth {
            clone = clone.arg("--depth").arg(depth.to_string());
        }
        if let Some(branch) = &self.config.clone.branch {
            clone = clone.arg("--branch").arg(branch);
        }
        let clone = clone
            .arg("--")
            .arg(&repo.raw)
            .arg(project_dir.as_str())
            .current_dir(&self.workdir);

        let pm = self.config.package_manager;
        Plan {
            manifest: project_dir.join(&self.config.manifest_file),
            cache_dir: project_dir.join(&self.config.cache_dir),
            nosync_dir: project_dir.join(self.config.nosync_dir_name()),
            install: pm.install_command(&project_path),
            init: pm.init_command(&project_path),
            clone,
            repo,
            project_dir,
            project_path,
        }
    }

    /// Run every step after planning
    pub async fn execute(&mut self, plan: &Plan) -> Result<Outcome> {
        let result = self.clone_repo(plan).await;
        self.track(result, Stage::Cloned)?;

        let result = self.setup_dependencies(plan).await;
        let next = if matches!(result, Ok(SetupKind::Initialized)) {
            Stage::Initialized
        } else {
            Stage::Installed
        };
        let setup = self.track(result, next)?;

        let result = self.relocate(plan);
        let relocation = self.track(result, Stage::Relocated)?;

        self.sink.write(Message::Success("All done :)".to_string()));
        self.advance(Stage::Done);

        Ok(Outcome {
            project_dir: plan.project_dir.clone(),
            setup,
            relocation,
        })
    }

    async fn clone_repo(&self, plan: &Plan) -> Result<()> {
        if plan.project_path.exists() {
            return Err(Error::project_exists(plan.project_dir.as_str()));
        }

        info!("Cloning {} into {}", plan.repo, plan.project_dir);
        self.sink
            .write(Message::Working("Cloning repository...".to_string()));

        let output = self.runner.run(&plan.clone, &mut |_: StreamLine| {}).await?;
        if !output.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("git clone exited with {:?}", output.exit_code)
            } else {
                stderr.to_string()
            };
            return Err(Error::clone_failed(message));
        }

        self.sink.write(Message::StepDone("Done!".to_string()));
        Ok(())
    }

    async fn setup_dependencies(&self, plan: &Plan) -> Result<SetupKind> {
        let manifest = self.workdir.join(&plan.manifest);
        let (cmd, kind, label) = if manifest_present(&manifest)? {
            (&plan.install, SetupKind::Installed, "Installing packages...")
        } else {
            (&plan.init, SetupKind::Initialized, "Initializing project...")
        };

        info!("Running {} in {}", cmd, plan.project_dir);
        self.sink.write(Message::Step(label.to_string()));

        let sink = self.sink;
        let output = self
            .runner
            .run(cmd, &mut |line: StreamLine| match line {
                StreamLine::Stdout(line) => sink.write(Message::Stdout(line)),
                StreamLine::Stderr(line) => sink.write(Message::Stderr(line)),
            })
            .await?;

        if !output.success() {
            if self.config.strict_exit_codes {
                return Err(match kind {
                    SetupKind::Installed => Error::InstallFailed {
                        code: output.exit_code,
                    },
                    SetupKind::Initialized => Error::InitFailed {
                        code: output.exit_code,
                    },
                });
            }
            warn!("{} exited with {:?}, continuing", cmd, output.exit_code);
            self.sink.write(Message::Info(format!(
                "{} exited with {:?}; continuing",
                cmd.program, output.exit_code
            )));
        }

        self.sink.write(Message::StepDone("Done!".to_string()));
        Ok(kind)
    }

    fn relocate(&self, plan: &Plan) -> Result<Relocation> {
        self.sink.write(Message::Step(format!(
            "Creating {} setup...",
            self.config.nosync_dir_name()
        )));
        let relocation = relocate_cache(
            &plan.project_path,
            &self.config.cache_dir,
            &self.config.nosync_suffix,
        )?;
        self.sink.write(Message::StepDone("Done!".to_string()));
        Ok(relocation)
    }

    /// Record `next` on success or [`Stage::Failed`] on error
    fn track<T>(&mut self, result: Result<T>, next: Stage) -> Result<T> {
        match &result {
            Ok(_) => self.advance(next),
            Err(e) => {
                debug!("Failed before reaching {}: {}", next, e);
                self.advance(Stage::Failed);
            }
        }
        result
    }

    fn advance(&mut self, stage: Stage) {
        debug!("Stage: {}", stage);
        self.stages.push(stage);
    }
}

/// The repository argument, if one was given and is not blank
pub fn extract_reference(reference: Option<&str>) -> Result<&str> {
    match reference.map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ => Err(Error::MissingArgument),
    }
}

/// Whether the manifest file exists
///
/// Unlike a plain `exists()` check, an inaccessible path is an error rather
/// than "absent".
pub fn manifest_present(path: &Utf8Path) -> Result<bool> {
    path.as_std_path()
        .try_exists()
        .map_err(|e| Error::manifest_probe(path.as_str(), e))
}
