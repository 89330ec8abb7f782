//! The build pipeline.
//!
//! A single linear run: resolve and validate the parameters, unlock the
//! keychain when credentials are given, install or update CocoaPods when a
//! Podfile is present, then invoke xcodebuild and package the result with
//! xcrun. Strictly sequential, no parallelism, and the first failure aborts
//! everything that follows; nothing is retried or rolled back.

use std::path::PathBuf;

use crate::invocations::{pod_args, unlock_keychain_args, xcodebuild_args, xcrun_args};
use crate::project::{has_podfile, has_podfile_lock, resolve, validate};
use crate::runner::CommandRunner;
use crate::types::{BuildArtifacts, BuildError, BuildParams, Defaults, HostProject};

/// One tool invocation the pipeline has decided to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    /// Argument vector, program name first.
    pub argv: Vec<String>,
    /// Working directory, or `None` for the process's current directory.
    pub cwd: Option<PathBuf>,
}

/// The full set of invocations a run would make, plus the artifact paths a
/// successful run produces.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub commands: Vec<PlannedCommand>,
    pub artifacts: BuildArtifacts,
}

/// Orchestrates one build run.
///
/// The only entry points are [`BuildPipeline::plan`] and
/// [`BuildPipeline::run`]; both take a fully formed [`BuildParams`] plus
/// host project info, independent of whatever front-end collected them.
///
/// # Example
///
/// ```no_run
/// use ipabuild_sdk::{BuildParams, BuildPipeline, HostProject, ProcessRunner};
/// use std::path::PathBuf;
///
/// let mut params = BuildParams::new("MyApp");
/// params.workspace_name = Some("App".into());
/// params.scheme = Some("App-Release".into());
///
/// let host = HostProject {
///     base_dir: PathBuf::from("/projects/my-app"),
///     build_dir: PathBuf::from("/projects/my-app/target"),
///     final_name: "MyApp-1.0".into(),
/// };
///
/// let artifacts = BuildPipeline::new(params, host).run(&mut ProcessRunner::new())?;
/// println!("✓ IPA created: {:?}", artifacts.ipa_path);
/// # Ok::<(), ipabuild_sdk::BuildError>(())
/// ```
#[derive(Debug)]
pub struct BuildPipeline {
    params: BuildParams,
    host: HostProject,
    defaults: Defaults,
}

impl BuildPipeline {
    /// Creates a pipeline with the built-in [`Defaults`].
    pub fn new(params: BuildParams, host: HostProject) -> Self {
        Self {
            params,
            host,
            defaults: Defaults::default(),
        }
    }

    /// Overrides the default constants used by the resolver.
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Resolves, validates, and derives every invocation the run would
    /// make, without executing anything.
    ///
    /// Configuration errors surface here, before any tool could run.
    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        let resolved = resolve(&self.params, &self.host, &self.defaults);
        validate(&self.params, &resolved)?;

        let mut commands = Vec::new();

        if let Some((password, path)) = self.params.keychain() {
            commands.push(PlannedCommand {
                argv: unlock_keychain_args(password, path),
                cwd: None,
            });
        }

        if !self.params.skip_pod_update && has_podfile(&resolved.work_dir) {
            commands.push(PlannedCommand {
                argv: pod_args(has_podfile_lock(&resolved.work_dir)),
                cwd: Some(resolved.work_dir.clone()),
            });
        }

        commands.push(PlannedCommand {
            argv: xcodebuild_args(&self.params, &resolved),
            cwd: Some(resolved.work_dir.clone()),
        });
        commands.push(PlannedCommand {
            argv: xcrun_args(&self.params, &resolved, &self.host.final_name),
            cwd: Some(resolved.work_dir.clone()),
        });

        let artifacts = BuildArtifacts {
            app_path: resolved.app_dir.join(format!("{}.app", self.params.app_name)),
            ipa_path: resolved
                .app_dir
                .join(format!("{}.ipa", self.host.final_name)),
        };

        Ok(BuildPlan {
            commands,
            artifacts,
        })
    }

    /// Runs the pipeline to completion, aborting at the first failure.
    pub fn run(&self, runner: &mut impl CommandRunner) -> Result<BuildArtifacts, BuildError> {
        let plan = self.plan()?;
        for command in &plan.commands {
            runner.run(&command.argv, command.cwd.as_deref())?;
        }
        Ok(plan.artifacts)
    }
}
