//! iOS build orchestration SDK.
//!
//! `ipabuild-sdk` drives a native iOS build by invoking a fixed sequence of
//! external command-line tools with correctly derived arguments: CocoaPods
//! for dependencies, `security` to unlock the signing keychain, `xcodebuild`
//! to compile, and `xcrun PackageApplication` to produce an `.ipa`. The SDK
//! decides *whether*, *in what order*, and *with what arguments* to invoke
//! each tool; the tools themselves do the actual dependency resolution,
//! compilation, signing, and packaging.
//!
//! # Quick Start
//!
//! ```no_run
//! use ipabuild_sdk::{BuildParams, BuildPipeline, HostProject, ProcessRunner};
//! use std::path::PathBuf;
//!
//! let mut params = BuildParams::new("MyApp");
//! params.workspace_name = Some("App".into());
//! params.scheme = Some("App-Release".into());
//!
//! let host = HostProject {
//!     base_dir: PathBuf::from("/projects/my-app"),
//!     build_dir: PathBuf::from("/projects/my-app/target"),
//!     final_name: "MyApp-1.0".into(),
//! };
//!
//! let artifacts = BuildPipeline::new(params, host).run(&mut ProcessRunner::new())?;
//! println!("✓ IPA created: {:?}", artifacts.ipa_path);
//! # Ok::<(), ipabuild_sdk::BuildError>(())
//! ```
//!
//! # Architecture
//!
//! - **types**: build parameters, derived paths, and the two error
//!   categories (configuration vs. tool failure)
//! - **project**: defaulting/path resolution, validation, Podfile probing
//! - **invocations**: pure argument builders, one per external tool
//! - **runner**: the [`CommandRunner`] seam and its process-backed
//!   implementation
//! - **pipeline**: the sequential, fail-fast orchestrator
//!
//! Execution is single-threaded and strictly sequential; each tool blocks
//! until the previous one finished, and the first failure aborts the run.

pub mod invocations;
pub mod pipeline;
pub mod project;
pub mod runner;
pub mod types;

// Re-export key types for convenience
pub use pipeline::{BuildPipeline, BuildPlan, PlannedCommand};
pub use runner::{CommandRunner, ProcessRunner};
pub use types::{BuildArtifacts, BuildError, BuildParams, Defaults, HostProject, ResolvedProject};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
