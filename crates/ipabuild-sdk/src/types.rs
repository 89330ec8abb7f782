//! Core types for ipabuild-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`BuildParams`] - User-supplied build configuration
//! - [`HostProject`] - Host-supplied project directories and artifact name
//! - [`Defaults`] - Overridable default constants for the resolver
//! - [`ResolvedProject`] - Paths and effective settings derived once per build
//! - [`BuildError`] - Error categories for configuration and tool failures

use std::io;
use std::path::PathBuf;

/// Error type for ipabuild-sdk operations.
///
/// Errors fall into two externally distinguishable categories. A
/// configuration error means the supplied parameters are invalid and the
/// caller must fix its input; it is always raised before any external tool
/// runs. Tool errors ([`BuildError::Tool`] and [`BuildError::Spawn`]) mean an
/// external command failed or could not be launched, and carry the exact
/// argument vector for diagnostics. Nothing is ever retried.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The supplied build parameters are invalid or inconsistent.
    ///
    /// Examples: a workspace without a scheme, or a source directory that
    /// does not exist on disk.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An external tool exited with a non-zero status.
    #[error("command `{}` failed with {}", .command.join(" "), exit_label(.code))]
    Tool {
        /// The full argument vector that was executed, program name first.
        command: Vec<String>,
        /// The process exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// An external tool could not be launched at all.
    ///
    /// Common causes: the tool is not installed or not on PATH, or the
    /// working directory vanished between validation and execution.
    #[error("failed to launch `{}`: {source}", .command.join(" "))]
    Spawn {
        /// The argument vector that failed to spawn.
        command: Vec<String>,
        /// The underlying launch error.
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Returns `true` for the configuration category, `false` for the tool
    /// category ([`BuildError::Tool`] and [`BuildError::Spawn`]).
    pub fn is_config(&self) -> bool {
        matches!(self, BuildError::Config(_))
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal?)".to_string(),
    }
}

/// User-supplied build parameters.
///
/// Mirrors the configuration surface a front-end (CLI flags, config file,
/// build-system properties) exposes. Immutable once constructed; all
/// derivation happens in [`crate::project::resolve`].
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    /// Name of the app bundle, without the `.app` suffix.
    pub app_name: String,
    /// Source directory, relative to the host project base directory.
    pub source_dir: String,
    /// Skip `pod install`/`pod update` even when a Podfile is present.
    pub skip_pod_update: bool,
    /// Xcode project name; ignored when `workspace_name` is set.
    pub project_name: Option<String>,
    /// Xcode workspace name; requires `scheme`.
    pub workspace_name: Option<String>,
    /// Build scheme; takes priority over `target` when both are set.
    pub scheme: Option<String>,
    /// Build target; only used when no scheme is given.
    pub target: Option<String>,
    /// SDK identifier passed to xcodebuild and xcrun (e.g. "iphoneos").
    pub sdk: Option<String>,
    /// Build configuration name (e.g. "Release").
    pub configuration: Option<String>,
    /// Identity forwarded as CODE_SIGN_IDENTITY and `--sign`.
    pub code_sign_identity: Option<String>,
    /// Extra xcodebuild settings, emitted as KEY=VALUE in insertion order.
    pub build_settings: Vec<(String, String)>,
    /// Keychain file to unlock before building; only meaningful together
    /// with `keychain_password`.
    pub keychain_path: Option<String>,
    /// Password for the keychain; only meaningful together with
    /// `keychain_path`.
    pub keychain_password: Option<String>,
}

impl BuildParams {
    /// Creates parameters for `app_name` with the source directory defaulted
    /// to the project base directory.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            source_dir: ".".to_string(),
            ..Self::default()
        }
    }

    /// Returns the code-sign identity if it is present and non-empty.
    pub fn signing_identity(&self) -> Option<&str> {
        self.code_sign_identity
            .as_deref()
            .filter(|identity| !identity.is_empty())
    }

    /// Returns the keychain password/path pair if both are present.
    pub fn keychain(&self) -> Option<(&str, &str)> {
        match (&self.keychain_password, &self.keychain_path) {
            (Some(password), Some(path)) => Some((password, path)),
            _ => None,
        }
    }
}

/// Project locations supplied by the host, not derived by the SDK.
#[derive(Debug, Clone)]
pub struct HostProject {
    /// Absolute project root directory.
    pub base_dir: PathBuf,
    /// Absolute build output directory (SYMROOT).
    pub build_dir: PathBuf,
    /// Base name of the final artifact, without the `.ipa` suffix.
    pub final_name: String,
}

/// Default constants consumed by the resolver.
///
/// Passed explicitly rather than read from globals so tests and callers can
/// override them without process-wide state.
#[derive(Debug, Clone)]
pub struct Defaults {
    /// SDK used when `BuildParams::sdk` is not set, and always used for the
    /// products directory segment.
    pub sdk: String,
    /// Build configuration used when `BuildParams::configuration` is not set.
    pub configuration: String,
    /// Subdirectory of the build dir passed as SHARED_PRECOMPS_DIR.
    pub shared_precomps_dir: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            sdk: "iphoneos".to_string(),
            configuration: "Release".to_string(),
            shared_precomps_dir: "shared_precomps".to_string(),
        }
    }
}

/// Settings and paths derived once at the start of a build run.
///
/// Read-only after [`crate::project::resolve`]; every argument builder and
/// pipeline step works from this struct.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    /// Effective SDK (configured or default).
    pub sdk: String,
    /// Effective build configuration (configured or default).
    pub configuration: String,
    /// Directory all build tools run in: `base_dir/source_dir`.
    pub work_dir: PathBuf,
    /// Build output directory, forwarded as SYMROOT.
    pub build_dir: PathBuf,
    /// Directory the built `.app` bundle lands in:
    /// `build_dir/<configuration>-<default sdk>`.
    ///
    /// Note the path segment always uses the default SDK name, even when a
    /// non-default SDK is configured. Known oddity, kept for compatibility
    /// with existing product layouts.
    pub app_dir: PathBuf,
    /// Directory forwarded as SHARED_PRECOMPS_DIR.
    pub shared_precomps_dir: PathBuf,
}

/// Paths to the artifacts a completed pipeline run produced.
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    /// Path to the built `.app` bundle.
    pub app_path: PathBuf,
    /// Path to the packaged `.ipa`.
    pub ipa_path: PathBuf,
}
