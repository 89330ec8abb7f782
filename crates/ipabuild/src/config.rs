//! Configuration file support for ipabuild.
//!
//! An `ipabuild.toml` file persists project settings so they need not be
//! passed as CLI flags on every invocation. Flags always win over file
//! values.
//!
//! ## Configuration File Location
//!
//! The file is searched for in the current working directory first, then in
//! each parent directory up to the filesystem root.
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! app_name = "MyApp"
//! source_dir = "."
//! final_name = "MyApp-1.0"
//!
//! [build]
//! workspace = "App"
//! scheme = "App-Release"
//! configuration = "Release"
//! settings = ["ENABLE_BITCODE=NO"]
//!
//! [keychain]
//! path = "/Users/ci/Library/Keychains/build.keychain"
//! password = "${KEYCHAIN_PASSWORD}"
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "ipabuild.toml";

/// Root configuration structure for `ipabuild.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpabuildConfig {
    /// Project layout and artifact naming.
    pub project: ProjectConfig,

    /// Build target, SDK, and signing settings.
    pub build: BuildConfig,

    /// Keychain to unlock before signing.
    pub keychain: KeychainConfig,
}

/// Project layout and artifact naming.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name of the app bundle, without the `.app` suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Source directory relative to the project root. Defaults to ".".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    /// Base name of the final `.ipa`. Defaults to the app name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,

    /// Build output directory. Defaults to `<project root>/target`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
}

/// Build target, SDK, and signing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Xcode workspace name; requires `scheme`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,

    /// Xcode project name; ignored when `workspace` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Build scheme; wins over `target` when both are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Build target; only used without a scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// SDK identifier, e.g. "iphoneos" or "iphonesimulator".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,

    /// Build configuration name, e.g. "Release".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    /// Code-sign identity forwarded to xcodebuild and xcrun.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_sign_identity: Option<String>,

    /// Skip `pod install`/`pod update` even when a Podfile exists.
    pub skip_pod_update: bool,

    /// Extra xcodebuild settings as `KEY=VALUE` strings, in order.
    pub settings: Vec<String>,
}

/// Keychain to unlock before signing. Only meaningful when both fields are
/// set; a half-configured keychain is silently skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Searches for a configuration file starting at `dir` and walking up
/// through parent directories. Returns `None` when no file is found.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let mut current = Some(dir);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

/// Loads and parses the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<IpabuildConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
    toml::from_str(&contents).with_context(|| format!("parsing config {:?}", path))
}

/// Parses a `KEY=VALUE` build setting into an ordered pair.
pub fn parse_setting(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid build setting {:?}: expected KEY=VALUE", raw),
    }
}
