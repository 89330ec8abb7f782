//! Argument builders for the external tools.
//!
//! Every function here is a pure mapping from resolved configuration to the
//! exact argument vector for one tool invocation, program name first. No
//! I/O and no failure path; consistency of the inputs is the validator's
//! job, and whether a command actually runs is the pipeline's.

use crate::types::{BuildParams, ResolvedProject};

const WORKSPACE_SUFFIX: &str = ".xcworkspace";
const PROJECT_SUFFIX: &str = ".xcodeproj";

/// Appends `suffix` to `name` unless it is already there.
///
/// Computed from the raw name on every call, so repeated argument building
/// never stacks suffixes.
fn with_suffix(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Arguments for the CocoaPods step: `pod update` when a lockfile exists,
/// `pod install` otherwise.
pub fn pod_args(lockfile_present: bool) -> Vec<String> {
    let action = if lockfile_present { "update" } else { "install" };
    vec!["pod".to_string(), action.to_string()]
}

/// Arguments for unlocking the signing keychain before the build.
pub fn unlock_keychain_args(password: &str, path: &str) -> Vec<String> {
    vec![
        "security".to_string(),
        "unlock-keychain".to_string(),
        "-p".to_string(),
        password.to_string(),
        path.to_string(),
    ]
}

/// Arguments for the xcodebuild invocation.
///
/// The workspace wins over the project, and the scheme wins over the
/// target, when both are set. Build settings are emitted as `KEY=VALUE`
/// tokens in insertion order, followed by the code-sign identity (only when
/// non-empty) and the SYMROOT / SHARED_PRECOMPS_DIR overrides.
pub fn xcodebuild_args(params: &BuildParams, resolved: &ResolvedProject) -> Vec<String> {
    let mut args = vec!["xcodebuild".to_string()];

    if let Some(workspace) = &params.workspace_name {
        args.push("-workspace".to_string());
        args.push(with_suffix(workspace, WORKSPACE_SUFFIX));
    } else if let Some(project) = &params.project_name {
        args.push("-project".to_string());
        args.push(with_suffix(project, PROJECT_SUFFIX));
    }

    if let Some(scheme) = &params.scheme {
        args.push("-scheme".to_string());
        args.push(scheme.clone());
    } else if let Some(target) = &params.target {
        args.push("-target".to_string());
        args.push(target.clone());
    }

    args.push("-sdk".to_string());
    args.push(resolved.sdk.clone());
    args.push("-configuration".to_string());
    args.push(resolved.configuration.clone());

    for (key, value) in &params.build_settings {
        args.push(format!("{key}={value}"));
    }

    if let Some(identity) = params.signing_identity() {
        args.push(format!("CODE_SIGN_IDENTITY={identity}"));
    }

    args.push(format!("SYMROOT={}", resolved.build_dir.display()));
    args.push(format!(
        "SHARED_PRECOMPS_DIR={}",
        resolved.shared_precomps_dir.display()
    ));

    args
}

/// Arguments for packaging the built `.app` bundle into an `.ipa` via
/// `xcrun PackageApplication`.
pub fn xcrun_args(params: &BuildParams, resolved: &ResolvedProject, final_name: &str) -> Vec<String> {
    let app_path = resolved.app_dir.join(format!("{}.app", params.app_name));
    let ipa_path = resolved.app_dir.join(format!("{final_name}.ipa"));

    let mut args = vec![
        "xcrun".to_string(),
        "-sdk".to_string(),
        resolved.sdk.clone(),
        "PackageApplication".to_string(),
        "-v".to_string(),
        app_path.display().to_string(),
        "-o".to_string(),
        ipa_path.display().to_string(),
    ];

    if let Some(identity) = params.signing_identity() {
        args.push("--sign".to_string());
        args.push(identity.to_string());
    }

    args
}
