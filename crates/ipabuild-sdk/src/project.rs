//! Parameter resolution, validation, and CocoaPods probing.
//!
//! [`resolve`] turns [`BuildParams`] plus host project info into a
//! [`ResolvedProject`] by pure defaulting and path derivation. [`validate`]
//! is the only place configuration errors are raised; everything downstream
//! assumes a consistent configuration.

use std::path::Path;

use crate::types::{BuildError, BuildParams, Defaults, HostProject, ResolvedProject};

/// Dependency manifest checked for in the working directory.
pub const PODFILE: &str = "Podfile";
/// Lockfile that switches `pod install` to `pod update`.
pub const PODFILE_LOCK: &str = "Podfile.lock";

/// Derives the effective settings and paths for a build run.
///
/// Defaulting only, never fails: a missing build configuration or SDK falls
/// back to the values in `defaults`, and the working and products
/// directories are computed from the host project layout.
pub fn resolve(params: &BuildParams, host: &HostProject, defaults: &Defaults) -> ResolvedProject {
    let sdk = params
        .sdk
        .clone()
        .unwrap_or_else(|| defaults.sdk.clone());
    let configuration = params
        .configuration
        .clone()
        .unwrap_or_else(|| defaults.configuration.clone());

    // The products directory segment always uses the default SDK name, even
    // when a different SDK is configured. Known oddity, preserved so the
    // packaging step finds bundles where existing product layouts put them.
    let app_dir = host
        .build_dir
        .join(format!("{}-{}", configuration, defaults.sdk));

    ResolvedProject {
        sdk,
        configuration,
        work_dir: host.base_dir.join(&params.source_dir),
        build_dir: host.build_dir.clone(),
        app_dir,
        shared_precomps_dir: host.build_dir.join(&defaults.shared_precomps_dir),
    }
}

/// Checks the resolved configuration for inconsistencies.
///
/// Fails with [`BuildError::Config`] when a workspace is named without a
/// scheme, or when the resolved working directory does not exist. Runs
/// before any external tool is invoked.
pub fn validate(params: &BuildParams, resolved: &ResolvedProject) -> Result<(), BuildError> {
    if params.workspace_name.is_some() && params.scheme.is_none() {
        return Err(BuildError::Config(
            "the 'scheme' parameter is required when building a workspace".to_string(),
        ));
    }

    if !resolved.work_dir.exists() {
        return Err(BuildError::Config(format!(
            "invalid source_dir: {} does not exist",
            resolved.work_dir.display()
        )));
    }

    Ok(())
}

/// Returns whether the working directory contains a `Podfile`.
pub fn has_podfile(work_dir: &Path) -> bool {
    work_dir.join(PODFILE).exists()
}

/// Returns whether the working directory contains a `Podfile.lock`.
pub fn has_podfile_lock(work_dir: &Path) -> bool {
    work_dir.join(PODFILE_LOCK).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn host(base: &Path) -> HostProject {
        HostProject {
            base_dir: base.to_path_buf(),
            build_dir: base.join("target"),
            final_name: "MyApp-1.0".to_string(),
        }
    }

    #[test]
    fn resolve_applies_defaults() {
        let params = BuildParams::new("MyApp");
        let base = PathBuf::from("/projects/my-app");
        let resolved = resolve(&params, &host(&base), &Defaults::default());
        assert_eq!(resolved.sdk, "iphoneos");
        assert_eq!(resolved.configuration, "Release");
        assert_eq!(resolved.work_dir, base.join("."));
        assert_eq!(
            resolved.app_dir,
            base.join("target").join("Release-iphoneos")
        );
        assert_eq!(
            resolved.shared_precomps_dir,
            base.join("target").join("shared_precomps")
        );
    }

    #[test]
    fn resolve_keeps_configured_values() {
        let mut params = BuildParams::new("MyApp");
        params.sdk = Some("iphonesimulator".into());
        params.configuration = Some("Debug".into());
        params.source_dir = "ios".into();
        let base = PathBuf::from("/projects/my-app");
        let resolved = resolve(&params, &host(&base), &Defaults::default());
        assert_eq!(resolved.sdk, "iphonesimulator");
        assert_eq!(resolved.configuration, "Debug");
        assert_eq!(resolved.work_dir, base.join("ios"));
        // The products segment keeps the default SDK even though the build
        // uses the simulator SDK.
        assert_eq!(resolved.app_dir, base.join("target").join("Debug-iphoneos"));
    }

    #[test]
    fn validate_rejects_workspace_without_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = BuildParams::new("MyApp");
        params.workspace_name = Some("App".into());
        let resolved = resolve(&params, &host(dir.path()), &Defaults::default());
        let err = validate(&params, &resolved).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn validate_accepts_workspace_with_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = BuildParams::new("MyApp");
        params.workspace_name = Some("App".into());
        params.scheme = Some("App-Release".into());
        let resolved = resolve(&params, &host(dir.path()), &Defaults::default());
        assert!(validate(&params, &resolved).is_ok());
    }

    #[test]
    fn validate_rejects_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = BuildParams::new("MyApp");
        params.source_dir = "does-not-exist".into();
        let resolved = resolve(&params, &host(dir.path()), &Defaults::default());
        let err = validate(&params, &resolved).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn podfile_probing_is_plain_existence() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_podfile(dir.path()));
        assert!(!has_podfile_lock(dir.path()));

        fs::write(dir.path().join(PODFILE), "platform :ios, '15.0'\n").unwrap();
        assert!(has_podfile(dir.path()));
        assert!(!has_podfile_lock(dir.path()));

        fs::write(dir.path().join(PODFILE_LOCK), "PODS:\n").unwrap();
        assert!(has_podfile_lock(dir.path()));
    }
}
