use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use ipabuild_sdk::{BuildParams, BuildPipeline, HostProject, ProcessRunner};
use serde_json::json;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use config::{IpabuildConfig, find_config, load_config, parse_setting};

mod config;

/// CLI orchestrator for building and packaging iOS apps.
#[derive(Parser, Debug)]
#[command(name = "ipabuild", author, version, about = "iOS build and packaging orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline: unlock keychain, pods, xcodebuild, xcrun.
    Build {
        #[command(flatten)]
        flags: BuildFlags,
        #[arg(long, help = "Echo each command line before running it")]
        verbose: bool,
    },
    /// Print the tool invocations a build would make, without running them.
    Plan {
        #[command(flatten)]
        flags: BuildFlags,
        #[arg(long, help = "Emit the plan as JSON")]
        json: bool,
    },
    /// Scaffold a starter ipabuild.toml.
    Init {
        #[arg(long, default_value = "ipabuild.toml")]
        output: PathBuf,
        #[arg(long, default_value = "MyApp")]
        app_name: String,
    },
}

/// Flags shared by `build` and `plan`. Every flag overrides the
/// corresponding `ipabuild.toml` value.
#[derive(Args, Debug, Default)]
struct BuildFlags {
    #[arg(long, help = "App bundle name, without the .app suffix")]
    app_name: Option<String>,
    #[arg(long, help = "Source directory relative to the project root")]
    source_dir: Option<String>,
    #[arg(long, help = "Xcode workspace name (requires --scheme)")]
    workspace: Option<String>,
    #[arg(long, help = "Xcode project name (ignored with --workspace)")]
    project: Option<String>,
    #[arg(long)]
    scheme: Option<String>,
    #[arg(long, help = "Build target (only used without --scheme)")]
    target: Option<String>,
    #[arg(long, help = "SDK identifier, e.g. iphoneos or iphonesimulator")]
    sdk: Option<String>,
    #[arg(long, help = "Build configuration, e.g. Release")]
    configuration: Option<String>,
    #[arg(long, help = "Code-sign identity for xcodebuild and xcrun")]
    identity: Option<String>,
    #[arg(
        long = "setting",
        value_name = "KEY=VALUE",
        help = "Extra xcodebuild setting; repeatable, order preserved"
    )]
    settings: Vec<String>,
    #[arg(long, help = "Skip pod install/update even when a Podfile exists")]
    skip_pod_update: bool,
    #[arg(long, help = "Keychain to unlock before signing")]
    keychain_path: Option<String>,
    #[arg(long, help = "Password for --keychain-path; ${VAR} reads the environment")]
    keychain_password: Option<String>,
    #[arg(long, help = "Project root directory (defaults to the current directory)")]
    project_dir: Option<PathBuf>,
    #[arg(long, help = "Build output directory (defaults to <project-dir>/target)")]
    build_dir: Option<PathBuf>,
    #[arg(long, help = "Base name of the final .ipa (defaults to the app name)")]
    final_name: Option<String>,
    #[arg(long, help = "Explicit path to ipabuild.toml")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { flags, verbose } => cmd_build(flags, verbose),
        Command::Plan { flags, json } => cmd_plan(flags, json),
        Command::Init { output, app_name } => cmd_init(&output, &app_name),
    }
}

fn cmd_build(flags: BuildFlags, verbose: bool) -> Result<()> {
    let (params, host) = resolve_inputs(flags)?;
    println!(
        "Building {} ({} / {})",
        params.app_name,
        params
            .configuration
            .as_deref()
            .unwrap_or("Release"),
        params.sdk.as_deref().unwrap_or("iphoneos"),
    );

    let pipeline = BuildPipeline::new(params, host);
    let mut runner = ProcessRunner::new().verbose(verbose);
    let artifacts = pipeline.run(&mut runner)?;

    println!("\n✓ Build completed!");
    println!("  App: {:?}", artifacts.app_path);
    println!("  IPA: {:?}", artifacts.ipa_path);
    Ok(())
}

fn cmd_plan(flags: BuildFlags, as_json: bool) -> Result<()> {
    let (params, host) = resolve_inputs(flags)?;
    let plan = BuildPipeline::new(params, host).plan()?;

    if as_json {
        let commands: Vec<_> = plan
            .commands
            .iter()
            .map(|cmd| {
                json!({
                    "argv": cmd.argv,
                    "cwd": cmd.cwd,
                })
            })
            .collect();
        let payload = json!({
            "commands": commands,
            "app_path": plan.artifacts.app_path,
            "ipa_path": plan.artifacts.ipa_path,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for cmd in &plan.commands {
        match &cmd.cwd {
            Some(dir) => println!("[{}] {}", dir.display(), cmd.argv.join(" ")),
            None => println!("{}", cmd.argv.join(" ")),
        }
    }
    println!("\nArtifacts:");
    println!("  App: {:?}", plan.artifacts.app_path);
    println!("  IPA: {:?}", plan.artifacts.ipa_path);
    Ok(())
}

fn cmd_init(output: &Path, app_name: &str) -> Result<()> {
    ensure_can_write(output)?;

    let mut cfg = IpabuildConfig::default();
    cfg.project.app_name = Some(app_name.to_string());
    cfg.project.source_dir = Some(".".to_string());
    cfg.build.workspace = Some(app_name.to_string());
    cfg.build.scheme = Some(format!("{app_name}-Release"));
    cfg.build.configuration = Some("Release".to_string());

    let contents = toml::to_string_pretty(&cfg)?;
    fs::write(output, contents).with_context(|| format!("writing config {:?}", output))?;
    println!("Wrote starter config to {:?}", output);
    Ok(())
}

/// Merges CLI flags over the config file into the SDK's input types.
///
/// Flags win; the file fills the gaps. The only hard requirement is an app
/// name from one of the two sources.
fn resolve_inputs(flags: BuildFlags) -> Result<(BuildParams, HostProject)> {
    let project_dir = match &flags.project_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("resolving current directory")?,
    };

    let file = match &flags.config {
        Some(path) => Some(load_config(path)?),
        None => match find_config(&project_dir) {
            Some(path) => Some(load_config(&path)?),
            None => None,
        },
    };
    let file = file.unwrap_or_default();

    let app_name = flags
        .app_name
        .or(file.project.app_name)
        .ok_or_else(|| anyhow!("app name missing; pass --app-name or set project.app_name"))?;

    let mut settings = Vec::new();
    for raw in file.build.settings.iter().map(String::as_str) {
        settings.push(parse_setting(raw)?);
    }
    for raw in &flags.settings {
        settings.push(parse_setting(raw)?);
    }

    let keychain_path = flags
        .keychain_path
        .or(file.keychain.path)
        .map(|v| expand_env_var(&v))
        .transpose()?;
    let keychain_password = flags
        .keychain_password
        .or(file.keychain.password)
        .map(|v| expand_env_var(&v))
        .transpose()?;

    let params = BuildParams {
        app_name: app_name.clone(),
        source_dir: flags
            .source_dir
            .or(file.project.source_dir)
            .unwrap_or_else(|| ".".to_string()),
        skip_pod_update: flags.skip_pod_update || file.build.skip_pod_update,
        project_name: flags.project.or(file.build.project),
        workspace_name: flags.workspace.or(file.build.workspace),
        scheme: flags.scheme.or(file.build.scheme),
        target: flags.target.or(file.build.target),
        sdk: flags.sdk.or(file.build.sdk),
        configuration: flags.configuration.or(file.build.configuration),
        code_sign_identity: flags.identity.or(file.build.code_sign_identity),
        build_settings: settings,
        keychain_path,
        keychain_password,
    };

    let build_dir = flags
        .build_dir
        .or(file.project.build_dir)
        .unwrap_or_else(|| project_dir.join("target"));
    let final_name = flags
        .final_name
        .or(file.project.final_name)
        .unwrap_or(app_name);

    let host = HostProject {
        base_dir: project_dir,
        build_dir,
        final_name,
    };

    Ok((params, host))
}

/// Resolves `${VAR}` values from the environment; anything else passes
/// through unchanged.
fn expand_env_var(raw: &str) -> Result<String> {
    if let Some(stripped) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        let val = env::var(stripped)
            .with_context(|| format!("resolving env var {stripped} for keychain config"))?;
        return Ok(val);
    }
    Ok(raw.to_string())
}

fn ensure_can_write(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating parent directory {:?}", parent))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_with(app: &str, dir: &Path) -> BuildFlags {
        BuildFlags {
            app_name: Some(app.to_string()),
            project_dir: Some(dir.to_path_buf()),
            ..BuildFlags::default()
        }
    }

    #[test]
    fn flags_alone_resolve_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (params, host) = resolve_inputs(flags_with("MyApp", dir.path())).unwrap();
        assert_eq!(params.app_name, "MyApp");
        assert_eq!(params.source_dir, ".");
        assert_eq!(host.build_dir, dir.path().join("target"));
        assert_eq!(host.final_name, "MyApp");
    }

    #[test]
    fn missing_app_name_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut flags = flags_with("MyApp", dir.path());
        flags.app_name = None;
        let err = resolve_inputs(flags).unwrap_err();
        assert!(err.to_string().contains("app name missing"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(config::CONFIG_FILE_NAME),
            r#"
[project]
app_name = "FromFile"
final_name = "FromFile-1.0"

[build]
scheme = "File-Scheme"
configuration = "Debug"
"#,
        )
        .unwrap();

        let mut flags = flags_with("FromFlag", dir.path());
        flags.scheme = Some("Flag-Scheme".to_string());
        let (params, host) = resolve_inputs(flags).unwrap();
        assert_eq!(params.app_name, "FromFlag");
        assert_eq!(params.scheme.as_deref(), Some("Flag-Scheme"));
        // Unset flags still fall back to the file.
        assert_eq!(params.configuration.as_deref(), Some("Debug"));
        assert_eq!(host.final_name, "FromFile-1.0");
    }

    #[test]
    fn file_settings_precede_flag_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(config::CONFIG_FILE_NAME),
            "[build]\nsettings = [\"FOO=1\"]\n",
        )
        .unwrap();

        let mut flags = flags_with("MyApp", dir.path());
        flags.settings = vec!["BAR=2".to_string()];
        let (params, _) = resolve_inputs(flags).unwrap();
        assert_eq!(
            params.build_settings,
            [
                ("FOO".to_string(), "1".to_string()),
                ("BAR".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn malformed_setting_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut flags = flags_with("MyApp", dir.path());
        flags.settings = vec!["NOEQUALS".to_string()];
        assert!(resolve_inputs(flags).is_err());
    }

    #[test]
    fn keychain_env_expansion() {
        let dir = tempfile::tempdir().unwrap();
        // Env mutation is process-wide; keep the variable name test-unique.
        env::set_var("IPABUILD_TEST_KEYCHAIN_PW", "hunter2");
        let mut flags = flags_with("MyApp", dir.path());
        flags.keychain_path = Some("/tmp/build.keychain".to_string());
        flags.keychain_password = Some("${IPABUILD_TEST_KEYCHAIN_PW}".to_string());
        let (params, _) = resolve_inputs(flags).unwrap();
        assert_eq!(params.keychain_password.as_deref(), Some("hunter2"));
        env::remove_var("IPABUILD_TEST_KEYCHAIN_PW");
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ipabuild.toml");
        cmd_init(&output, "MyApp").unwrap();
        let config = load_config(&output).unwrap();
        assert_eq!(config.project.app_name.as_deref(), Some("MyApp"));
        assert!(cmd_init(&output, "MyApp").is_err());
    }
}
