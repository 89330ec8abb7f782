//! Command execution.
//!
//! [`CommandRunner`] is the seam between the pipeline and the outside world:
//! the pipeline decides *what* to run and *where*, a runner actually runs
//! it. [`ProcessRunner`] is the real implementation; tests substitute a
//! recording runner to assert on the exact invocations.

use std::path::Path;
use std::process::Command;

use crate::types::BuildError;

/// Executes one external command and reports success or failure.
pub trait CommandRunner {
    /// Runs `argv` (program name first) in `cwd`, or in the process's
    /// current directory when `cwd` is `None`, blocking until it exits.
    ///
    /// Returns `Ok(())` only for exit code zero. A non-zero exit maps to
    /// [`BuildError::Tool`], a launch failure to [`BuildError::Spawn`].
    fn run(&mut self, argv: &[String], cwd: Option<&Path>) -> Result<(), BuildError>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
///
/// Standard streams are inherited so the tools' own output stays visible;
/// the SDK never parses it.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo each command line before running it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, argv: &[String], cwd: Option<&Path>) -> Result<(), BuildError> {
        if self.verbose {
            println!("  Running: {}", argv.join(" "));
        }

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| BuildError::Spawn {
            command: argv.to_vec(),
            source,
        })?;

        if !status.success() {
            return Err(BuildError::Tool {
                command: argv.to_vec(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let mut runner = ProcessRunner::new();
        let argv = vec!["ipabuild-test-no-such-tool".to_string()];
        let err = runner.run(&argv, None).unwrap_err();
        match err {
            BuildError::Spawn { command, .. } => assert_eq!(command, argv),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_exit_is_a_tool_error() {
        // `false` exits 1 on every unix we run tests on.
        let mut runner = ProcessRunner::new();
        let argv = vec!["false".to_string()];
        let err = runner.run(&argv, None).unwrap_err();
        match err {
            BuildError::Tool { command, code } => {
                assert_eq!(command, argv);
                assert_eq!(code, Some(1));
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[test]
    fn zero_exit_is_ok() {
        let mut runner = ProcessRunner::new();
        assert!(runner.run(&["true".to_string()], None).is_ok());
    }
}
