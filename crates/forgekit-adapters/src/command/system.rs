//! Runs programs found on `PATH`.

use std::path::Path;
use std::process::Command;

use tracing::{debug, instrument};

use forgekit_core::{
    application::{
        ApplicationError,
        ports::{CommandOutput, CommandRunner},
    },
    error::ForgeResult,
};

/// Runs external programs (`npm`, `pnpm`, `docker`, ...) synchronously.
///
/// The program is looked up with [`which`], which also resolves the
/// `.cmd`/`.exe` shims package managers install on Windows. A non-zero exit
/// is not an error here; callers inspect [`CommandOutput::status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Whether `program` resolves on `PATH`.
    pub fn is_available(program: &str) -> bool {
        which::which(program).is_ok()
    }
}

impl CommandRunner for SystemCommandRunner {
    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> ForgeResult<CommandOutput> {
        let command_line = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        let resolved = which::which(program).map_err(|e| ApplicationError::CommandFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %resolved.display(), "Resolved program");

        let output = Command::new(&resolved)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| ApplicationError::CommandFailed {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        debug!(status = ?output.status.code(), "Command finished");

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgekit_core::error::ForgeError;
    use tempfile::TempDir;

    #[test]
    fn missing_program_is_command_failed() {
        let tmp = TempDir::new().unwrap();
        let err = SystemCommandRunner
            .run("forgekit-no-such-program", &["--version".into()], tmp.path())
            .unwrap_err();
        match err {
            ForgeError::Application(ApplicationError::CommandFailed { command, .. }) => {
                assert_eq!(command, "forgekit-no-such-program --version");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!SystemCommandRunner::is_available("forgekit-no-such-program"));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_status_in_cwd() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "x").unwrap();

        let out = SystemCommandRunner
            .run(
                "sh",
                &["-c".into(), "ls; echo oops >&2; exit 3".into()],
                tmp.path(),
            )
            .unwrap();

        assert_eq!(out.status, Some(3));
        assert!(!out.success());
        assert!(out.stdout.contains("marker.txt"));
        assert_eq!(out.stderr.trim(), "oops");
    }
}
