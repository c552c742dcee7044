//! Running escaped lines through the system shell.

use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::Interrupted;
use anyhow::{Context as _, Result, anyhow};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Runs the lines a session routes past its own commands, e.g. `!ls -la`.
pub trait ExternalRunner {
    /// Run `command` and copy whatever it prints to `out`.
    ///
    /// # Arguments
    /// * `command` - The line with the escape character removed.
    /// * `env` - Variables and working directory for the child process.
    /// * `out` - Session output.
    ///
    /// # Returns
    /// The exit code of the command, or an error when it could not be started.
    fn run(&mut self, command: &str, env: &Environment, out: &mut dyn Write) -> Result<ExitCode>;
}

/// Hands command lines to the platform shell (`sh -c` or `cmd /C`).
#[derive(Debug, Default, Clone)]
pub struct SystemShell;

impl SystemShell {
    #[cfg(unix)]
    fn program(env: &Environment) -> Result<(PathBuf, &'static str)> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let fallback = Path::new("/bin/sh");
        find_in_path(OsStr::new(&search_paths), OsStr::new("sh"))
            .or_else(|| fallback.exists().then(|| fallback.to_path_buf()))
            .map(|path| (path, "-c"))
            .ok_or_else(|| anyhow!("no system shell found in PATH"))
    }

    #[cfg(not(unix))]
    fn program(_env: &Environment) -> Result<(PathBuf, &'static str)> {
        Ok((PathBuf::from("cmd"), "/C"))
    }
}

impl ExternalRunner for SystemShell {
    fn run(&mut self, command: &str, env: &Environment, out: &mut dyn Write) -> Result<ExitCode> {
        let (program, flag) = Self::program(env)?;
        log::debug!("Running {command:?} through {}", program.display());
        let output = std::process::Command::new(&program)
            .arg(flag)
            .arg(command)
            .stdin(Stdio::inherit())
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .output()
            .with_context(|| format!("failed to start {}", program.display()))?;

        out.write_all(&output.stdout)?;
        out.write_all(&output.stderr)?;
        if killed_by_interrupt(output.status) {
            return Err(anyhow::Error::new(Interrupted).context(format!("{command} got SIGINT")));
        }
        match output.status.code() {
            Some(code) => Ok(code),
            None => Ok(terminated_by_signal(output.status)),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(unix)]
fn killed_by_interrupt(exit_status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    ExitStatusExt::signal(&exit_status) == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_exit_status: ExitStatus) -> bool {
    false
}

#[cfg(unix)]
fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::is_interrupt;
    use std::fs;
    use std::fs::File;

    #[test]
    #[cfg(unix)]
    fn shell_found_in_path() {
        let found = find_in_path(OsStr::new("/bin"), OsStr::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.starts_with("/bin"));
        assert!(found.ends_with("sh"));
    }

    #[test]
    #[cfg(unix)]
    fn missing_program_is_none() {
        let res = find_in_path(OsStr::new("/bin"), OsStr::new("nonexisting_program_name"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn later_path_entries_are_searched() {
        let tmp_base =
            std::env::temp_dir().join(format!("cmdloop_external_{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp_base);
        fs::create_dir_all(tmp_base.join("bin")).expect("create temp bin dir");
        File::create(tmp_base.join("bin").join("mytool")).expect("touch mytool");

        let search = std::env::join_paths([tmp_base.join("missing"), tmp_base.join("bin")])
            .expect("join paths");
        let found = find_in_path(&search, OsStr::new("mytool"));
        let _ = fs::remove_dir_all(&tmp_base);

        let found = found.expect("Expected to find mytool in the second PATH entry");
        assert!(found.ends_with("bin/mytool"));
    }

    #[test]
    #[cfg(unix)]
    fn system_shell_captures_output() {
        let env = Environment::new();
        let mut out = Vec::new();
        let code = SystemShell.run("echo hello", &env, &mut out).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }

    #[test]
    #[cfg(unix)]
    fn system_shell_reports_exit_code() {
        let env = Environment::new();
        let mut out = Vec::new();
        let code = SystemShell.run("exit 3", &env, &mut out).unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    #[cfg(unix)]
    fn system_shell_reports_sigint_as_interrupt() {
        let env = Environment::new();
        let mut out = Vec::new();
        let err = SystemShell.run("kill -INT $$", &env, &mut out).unwrap_err();
        assert!(is_interrupt(&err));
    }

    #[test]
    #[cfg(unix)]
    fn system_shell_passes_variables() {
        let mut env = Environment::new();
        env.set_var("CMDLOOP_GREETING", "howdy");
        let mut out = Vec::new();
        SystemShell.run("echo $CMDLOOP_GREETING", &env, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "howdy\n");
    }
}
