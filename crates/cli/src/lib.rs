#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end for `dirload`: it recognizes the
//! configuration surface in spec.md §6, validates it into a
//! [`dispatch::RunConfig`], and drives either a one-shot startup action
//! (`--clean-write-paths`, `--flist-file-create`) or the full dispatch loop.
//!
//! # Design
//!
//! [`run`] mirrors the shape of a typical Rust CLI front-end: it accepts an
//! argument iterator plus stdout/stderr handles rather than touching
//! [`std::env`] or the real standard streams directly, so the whole surface
//! is testable in-process. Argument parsing itself is a plain
//! [`clap`](https://docs.rs/clap) [`clap::Command`] built with the builder
//! API (no derive macros) in [`command::clap_command`], matching the
//! workspace's established parsing style.
//!
//! # Errors
//!
//! [`run`] never panics. Argument errors, configuration rejection, and
//! dispatch failures all render a message to `stderr` and map to exit code 1;
//! everything else maps to exit code 0.

mod args;
mod command;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use args::parse_args;
use dispatch::{DispatchError, RunConfig};
use logging::DebugSink;

const PROGRAM_NAME: &str = "dirload";

/// Errors [`run`] can surface before mapping them to an exit code.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Parse(clap::Error),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error("dirload does not support Windows: POSIX path separators only")]
    UnsupportedPlatform,
    #[error("{0} write path(s) remained after cleanup")]
    ResidualWritePaths(usize),
}

/// Runs one invocation of `dirload`, writing output to `stdout`/`stderr`.
///
/// Returns the process exit code: `0` on a clean run, `1` on any startup
/// rejection or uncleaned write paths (spec.md §6).
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    if cfg!(windows) {
        let _ = writeln!(stderr, "{}", CliError::UnsupportedPlatform);
        return 1;
    }

    match run_inner(arguments, stdout) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {e}");
            1
        }
    }
}

/// Maps the `i32` status from [`run`] to a process [`ExitCode`], clamping to
/// the range representable by a Unix process.
#[must_use]
pub fn exit_code_from(status: i32) -> ExitCode {
    ExitCode::from(status.clamp(0, i32::from(u8::MAX)) as u8)
}

fn run_inner<I, S, Out>(arguments: I, stdout: &mut Out) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
{
    let parsed = parse_args(PROGRAM_NAME, arguments).map_err(CliError::Parse)?;

    if parsed.show_help {
        let _ = writeln!(stdout, "{}", help_text());
        return Ok(());
    }
    if parsed.show_version {
        let _ = writeln!(stdout, "{PROGRAM_NAME} {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let sink: Arc<dyn DebugSink> = Arc::from(logging::init(parsed.verbose, parsed.debug)?);
    let cfg = RunConfig::validate(parsed.raw)?;

    if cfg.clean_write_paths {
        let cleaned = dispatch::run_clean_write_paths(&cfg)?;
        let _ = writeln!(stdout, "cleaned {cleaned} write path(s)");
        return Ok(());
    }
    if cfg.flist_file_create {
        dispatch::run_flist_file_create(&cfg, sink.as_ref())?;
        return Ok(());
    }

    let outcomes = dispatch::dispatch_all(&cfg, sink)?;
    let residual: usize = outcomes.iter().map(|o| o.remaining_write_paths).sum();
    if residual > 0 {
        return Err(CliError::ResidualWritePaths(residual));
    }
    Ok(())
}

fn help_text() -> String {
    format!(
        "Usage: {PROGRAM_NAME} [OPTIONS] ROOT...\n\n\
         Multi-worker filesystem load generator.\n\n\
         Run `{PROGRAM_NAME} --help` after building to see the full flag list;\n\
         pass one or more directory roots and --num-reader/--num-writer to start."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_flag_reports_success_and_writes_stdout() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["dirload", "--version"], &mut stdout, &mut stderr);
        assert_eq!(status, 0);
        assert!(!stdout.is_empty());
        assert!(stderr.is_empty());
    }

    #[test]
    fn help_flag_reports_success() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["dirload", "--help"], &mut stdout, &mut stderr);
        assert_eq!(status, 0);
        assert!(!stdout.is_empty());
    }

    #[test]
    fn missing_roots_is_a_configuration_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["dirload"], &mut stdout, &mut stderr);
        assert_eq!(status, 1);
        assert!(!stderr.is_empty());
    }

    #[test]
    fn nonexistent_root_is_a_configuration_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["dirload", "/no/such/dirload-root"], &mut stdout, &mut stderr);
        assert_eq!(status, 1);
    }

    #[test]
    fn exit_code_from_clamps_to_u8_range() {
        assert_eq!(exit_code_from(-1), ExitCode::from(0));
        assert_eq!(exit_code_from(300), ExitCode::from(255));
    }
}
