//! CLI-level errors and the exit codes they map to (§6: `0`/`1`/`2`/`124`).

use thiserror::Error;

/// Everything that can go wrong before a task is even submitted.
///
/// Distinct from [`neuron_task::TaskError`] (a task that ran and failed) —
/// a `CliError` means the run never legitimately started: bad flags, an
/// unparsable `--agent`/`--run-conf` file, or an input path outside the
/// sandbox `AWORLD_WORKSPACE` allows. All map to exit code `2`.
#[derive(Debug, Error)]
pub enum CliError {
    /// An `--agent`/`--run-conf` document was missing, unreadable, or
    /// failed to parse.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// `--input @file` named a path outside every directory listed in
    /// `AWORLD_WORKSPACE`.
    #[error("input path not in AWORLD_WORKSPACE: {0}")]
    InputOutsideWorkspace(String),

    /// `--input @file` could not be read.
    #[error("reading input file: {0}")]
    InputUnreadable(String),
}

/// Process exit codes fixed by §6.
pub mod exit_code {
    /// `success=true`.
    pub const SUCCESS: i32 = 0;
    /// `success=false`.
    pub const FAILURE: i32 = 1;
    /// Invalid config — never reached the scheduler.
    pub const INVALID_CONFIG: i32 = 2;
    /// The task's deadline elapsed.
    pub const TIMEOUT: i32 = 124;
}
