use std::{fmt::Display, path::PathBuf};

use geth_harness_common::timeout::{DeadlineError, DeadlineExceeded};
use geth_harness_config::ConfigurationError;
use thiserror::Error;

/// The errors returned by the public operations of this crate.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(
        "no geth executable found at `{}`, ensure geth is installed and available on your PATH or use the GETH_BINARY environment variable",
        .0.display()
    )]
    ExecutableNotFound(PathBuf),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    DeadlineExceeded(#[from] DeadlineExceeded),

    #[error("the {0} interface is not enabled")]
    InterfaceNotEnabled(Interface),

    #[error(transparent)]
    ChildProcess(#[from] ChildProcessError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NodeError {
    /// Only timeouts are worth retrying, possibly with a longer budget. Everything else is either
    /// a bug in the caller or a broken environment.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }
}

impl From<DeadlineError<DeadlineExceeded>> for NodeError {
    fn from(value: DeadlineError<DeadlineExceeded>) -> Self {
        match value {
            DeadlineError::Expired(exceeded) => Self::DeadlineExceeded(exceeded),
            misuse => Self::Other(anyhow::Error::new(misuse)),
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("geth is already running")]
    AlreadyRunning,
    #[error("geth is not running")]
    NotRunning,
    #[error("geth has already been started once and can't be restarted")]
    CannotRestart,
    #[error("geth is still alive after being killed")]
    StillAlive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interface {
    Rpc,
    Ipc,
}

impl Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rpc => f.write_str("RPC"),
            Self::Ipc => f.write_str("IPC"),
        }
    }
}

/// A geth subcommand that exited unsuccessfully, together with everything needed to diagnose it
/// without running it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildProcessError {
    pub message: String,
    pub command: Vec<String>,
    /// `None` when the child was terminated by a signal.
    pub return_code: Option<i32>,
    pub stdin: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl Display for ChildProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f, "Command    : {}", self.command.join(" "))?;
        match self.return_code {
            Some(return_code) => writeln!(f, "Return Code: {return_code}")?,
            None => writeln!(f, "Return Code: N/A (terminated by a signal)")?,
        }
        match self.stdout.as_str() {
            "" => writeln!(f, "stdout: N/A")?,
            stdout => writeln!(f, "stdout:\n`{stdout}`")?,
        }
        match self.stderr.as_str() {
            "" => write!(f, "stderr: N/A"),
            stderr => write!(f, "stderr:\n`{stderr}`"),
        }
    }
}

impl std::error::Error for ChildProcessError {}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create a new account: {0}")]
    AccountCreation(ChildProcessError),

    #[error("did not find an address in the output of `account new`: {0}")]
    NoAddressInOutput(ChildProcessError),

    #[error("no accounts found and no password supplied to create a new account")]
    MissingPassword,

    #[error("password file not found at path: {}", .0.display())]
    PasswordFileNotFound(PathBuf),

    #[error("error initializing the chain from its genesis file: {0}")]
    GenesisInitialization(ChildProcessError),

    #[error(
        "genesis file already present at {}, overwrite it explicitly to replace it",
        .0.display()
    )]
    GenesisAlreadyExists(PathBuf),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn child_process_errors_render_every_part() {
        // Arrange
        let error = ChildProcessError {
            message: "Error trying to list accounts".into(),
            command: vec!["geth".into(), "account".into(), "list".into()],
            return_code: Some(1),
            stdin: None,
            stdout: String::new(),
            stderr: "Fatal: boom".into(),
        };

        // Act
        let rendered = error.to_string();

        // Assert
        assert_eq!(
            rendered,
            "Error trying to list accounts\n\
             Command    : geth account list\n\
             Return Code: 1\n\
             stdout: N/A\n\
             stderr:\n`Fatal: boom`"
        );
    }

    #[test]
    fn only_expired_deadlines_are_retryable() {
        // Arrange
        let expired = NodeError::from(DeadlineError::Expired(DeadlineExceeded {
            duration: Duration::from_millis(10),
        }));
        let misuse = NodeError::from(DeadlineError::<DeadlineExceeded>::NotStarted);

        // Assert
        assert!(expired.is_retryable());
        assert!(matches!(misuse, NodeError::Other(_)));
        assert!(!misuse.is_retryable());
        assert!(!NodeError::from(LifecycleError::NotRunning).is_retryable());
    }
}
