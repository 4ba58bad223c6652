use std::{
    fs::File,
    io::{ErrorKind, Write},
    ops::ControlFlow,
    path::{Path, PathBuf},
    process::{Child, ExitStatus, Stdio},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Context as _;
use geth_harness_common::{
    polling::{PollingWaitBehavior, poll},
    timeout::Deadline,
    types::NodeId,
};
use geth_harness_config::{ConfigurationError, NodeConfiguration};
use semver::Version;
use temp_dir::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::{
    ChildProcessError, CommandVector, Interface, LifecycleError, NodeError, StreamInterceptor,
    StreamSink, build_command,
    chain::{live_data_dir, sepolia_data_dir},
    constants::{EXIT_POLLING_INTERVAL, IPC_FILE, SEPOLIA_NETWORK_ID, STREAM_JOIN_TIMEOUT},
    get_accounts, geth_version,
    readiness::{is_ipc_ready, is_rpc_ready},
};

/// Where a standard stream of the child is connected to.
#[derive(Debug, Default)]
pub enum StdioTarget {
    /// A pipe owned by the supervisor. Piped stdout and stderr are always drained by a
    /// [`StreamInterceptor`] so that the child never blocks on a full pipe.
    #[default]
    Piped,
    Null,
    Inherit,
    File(File),
}

impl StdioTarget {
    fn is_piped(&self) -> bool {
        matches!(self, Self::Piped)
    }

    /// Files are duplicated so that the target stays usable if spawning fails.
    fn to_stdio(&self) -> std::io::Result<Stdio> {
        Ok(match self {
            Self::Piped => Stdio::piped(),
            Self::Null => Stdio::null(),
            Self::Inherit => Stdio::inherit(),
            Self::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

/// A cloneable handle through which the owner of a [`NodeProcess`] reports user interrupts
/// (e.g. Ctrl+C) while the process is being stopped.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle(Arc<AtomicUsize>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long each stage of the escalating shutdown waits for the child to exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShutdownBehavior {
    pub interrupt_wait: Duration,
    pub terminate_wait: Duration,
    pub kill_wait: Duration,
    pub polling_interval: Duration,
}

impl Default for ShutdownBehavior {
    fn default() -> Self {
        Self {
            interrupt_wait: Duration::from_secs(30),
            terminate_wait: Duration::from_secs(10),
            kill_wait: Duration::from_secs(2),
            polling_interval: EXIT_POLLING_INTERVAL,
        }
    }
}

/// A supervised geth process.
///
/// The supervisor is started at most once: `Stopped -> start() -> Running -> stop() -> Stopped`.
/// Starting a running supervisor, restarting a stopped one or stopping one that isn't running are
/// [`LifecycleError`]s. A child that dies on its own is not an error, its exit is observed through
/// [`NodeProcess::is_alive`] and [`NodeProcess::is_stopped`].
pub struct NodeProcess {
    id: NodeId,
    configuration: NodeConfiguration,
    command: CommandVector,
    data_dir: PathBuf,

    stdin: StdioTarget,
    stdout: StdioTarget,
    stderr: StdioTarget,

    child: Option<Child>,
    is_running: bool,
    interceptor: Option<StreamInterceptor>,

    interrupt_handle: InterruptHandle,
    shutdown_behavior: ShutdownBehavior,
    readiness_polling: PollingWaitBehavior,

    /// Removed once the supervisor is dropped, after the child has been stopped.
    ipc_directory: Option<TempDir>,
}

impl NodeProcess {
    /// Builds the command of the node right away so that invalid configurations are rejected
    /// before anything is launched.
    pub fn new(id: NodeId, configuration: NodeConfiguration) -> Result<Self, NodeError> {
        let command = build_command(&configuration)?;
        let data_dir = match configuration.data_dir.as_ref() {
            Some(data_dir) => data_dir.clone(),
            None => live_data_dir()?,
        };
        Ok(Self {
            id,
            configuration,
            command,
            data_dir,
            stdin: StdioTarget::Null,
            stdout: StdioTarget::Piped,
            stderr: StdioTarget::Piped,
            child: None,
            is_running: false,
            interceptor: None,
            interrupt_handle: InterruptHandle::new(),
            shutdown_behavior: ShutdownBehavior::default(),
            readiness_polling: PollingWaitBehavior::default(),
            ipc_directory: None,
        })
    }

    /// A node of the main network, using the default data directory of geth.
    pub fn mainnet(id: NodeId, configuration: NodeConfiguration) -> Result<Self, NodeError> {
        if configuration.data_dir.is_some() {
            return Err(ConfigurationError::contradiction(
                "`data_dir` can't be specified for a mainnet node",
            )
            .into());
        }
        Self::new(id, configuration)
    }

    /// A node of the sepolia test network, using the sepolia directory inside of the default data
    /// directory of geth.
    pub fn sepolia(id: NodeId, configuration: NodeConfiguration) -> Result<Self, NodeError> {
        if configuration.data_dir.is_some() {
            return Err(ConfigurationError::contradiction(
                "`data_dir` can't be specified for a sepolia node",
            )
            .into());
        }
        if configuration.network_id.is_some() {
            return Err(ConfigurationError::contradiction(
                "`network_id` can't be specified for a sepolia node",
            )
            .into());
        }
        Self::new(
            id,
            NodeConfiguration {
                network_id: Some(SEPOLIA_NETWORK_ID.to_owned()),
                data_dir: Some(sepolia_data_dir()?),
                ..configuration
            },
        )
    }

    pub fn with_stdin(mut self, target: StdioTarget) -> Self {
        self.stdin = target;
        self
    }

    pub fn with_stdout(mut self, target: StdioTarget) -> Self {
        self.stdout = target;
        self
    }

    pub fn with_stderr(mut self, target: StdioTarget) -> Self {
        self.stderr = target;
        self
    }

    pub fn with_shutdown_behavior(mut self, shutdown_behavior: ShutdownBehavior) -> Self {
        self.shutdown_behavior = shutdown_behavior;
        self
    }

    pub fn with_readiness_polling(mut self, readiness_polling: PollingWaitBehavior) -> Self {
        self.readiness_polling = readiness_polling;
        self
    }

    pub fn with_interrupt_handle(mut self, interrupt_handle: InterruptHandle) -> Self {
        self.interrupt_handle = interrupt_handle;
        self
    }

    /// Hands over the temporary directory holding the IPC socket of the node.
    pub fn with_ipc_directory(mut self, ipc_directory: Option<TempDir>) -> Self {
        self.ipc_directory = ipc_directory;
        self
    }

    /// Forwards every line geth writes to its stdout to the callback. Only effective for piped
    /// stdout and when registered before [`NodeProcess::start`].
    pub fn register_stdout_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.interceptor
            .get_or_insert_with(StreamInterceptor::new)
            .register_stdout_callback(callback);
    }

    pub fn register_stderr_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.interceptor
            .get_or_insert_with(StreamInterceptor::new)
            .register_stderr_callback(callback);
    }

    pub fn register_sink(&mut self, sink: impl StreamSink) {
        self.interceptor
            .get_or_insert_with(StreamInterceptor::new)
            .register_sink(sink);
    }

    #[instrument(level = "info", skip_all, fields(node_id = %self.id))]
    pub fn start(&mut self) -> Result<(), NodeError> {
        if self.is_running {
            return Err(LifecycleError::AlreadyRunning.into());
        }
        if self.child.is_some() {
            return Err(LifecycleError::CannotRestart.into());
        }

        info!(command = %self.command, "Launching geth");

        let intercept = self.stdout.is_piped() || self.stderr.is_piped();
        let mut command = self.command.to_command();
        command
            .stdin(self.stdin.to_stdio().context("Failed to duplicate the stdin of geth")?)
            .stdout(self.stdout.to_stdio().context("Failed to duplicate the stdout of geth")?)
            .stderr(self.stderr.to_stdio().context("Failed to duplicate the stderr of geth")?);
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn geth: {}", self.command))?;
        debug!(pid = child.id(), "Spawned geth");

        if intercept {
            let interceptor = self.interceptor.get_or_insert_with(StreamInterceptor::new);
            if let Err(error) = interceptor.start(child.stdout.take(), child.stderr.take()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(error.into());
            }
        }

        self.stdin = StdioTarget::Null;
        self.stdout = StdioTarget::Null;
        self.stderr = StdioTarget::Null;
        self.child = Some(child);
        self.is_running = true;
        Ok(())
    }

    /// Stops the child, escalating from an interrupt to a terminate to a kill signal for as long
    /// as it doesn't exit within the wait of the stage. See [`ShutdownBehavior`].
    ///
    /// The supervisor keeps running until an exit of the child is observed, a failed stop can be
    /// retried.
    #[instrument(level = "info", skip_all, fields(node_id = %self.id))]
    pub fn stop(&mut self) -> Result<(), NodeError> {
        if !self.is_running {
            return Err(LifecycleError::NotRunning.into());
        }
        let Some(child) = self.child.as_mut() else {
            return Err(LifecycleError::NotRunning.into());
        };

        match child
            .try_wait()
            .context("Failed to check the exit status of geth")?
        {
            Some(status) => info!(%status, "geth had already exited"),
            None => {
                let status =
                    terminate_child(child, &self.shutdown_behavior, &self.interrupt_handle)?
                        .ok_or(LifecycleError::StillAlive)?;
                info!(%status, "Stopped geth");
            }
        }
        self.is_running = false;

        if let Some(interceptor) = self.interceptor.as_mut() {
            interceptor.shutdown(STREAM_JOIN_TIMEOUT);
        }
        Ok(())
    }

    /// Waits for the HTTP RPC endpoint to accept connections. `None` waits forever.
    #[instrument(level = "info", skip_all, fields(node_id = %self.id))]
    pub fn wait_for_rpc(&self, timeout: impl Into<Option<Duration>>) -> Result<(), NodeError> {
        if !self.configuration.is_rpc_enabled() {
            return Err(NodeError::InterfaceNotEnabled(Interface::Rpc));
        }
        let (host, port) = (self.configuration.rpc_host(), self.configuration.rpc_port());
        poll(Deadline::new(timeout), self.readiness_polling, || {
            Ok::<_, NodeError>(match is_rpc_ready(host, port) {
                true => ControlFlow::Break(()),
                false => ControlFlow::Continue(()),
            })
        })
    }

    /// Waits for the IPC socket to accept connections. `None` waits forever.
    #[instrument(level = "info", skip_all, fields(node_id = %self.id))]
    pub fn wait_for_ipc(&self, timeout: impl Into<Option<Duration>>) -> Result<(), NodeError> {
        if !self.configuration.is_ipc_enabled() {
            return Err(NodeError::InterfaceNotEnabled(Interface::Ipc));
        }
        let ipc_path = self.ipc_path();
        poll(Deadline::new(timeout), self.readiness_polling, || {
            Ok::<_, NodeError>(match is_ipc_ready(&ipc_path) {
                true => ControlFlow::Break(()),
                false => ControlFlow::Continue(()),
            })
        })
    }

    /// Running and the child has not exited.
    pub fn is_alive(&mut self) -> bool {
        self.is_running && self.child.is_some() && self.exit_status().is_none()
    }

    /// Started at some point and the child has exited since.
    pub fn is_stopped(&mut self) -> bool {
        self.exit_status().is_some()
    }

    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child.as_mut()?.try_wait().ok().flatten()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn command(&self) -> &CommandVector {
        &self.command
    }

    pub fn configuration(&self) -> &NodeConfiguration {
        &self.configuration
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt_handle.clone()
    }

    pub fn ipc_path(&self) -> PathBuf {
        self.configuration
            .ipc_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(IPC_FILE))
    }

    pub fn accounts(&self) -> Result<Vec<alloy_primitives::Address>, NodeError> {
        get_accounts(&self.data_dir, &self.configuration)
    }

    pub fn version(&self) -> Result<Version, NodeError> {
        geth_version(&self.configuration)
    }
}

impl Drop for NodeProcess {
    #[instrument(level = "info", skip_all, fields(node_id = %self.id))]
    fn drop(&mut self) {
        if self.is_running {
            if let Err(error) = self.stop() {
                warn!(%error, "Failed to stop geth while dropping its supervisor");
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShutdownStage {
    Interrupt,
    Terminate,
    Kill,
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Interrupted,
}

/// Escalates through the shutdown stages until the child exits. Returns `None` if the child
/// survived even the kill stage.
///
/// A user interrupt during the interrupt or terminate stage ends that stage early and moves on
/// to the next one. A user interrupt during the kill stage kills the child once more and returns
/// without waiting any further.
fn terminate_child(
    child: &mut Child,
    behavior: &ShutdownBehavior,
    interrupt_handle: &InterruptHandle,
) -> Result<Option<ExitStatus>, NodeError> {
    let stages = [
        (ShutdownStage::Interrupt, behavior.interrupt_wait),
        (ShutdownStage::Terminate, behavior.terminate_wait),
        (ShutdownStage::Kill, behavior.kill_wait),
    ];
    for (index, (stage, wait)) in stages.into_iter().enumerate() {
        let remaining_interrupts = stages.len() - 1 - index;
        if !send_stop_signal(child, stage)? {
            continue;
        }
        debug!(?stage, ?wait, "Waiting for geth to exit");

        match wait_for_exit(child, wait, behavior.polling_interval, interrupt_handle)? {
            WaitOutcome::Exited(status) => return Ok(Some(status)),
            WaitOutcome::TimedOut => {
                warn!(?stage, ?wait, "geth did not exit in time");
            }
            WaitOutcome::Interrupted if stage == ShutdownStage::Kill => {
                warn!("Interrupted while waiting for geth to be killed, killing it again");
                let _ = child.kill();
                return Ok(None);
            }
            WaitOutcome::Interrupted => {
                warn!(
                    ?stage,
                    "Trying to close geth, interrupt {remaining_interrupts} more times to force quit"
                );
            }
        }
    }
    Ok(child.try_wait().ok().flatten())
}

/// Returns `false` if the stage isn't supported on this platform.
fn send_stop_signal(child: &mut Child, stage: ShutdownStage) -> Result<bool, NodeError> {
    match stage {
        ShutdownStage::Kill => match child.kill() {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::InvalidInput => Ok(true),
            Err(error) => Err(anyhow::Error::new(error)
                .context("Failed to kill geth")
                .into()),
        },
        #[cfg(unix)]
        ShutdownStage::Interrupt | ShutdownStage::Terminate => {
            use nix::{
                errno::Errno,
                sys::signal::{Signal, kill},
                unistd::Pid,
            };

            let signal = match stage {
                ShutdownStage::Interrupt => Signal::SIGINT,
                _ => Signal::SIGTERM,
            };
            let pid = i32::try_from(child.id()).context("The pid of geth is out of range")?;
            match kill(Pid::from_raw(pid), signal) {
                Ok(()) | Err(Errno::ESRCH) => Ok(true),
                Err(error) => Err(anyhow::Error::new(error)
                    .context(format!("Failed to send {signal:?} to geth"))
                    .into()),
            }
        }
        #[cfg(not(unix))]
        ShutdownStage::Interrupt | ShutdownStage::Terminate => Ok(false),
    }
}

fn wait_for_exit(
    child: &mut Child,
    wait: Duration,
    polling_interval: Duration,
    interrupt_handle: &InterruptHandle,
) -> Result<WaitOutcome, NodeError> {
    let interrupts_at_start = interrupt_handle.count();
    let result = poll(
        Deadline::new(wait),
        PollingWaitBehavior::Constant(polling_interval),
        || -> Result<ControlFlow<WaitOutcome, ()>, NodeError> {
            if let Some(status) = child
                .try_wait()
                .context("Failed to check the exit status of geth")?
            {
                return Ok(ControlFlow::Break(WaitOutcome::Exited(status)));
            }
            if interrupt_handle.count() != interrupts_at_start {
                return Ok(ControlFlow::Break(WaitOutcome::Interrupted));
            }
            Ok(ControlFlow::Continue(()))
        },
    );
    match result {
        Err(NodeError::DeadlineExceeded(_)) => Ok(WaitOutcome::TimedOut),
        result => result,
    }
}

/// The captured result of a subcommand that was run to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedProcess {
    pub command: CommandVector,
    pub stdin: Option<String>,
    /// `None` when the child was terminated by a signal.
    pub return_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CompletedProcess {
    pub fn success(&self) -> bool {
        self.return_code == Some(0)
    }

    pub fn into_error(self, message: impl Into<String>) -> ChildProcessError {
        ChildProcessError {
            message: message.into(),
            command: self.command.into_inner(),
            return_code: self.return_code,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }

    /// Turns a non-zero exit into a [`ChildProcessError`] carrying the message.
    pub fn check(self, message: impl Into<String>) -> Result<Self, ChildProcessError> {
        match self.success() {
            true => Ok(self),
            false => Err(self.into_error(message)),
        }
    }
}

/// Runs a one-shot subcommand, writing `stdin` to it and blocking until it exits.
///
/// Exiting unsuccessfully is not an error here, callers decide through
/// [`CompletedProcess::check`] since some subcommands report expected conditions that way.
#[instrument(level = "info", skip_all, fields(command = %command))]
pub fn run_to_completion(
    command: CommandVector,
    stdin: Option<&str>,
) -> Result<CompletedProcess, NodeError> {
    let mut child = command
        .to_command()
        .stdin(match stdin {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {command}"))?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        match pipe.write_all(input.as_bytes()) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::BrokenPipe => {
                debug!("The subcommand exited before reading all of its input");
            }
            Err(error) => {
                return Err(anyhow::Error::new(error)
                    .context(format!("Failed to write to the stdin of {command}"))
                    .into());
            }
        }
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for {command}"))?;
    Ok(CompletedProcess {
        command,
        stdin: stdin.map(str::to_owned),
        return_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::{fs, os::unix::fs::PermissionsExt, time::Instant};

    use temp_dir::TempDir;

    use super::*;

    fn script(directory: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = directory.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn quick_shutdown() -> ShutdownBehavior {
        ShutdownBehavior {
            interrupt_wait: Duration::from_millis(300),
            terminate_wait: Duration::from_millis(300),
            kill_wait: Duration::from_secs(2),
            polling_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn run_to_completion_captures_everything() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let executable = script(&directory, "geth", "cat\necho oops >&2\nexit 3");
        let command = CommandVector::new(vec![executable.display().to_string()]);

        // Act
        let completed = run_to_completion(command, Some("hello")).unwrap();

        // Assert
        assert!(!completed.success());
        assert_eq!(completed.return_code, Some(3));
        assert_eq!(completed.stdout, "hello");
        assert_eq!(completed.stderr, "oops\n");
        let error = completed.check("Error running geth").unwrap_err();
        assert_eq!(error.stdin.as_deref(), Some("hello"));
        assert!(error.to_string().starts_with("Error running geth\n"));
    }

    #[test]
    fn stubborn_children_are_escalated_to_kill() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let executable = script(
            &directory,
            "stubborn",
            "trap '' INT TERM\nwhile true; do sleep 0.05; done",
        );
        let mut child = CommandVector::new(vec![executable.display().to_string()])
            .to_command()
            .spawn()
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));

        // Act
        let status =
            terminate_child(&mut child, &quick_shutdown(), &InterruptHandle::new()).unwrap();

        // Assert
        assert!(status.is_some());
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn interrupts_cut_the_soft_stages_short() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let executable = script(
            &directory,
            "stubborn",
            "trap '' INT TERM\nwhile true; do sleep 0.05; done",
        );
        let mut child = CommandVector::new(vec![executable.display().to_string()])
            .to_command()
            .spawn()
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        let behavior = ShutdownBehavior {
            interrupt_wait: Duration::from_secs(60),
            terminate_wait: Duration::from_secs(60),
            ..quick_shutdown()
        };
        let interrupt_handle = InterruptHandle::new();
        let interrupter = {
            let interrupt_handle = interrupt_handle.clone();
            std::thread::spawn(move || {
                for _ in 0..2 {
                    std::thread::sleep(Duration::from_millis(200));
                    interrupt_handle.interrupt();
                }
            })
        };
        let start = Instant::now();

        // Act
        let status = terminate_child(&mut child, &behavior, &interrupt_handle).unwrap();

        // Assert
        interrupter.join().unwrap();
        assert!(status.is_some());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn network_presets_guard_their_fields() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let configuration = NodeConfiguration {
            geth_executable: Some(script(&directory, "geth", "exit 0")),
            nice: Some(false),
            ..Default::default()
        };

        // Act
        let mainnet_with_data_dir = NodeProcess::mainnet(
            NodeId::new(1u64),
            NodeConfiguration {
                data_dir: Some(directory.path().to_path_buf()),
                ..configuration.clone()
            },
        );
        let sepolia_with_network_id = NodeProcess::sepolia(
            NodeId::new(2u64),
            NodeConfiguration {
                network_id: Some("1".into()),
                ..configuration.clone()
            },
        );
        let sepolia = NodeProcess::sepolia(NodeId::new(3u64), configuration)
            .expect("Failed to create the sepolia node");

        // Assert
        assert!(matches!(
            mainnet_with_data_dir,
            Err(NodeError::Configuration(_))
        ));
        assert!(matches!(
            sepolia_with_network_id,
            Err(NodeError::Configuration(_))
        ));
        assert!(sepolia.data_dir().ends_with("sepolia"));
        assert!(
            sepolia
                .command()
                .args()
                .windows(2)
                .any(|pair| pair == ["--networkid", SEPOLIA_NETWORK_ID])
        );
    }
}
