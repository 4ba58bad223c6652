//! Interception of the standard streams of a supervised child.
//!
//! Each intercepted stream is served by two threads: a producer that blocks on reading lines from
//! the pipe and hands them over through a bounded queue, and a consumer that drains the queue
//! into the registered callbacks. Shutting down pushes a stop sentinel into every queue and joins
//! the threads with a bounded timeout. Threads that don't finish in time are abandoned.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Read, Write},
    ops::ControlFlow,
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use geth_harness_common::{
    polling::{PollingWaitBehavior, poll},
    timeout::Deadline,
};
use tracing::{debug, warn};

use crate::{NodeError, constants::STREAM_QUEUE_CAPACITY};

pub type LineCallback = Box<dyn FnMut(&str) + Send + 'static>;

/// Something that consumes the lines of a child's standard streams by registering callbacks with
/// a [`StreamInterceptor`].
pub trait StreamSink {
    fn attach(self, interceptor: &mut StreamInterceptor);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

enum QueueItem {
    Line(String),
    Stop,
}

struct Pipeline {
    kind: StreamKind,
    sender: SyncSender<QueueItem>,
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

/// Forwards the lines of a child's stdout and stderr to the registered callbacks.
///
/// Callbacks must be registered before [`StreamInterceptor::start`], the ones registered later
/// are never called.
#[derive(Default)]
pub struct StreamInterceptor {
    stdout_callbacks: Vec<LineCallback>,
    stderr_callbacks: Vec<LineCallback>,
    pipelines: Vec<Pipeline>,
}

impl StreamInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_stdout_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.stdout_callbacks.push(Box::new(callback));
    }

    pub fn register_stderr_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.stderr_callbacks.push(Box::new(callback));
    }

    pub fn register_sink(&mut self, sink: impl StreamSink) {
        sink.attach(self);
    }

    pub fn is_started(&self) -> bool {
        !self.pipelines.is_empty()
    }

    /// Spawns the producer and consumer threads of the given streams.
    pub fn start(
        &mut self,
        stdout: Option<impl Read + Send + 'static>,
        stderr: Option<impl Read + Send + 'static>,
    ) -> Result<()> {
        if let Some(stdout) = stdout {
            let callbacks = std::mem::take(&mut self.stdout_callbacks);
            self.pipelines
                .push(Pipeline::spawn(StreamKind::Stdout, stdout, callbacks)?);
        }
        if let Some(stderr) = stderr {
            let callbacks = std::mem::take(&mut self.stderr_callbacks);
            self.pipelines
                .push(Pipeline::spawn(StreamKind::Stderr, stderr, callbacks)?);
        }
        Ok(())
    }

    /// Stops the consumers and waits up to `timeout` for every thread to finish.
    ///
    /// A producer only finishes once the child closes its end of the pipe, so this should be
    /// called after the child has exited. Failing to join in time is logged and otherwise ignored.
    pub fn shutdown(&mut self, timeout: Duration) {
        for pipeline in self.pipelines.iter() {
            match pipeline.sender.try_send(QueueItem::Stop) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    debug!(stream = ?pipeline.kind, "Queue is full, the consumer stops at the end of the stream")
                }
            }
        }

        let pipelines = std::mem::take(&mut self.pipelines);
        let joined = poll(
            Deadline::new(timeout),
            PollingWaitBehavior::Constant(Duration::from_millis(10)),
            || {
                let finished = pipelines
                    .iter()
                    .all(|pipeline| pipeline.producer.is_finished() && pipeline.consumer.is_finished());
                Ok::<_, NodeError>(match finished {
                    true => ControlFlow::Break(()),
                    false => ControlFlow::Continue(()),
                })
            },
        );

        match joined {
            Ok(()) => {
                for pipeline in pipelines {
                    let kind = pipeline.kind;
                    if pipeline.producer.join().is_err() || pipeline.consumer.join().is_err() {
                        warn!(stream = ?kind, "A stream interception thread panicked");
                    }
                }
            }
            Err(error) => {
                warn!(?error, "Stream interception threads did not finish in time, abandoning them");
            }
        }
    }
}

impl Pipeline {
    fn spawn(
        kind: StreamKind,
        stream: impl Read + Send + 'static,
        callbacks: Vec<LineCallback>,
    ) -> Result<Self> {
        let (sender, receiver) = sync_channel(STREAM_QUEUE_CAPACITY);

        let producer = {
            let sender = sender.clone();
            thread::Builder::new()
                .name(format!("geth-{kind:?}-producer").to_lowercase())
                .spawn(move || produce(stream, sender))
                .context("Failed to spawn the stream producer thread")?
        };
        let consumer = thread::Builder::new()
            .name(format!("geth-{kind:?}-consumer").to_lowercase())
            .spawn(move || consume(receiver, callbacks))
            .context("Failed to spawn the stream consumer thread")?;

        Ok(Self {
            kind,
            sender,
            producer,
            consumer,
        })
    }
}

fn produce(stream: impl Read, sender: SyncSender<QueueItem>) {
    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else {
            break;
        };
        if sender.send(QueueItem::Line(line)).is_err() {
            return;
        }
    }
    let _ = sender.send(QueueItem::Stop);
}

fn consume(receiver: Receiver<QueueItem>, mut callbacks: Vec<LineCallback>) {
    while let Ok(QueueItem::Line(line)) = receiver.recv() {
        let line = line.trim();
        for callback in callbacks.iter_mut() {
            callback(line);
        }
    }
}

/// Writes the lines of the child's streams into log files and echoes them as `debug` events.
#[derive(Debug)]
pub struct LogFileSink {
    stdout_log_path: PathBuf,
    stderr_log_path: PathBuf,
    stdout_log_file: File,
    stderr_log_file: File,
}

impl LogFileSink {
    /// Creates (or truncates) `[prefix_]stdout.log` and `[prefix_]stderr.log` in the directory.
    pub fn create<'a>(
        logs_directory: impl AsRef<Path>,
        log_file_prefix: impl Into<Option<&'a str>>,
    ) -> Result<Self> {
        let (stdout_file_name, stderr_file_name) = match log_file_prefix.into() {
            Some(prefix) => (
                format!("{prefix}_stdout.log"),
                format!("{prefix}_stderr.log"),
            ),
            None => ("stdout.log".to_string(), "stderr.log".to_string()),
        };
        let stdout_log_path = logs_directory.as_ref().join(stdout_file_name);
        let stderr_log_path = logs_directory.as_ref().join(stderr_file_name);

        let open = |path: &Path| {
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(path)
                .with_context(|| format!("Failed to open the log file {}", path.display()))
        };
        Ok(Self {
            stdout_log_file: open(&stdout_log_path)?,
            stderr_log_file: open(&stderr_log_path)?,
            stdout_log_path,
            stderr_log_path,
        })
    }

    pub fn stdout_log_path(&self) -> &Path {
        &self.stdout_log_path
    }

    pub fn stderr_log_path(&self) -> &Path {
        &self.stderr_log_path
    }
}

impl StreamSink for LogFileSink {
    fn attach(self, interceptor: &mut StreamInterceptor) {
        let Self {
            stdout_log_file: mut stdout,
            stderr_log_file: mut stderr,
            ..
        } = self;
        interceptor.register_stdout_callback(move |line| {
            debug!(target: "geth::stdout", "{line}");
            if let Err(error) = writeln!(stdout, "{line}") {
                warn!(?error, "Failed to write to the stdout log file");
            }
        });
        interceptor.register_stderr_callback(move |line| {
            debug!(target: "geth::stderr", "{line}");
            if let Err(error) = writeln!(stderr, "{line}") {
                warn!(?error, "Failed to write to the stderr log file");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Cursor,
        sync::{Arc, Mutex},
    };

    use temp_dir::TempDir;

    use super::*;

    #[test]
    fn lines_reach_every_callback_of_their_stream() {
        // Arrange
        let stdout_lines = Arc::new(Mutex::new(Vec::new()));
        let stderr_lines = Arc::new(Mutex::new(Vec::new()));
        let mut interceptor = StreamInterceptor::new();
        {
            let stdout_lines = stdout_lines.clone();
            interceptor.register_stdout_callback(move |line| {
                stdout_lines.lock().unwrap().push(line.to_owned())
            });
            let stderr_lines = stderr_lines.clone();
            interceptor.register_stderr_callback(move |line| {
                stderr_lines.lock().unwrap().push(line.to_owned())
            });
        }

        // Act
        interceptor
            .start(
                Some(Cursor::new("first\nsecond  \n")),
                Some(Cursor::new("INFO starting\n")),
            )
            .expect("Failed to start the interceptor");
        interceptor.shutdown(Duration::from_secs(5));

        // Assert
        assert!(!interceptor.is_started());
        assert_eq!(*stdout_lines.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(*stderr_lines.lock().unwrap(), vec!["INFO starting"]);
    }

    #[test]
    fn log_file_sink_writes_prefixed_files() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let sink = LogFileSink::create(directory.path(), "node").unwrap();
        let stdout_log_path = sink.stdout_log_path().to_path_buf();
        let stderr_log_path = sink.stderr_log_path().to_path_buf();
        let mut interceptor = StreamInterceptor::new();
        interceptor.register_sink(sink);

        // Act
        interceptor
            .start(Some(Cursor::new("out\n")), Some(Cursor::new("err\n")))
            .unwrap();
        interceptor.shutdown(Duration::from_secs(5));

        // Assert
        assert_eq!(stdout_log_path, directory.path().join("node_stdout.log"));
        assert_eq!(std::fs::read_to_string(stdout_log_path).unwrap(), "out\n");
        assert_eq!(std::fs::read_to_string(stderr_log_path).unwrap(), "err\n");
    }
}
