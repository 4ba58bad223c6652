mod signals;

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::Parser;
use geth_harness_common::{fs::ensure_directory, types::SequenceGenerator};
use geth_harness_config::{Arguments, DevArguments, HarnessCommand, NodeConfiguration};
use geth_harness_node::{
    DevChain, LogFileSink, NodeProcess, build_command, get_accounts, geth_version,
    read_genesis_file,
};
use temp_dir::TempDir;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LIVENESS_POLLING_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    let interrupts = signals::install()?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match Arguments::parse().command {
        HarnessCommand::Dev(arguments) => run_dev(arguments, interrupts),
        HarnessCommand::Command { config } => {
            let configuration = NodeConfiguration::from_path(config)?;
            println!("{}", build_command(&configuration)?);
            Ok(())
        }
        HarnessCommand::Accounts { data_dir, geth } => {
            let configuration = NodeConfiguration {
                geth_executable: geth,
                ..Default::default()
            };
            for account in get_accounts(data_dir, &configuration)? {
                println!("{account}");
            }
            Ok(())
        }
        HarnessCommand::Version { geth } => {
            let configuration = NodeConfiguration {
                geth_executable: geth,
                ..Default::default()
            };
            println!("{}", geth_version(&configuration)?);
            Ok(())
        }
    }
}

/// Bootstraps the development chain, runs geth on it and stops it once geth exits, the run
/// duration elapses or a termination is requested.
fn run_dev(arguments: DevArguments, interrupts: signals::Interrupts) -> anyhow::Result<()> {
    let temporary_directory = TempDir::new()?;
    let base_dir = arguments
        .base_dir
        .clone()
        .unwrap_or_else(|| temporary_directory.path().into());

    let mut overrides = match arguments.config.as_ref() {
        Some(path) => NodeConfiguration::from_path(path)?,
        None => NodeConfiguration::default(),
    };
    if let Some(geth) = arguments.geth.clone() {
        overrides.geth_executable = Some(geth);
    }
    let genesis = arguments
        .genesis
        .as_ref()
        .map(read_genesis_file)
        .transpose()?;

    let node_ids = SequenceGenerator::new();
    let mut node = NodeProcess::dev(
        node_ids.next_node_id(),
        DevChain {
            chain_name: arguments.chain_name.clone(),
            base_dir: Some(base_dir),
            overrides,
            genesis,
            geth_version: arguments.geth_version.clone(),
        },
    )?
    .with_interrupt_handle(interrupts.handle());

    match arguments.logs_dir.as_ref() {
        Some(logs_dir) => {
            ensure_directory(logs_dir)?;
            let sink = LogFileSink::create(logs_dir, arguments.chain_name.as_str())?;
            info!(
                stdout = %sink.stdout_log_path().display(),
                stderr = %sink.stderr_log_path().display(),
                "Writing the logs of geth"
            );
            node.register_sink(sink);
        }
        None => {
            node.register_stdout_callback(|line| debug!(target: "geth::stdout", "{line}"));
            node.register_stderr_callback(|line| debug!(target: "geth::stderr", "{line}"));
        }
    }

    node.start()?;
    node.wait_for_rpc(arguments.ready_timeout())
        .context("geth did not open its RPC endpoint in time")?;

    let configuration = node.configuration();
    info!(
        rpc = %format!("http://{}:{}", configuration.rpc_host(), configuration.rpc_port()),
        ipc = %node.ipc_path().display(),
        data_dir = %node.data_dir().display(),
        "geth is ready"
    );
    for account in node.accounts()? {
        info!(%account, "Account available");
    }

    wait_until_done(&mut node, arguments.run_for(), &interrupts);
    if let Some(status) = node.exit_status() {
        warn!(%status, "geth exited on its own");
    }
    node.stop()?;
    Ok(())
}

fn wait_until_done(
    node: &mut NodeProcess,
    run_for: Option<Duration>,
    interrupts: &signals::Interrupts,
) {
    let started = Instant::now();
    while node.is_alive()
        && !interrupts.is_requested()
        && run_for.is_none_or(|run_for| started.elapsed() < run_for)
    {
        thread::sleep(LIVENESS_POLLING_INTERVAL);
    }
}
