//! Translation of a [`NodeConfiguration`] into the command line of geth.

use std::{
    ffi::OsString,
    fmt::Display,
    path::{Path, PathBuf},
    process::Command,
};

use geth_harness_common::define_wrapper_type;
use geth_harness_config::{
    ConfigurationError, DEFAULT_GETH_BINARY, GETH_BINARY_ENV, NodeConfiguration,
};

use tracing::debug;

use crate::NodeError;

define_wrapper_type!(
    /// The argv of a geth invocation: an optional `nice` prefix, the executable and its flags.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommandVector(Vec<String>);
);

impl CommandVector {
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// Creates a [`Command`] for this argv. Standard streams are left for the caller to set up.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(self.program().unwrap_or(DEFAULT_GETH_BINARY));
        command.args(self.args());
        command
    }
}

impl Display for CommandVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommandBuilder {
    command: Vec<String>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: impl ToString) -> &mut Self {
        self.command.push(value.to_string());
        self
    }

    pub fn extend<T: ToString>(&mut self, values: impl IntoIterator<Item = T>) -> &mut Self {
        self.command
            .extend(values.into_iter().map(|value| value.to_string()));
        self
    }

    fn flag(&mut self, flag: &str, enabled: Option<bool>) -> &mut Self {
        if enabled.unwrap_or_default() {
            self.append(flag);
        }
        self
    }

    fn option(&mut self, flag: &str, value: Option<impl Display>) -> &mut Self {
        if let Some(value) = value {
            self.extend([flag.to_owned(), value.to_string()]);
        }
        self
    }

    pub fn build(self) -> CommandVector {
        CommandVector(self.command)
    }
}

/// Builds the command line of geth from the configuration.
///
/// Flags are always emitted in the same order, network interfaces first, then the data
/// directory, peering, identity, mining, transaction pool and database flags, and finally the
/// caller's suffix keyword arguments (in key order) and suffix arguments, unmodified. Building
/// twice from the same configuration yields identical vectors.
pub fn build_command(configuration: &NodeConfiguration) -> Result<CommandVector, NodeError> {
    check_flag_dependencies(configuration)?;
    let executable = resolve_geth_executable(configuration.geth_executable.as_deref())?;

    let mut builder = CommandBuilder::new();
    if configuration.is_nice() && is_nice_available() {
        builder.extend(["nice", "-n", "20"]);
    }
    builder.append(executable.display());

    builder
        .flag("--http", configuration.rpc_enabled)
        .option("--http.addr", configuration.rpc_addr.as_ref())
        .option("--http.port", configuration.rpc_port.as_ref())
        .option("--http.api", configuration.rpc_api.as_ref())
        .option("--http.corsdomain", configuration.rpc_cors_domain.as_ref());

    builder
        .flag("--ws", configuration.ws_enabled)
        .option("--ws.addr", configuration.ws_addr.as_ref())
        .option("--ws.origins", configuration.ws_origins.as_ref())
        .option("--ws.port", configuration.ws_port.as_ref())
        .option("--ws.api", configuration.ws_api.as_ref());

    builder
        .option(
            "--datadir",
            configuration.data_dir.as_ref().map(|path| path.display()),
        )
        .flag("--dev", configuration.dev_mode)
        .option("--dev.period", configuration.dev_period.as_ref())
        .option("--maxpeers", configuration.max_peers.as_ref())
        .option("--networkid", configuration.network_id.as_ref())
        .option("--port", configuration.port.as_ref())
        .flag("--ipcdisable", configuration.ipc_disable)
        .option(
            "--ipcpath",
            configuration.ipc_path.as_ref().map(|path| path.display()),
        )
        .option("--verbosity", configuration.verbosity.as_ref());

    builder
        .option("--unlock", configuration.unlock.as_ref())
        .option(
            "--password",
            configuration.password.as_ref().map(|path| path.display()),
        )
        .option("--preload", configuration.preload.as_ref())
        .flag("--nodiscover", configuration.no_discover);

    builder
        .flag("--mine", configuration.mine)
        .option("--miner.threads", configuration.miner_threads)
        .option("--miner.etherbase", configuration.miner_etherbase.as_ref())
        .flag(
            "--allow-insecure-unlock",
            configuration.allow_insecure_unlock,
        );

    builder
        .option(
            "--txpool.globalslots",
            configuration.tx_pool_global_slots.as_ref(),
        )
        .option(
            "--txpool.pricelimit",
            configuration.tx_pool_price_limit.as_ref(),
        )
        .option("--txpool.lifetime", configuration.tx_pool_lifetime.as_ref())
        .option("--cache", configuration.cache.as_ref())
        .option("--gcmode", configuration.gcmode);

    for (key, value) in configuration.suffix_kwargs.iter().flatten() {
        builder.extend([key, value]);
    }
    if let Some(suffix_args) = configuration.suffix_args.as_ref() {
        builder.extend(suffix_args);
    }

    Ok(builder.build())
}

/// Rejects combinations of fields that geth itself would refuse or silently misinterpret.
pub fn check_flag_dependencies(
    configuration: &NodeConfiguration,
) -> Result<(), ConfigurationError> {
    if configuration.is_mining() && configuration.unlock.is_none() {
        return Err(ConfigurationError::contradiction(
            "`mine` requires an account to be unlocked through `unlock`",
        ));
    }
    if !configuration.is_mining() {
        if configuration.miner_etherbase.is_some() {
            return Err(ConfigurationError::contradiction(
                "`miner_etherbase` requires `mine` to be enabled",
            ));
        }
        if configuration.miner_threads.is_some() {
            return Err(ConfigurationError::contradiction(
                "`miner_threads` requires `mine` to be enabled",
            ));
        }
    }
    if configuration.unlock.is_some() && configuration.password.is_none() {
        return Err(ConfigurationError::contradiction(
            "`unlock` requires a `password` file",
        ));
    }
    Ok(())
}

/// Resolves the geth executable: the explicitly configured one, else the `GETH_BINARY`
/// environment variable, else `geth` from `$PATH`.
pub fn resolve_geth_executable(explicit: Option<&Path>) -> Result<PathBuf, NodeError> {
    resolve_executable(explicit, std::env::var_os(GETH_BINARY_ENV))
}

fn resolve_executable(
    explicit: Option<&Path>,
    environment_override: Option<OsString>,
) -> Result<PathBuf, NodeError> {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| environment_override.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GETH_BINARY));
    which::which(&candidate).map_err(|error| {
        debug!(%error, candidate = %candidate.display(), "Failed to resolve the executable");
        NodeError::ExecutableNotFound(candidate)
    })
}

fn is_nice_available() -> bool {
    which::which("nice").is_ok()
}
