//! Locations of chains on disk and the bootstrapping of disposable development chains.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use geth_harness_common::{
    fs::{absolute_path, ensure_directory, is_same_path, remove_file_if_exists},
    types::NodeId,
};
use geth_harness_config::{
    ConfigurationError, GETH_BASE_INSTALL_PATH_ENV, NodeConfiguration, UNIX_PATH_MAX_ENV,
};
use semver::Version;
use temp_dir::TempDir;
use tracing::{info, instrument, warn};

use crate::{
    BootstrapError, GenesisDocument, NodeError, NodeProcess, build_command,
    constants::{
        ALL_APIS, COINBASE_BALANCE, DEFAULT_PASSWORD, GENESIS_JSON_FILE, IPC_FILE, PASSWORD_FILE,
    },
    ensure_account_exists, geth_version,
    process::run_to_completion,
    readiness::{get_open_port, is_port_open},
    write_genesis_file,
};

pub fn home_dir() -> anyhow::Result<PathBuf> {
    let variable = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(variable)
        .map(PathBuf::from)
        .with_context(|| format!("The {variable} environment variable is not set"))
}

/// The default data directory of geth on this platform.
pub fn live_data_dir() -> anyhow::Result<PathBuf> {
    let home = home_dir()?;
    if cfg!(target_os = "macos") {
        Ok(home.join("Library").join("Ethereum"))
    } else if cfg!(target_os = "linux") {
        Ok(home.join(".ethereum"))
    } else if cfg!(windows) {
        Ok(home.join("AppData").join("Roaming").join("Ethereum"))
    } else {
        bail!(
            "Unsupported platform `{}`, only macos, linux and windows are supported. The data directory must be specified manually",
            std::env::consts::OS
        )
    }
}

pub fn sepolia_data_dir() -> anyhow::Result<PathBuf> {
    Ok(absolute_path(live_data_dir()?.join("sepolia")))
}

pub fn default_base_dir() -> anyhow::Result<PathBuf> {
    live_data_dir()
}

/// The data directory of a named chain inside of the base directory. It's created if missing.
pub fn chain_data_dir(base_dir: impl AsRef<Path>, chain_name: &str) -> anyhow::Result<PathBuf> {
    let data_dir = absolute_path(base_dir.as_ref().join(chain_name));
    ensure_directory(&data_dir)?;
    Ok(data_dir)
}

pub fn genesis_file_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(GENESIS_JSON_FILE)
}

pub fn is_live_chain(data_dir: impl AsRef<Path>) -> bool {
    live_data_dir().is_ok_and(|live_data_dir| is_same_path(data_dir, live_data_dir))
}

pub fn is_sepolia_chain(data_dir: impl AsRef<Path>) -> bool {
    sepolia_data_dir().is_ok_and(|sepolia_data_dir| is_same_path(data_dir, sepolia_data_dir))
}

/// The directory geth releases are installed into, `$GETH_BASE_INSTALL_PATH` or
/// `~/.geth-harness`.
pub fn base_install_path() -> anyhow::Result<PathBuf> {
    match std::env::var_os(GETH_BASE_INSTALL_PATH_ENV) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(home_dir()?.join(".geth-harness")),
    }
}

/// The path of the executable of an installed geth release, e.g. `v1.14.12`.
pub fn installed_executable_path(identifier: &str) -> anyhow::Result<PathBuf> {
    Ok(base_install_path()?
        .join(format!("geth-{identifier}"))
        .join("bin")
        .join("geth"))
}

/// The longest path a unix domain socket can be bound to.
pub fn max_socket_path_length() -> usize {
    if let Some(value) = std::env::var_os(UNIX_PATH_MAX_ENV) {
        match value.to_string_lossy().parse() {
            Ok(length) => return length,
            Err(error) => warn!(?value, %error, "Ignoring the malformed socket path length"),
        }
    }
    if cfg!(target_os = "macos") {
        104
    } else if cfg!(windows) {
        260
    } else {
        108
    }
}

/// Fills every unset field of the overrides with the defaults of a development chain living in
/// `data_dir`.
///
/// The password file of the chain is created with an insecure default password when it doesn't
/// exist yet. Default ports are used when they're free, free ports are picked otherwise. When the
/// IPC socket doesn't fit in the data directory it's placed in the returned temporary directory,
/// which is removed once dropped.
pub fn dev_chain_configuration(
    data_dir: impl AsRef<Path>,
    overrides: NodeConfiguration,
) -> Result<(NodeConfiguration, Option<TempDir>), NodeError> {
    let data_dir = absolute_path(data_dir);
    if overrides.data_dir.is_some() {
        return Err(ConfigurationError::contradiction(
            "`data_dir` can't be specified for a development chain",
        )
        .into());
    }

    let mut configuration = NodeConfiguration {
        data_dir: Some(data_dir.clone()),
        ..overrides
    };

    if configuration.password.is_none() {
        let password_path = data_dir.join(PASSWORD_FILE);
        if !password_path.exists() {
            std::fs::write(&password_path, DEFAULT_PASSWORD).with_context(|| {
                format!("Failed to write the password file {}", password_path.display())
            })?;
        }
        configuration.password = Some(password_path);
    }

    configuration.dev_mode.get_or_insert(true);
    configuration.no_discover.get_or_insert(true);
    configuration.max_peers.get_or_insert_with(|| "0".into());
    configuration.network_id.get_or_insert_with(|| "1234".into());
    if configuration.port.is_none() {
        configuration.port = Some(preferred_port(30303)?);
    }

    configuration.ws_enabled.get_or_insert(true);
    configuration.ws_addr.get_or_insert_with(|| "127.0.0.1".into());
    configuration.ws_api.get_or_insert_with(|| ALL_APIS.into());
    if configuration.ws_port.is_none() {
        configuration.ws_port = Some(preferred_port(8546)?);
    }

    configuration.rpc_enabled.get_or_insert(true);
    configuration.rpc_addr.get_or_insert_with(|| "127.0.0.1".into());
    configuration.rpc_api.get_or_insert_with(|| ALL_APIS.into());
    if configuration.rpc_port.is_none() {
        configuration.rpc_port = Some(preferred_port(8545)?);
    }

    let mut ipc_directory = None;
    if configuration.ipc_path.is_none() {
        let (ipc_path, directory) = dev_ipc_path(&data_dir)?;
        configuration.ipc_path = Some(ipc_path);
        ipc_directory = directory;
    }

    configuration.verbosity.get_or_insert_with(|| "5".into());
    configuration.allow_insecure_unlock.get_or_insert(true);

    Ok((configuration, ipc_directory))
}

fn preferred_port(port: u16) -> anyhow::Result<String> {
    match is_port_open(port) {
        true => Ok(port.to_string()),
        false => Ok(get_open_port()?.to_string()),
    }
}

/// `geth.ipc` in the data directory when the path fits in a socket address, a fresh temporary
/// directory otherwise.
fn dev_ipc_path(data_dir: &Path) -> anyhow::Result<(PathBuf, Option<TempDir>)> {
    let ipc_path = data_dir.join(IPC_FILE);
    if ipc_path.as_os_str().len() <= max_socket_path_length() {
        return Ok((ipc_path, None));
    }
    let directory = TempDir::with_prefix("geth-ipc-")
        .context("Failed to create a temporary directory for the IPC socket")?;
    Ok((directory.path().join(IPC_FILE), Some(directory)))
}

/// Writes the genesis into the data directory and runs `geth init` on it.
///
/// The genesis file marks the chain as initialized, it's removed again when `geth init` fails.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.as_ref().display()))]
pub fn initialize_chain(
    genesis: &GenesisDocument,
    data_dir: impl AsRef<Path>,
    configuration: &NodeConfiguration,
) -> Result<(), NodeError> {
    let data_dir = data_dir.as_ref();
    let genesis_path = genesis_file_path(data_dir);
    write_genesis_file(&genesis_path, genesis, false)?;

    let mut subcommand =
        configuration.for_subcommand(["init".to_owned(), genesis_path.display().to_string()]);
    subcommand.data_dir = Some(data_dir.to_path_buf());
    let initialized = build_command(&subcommand)
        .and_then(|command| run_to_completion(command, None))
        .and_then(|completed| {
            completed
                .check("Error initializing genesis.json")
                .map_err(|error| BootstrapError::GenesisInitialization(error).into())
        });
    if let Err(error) = initialized {
        remove_file_if_exists(&genesis_path)?;
        return Err(error);
    }
    info!("Initialized the chain");
    Ok(())
}

/// Geth up to 1.14.0 only loads the post-merge instruction set with a negative terminal total
/// difficulty.
pub fn adjust_genesis_for_version(genesis: &mut GenesisDocument, version: &Version) {
    if *version <= Version::new(1, 14, 0) {
        genesis.config.terminal_total_difficulty = Some((-1).into());
    }
}

/// Everything describing a development chain before it's bootstrapped.
#[derive(Clone, Debug, Default)]
pub struct DevChain {
    pub chain_name: String,
    /// Defaults to the data directory of geth.
    pub base_dir: Option<PathBuf>,
    pub overrides: NodeConfiguration,
    /// Defaults to [`GenesisDocument::dev_default`].
    pub genesis: Option<GenesisDocument>,
    /// The version of geth the chain is run with. Queried from geth when absent.
    pub geth_version: Option<Version>,
}

/// Prepares a development chain for its first start: an account to act as the coinbase and a
/// chain initialized from genesis exactly once.
#[derive(Debug)]
pub struct ChainBootstrapper {
    data_dir: PathBuf,
    configuration: NodeConfiguration,
    ipc_directory: Option<TempDir>,
    genesis: GenesisDocument,
    geth_version: Option<Version>,
}

impl ChainBootstrapper {
    /// Resolves the data directory of the chain and the configuration it runs with. This creates
    /// the data directory and the password file but doesn't run geth.
    pub fn new(chain: DevChain) -> Result<Self, NodeError> {
        let genesis = chain.genesis.unwrap_or_else(GenesisDocument::dev_default);
        genesis.validate()?;

        let base_dir = match chain.base_dir {
            Some(base_dir) => base_dir,
            None => default_base_dir()?,
        };
        let data_dir = chain_data_dir(base_dir, &chain.chain_name)?;
        let (configuration, ipc_directory) = dev_chain_configuration(&data_dir, chain.overrides)?;

        Ok(Self {
            data_dir,
            configuration,
            ipc_directory,
            genesis,
            geth_version: chain.geth_version,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn configuration(&self) -> &NodeConfiguration {
        &self.configuration
    }

    pub fn take_ipc_directory(&mut self) -> Option<TempDir> {
        self.ipc_directory.take()
    }

    /// Chains are initialized once, and never when they are one of the public networks.
    pub fn needs_init(&self) -> bool {
        !genesis_file_path(&self.data_dir).exists()
            && !is_live_chain(&self.data_dir)
            && !is_sepolia_chain(&self.data_dir)
    }

    /// Ensures an account exists and initializes the chain, returning the configuration to run
    /// the chain with. Chains that don't need an initialization are left untouched.
    ///
    /// The temporary directory of the IPC socket, if any, is removed once the bootstrapper is
    /// dropped. Take it beforehand with [`ChainBootstrapper::take_ipc_directory`] to keep it.
    #[instrument(level = "info", skip_all, fields(data_dir = %self.data_dir.display()))]
    pub fn bootstrap(self) -> Result<NodeConfiguration, NodeError> {
        if !self.needs_init() {
            info!("The chain is already initialized or public, skipping its bootstrap");
            return Ok(self.configuration);
        }

        let coinbase = ensure_account_exists(&self.data_dir, &self.configuration)?;
        info!(%coinbase, "Using the coinbase");

        let mut genesis = self.genesis;
        genesis.fund_coinbase(&format!("{coinbase:#x}"), COINBASE_BALANCE);
        let version = match self.geth_version {
            Some(version) => version,
            None => geth_version(&self.configuration)?,
        };
        adjust_genesis_for_version(&mut genesis, &version);
        initialize_chain(&genesis, &self.data_dir, &self.configuration)?;

        Ok(self.configuration)
    }
}

impl NodeProcess {
    /// Bootstraps the development chain and creates a supervisor for it.
    pub fn dev(id: NodeId, chain: DevChain) -> Result<Self, NodeError> {
        let mut bootstrapper = ChainBootstrapper::new(chain)?;
        let ipc_directory = bootstrapper.take_ipc_directory();
        let configuration = bootstrapper.bootstrap()?;
        Ok(Self::new(id, configuration)?.with_ipc_directory(ipc_directory))
    }
}
