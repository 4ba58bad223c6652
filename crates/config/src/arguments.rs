use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use semver::Version;

#[derive(Debug, Parser, Clone)]
#[command(name = "geth-harness")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: HarnessCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum HarnessCommand {
    /// Bootstraps a disposable development chain and runs it until geth exits or the run duration
    /// elapses.
    Dev(DevArguments),

    /// Prints the command line that a JSON configuration file translates into.
    Command {
        /// The JSON file holding the node configuration.
        config: PathBuf,
    },

    /// Lists the accounts found in the keystore of a data directory.
    Accounts {
        #[arg(long = "datadir")]
        data_dir: PathBuf,

        /// The path to the `geth` executable.
        ///
        /// By default it uses the `GETH_BINARY` environment variable or the `geth` binary found in
        /// `$PATH`.
        #[arg(long = "geth")]
        geth: Option<PathBuf>,
    },

    /// Prints the version of the geth executable.
    Version {
        #[arg(long = "geth")]
        geth: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args, Clone)]
pub struct DevArguments {
    /// The name of the chain, also the name of its directory under the base directory.
    #[arg(long = "chain", default_value = "dev")]
    pub chain_name: String,

    /// The directory that holds the chain directories.
    ///
    /// Creates a temporary directory if not specified.
    #[arg(long = "base-dir")]
    pub base_dir: Option<PathBuf>,

    /// A JSON configuration file whose fields override the development chain defaults.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Initialize the chain with this genesis file instead of the built-in development genesis.
    #[arg(long = "genesis")]
    pub genesis: Option<PathBuf>,

    #[arg(long = "geth")]
    pub geth: Option<PathBuf>,

    /// Skips querying the geth executable for its version when preparing the genesis.
    #[arg(long = "geth-version")]
    pub geth_version: Option<Version>,

    /// The maximum time in milliseconds to wait for the RPC endpoint to come up.
    #[arg(long = "ready-timeout", default_value = "60000")]
    pub ready_timeout_ms: u64,

    /// Stops the node after this many seconds. Runs until geth exits otherwise.
    #[arg(long = "run-for")]
    pub run_for_secs: Option<u64>,

    /// Writes the stdout and stderr of geth into this directory.
    #[arg(long = "logs-dir")]
    pub logs_dir: Option<PathBuf>,
}

impl DevArguments {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }
}
