use std::{
    collections::BTreeMap,
    fmt::Display,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConfigurationError, validate_configuration};

/// The environment variable that overrides the geth executable.
pub const GETH_BINARY_ENV: &str = "GETH_BINARY";

/// The environment variable that overrides the directory that geth releases are installed into.
pub const GETH_BASE_INSTALL_PATH_ENV: &str = "GETH_BASE_INSTALL_PATH";

/// The environment variable that overrides the maximum length of a unix socket path.
pub const UNIX_PATH_MAX_ENV: &str = "UNIX_PATH_MAX";

/// The executable that's used when neither the configuration nor the environment name one.
pub const DEFAULT_GETH_BINARY: &str = "geth";

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: &str = "8545";

/// The configuration of a geth node.
///
/// Every field is optional and an absent field means that the corresponding flag is not passed to
/// geth. Ports and identifiers are kept as strings since they are forwarded verbatim on the
/// command line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcmode: Option<GcMode>,
    /// The geth executable, either a path or a name looked up in `$PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geth_executable: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_disable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_peers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Runs geth through `nice` when it's available on the host. Defaults to `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_discover: Option<bool>,
    /// Path to a file containing the password of the unlocked account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_api: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_cors_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<String>,
    /// Data written to the standard input of one-shot subcommands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Positional arguments appended verbatim after every other flag, e.g. `["account", "new"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix_args: Option<Vec<String>>,
    /// Flags appended verbatim, as `key value` pairs in key order, before the suffix arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix_kwargs: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_pool_global_slots: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_pool_lifetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_pool_price_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_api: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_origins: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miner_threads: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miner_etherbase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_insecure_unlock: Option<bool>,
}

impl NodeConfiguration {
    /// Validates an untyped configuration and converts it into a [`NodeConfiguration`].
    pub fn try_from_value(value: Value) -> Result<Self, ConfigurationError> {
        let Value::Object(fields) = &value else {
            return Err(ConfigurationError::NotAMapping {
                actual: crate::validation::describe_value(&value),
            });
        };
        validate_configuration(fields)?;
        serde_json::from_value(value).map_err(|error| ConfigurationError::Deserialization {
            message: error.to_string(),
        })
    }

    /// Reads a JSON configuration file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let unreadable = |message: String| ConfigurationError::Unreadable {
            path: path.to_path_buf(),
            message,
        };
        let file = File::open(path).map_err(|error| unreadable(error.to_string()))?;
        let value = serde_json::from_reader::<_, Value>(BufReader::new(file))
            .map_err(|error| unreadable(error.to_string()))?;
        Self::try_from_value(value)
    }

    pub fn is_nice(&self) -> bool {
        self.nice.unwrap_or(true)
    }

    pub fn is_mining(&self) -> bool {
        self.mine.unwrap_or_default()
    }

    pub fn is_rpc_enabled(&self) -> bool {
        self.rpc_enabled.unwrap_or_default()
    }

    pub fn is_ws_enabled(&self) -> bool {
        self.ws_enabled.unwrap_or_default()
    }

    pub fn is_ipc_enabled(&self) -> bool {
        !self.ipc_disable.unwrap_or_default()
    }

    pub fn rpc_host(&self) -> &str {
        self.rpc_addr.as_deref().unwrap_or(DEFAULT_RPC_HOST)
    }

    pub fn rpc_port(&self) -> &str {
        self.rpc_port.as_deref().unwrap_or(DEFAULT_RPC_PORT)
    }

    /// Returns a configuration for a one-shot subcommand that only keeps the fields that locate
    /// the executable and its data directory.
    pub fn for_subcommand<I, S>(&self, suffix_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            geth_executable: self.geth_executable.clone(),
            data_dir: self.data_dir.clone(),
            nice: Some(false),
            suffix_args: Some(suffix_args.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// The garbage collection mode of the node's database.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lower")]
pub enum GcMode {
    Full,
    Archive,
}

impl GcMode {
    pub const ALL: &'static [&'static str] = &["full", "archive"];
}

impl Display for GcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Archive => f.write_str("archive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use temp_dir::TempDir;

    use super::*;

    #[test]
    fn valid_configuration_is_converted() {
        // Arrange
        let value = json!({
            "data_dir": "/tmp",
            "network_id": "123",
            "rpc_port": "1234",
            "dev_mode": true,
            "gcmode": "archive",
            "miner_threads": 2,
            "suffix_args": ["account", "list"],
            "suffix_kwargs": {"--syncmode": "full"},
        });

        // Act
        let configuration = NodeConfiguration::try_from_value(value);

        // Assert
        let configuration = configuration.expect("Failed to convert the configuration");
        assert_eq!(configuration.data_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(configuration.gcmode, Some(GcMode::Archive));
        assert_eq!(configuration.miner_threads, Some(2));
        assert_eq!(configuration.dev_mode, Some(true));
        assert_eq!(
            configuration.suffix_kwargs,
            Some(BTreeMap::from([("--syncmode".into(), "full".into())]))
        );
    }

    #[test]
    fn defaults_of_derived_accessors() {
        // Arrange
        let configuration = NodeConfiguration::default();

        // Assert
        assert!(configuration.is_nice());
        assert!(configuration.is_ipc_enabled());
        assert!(!configuration.is_rpc_enabled());
        assert!(!configuration.is_mining());
        assert_eq!(configuration.rpc_host(), DEFAULT_RPC_HOST);
        assert_eq!(configuration.rpc_port(), DEFAULT_RPC_PORT);
    }

    #[test]
    fn subcommand_configuration_keeps_only_location_fields() {
        // Arrange
        let configuration = NodeConfiguration {
            geth_executable: Some("/opt/geth".into()),
            data_dir: Some("/tmp/chain".into()),
            rpc_enabled: Some(true),
            mine: Some(true),
            ..Default::default()
        };

        // Act
        let subcommand = configuration.for_subcommand(["account", "list"]);

        // Assert
        assert_eq!(
            subcommand,
            NodeConfiguration {
                geth_executable: Some("/opt/geth".into()),
                data_dir: Some("/tmp/chain".into()),
                nice: Some(false),
                suffix_args: Some(vec!["account".into(), "list".into()]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn configuration_file_is_loaded_and_validated() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let good = directory.path().join("good.json");
        let bad = directory.path().join("bad.json");
        std::fs::write(&good, r#"{"rpc_enabled": true, "rpc_port": "8545"}"#).unwrap();
        std::fs::write(&bad, r#"{"rpc_enabled": true, "kangaroo": 1}"#).unwrap();

        // Act
        let good = NodeConfiguration::from_path(&good);
        let bad = NodeConfiguration::from_path(&bad);

        // Assert
        assert_eq!(
            good.expect("Failed to load the configuration").rpc_port(),
            "8545"
        );
        assert!(matches!(
            bad,
            Err(ConfigurationError::UnknownField { ref field }) if field == "kangaroo"
        ));
    }
}
