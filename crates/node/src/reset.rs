//! Wiping the state of a chain, either by deleting it from the data directory or through
//! `geth removedb`.

use std::path::Path;

use geth_harness_common::fs::{remove_dir_if_exists, remove_file_if_exists};
use geth_harness_config::{ConfigurationError, NodeConfiguration};
use tracing::{info, instrument};

use crate::{
    NodeError, build_command,
    chain::{is_live_chain, is_sepolia_chain},
    process::run_to_completion,
};

/// The entries of a data directory holding chain state. The keystore is not one of them.
const CHAIN_STATE_ENTRIES: [&str; 6] = [
    "chaindata",
    "dapp",
    "nodekey",
    "nodes",
    "geth.ipc",
    "history",
];

fn ensure_reset_allowed(
    data_dir: &Path,
    allow_live: bool,
    allow_testnet: bool,
) -> Result<(), ConfigurationError> {
    if is_live_chain(data_dir) && !allow_live {
        return Err(ConfigurationError::contradiction(
            "resetting the live chain requires `allow_live` to be set",
        ));
    }
    if is_sepolia_chain(data_dir) && !allow_testnet {
        return Err(ConfigurationError::contradiction(
            "resetting the sepolia chain requires `allow_testnet` to be set",
        ));
    }
    Ok(())
}

/// Deletes the chain state from the data directory, keeping the keystore and the genesis file.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.as_ref().display()))]
pub fn hard_reset_chain(
    data_dir: impl AsRef<Path>,
    allow_live: bool,
    allow_testnet: bool,
) -> Result<(), NodeError> {
    let data_dir = data_dir.as_ref();
    ensure_reset_allowed(data_dir, allow_live, allow_testnet)?;
    for entry in CHAIN_STATE_ENTRIES {
        let path = data_dir.join(entry);
        if remove_dir_if_exists(&path)? || remove_file_if_exists(&path)? {
            info!(path = %path.display(), "Removed chain state");
        }
    }
    Ok(())
}

/// Deletes the chain databases through `geth removedb`, keeping the keystore.
#[instrument(level = "info", skip_all)]
pub fn soft_reset_chain(
    configuration: &NodeConfiguration,
    allow_live: bool,
    allow_testnet: bool,
) -> Result<(), NodeError> {
    let Some(data_dir) = configuration.data_dir.as_deref() else {
        return Err(ConfigurationError::contradiction(
            "`data_dir` is required to soft reset a chain",
        )
        .into());
    };
    ensure_reset_allowed(data_dir, allow_live, allow_testnet)?;

    let mut suffix_args = configuration.suffix_args.clone().unwrap_or_default();
    suffix_args.push("removedb".into());
    let command = build_command(&NodeConfiguration {
        suffix_args: Some(suffix_args),
        ..configuration.clone()
    })?;

    let completed = run_to_completion(command, Some("y"))?;
    if !completed.stdout.contains("Removing chaindata")
        && !completed.stderr.contains("Removing chaindata")
    {
        return Err(completed
            .into_error("Error soft resetting the chain")
            .into());
    }
    info!("Removed the chain databases");
    Ok(())
}

#[cfg(test)]
mod tests {
    use temp_dir::TempDir;

    use super::*;

    #[test]
    fn hard_reset_removes_the_chain_state_only() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let data_dir = directory.path();
        std::fs::create_dir_all(data_dir.join("keystore")).unwrap();
        std::fs::create_dir_all(data_dir.join("chaindata").join("ancient")).unwrap();
        std::fs::write(data_dir.join("nodekey"), "key").unwrap();
        std::fs::write(data_dir.join("genesis.json"), "{}").unwrap();

        // Act
        hard_reset_chain(data_dir, false, false).expect("Failed to reset");

        // Assert
        assert!(!data_dir.join("chaindata").exists());
        assert!(!data_dir.join("nodekey").exists());
        assert!(data_dir.join("keystore").is_dir());
        assert!(data_dir.join("genesis.json").is_file());
        hard_reset_chain(data_dir, false, false).expect("Resetting twice must succeed");
    }

    #[test]
    fn soft_reset_requires_a_data_directory() {
        assert!(matches!(
            soft_reset_chain(&NodeConfiguration::default(), false, false),
            Err(NodeError::Configuration(_))
        ));
    }
}
