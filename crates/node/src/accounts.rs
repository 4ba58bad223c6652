//! Listing and creating the accounts of a chain through geth's `account` subcommands.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
};

use alloy_primitives::Address;
use geth_harness_config::NodeConfiguration;
use regex::Regex;
use tracing::{info, instrument};

use crate::{BootstrapError, NodeError, build_command, process::run_to_completion};

/// Exactly 40 hex digits, either standing on their own or behind a `0x` prefix.
static ACCOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b|0x)([a-fA-F0-9]{40})\b").expect("Invalid account regex")
});

const NO_KEYS_IN_STORE: &str = "no keys in store";

/// Extracts every distinct address mentioned in the output of an `account` subcommand, in the
/// order they first appear.
pub fn parse_geth_accounts(output: &str) -> Vec<Address> {
    let mut accounts = Vec::new();
    for address in ACCOUNT_REGEX
        .captures_iter(output)
        .filter_map(|captures| Address::from_str(captures.get(1)?.as_str()).ok())
    {
        if !accounts.contains(&address) {
            accounts.push(address);
        }
    }
    accounts
}

/// Lists the accounts in the keystore of the data directory. An empty keystore is not an error.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.as_ref().display()))]
pub fn get_accounts(
    data_dir: impl AsRef<Path>,
    configuration: &NodeConfiguration,
) -> Result<Vec<Address>, NodeError> {
    let mut subcommand = configuration.for_subcommand(["account", "list"]);
    subcommand.data_dir = Some(data_dir.as_ref().to_path_buf());

    let completed = run_to_completion(build_command(&subcommand)?, None)?;
    if !completed.success() {
        if completed.stderr.contains(NO_KEYS_IN_STORE) {
            return Ok(Vec::new());
        }
        return Err(completed
            .into_error("Error trying to list accounts")
            .into());
    }
    Ok(parse_geth_accounts(&completed.stdout))
}

/// Where the password protecting a new account comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasswordSource {
    File(PathBuf),
    /// Typed into the interactive prompt of geth.
    Literal(String),
}

/// Creates a new account in the keystore of the data directory and returns its address.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.as_ref().display()))]
pub fn create_new_account(
    data_dir: impl AsRef<Path>,
    password: PasswordSource,
    configuration: &NodeConfiguration,
) -> Result<Address, NodeError> {
    let mut subcommand = configuration.for_subcommand(["account", "new"]);
    subcommand.data_dir = Some(data_dir.as_ref().to_path_buf());

    let stdin = match password {
        PasswordSource::File(path) => {
            if !path.is_file() {
                return Err(BootstrapError::PasswordFileNotFound(path).into());
            }
            subcommand.password = Some(path);
            None
        }
        PasswordSource::Literal(password) => Some(format!("{password}\n{password}")),
    };

    let completed = run_to_completion(build_command(&subcommand)?, stdin.as_deref())?
        .check("Error creating a new account")
        .map_err(BootstrapError::AccountCreation)?;
    match parse_geth_accounts(&completed.stdout).first() {
        Some(address) => {
            info!(%address, "Created a new account");
            Ok(*address)
        }
        None => Err(BootstrapError::NoAddressInOutput(
            completed.into_error("Did not find an address in the output of `account new`"),
        )
        .into()),
    }
}

/// Returns the first account of the data directory, creating one with the configured password
/// file when the keystore is empty.
pub fn ensure_account_exists(
    data_dir: impl AsRef<Path>,
    configuration: &NodeConfiguration,
) -> Result<Address, NodeError> {
    let data_dir = data_dir.as_ref();
    if let Some(address) = get_accounts(data_dir, configuration)?.first() {
        return Ok(*address);
    }
    let Some(password) = configuration.password.clone() else {
        return Err(BootstrapError::MissingPassword.into());
    };
    create_new_account(data_dir, PasswordSource::File(password), configuration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_are_parsed_from_a_listing() {
        // Arrange
        let output = "\
Account #0: {d3cda913deb6f67967b99d67acdfa1712c293601} keystore:///home/user/.ethereum/keystore/UTC--2015-09-11T00-22-22.651000000Z--d3cda913deb6f67967b99d67acdfa1712c293601
Account #1: {8ccd6cd1b4de7c2a5bd1b8d0b8bb8bde2a0dd8cd} keystore:///home/user/.ethereum/keystore/UTC--2016-01-06T16-02-54.066000000Z--8ccd6cd1b4de7c2a5bd1b8d0b8bb8bde2a0dd8cd
";

        // Act
        let accounts = parse_geth_accounts(output);

        // Assert
        assert_eq!(
            accounts,
            vec![
                Address::from_str("d3cda913deb6f67967b99d67acdfa1712c293601").unwrap(),
                Address::from_str("8ccd6cd1b4de7c2a5bd1b8d0b8bb8bde2a0dd8cd").unwrap(),
            ]
        );
    }

    #[test]
    fn checksummed_addresses_of_new_accounts_are_parsed() {
        // Arrange
        let output = "\
Your new key was generated

Public address of the key:   0x8c28B76A845F525a7F91149864574D3a4986E693
Path of the secret key file: /tmp/chain/keystore/UTC--2024-06-19T20-40-51.284430000Z--8c28b76a845f525a7f91149864574d3a4986e693
";

        // Act
        let accounts = parse_geth_accounts(output);

        // Assert
        assert_eq!(
            accounts,
            vec![Address::from_str("0x8c28b76a845f525a7f91149864574d3a4986e693").unwrap()]
        );
    }

    #[test]
    fn longer_hex_runs_are_not_addresses() {
        // Arrange
        let output = "\
Account #0: {d3cda913deb6f67967b99d67acdfa1712c293601} keystore:///tmp/keystore/key
block hash 0x4d3c2b1a09f8e7d6c5b4a39281706f5e4d3c2b1a09f8e7d6c5b4a39281706f5e
";

        // Act
        let accounts = parse_geth_accounts(output);

        // Assert
        assert_eq!(
            accounts,
            vec![Address::from_str("d3cda913deb6f67967b99d67acdfa1712c293601").unwrap()]
        );
    }

    #[test]
    fn outputs_without_addresses_have_no_accounts() {
        assert!(parse_geth_accounts("INFO [06-19|20:40:51.284] Maximum peer count").is_empty());
    }
}
