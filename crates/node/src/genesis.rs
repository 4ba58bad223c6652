//! The genesis document that development chains are initialized from.

use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;
use geth_harness_config::ConfigurationError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};

use crate::{BootstrapError, NodeError};

/// A genesis document. Unknown keys, at the top level or inside of `config`, are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisDocument {
    #[serde(default)]
    pub alloc: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    #[serde(default)]
    pub config: GenesisConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The chain configuration of a genesis document: fork activation blocks and times.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethash: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homestead_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dao_fork_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dao_fork_support: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip150_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip155_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip158_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byzantium_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constantinople_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petersburg_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istanbul_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berlin_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub london_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow_glacier_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gray_glacier_block: Option<u64>,
    /// Signed and arbitrarily large, older geth versions require `-1` here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_total_difficulty: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_total_difficulty_passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shanghai_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancun_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prague_time: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blob_schedule: BTreeMap<String, Value>,
}

impl GenesisDocument {
    /// Validates an untyped genesis document and converts it.
    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        let document = serde_json::from_value::<Self>(value)
            .map_err(ConfigurationError::invalid_genesis)?;
        document.validate()?;
        Ok(document)
    }

    /// Checks the rules that span multiple fields.
    ///
    /// Every time-gated fork that introduces or changes blobs must be accompanied by its entry
    /// in the blob schedule once it's activated after genesis.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (fork, time) in [
            ("cancun", self.config.cancun_time),
            ("prague", self.config.prague_time),
        ] {
            let activated = time.is_some_and(|time| time != 0);
            if activated && !self.has_blob_schedule(fork) {
                return Err(ConfigurationError::invalid_genesis(format!(
                    "blobSchedule '{fork}' value is required when {fork}Time is set"
                )));
            }
        }
        Ok(())
    }

    /// Only a non-empty object is a blob schedule entry.
    fn has_blob_schedule(&self, fork: &str) -> bool {
        matches!(
            self.config.blob_schedule.get(fork),
            Some(Value::Object(entries)) if !entries.is_empty()
        )
    }

    /// Funds the coinbase in genesis and makes it the coinbase of the genesis block. An existing
    /// allocation of the coinbase is kept.
    pub fn fund_coinbase(&mut self, coinbase: &str, balance: &str) {
        self.coinbase = Some(coinbase.to_owned());
        self.alloc
            .entry(coinbase.to_owned())
            .or_insert_with(|| BTreeMap::from([("balance".to_owned(), json!(balance))]));
    }

    /// The genesis of development chains: every fork active from genesis on.
    pub fn dev_default() -> Self {
        Self {
            nonce: Some("0x0".into()),
            timestamp: Some("0x0".into()),
            parent_hash: Some(
                "0x0000000000000000000000000000000000000000000000000000000000000000".into(),
            ),
            extra_data: Some("0x686f727365".into()),
            gas_limit: Some("0x47d5cc".into()),
            base_fee_per_gas: Some("0x0".into()),
            difficulty: Some("0x01".into()),
            mix_hash: Some(
                "0x0000000000000000000000000000000000000000000000000000000000000000".into(),
            ),
            coinbase: Some("0x3333333333333333333333333333333333333333".into()),
            config: GenesisConfig {
                chain_id: Some(131277322940537),
                ethash: Some(BTreeMap::new()),
                homestead_block: Some(0),
                dao_fork_block: Some(0),
                dao_fork_support: Some(false),
                eip150_block: Some(0),
                eip155_block: Some(0),
                eip158_block: Some(0),
                byzantium_block: Some(0),
                constantinople_block: Some(0),
                petersburg_block: Some(0),
                istanbul_block: Some(0),
                berlin_block: Some(0),
                london_block: Some(0),
                arrow_glacier_block: Some(0),
                gray_glacier_block: Some(0),
                terminal_total_difficulty: Some(Number::from(0)),
                terminal_total_difficulty_passed: Some(true),
                shanghai_time: Some(0),
                cancun_time: Some(0),
                prague_time: None,
                blob_schedule: BTreeMap::from([(
                    "cancun".to_owned(),
                    json!({"target": 3, "max": 6, "baseFeeUpdateFraction": 3338477}),
                )]),
            },
            ..Default::default()
        }
    }
}

/// Validates the document and writes it to the path. An existing file is only replaced when
/// `overwrite` is set.
pub fn write_genesis_file(
    path: impl AsRef<Path>,
    document: &GenesisDocument,
    overwrite: bool,
) -> Result<(), NodeError> {
    let path = path.as_ref();
    if path.exists() && !overwrite {
        return Err(BootstrapError::GenesisAlreadyExists(path.to_path_buf()).into());
    }
    document.validate()?;

    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open the genesis file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, document).context("Failed to serialize the genesis")?;
    writer
        .flush()
        .with_context(|| format!("Failed to write the genesis file {}", path.display()))?;
    Ok(())
}

pub fn read_genesis_file(path: impl AsRef<Path>) -> Result<GenesisDocument, NodeError> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open the genesis file {}", path.display()))?;
    let value = serde_json::from_reader::<_, Value>(BufReader::new(file))
        .with_context(|| format!("Failed to parse the genesis file {}", path.display()))?;
    Ok(GenesisDocument::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use temp_dir::TempDir;

    use super::*;

    #[test]
    fn dev_default_is_valid() {
        GenesisDocument::dev_default()
            .validate()
            .expect("The default genesis is invalid");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        // Arrange
        let top_level = json!({"gasLimit": "0x47d5cc", "kangaroo": "0x1"});
        let nested = json!({"config": {"chainId": 1, "kangarooBlock": 0}});

        // Act & Assert
        assert!(matches!(
            GenesisDocument::from_value(top_level),
            Err(ConfigurationError::InvalidGenesis { .. })
        ));
        assert!(matches!(
            GenesisDocument::from_value(nested),
            Err(ConfigurationError::InvalidGenesis { .. })
        ));
    }

    #[test]
    fn time_gated_forks_require_their_blob_schedule() {
        // Arrange
        let missing = json!({"config": {"cancunTime": 5, "blobSchedule": {}}});
        let at_genesis = json!({"config": {"cancunTime": 0}});
        let present = json!({"config": {
            "cancunTime": 5,
            "pragueTime": 10,
            "blobSchedule": {
                "cancun": {"target": 3, "max": 6, "baseFeeUpdateFraction": 3338477},
                "prague": {"target": 6, "max": 9, "baseFeeUpdateFraction": 5007716},
            },
        }});

        // Act
        let missing = GenesisDocument::from_value(missing);
        let at_genesis = GenesisDocument::from_value(at_genesis);
        let present = GenesisDocument::from_value(present);

        // Assert
        assert_eq!(
            missing.unwrap_err().to_string(),
            "invalid genesis data: blobSchedule 'cancun' value is required when cancunTime is set"
        );
        assert!(at_genesis.is_ok());
        assert!(present.is_ok());
    }

    #[test]
    fn falsy_blob_schedules_are_missing() {
        for schedule in [json!(0), json!(false), json!(""), json!({})] {
            // Arrange
            let document = json!({
                "config": {"cancunTime": 5, "blobSchedule": {"cancun": schedule.clone()}}
            });

            // Act
            let result = GenesisDocument::from_value(document);

            // Assert
            assert!(
                matches!(result, Err(ConfigurationError::InvalidGenesis { .. })),
                "{schedule} was accepted as a blob schedule"
            );
        }
    }

    #[test]
    fn invalid_documents_are_not_written() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("genesis.json");
        let mut document = GenesisDocument::dev_default();
        document.config.prague_time = Some(100);

        // Act
        let result = write_genesis_file(&path, &document, false);

        // Assert
        assert!(matches!(
            result,
            Err(NodeError::Configuration(ConfigurationError::InvalidGenesis { .. }))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn written_documents_read_back_identically() {
        // Arrange
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("genesis.json");
        let mut document = GenesisDocument::dev_default();
        document.config.terminal_total_difficulty = Some(Number::from(-1));
        document.fund_coinbase(
            "0x8c28b76a845f525a7f91149864574d3a4986e693",
            "1000000000000000000000000000000",
        );

        // Act
        write_genesis_file(&path, &document, false).expect("Failed to write the genesis");
        let read = read_genesis_file(&path).expect("Failed to read the genesis");

        // Assert
        assert_eq!(read, document);
        assert!(matches!(
            write_genesis_file(&path, &document, false),
            Err(NodeError::Bootstrap(BootstrapError::GenesisAlreadyExists(_)))
        ));
        write_genesis_file(&path, &document, true).expect("Failed to overwrite the genesis");
    }
}
