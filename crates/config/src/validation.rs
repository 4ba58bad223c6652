use std::{fmt::Display, path::PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::GcMode;

/// The type a configuration field accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// A non-negative integer that fits in 32 bits.
    Integer,
    Boolean,
    /// One of a closed set of string literals.
    Literal(&'static [&'static str]),
    StringList,
    StringMap,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => f.write_str("a string"),
            Self::Integer => f.write_str("a non-negative 32-bit integer"),
            Self::Boolean => f.write_str("a boolean"),
            Self::Literal(literals) => write!(f, "one of {}", literals.join(", ")),
            Self::StringList => f.write_str("a list of strings"),
            Self::StringMap => f.write_str("a mapping of strings to strings"),
        }
    }
}

/// The recognized configuration fields in the order they are declared in.
pub const CONFIGURATION_FIELDS: &[(&str, FieldKind)] = &[
    ("cache", FieldKind::String),
    ("data_dir", FieldKind::String),
    ("dev_mode", FieldKind::Boolean),
    ("dev_period", FieldKind::String),
    ("gcmode", FieldKind::Literal(GcMode::ALL)),
    ("geth_executable", FieldKind::String),
    ("ipc_disable", FieldKind::Boolean),
    ("ipc_path", FieldKind::String),
    ("max_peers", FieldKind::String),
    ("network_id", FieldKind::String),
    ("nice", FieldKind::Boolean),
    ("no_discover", FieldKind::Boolean),
    ("password", FieldKind::String),
    ("port", FieldKind::String),
    ("preload", FieldKind::String),
    ("rpc_addr", FieldKind::String),
    ("rpc_api", FieldKind::String),
    ("rpc_cors_domain", FieldKind::String),
    ("rpc_enabled", FieldKind::Boolean),
    ("rpc_port", FieldKind::String),
    ("stdin", FieldKind::String),
    ("suffix_args", FieldKind::StringList),
    ("suffix_kwargs", FieldKind::StringMap),
    ("tx_pool_global_slots", FieldKind::String),
    ("tx_pool_lifetime", FieldKind::String),
    ("tx_pool_price_limit", FieldKind::String),
    ("verbosity", FieldKind::String),
    ("ws_addr", FieldKind::String),
    ("ws_api", FieldKind::String),
    ("ws_enabled", FieldKind::Boolean),
    ("ws_origins", FieldKind::String),
    ("ws_port", FieldKind::String),
    ("unlock", FieldKind::String),
    ("mine", FieldKind::Boolean),
    ("miner_threads", FieldKind::Integer),
    ("miner_etherbase", FieldKind::String),
    ("allow_insecure_unlock", FieldKind::Boolean),
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown configuration field `{field}`")]
    UnknownField { field: String },

    #[error("configuration field `{field}` expects {expected} but got {actual}")]
    InvalidType {
        field: String,
        expected: FieldKind,
        actual: String,
    },

    #[error("configuration must be a mapping of field names to values but got {actual}")]
    NotAMapping { actual: String },

    #[error("contradicting configuration: {message}")]
    Contradiction { message: String },

    #[error("invalid genesis data: {message}")]
    InvalidGenesis { message: String },

    #[error("failed to deserialize the configuration: {message}")]
    Deserialization { message: String },

    #[error("failed to read the configuration file {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

impl ConfigurationError {
    pub fn contradiction(message: impl Into<String>) -> Self {
        Self::Contradiction {
            message: message.into(),
        }
    }

    pub fn invalid_genesis(message: impl Display) -> Self {
        Self::InvalidGenesis {
            message: message.to_string(),
        }
    }
}

/// Checks that every field of the configuration is recognized and that its value has the type
/// the field accepts. `null` is accepted for every field and means the field is unset.
///
/// This never touches the filesystem or the network.
pub fn validate_configuration(fields: &Map<String, Value>) -> Result<(), ConfigurationError> {
    for (field, value) in fields {
        let Some((_, kind)) = CONFIGURATION_FIELDS
            .iter()
            .find(|(name, _)| *name == field.as_str())
        else {
            return Err(ConfigurationError::UnknownField {
                field: field.clone(),
            });
        };
        if value.is_null() || value_matches_kind(value, *kind) {
            continue;
        }
        return Err(ConfigurationError::InvalidType {
            field: field.clone(),
            expected: *kind,
            actual: match (kind, value) {
                (FieldKind::Literal(_), Value::String(literal)) => format!("`{literal}`"),
                _ => describe_value(value),
            },
        });
    }
    Ok(())
}

fn value_matches_kind(value: &Value, kind: FieldKind) -> bool {
    match (kind, value) {
        (FieldKind::String, Value::String(_)) => true,
        (FieldKind::Boolean, Value::Bool(_)) => true,
        (FieldKind::Integer, Value::Number(number)) => number
            .as_u64()
            .is_some_and(|value| u32::try_from(value).is_ok()),
        (FieldKind::Literal(literals), Value::String(literal)) => {
            literals.contains(&literal.as_str())
        }
        (FieldKind::StringList, Value::Array(items)) => items.iter().all(Value::is_string),
        (FieldKind::StringMap, Value::Object(entries)) => entries.values().all(Value::is_string),
        _ => false,
    }
}

pub(crate) fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(value) => format!("a boolean ({value})"),
        Value::Number(number) if number.is_u64() || number.is_i64() => {
            format!("an integer ({number})")
        }
        Value::Number(number) => format!("a number ({number})"),
        Value::String(value) => format!("a string (\"{value}\")"),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            "a list of strings".to_owned()
        }
        Value::Array(_) => "a list with non-string items".to_owned(),
        Value::Object(entries) if entries.values().all(Value::is_string) => {
            "a mapping of strings to strings".to_owned()
        }
        Value::Object(_) => "a mapping with non-string values".to_owned(),
    }
}
