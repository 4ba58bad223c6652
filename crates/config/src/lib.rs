//! The configuration of supervised geth nodes and the arguments of the `geth-harness` binary.
//!
//! A [`NodeConfiguration`] is a flat record drawn from a closed set of fields. Configurations that
//! come from untyped sources (JSON files, maps built by test harnesses) go through
//! [`validate_configuration`] first so that unknown or mistyped fields are rejected with a
//! diagnostic instead of being silently dropped.

mod arguments;
mod configuration;
mod validation;

pub use arguments::*;
pub use configuration::*;
pub use validation::*;
