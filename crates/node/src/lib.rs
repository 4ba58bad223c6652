//! This crate supervises geth nodes as child processes.
//!
//! A [`NodeConfiguration`] is turned into a [`CommandVector`] by [`build_command`], launched and
//! stopped by a [`NodeProcess`] and polled for readiness through the probes in [`readiness`]. The
//! [`ChainBootstrapper`] prepares disposable development chains (an account and an initialized
//! genesis) before their first start by running one-shot geth subcommands to completion.
//!
//! [`NodeConfiguration`]: geth_harness_config::NodeConfiguration

pub mod accounts;
pub mod chain;
pub mod command;
pub mod constants;
pub mod error;
pub mod genesis;
pub mod process;
pub mod readiness;
pub mod reset;
pub mod streams;
pub mod version;

pub use accounts::*;
pub use chain::*;
pub use command::*;
pub use error::*;
pub use genesis::*;
pub use process::*;
pub use streams::*;
pub use version::*;
