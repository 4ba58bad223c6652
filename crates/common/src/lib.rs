//! This crate provides the primitives shared by the other crates in the workspace: the deadline
//! guard that bounds every wait loop, the blocking polling helper built on top of it, filesystem
//! helpers, the injected sequence generator used for node identifiers and
//! [`define_wrapper_type!`] for newtypes.

pub mod fs;
mod macros;
pub mod polling;
pub mod timeout;
pub mod types;
