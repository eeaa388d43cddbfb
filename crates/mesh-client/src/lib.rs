//! # mesh-client
//!
//! The client role of the MeshDiag harness: sweep the address range for
//! reachable nodes, then run periodic diagnostic sessions against the
//! configured target.  All protocol behaviour lives in `mesh-core`; this
//! crate adds the command line, configuration file, and operator-facing
//! progress output.

pub mod cli;
pub mod config;
pub mod identity;
pub mod progress;
