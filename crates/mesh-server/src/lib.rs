//! # mesh-server
//!
//! The server role of the MeshDiag harness: bind a listening socket on all
//! ports, accept connections, and route each packet either to the
//! application's message handler or to the protocol's default service
//! handler.  All protocol behaviour lives in `mesh-core`; this crate adds
//! the command line, configuration file, and the logging message handler.

pub mod cli;
pub mod config;
pub mod handler;
pub mod identity;
