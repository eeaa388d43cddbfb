//! Command-line options for the client binary.
//!
//! Unknown flags are a usage error: `clap` prints the usage text and exits
//! with a failure status before `main` ever sees the arguments.

use clap::Parser;
use mesh_core::Address;

#[derive(Debug, Parser)]
#[command(name = "mesh-client")]
#[command(about = "Diagnostic client: scan the network, then exchange greetings with a target node.")]
pub struct CommandLine {
    /// Protocol version to speak on the wire.
    #[arg(short = 'v', long = "protocol-version", default_value_t = 2)]
    pub protocol_version: u8,

    /// Local node address, overriding the configuration file.
    #[arg(short = 'n', long = "address")]
    pub address: Option<Address>,

    /// Path to the configuration file.
    #[arg(short = 'f', long = "config")]
    pub config: Option<std::path::PathBuf>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
