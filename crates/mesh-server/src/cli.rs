//! Command-line options for the server binary.

use clap::Parser;
use mesh_core::Address;

#[derive(Debug, Parser)]
#[command(name = "mesh-server")]
#[command(about = "Diagnostic server: accept connections and log received messages.")]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_flags_given() {
        let cli = CommandLine::parse_from(["mesh-server"]);

        assert_eq!(cli.protocol_version, 2);
        assert_eq!(cli.address, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let result = CommandLine::try_parse_from(["mesh-server", "--bogus"]);
        assert!(result.is_err());
    }
}
