//! Identity metadata this node reports to identification queries.

use mesh_core::NodeIdentity;

/// Builds the identity record registered for the local node.
pub fn local_identity(hostname: &str) -> NodeIdentity {
    NodeIdentity {
        hostname: hostname.to_string(),
        model: "MeshDiag".to_string(),
        revision: env!("CARGO_PKG_VERSION").to_string(),
        date: option_env!("BUILD_DATE").unwrap_or("unknown").to_string(),
        time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_identity_carries_hostname_and_revision() {
        let identity = local_identity("relay-7");

        assert_eq!(identity.hostname, "relay-7");
        assert_eq!(identity.revision, env!("CARGO_PKG_VERSION"));
    }
}
