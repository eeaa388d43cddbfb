//! Identity metadata this node reports to identification queries.

use mesh_core::NodeIdentity;

/// Builds the identity record registered for the local node.  The revision
/// is the crate version; build date and time come from the environment when
/// the build system provides them.
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
        // Arrange / Act
        let identity = local_identity("bench-1");

        // Assert
        assert_eq!(identity.hostname, "bench-1");
        assert_eq!(identity.model, "MeshDiag");
        assert_eq!(identity.revision, env!("CARGO_PKG_VERSION"));
    }
}
