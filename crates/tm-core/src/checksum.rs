//! SHA-256 checksum utility for migration drift detection.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 checksum of a migration body.
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}
