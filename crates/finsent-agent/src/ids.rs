//! Deterministic document id derivation.

use sha2::{Digest, Sha256};

/// Derive a stable `doc_id` from a batch origin and row index.
///
/// Takes the first 16 bytes of SHA-256 over `"{origin}#{index}"` and formats
/// them as a UUID-shaped hex string. Re-ingesting the identical batch
/// produces identical ids, which is what makes ingestion idempotent.
#[must_use]
pub fn derive_doc_id(origin: &str, index: usize) -> String {
    let hash = Sha256::digest(format!("{origin}#{index}").as_bytes());
    let b = &hash[..16];
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[0], b[1], b[2], b[3],
        b[4], b[5],
        b[6], b[7],
        b[8], b[9],
        b[10], b[11], b[12], b[13], b[14], b[15],
    )
}
