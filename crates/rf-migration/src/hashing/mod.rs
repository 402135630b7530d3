//! Canonicalización JSON + hash, para huellas de documentos.

pub mod canonical_json;

pub use canonical_json::to_canonical_json;

/// Hashea un string (blake3) y devuelve hex.
pub fn hash_str(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}
