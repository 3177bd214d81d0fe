use sha2::{Digest, Sha256};

/// Derives the dedup key for a signal. Identity is (pair, entry) only, so
/// two signals differing solely in SL/TP/leverage collide on purpose.
pub fn dedup_key(pair: &str, entry: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}", pair, entry).as_bytes());
    hex::encode(hasher.finalize())
}
