use sha2::{Digest, Sha256};

/// Characters of page text used for an empty title.
pub const TITLE_LEN: usize = 35;
/// Characters of page text used for an empty description.
pub const DESCRIPTION_LEN: usize = 160;

/// Normalize extracted page text: strip line breaks, trim surrounding
/// whitespace. Idempotent.
pub fn normalize(text: &str) -> String {
    text.replace(['\n', '\r'], "").trim().to_string()
}

/// Hex SHA-256 of the text, the cross-URL content dedup key.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First `limit` characters of the text, safe on any char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Decode a response body as UTF-8, dropping invalid sequences.
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
