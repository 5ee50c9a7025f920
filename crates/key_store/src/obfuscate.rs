//! Reversible obfuscation for keys at rest.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub fn obfuscate(key: &str) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decode a stored key. Returns `None` when the stored value is not
/// valid base64 or not UTF-8, e.g. a hand-edited snapshot file.
pub fn deobfuscate(stored: &str) -> Option<String> {
    let bytes = STANDARD.decode(stored).ok()?;
    String::from_utf8(bytes).ok()
}
