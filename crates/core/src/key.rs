//! Content-unit decryption keys.

use std::fmt;

/// Raw decryption key bytes for a content unit.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptionKey(Vec<u8>);

impl DecryptionKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse from a hex string (either case).
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        hex::decode(s.trim())
            .map(Self)
            .map_err(|e| crate::Error::InvalidKey(e.to_string()))
    }

    /// Encode as lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecryptionKey")
            .field(&"<redacted>")
            .finish()
    }
}
