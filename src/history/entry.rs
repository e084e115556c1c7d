//! A single clipboard history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Clipboard content captured from the system pasteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payload {
    Text { text: String },
    Image {
        #[serde(with = "base64_bytes")]
        png: Vec<u8>,
    },
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(png: Vec<u8>) -> Self {
        Self::Image { png }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    /// SHA-256 hex digest of the content, used for dedup.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            Self::Text { text } => {
                hasher.update(b"text:");
                hasher.update(text.as_bytes());
            }
            Self::Image { png } => {
                hasher.update(b"image:");
                hasher.update(png);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Serde helper storing image bytes as standard base64.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(&encoded).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub payload: Payload,
    /// Lowercased text for case-insensitive search. Empty for images.
    pub normalized: String,
    /// Capture time, refreshed when the entry is copied or re-detected.
    pub touched_at: DateTime<Utc>,
    pub favorite: bool,
    /// Position among favorites. `None` for non-favorites.
    pub favorite_rank: Option<u32>,
}

impl Entry {
    pub fn new(payload: Payload) -> Self {
        let normalized = payload
            .as_text()
            .map(|t| t.to_lowercase())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            payload,
            normalized,
            touched_at: Utc::now(),
            favorite: false,
            favorite_rank: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.payload.as_text()
    }

    pub fn fingerprint(&self) -> String {
        self.payload.fingerprint()
    }
}
