use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::hash::djb2;
use crate::error::EnvelopeError;

/// Tag identifying an envelope as a send operation.
pub const ENVELOPE_KIND: &str = "send";

/// The unit sent over the wire: file content plus the metadata the receiver
/// needs to store and verify it. Fully materialized in memory before any
/// byte is transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub id: String,
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
    pub djb2_hash: String,
    pub filename: String,
}

impl Envelope {
    /// Assemble an envelope. The hash is computed here, once, over the exact
    /// content bytes; the sender never recomputes it.
    pub fn new(id: String, content: Vec<u8>, filename: String) -> Self {
        let djb2_hash = djb2(&content).to_string();
        Self {
            kind: ENVELOPE_KIND.to_string(),
            id,
            content,
            djb2_hash,
            filename,
        }
    }

    /// Serialize to the wire format: a MessagePack map with string keys.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Reply sent back by the receiver. Only the `id` field is examined; any
/// other keys in the map are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckReply {
    pub id: String,
}

impl AckReply {
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// What to do when the source file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingFilePolicy {
    /// Send an envelope with empty content, hash computed over zero bytes.
    #[default]
    SendEmpty,
    /// Fail the transfer before anything is sent.
    Fail,
}

/// Read the whole file into memory, applying the missing-file policy.
pub async fn load_content(
    path: &Path,
    policy: MissingFilePolicy,
) -> Result<Vec<u8>, EnvelopeError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if policy == MissingFilePolicy::SendEmpty => {
            warn!(
                "cannot read {}: {}; sending empty content",
                path.display(),
                err
            );
            Ok(Vec::new())
        }
        Err(source) => Err(EnvelopeError::FileRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load the file and assemble an envelope with a fresh session identifier.
/// The filename field carries the caller-supplied path string verbatim.
pub async fn build_envelope(
    path: &Path,
    policy: MissingFilePolicy,
) -> Result<Envelope, EnvelopeError> {
    let content = load_content(path, policy).await?;
    Ok(Envelope::new(
        Uuid::new_v4().to_string(),
        content,
        path.to_string_lossy().into_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_content() {
        let content = b"the quick brown fox".to_vec();
        let envelope = Envelope::new("id-1".to_string(), content.clone(), "fox.txt".to_string());
        assert_eq!(envelope.kind, ENVELOPE_KIND);
        assert_eq!(envelope.djb2_hash, djb2(&content).to_string());
    }

    #[test]
    fn empty_content_hash_is_seed() {
        let envelope = Envelope::new("id-2".to_string(), Vec::new(), "gone.bin".to_string());
        assert_eq!(envelope.djb2_hash, "5381");
    }
}
