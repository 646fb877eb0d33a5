//! Byte image of a diff chain.
//!
//! Layout:
//!
//! ```text
//! magic "SDC\0" | version u8 | body length u64 LE | body | crc32 u32 LE
//! ```
//!
//! The body is MessagePack: the chain's size limit followed by its diffs,
//! oldest first. Writing the bytes anywhere is the caller's business.

use crate::diff::{ChainConfig, DiffChain, DiffNode};
use crate::error::{DiffError, Result};
use crate::state::SnapshotState;
use crate::types::SnapshotId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic bytes for chain images.
const IMAGE_MAGIC: &[u8; 4] = b"SDC\0";

/// Current image format version.
const IMAGE_VERSION: u8 = 1;

const HEADER_LEN: usize = IMAGE_MAGIC.len() + 1 + 8;

#[derive(Serialize, Deserialize)]
struct DiffRecord<T> {
    snapshot: SnapshotId,
    captured: Option<T>,
}

#[derive(Serialize, Deserialize)]
struct ImageBody<T> {
    max_len: u64,
    diffs: Vec<DiffRecord<T>>,
}

/// Encode a chain.
pub fn encode<S>(chain: &DiffChain<S>) -> Result<Vec<u8>>
where
    S: SnapshotState + Serialize,
{
    let body = ImageBody {
        max_len: chain.config().max_len as u64,
        diffs: chain
            .iter()
            .map(|node| DiffRecord {
                snapshot: node.snapshot(),
                captured: node.captured(),
            })
            .collect(),
    };
    let encoded = rmp_serde::to_vec(&body)?;

    let mut out = Vec::with_capacity(HEADER_LEN + encoded.len() + 4);
    out.extend_from_slice(IMAGE_MAGIC);
    out.push(IMAGE_VERSION);
    out.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
    out.extend_from_slice(&encoded);
    out.extend_from_slice(&crc32fast::hash(&encoded).to_le_bytes());

    tracing::debug!(diffs = chain.len(), bytes = out.len(), "encoded chain image");
    Ok(out)
}

/// Decode a chain.
///
/// Diffs are re-appended one by one, so an image whose snapshots are out of
/// order is rejected rather than producing an unordered chain.
pub fn decode<S>(bytes: &[u8]) -> Result<DiffChain<S>>
where
    S: SnapshotState + DeserializeOwned,
{
    if bytes.len() < HEADER_LEN {
        return Err(DiffError::InvalidFormat("Image too short".into()));
    }

    let (magic, rest) = bytes.split_at(IMAGE_MAGIC.len());
    if magic != IMAGE_MAGIC {
        return Err(DiffError::InvalidFormat("Invalid image magic".into()));
    }

    let (version, rest) = rest.split_at(1);
    if version[0] != IMAGE_VERSION {
        return Err(DiffError::InvalidFormat(format!(
            "Unsupported image version: {}",
            version[0]
        )));
    }

    let (len_bytes, rest) = rest.split_at(8);
    let mut len_buf = [0u8; 8];
    len_buf.copy_from_slice(len_bytes);
    let len = u64::from_le_bytes(len_buf) as usize;

    if rest.len() != len.saturating_add(4) {
        return Err(DiffError::InvalidFormat(format!(
            "Body length {} does not match image size",
            len
        )));
    }
    let (encoded, checksum_bytes) = rest.split_at(len);

    let mut checksum_buf = [0u8; 4];
    checksum_buf.copy_from_slice(checksum_bytes);
    let stored = u32::from_le_bytes(checksum_buf);
    let computed = crc32fast::hash(encoded);
    if stored != computed {
        return Err(DiffError::ChecksumMismatch {
            expected: stored,
            got: computed,
        });
    }

    let body: ImageBody<S> = rmp_serde::from_slice(encoded)?;
    let mut chain = DiffChain::with_config(ChainConfig {
        max_len: body.max_len as usize,
    });
    for record in body.diffs {
        chain.push(DiffNode::try_new(Some(record.snapshot), record.captured)?)?;
    }

    tracing::debug!(diffs = chain.len(), "decoded chain image");
    Ok(chain)
}
