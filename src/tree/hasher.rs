//! Hash computation for content blobs

use crate::types::ContentRef;

/// Content address of `bytes`.
pub fn content_ref(bytes: &[u8]) -> ContentRef {
    ContentRef(*blake3::hash(bytes).as_bytes())
}
