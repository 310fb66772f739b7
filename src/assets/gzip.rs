//! Gzip encoding of asset bodies

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use hyper::body::Bytes;

use crate::config::AssetsConfig;

/// Compress `content`, keeping the result only if it is worth sending
///
/// Returns `None` when gzip is disabled, the asset is under the size
/// threshold, or the encoded body is not strictly smaller.
pub fn encode(content: &[u8], options: &AssetsConfig) -> std::io::Result<Option<Bytes>> {
    if !options.gzip || (content.len() as u64) < options.gzip_min_size {
        return Ok(None);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(options.gzip_level.min(9)));
    encoder.write_all(content)?;
    let encoded = encoder.finish()?;

    if encoded.len() < content.len() {
        Ok(Some(Bytes::from(encoded)))
    } else {
        Ok(None)
    }
}
