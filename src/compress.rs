use std::io::Read;

use flate2::bufread::DeflateDecoder;
use flate2::bufread::DeflateEncoder;
use flate2::Compression;

use crate::{ColfileError, Result};

/// Block compression settings, fixed for the lifetime of one file.
///
/// Column blocks smaller than `threshold` are stored uncompressed; Deflate
/// rarely pays for itself below a couple hundred bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressConfig {
    pub(crate) threshold: usize,
    pub(crate) compression: Compression,
}

const DEFAULT_COMPRESS_THRESHOLD: usize = 256;

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPRESS_THRESHOLD,
            compression: Compression::default(),
        }
    }
}

impl CompressConfig {
    pub fn from_level(threshold: usize, level: u32) -> Self {
        Self {
            threshold,
            compression: Compression::new(level),
        }
    }

    /// Store every block raw. Useful for data that is already dense.
    pub fn none() -> Self {
        Self {
            threshold: usize::MAX,
            compression: Compression::none(),
        }
    }
}

pub(crate) fn compress(input: &[u8], cfg: &CompressConfig) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut encoder = DeflateEncoder::new(input, cfg.compression);
    encoder.read_to_end(&mut output)?;
    Ok(output)
}

pub(crate) fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut decoder = DeflateDecoder::new(input);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| ColfileError::CorruptData(format!("deflate stream: {e}")))?;
    Ok(output)
}
