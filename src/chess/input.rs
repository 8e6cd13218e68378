use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;
use zstd::stream::read::Decoder as ZstdDecoder;

use super::error::PgnError;

/// A buffered, possibly decompressing, input stream.
pub type PgnInput = Box<dyn BufRead + Send>;

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, PgnError> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") || normalized.eq_ignore_ascii_case("zst") {
            Ok(Self::Zstd)
        } else {
            Err(PgnError::InvalidCompression(normalized.to_string()))
        }
    }

    /// Chooses zstd for `.zst` files, plain otherwise.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }

    /// An explicit setting wins over the file extension.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Self {
        explicit.unwrap_or_else(|| Self::detect(path))
    }
}

pub fn open_input(path: &Path, compression: CompressionMode) -> Result<PgnInput, PgnError> {
    let file = File::open(path).map_err(|source| PgnError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), ?compression, "opened input");

    match compression {
        CompressionMode::Plain => Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)) as PgnInput)
            .map_err(|source| PgnError::Open {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Expands a glob pattern (`*`, `?` or `[`) into the matching paths in sorted
/// order. Anything else is taken as a single literal path.
pub fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, PgnError> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut paths: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();
    Ok(paths)
}
