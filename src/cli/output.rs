use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::chess::error::PgnError;

/// Output that only replaces its target once [`AtomicOutput::commit`] runs.
///
/// Everything is written to a temporary file next to the target; dropping the
/// value without committing removes the temporary and leaves the target alone.
pub struct AtomicOutput {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicOutput {
    pub fn create(target: &Path) -> Result<Self, PgnError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| PgnError::Open {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let temp = tempfile::Builder::new()
            .prefix(".pgn-eco-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|source| PgnError::Open {
                path: dir.to_path_buf(),
                source,
            })?;
        debug!(temp = %temp.path().display(), target = %target.display(), "Writing to temporary file");

        Ok(Self {
            target: target.to_path_buf(),
            writer: BufWriter::new(temp),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flushes, syncs and moves the temporary file over the target, returning
    /// the path that now holds the output.
    pub fn commit(self) -> Result<PathBuf, PgnError> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| PgnError::Io(e.into_error()))?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target)
            .map_err(|e| PgnError::Persist {
                path: self.target.clone(),
                source: e.error,
            })?;
        Ok(self.target)
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
