use std::path::PathBuf;
use std::vec;

use tracing::{debug, warn};

use super::InputArgs;
use crate::chess::cancel::CancellationToken;
use crate::chess::error::PgnError;
use crate::chess::input::{CompressionMode, PgnInput, expand_paths};
use crate::chess::reader::{PgnReader, ReaderOptions};
use crate::chess::types::GameRecord;

/// Games from several input files, read one file after the other in the order
/// the patterns were given. Stops at the first fatal error.
pub struct InputGames {
    paths: vec::IntoIter<PathBuf>,
    compression: Option<CompressionMode>,
    options: ReaderOptions,
    cancel: CancellationToken,
    current: Option<(PathBuf, PgnReader<PgnInput>)>,
    failed: bool,
}

impl InputGames {
    pub fn new(
        paths: Vec<PathBuf>,
        compression: Option<CompressionMode>,
        options: ReaderOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            paths: paths.into_iter(),
            compression,
            options,
            cancel,
            current: None,
            failed: false,
        }
    }

    pub fn from_args(
        args: &InputArgs,
        options: ReaderOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, PgnError> {
        let compression = args.compression()?;

        let mut paths = Vec::new();
        for pattern in &args.inputs {
            let matched = expand_paths(pattern)?;
            if matched.is_empty() {
                warn!(pattern = %pattern, "No input files match pattern");
            }
            paths.extend(matched);
        }

        Ok(Self::new(paths, compression, options, cancel.clone()))
    }

    fn open_next(&mut self) -> Option<Result<(), PgnError>> {
        let path = self.paths.next()?;
        let compression = CompressionMode::resolve(self.compression, &path);
        let opened = PgnReader::from_path(
            &path,
            compression,
            self.options.clone(),
            self.cancel.clone(),
        )
        .map(|reader| {
            self.current = Some((path, reader));
        });
        Some(opened)
    }
}

impl Iterator for InputGames {
    type Item = Result<GameRecord, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            if let Some((path, reader)) = self.current.as_mut() {
                match reader.next() {
                    Some(Ok(game)) => return Some(Ok(game)),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => {
                        debug!(
                            path = %path.display(),
                            games = reader.games_read(),
                            "Finished input"
                        );
                        self.current = None;
                    }
                }
            }

            if let Err(e) = self.open_next()? {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}
