//! Streaming PGN records, move tokens and ECO opening classification.

pub mod chess;
pub mod cli;

pub use chess::{
    CancellationToken, GameRecord, OpeningClassification, OpeningTrie, PgnError, PgnReader,
    PgnWriter, ReaderOptions, WriterOptions,
};
