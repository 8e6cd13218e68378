//! Command-line surface of the `pgn-eco` binary.

mod commands;
mod input;
mod output;
mod progress;

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::chess::cancel::CancellationToken;
use crate::chess::error::PgnError;
use crate::chess::input::CompressionMode;
use crate::chess::reader::{DEFAULT_MAX_LINE_LEN, ReaderOptions};
use crate::chess::writer::{DEFAULT_WRAP_WIDTH, WriterOptions};

pub use input::InputGames;
pub use output::AtomicOutput;
pub use progress::ProgressMeter;

/// Options shared by every command that reads PGN.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input PGN files or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Decompression to apply to every input (`zstd`). By default files ending
    /// in `.zst` are decompressed and everything else is read as plain text.
    #[arg(long, value_name = "MODE")]
    pub compression: Option<String>,

    /// Reject input lines longer than this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line_len: usize,
}

impl InputArgs {
    pub fn compression(&self) -> Result<Option<CompressionMode>, PgnError> {
        self.compression
            .as_deref()
            .map(CompressionMode::parse)
            .transpose()
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions::default().with_max_line_len(self.max_line_len)
    }
}

/// Options for commands that write PGN.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output PGN file, replaced atomically once every input was processed
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Wrap movetext at this many characters (0 disables wrapping)
    #[arg(long, value_name = "COLUMNS", default_value_t = DEFAULT_WRAP_WIDTH)]
    pub wrap_width: usize,
}

impl OutputArgs {
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            wrap_width: self.wrap_width,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag every game with the ECO code, opening and variation of its deepest
    /// match in a reference collection
    Classify {
        /// Reference PGN whose games carry ECO/Opening/Variation headers
        #[arg(long, value_name = "FILE")]
        reference: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse and re-serialize games in canonical layout
    Reformat {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the mainline move tokens of each game as JSON lines
    Tokens {
        #[command(flatten)]
        input: InputArgs,

        /// Print numbered movetext (`1. e4 e5`) instead of a token array
        #[arg(long)]
        numbered: bool,
    },

    /// Print the headers of each game as JSON lines, skipping movetext
    Headers {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Commands {
    pub fn execute(self, cancel: &CancellationToken) -> Result<(), PgnError> {
        match self {
            Commands::Classify {
                reference,
                input,
                output,
            } => commands::classify(&reference, &input, &output, cancel),
            Commands::Reformat { input, output } => commands::reformat(&input, &output, cancel),
            Commands::Tokens { input, numbered } => commands::tokens(&input, numbered, cancel),
            Commands::Headers { input } => commands::headers(&input, cancel),
        }
    }
}
