pub mod cancel;
pub mod error;
pub mod header;
pub mod input;
pub mod log;
pub mod opening;
pub mod reader;
pub mod scan;
pub mod tokenizer;
pub mod types;
pub mod writer;

pub use cancel::CancellationToken;
pub use error::{ErrorAccumulator, PgnError};
pub use input::{CompressionMode, PgnInput, expand_paths, open_input};
pub use opening::{OpeningTrie, TrieCache, classify_record, opening_trie_for};
pub use reader::{PgnReader, ReaderOptions, RecordOutcome, read_games};
pub use tokenizer::{MoveList, MoveTokens, move_list, normalize_movetext, tokenize};
pub use types::{GameRecord, OpeningClassification};
pub use writer::{PgnWriter, WriterOptions, write_games};
