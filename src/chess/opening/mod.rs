pub mod cache;
pub mod classify;
pub mod trie;

pub use cache::{OPENING_CACHE, TrieCache, load_trie, opening_trie_for};
pub use classify::{Classified, classify_record, classify_records};
pub use trie::{OpeningMatch, OpeningTrie};
