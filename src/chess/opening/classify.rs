use super::trie::OpeningTrie;
use crate::chess::error::PgnError;
use crate::chess::types::GameRecord;

/// Writes the deepest matching classification into the game's `ECO`,
/// `Opening` and `Variation` headers. Fields the match lacks leave existing
/// headers untouched. Returns whether any header was set.
pub fn classify_record(trie: &OpeningTrie, game: &mut GameRecord) -> bool {
    match trie.find(&game.movetext) {
        Some(classification) => game.apply_classification(classification),
        None => false,
    }
}

/// Stream adapter that classifies each record as it passes through.
pub struct Classified<'t, I> {
    trie: &'t OpeningTrie,
    records: I,
    seen: u64,
    classified: u64,
}

pub fn classify_records<I>(trie: &OpeningTrie, records: I) -> Classified<'_, I::IntoIter>
where
    I: IntoIterator<Item = Result<GameRecord, PgnError>>,
{
    Classified {
        trie,
        records: records.into_iter(),
        seen: 0,
        classified: 0,
    }
}

impl<I> Classified<'_, I> {
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn classified(&self) -> u64 {
        self.classified
    }
}

impl<I> Iterator for Classified<'_, I>
where
    I: Iterator<Item = Result<GameRecord, PgnError>>,
{
    type Item = Result<GameRecord, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut game = match self.records.next()? {
            Ok(game) => game,
            Err(e) => return Some(Err(e)),
        };

        self.seen += 1;
        if classify_record(self.trie, &mut game) {
            self.classified += 1;
        }
        Some(Ok(game))
    }
}
