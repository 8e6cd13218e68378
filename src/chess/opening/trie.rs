use std::collections::HashMap;

use crate::chess::error::PgnError;
use crate::chess::tokenizer::tokenize;
use crate::chess::types::{GameRecord, OpeningClassification};

const ROOT: usize = 0;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, usize>,
    data: Option<OpeningClassification>,
}

/// Deepest classified node reached by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningMatch<'a> {
    pub classification: &'a OpeningClassification,
    /// Number of plies matched to reach the node.
    pub depth: usize,
}

/// Move-sequence trie over normalized SAN tokens. Nodes live in an arena and
/// refer to their children by index; the root is index 0.
#[derive(Debug)]
pub struct OpeningTrie {
    nodes: Vec<TrieNode>,
    classified_nodes: usize,
    games_indexed: usize,
}

impl Default for OpeningTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            classified_nodes: 0,
            games_indexed: 0,
        }
    }

    /// Builds a trie from a stream of reference records. The first fatal error
    /// aborts the build.
    pub fn build<I>(records: I) -> Result<Self, PgnError>
    where
        I: IntoIterator<Item = Result<GameRecord, PgnError>>,
    {
        let mut trie = Self::new();
        for record in records {
            trie.insert_game(&record?);
        }
        Ok(trie)
    }

    /// Indexes one reference game. Returns false when its movetext has no
    /// move tokens, in which case the trie is unchanged.
    pub fn insert_game(&mut self, game: &GameRecord) -> bool {
        self.insert(tokenize(&game.movetext), &game.classification())
    }

    pub fn insert<'a, I>(&mut self, tokens: I, classification: &OpeningClassification) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = ROOT;
        let mut depth = 0;

        for token in tokens {
            current = match self.nodes[current].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(token.to_string(), child);
                    child
                }
            };
            depth += 1;
        }

        if depth == 0 {
            return false;
        }

        self.games_indexed += 1;
        if classification.has_data() {
            let node = &mut self.nodes[current];
            match &mut node.data {
                Some(existing) => existing.merge_from(classification),
                None => {
                    node.data = Some(classification.clone());
                    self.classified_nodes += 1;
                }
            }
        }
        true
    }

    pub fn find(&self, movetext: &str) -> Option<&OpeningClassification> {
        self.find_match(tokenize(movetext))
            .map(|found| found.classification)
    }

    /// Walks exact token matches from the root and returns the deepest visited
    /// node that carries classification data.
    pub fn find_match<'a, I>(&self, tokens: I) -> Option<OpeningMatch<'_>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = ROOT;
        let mut best = None;

        for (ply, token) in tokens.into_iter().enumerate() {
            let Some(&child) = self.nodes[current].children.get(token) else {
                break;
            };
            current = child;
            if let Some(classification) = &self.nodes[current].data {
                best = Some(OpeningMatch {
                    classification,
                    depth: ply + 1,
                });
            }
        }

        best
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn classified_nodes(&self) -> usize {
        self.classified_nodes
    }

    pub fn games_indexed(&self) -> usize {
        self.games_indexed
    }

    /// True when no lookup can ever succeed.
    pub fn is_empty(&self) -> bool {
        self.classified_nodes == 0
    }
}
