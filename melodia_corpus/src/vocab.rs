// Symbol <-> id vocabulary.
//
// Ids are dense in [0, len) and assigned by sorting the distinct symbols
// lexicographically, so the mapping depends only on which symbols occur,
// not on corpus order or file enumeration order.
//
// The trained network's output width is `len()`. A consumer decoding model
// outputs needs the identical vocabulary, so it is persisted next to the
// checkpoints (see store.rs).

use crate::error::{CorpusError, Result};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct Vocabulary {
    symbols: Vec<Symbol>,
    ids: HashMap<Symbol, usize>,
}

impl Vocabulary {
    /// Build from a corpus. An empty corpus has no vocabulary.
    pub fn build(corpus: &[Symbol]) -> Result<Vocabulary> {
        if corpus.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }
        let distinct: BTreeSet<&Symbol> = corpus.iter().collect();
        Ok(Vocabulary::from(distinct.into_iter().cloned().collect::<Vec<_>>()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Sorted distinct symbols; a symbol's index is its id.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn id(&self, symbol: &Symbol) -> Option<usize> {
        self.ids.get(symbol).copied()
    }

    pub fn symbol(&self, id: usize) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Map every corpus symbol to its id.
    pub fn encode(&self, corpus: &[Symbol]) -> Result<Vec<usize>> {
        corpus
            .iter()
            .map(|s| {
                self.id(s)
                    .ok_or_else(|| CorpusError::UnknownSymbol(s.to_string()))
            })
            .collect()
    }

    pub fn decode(&self, ids: &[usize]) -> Option<Vec<Symbol>> {
        ids.iter().map(|&id| self.symbol(id).cloned()).collect()
    }
}

impl From<Vec<Symbol>> for Vocabulary {
    /// Sorts and deduplicates, so any symbol list yields a valid vocabulary.
    fn from(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort();
        symbols.dedup();
        let ids = symbols
            .iter()
            .enumerate()
            .map(|(id, s)| (s.clone(), id))
            .collect();
        Vocabulary { symbols, ids }
    }
}

impl From<Vocabulary> for Vec<Symbol> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.symbols
    }
}
