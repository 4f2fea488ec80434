//! Flat word vocabulary and the shared vocabulary contract.
//!
//! Every vocabulary kind in this crate (plain word-level and BPE) presents
//! the same `lookup` / `rlookup` / `segment` surface; the vectorizer never
//! needs to know which one it was handed.

use std::collections::HashMap;

use crate::TokenId;

/// Padding id. Always present, never reassigned.
pub const PAD: TokenId = 0;
/// Beginning-of-sequence id.
pub const GO: TokenId = 1;
/// End-of-sequence id.
pub const EOS: TokenId = 2;
/// Unknown-piece id.
pub const UNK: TokenId = 3;

/// Canonical reverse spellings for the four reserved ids, in construction
/// order. Lowercase to match the conventional `transform = str.lower` used
/// by every caller in practice: `lookup` re-normalizes its argument before
/// matching, so a caller passing the uppercase `"<GO>"` sentinel through a
/// lowercasing transform must find it registered here in lowercase. See
/// DESIGN.md for the reasoning behind this choice.
const RESERVED: [&str; 4] = ["<pad>", "<go>", "<eos>", "<unk>"];

/// A normalization callable: `piece -> normalized piece`. Must be
/// deterministic and side-effect-free (§5): it is invoked on the calling
/// thread and its output becomes a cache key.
pub type Transform = dyn Fn(&str) -> String + Send + Sync;

/// The capability every vocabulary exposes to a vectorizer.
pub trait Vocab {
    /// Normalize `piece` (if `normalize` is given) and return its id, or
    /// `UNK` if absent. Never fails.
    fn lookup(&self, piece: &str, normalize: Option<&Transform>) -> TokenId;

    /// Reverse-lookup `id`. Empty string if out of range.
    fn rlookup(&self, id: TokenId) -> String;

    /// Segment one input word into pieces. For a flat word vocabulary this
    /// is the identity (one token in, one piece out); for BPE it performs
    /// subword segmentation.
    fn segment(&self, word: &str) -> Vec<String>;

    /// Total number of entries, including the four reserved ids.
    fn size(&self) -> usize;
}

/// Flat string-to-id mapping with reserved PAD/GO/EOS/UNK slots.
///
/// Ids form a dense prefix `[0, size())`; every id has exactly one reverse
/// mapping. Immutable after construction.
pub struct WordVocab {
    pieces: Vec<String>,
    ids: HashMap<String, TokenId>,
}

impl WordVocab {
    /// Build from an ordered list of pieces. Ids are assigned 4.. in the
    /// given order; duplicates collapse to their first occurrence.
    pub fn from_list<I, S>(pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::with_reserved();
        for piece in pieces {
            let piece = piece.into();
            if !vocab.ids.contains_key(&piece) {
                vocab.push(piece);
            }
        }
        vocab
    }

    /// Build from a piece-to-count mapping. Pieces are inserted in
    /// descending count order; ties are broken by ascending piece string,
    /// so construction is deterministic regardless of map iteration order.
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, u64)> =
            counts.into_iter().map(|(s, c)| (s.into(), c)).collect();
        entries.sort_by(|(a_piece, a_count), (b_piece, b_count)| {
            b_count.cmp(a_count).then_with(|| a_piece.cmp(b_piece))
        });

        let mut vocab = Self::with_reserved();
        for (piece, _count) in entries {
            if !vocab.ids.contains_key(&piece) {
                vocab.push(piece);
            }
        }
        vocab
    }

    /// Reconstruct a vocabulary from an already-dense piece list (index =
    /// id), as read back from a compiled snapshot. The caller guarantees
    /// `pieces[0..4]` are the reserved spellings.
    pub(crate) fn from_dense_pieces(pieces: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(pieces.len());
        for (id, piece) in pieces.iter().enumerate() {
            ids.insert(piece.clone(), id as TokenId);
        }
        Self { pieces, ids }
    }

    fn with_reserved() -> Self {
        let pieces: Vec<String> = RESERVED.iter().map(|s| (*s).to_string()).collect();
        let mut ids = HashMap::new();
        for (id, piece) in pieces.iter().enumerate() {
            ids.insert(piece.clone(), id as TokenId);
        }
        Self { pieces, ids }
    }

    fn push(&mut self, piece: String) {
        let id = self.pieces.len() as TokenId;
        self.ids.insert(piece.clone(), id);
        self.pieces.push(piece);
    }

    /// Dense list of all pieces, index = id. Used by the BPE snapshot writer.
    pub(crate) fn pieces(&self) -> &[String] {
        &self.pieces
    }
}

impl Vocab for WordVocab {
    fn lookup(&self, piece: &str, normalize: Option<&Transform>) -> TokenId {
        let normalized;
        let key: &str = match normalize {
            Some(f) => {
                normalized = f(piece);
                &normalized
            }
            None => piece,
        };
        self.ids.get(key).copied().unwrap_or(UNK)
    }

    fn rlookup(&self, id: TokenId) -> String {
        self.pieces.get(id as usize).cloned().unwrap_or_default()
    }

    fn segment(&self, word: &str) -> Vec<String> {
        vec![word.to_string()]
    }

    fn size(&self) -> usize {
        self.pieces.len()
    }
}
