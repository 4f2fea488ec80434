//! BPE segmentation: greedy lowest-rank merge of one input word into pieces.
//!
//! This is the algorithmic heart of the crate. Each round finds the
//! globally lowest-ranked adjacent pair in the current symbol sequence and
//! merges every non-overlapping occurrence of it, then repeats until no
//! learned merge applies. This mirrors the classic BPE-apply algorithm
//! (merge-everywhere-per-round), not a single-merge-then-requeue scheme: a
//! tied-lowest-rank pair that occurs twice in one word is merged at both
//! sites in the same round.

use crate::merges::MergeTable;

const END_OF_WORD: &str = "</w>";
const CONTINUATION: &str = "@@";

/// Segment `word` into BPE pieces per the greedy merge loop described in
/// the module docs. Never fails: an unknown word always yields at least
/// one piece.
pub fn segment_word(word: &str, merges: &MergeTable) -> Vec<String> {
    if word.chars().count() <= 1 {
        return vec![word.to_string()];
    }

    let symbols = initial_symbols(word);
    let merged = apply_merges(symbols, merges);
    emit_pieces(merged)
}

fn initial_symbols(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let last = chars.len() - 1;
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == last {
                format!("{c}{END_OF_WORD}")
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn apply_merges(mut symbols: Vec<String>, merges: &MergeTable) -> Vec<String> {
    loop {
        if symbols.len() <= 1 {
            return symbols;
        }

        let mut best: Option<(usize, usize)> = None; // (rank, index)
        for i in 0..symbols.len() - 1 {
            if let Some(rank) = merges.rank(&symbols[i], &symbols[i + 1]) {
                let better = match best {
                    Some((best_rank, _)) => rank < best_rank,
                    None => true,
                };
                if better {
                    best = Some((rank, i));
                }
            }
        }

        let Some((_, index)) = best else {
            return symbols;
        };

        let left = symbols[index].clone();
        let right = symbols[index + 1].clone();
        symbols = merge_all_occurrences(&symbols, &left, &right);
    }
}

/// Merge every non-overlapping `(left, right)` adjacency in `symbols`,
/// scanning left to right and advancing past each merged position so an
/// overlapping second candidate (e.g. `a a a` merging `a a`) isn't
/// double-counted.
fn merge_all_occurrences(symbols: &[String], left: &str, right: &str) -> Vec<String> {
    let mut merged = Vec::with_capacity(symbols.len());
    let mut i = 0;
    while i < symbols.len() {
        if i + 1 < symbols.len() && symbols[i] == left && symbols[i + 1] == right {
            merged.push(format!("{left}{right}"));
            i += 2;
        } else {
            merged.push(symbols[i].clone());
            i += 1;
        }
    }
    merged
}

fn emit_pieces(symbols: Vec<String>) -> Vec<String> {
    let last = symbols.len().saturating_sub(1);
    symbols
        .into_iter()
        .enumerate()
        .map(|(i, symbol)| {
            let stripped = symbol.strip_suffix(END_OF_WORD).unwrap_or(&symbol);
            if i == last {
                stripped.to_string()
            } else {
                format!("{stripped}{CONTINUATION}")
            }
        })
        .collect()
}
