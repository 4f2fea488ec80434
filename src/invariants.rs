//! Runtime invariant assertions for vectorizer correctness.
//!
//! These are debug-mode checks that help catch bugs during development
//! without imposing any cost on release builds, where every function here
//! compiles to a no-op.
//!
//! ```ignore
//! use vecxx::invariants;
//!
//! invariants::assert_tokens_in_bounds(&ids, vocab.size());
//! invariants::assert_bpe_continuation_suffixes(&pieces);
//! ```

use crate::TokenId;

/// Asserts that every id in `tokens` is within `[0, vocab_size)`.
///
/// # Panics
///
/// Panics in debug builds if any id `>= vocab_size`.
#[inline]
pub fn assert_tokens_in_bounds(tokens: &[TokenId], vocab_size: usize) {
    #[cfg(debug_assertions)]
    {
        for (i, &token) in tokens.iter().enumerate() {
            debug_assert!(
                (token as usize) < vocab_size,
                "invariant violation: token[{i}] = {token} >= vocab_size ({vocab_size})"
            );
        }
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (tokens, vocab_size);
    }
}

/// Asserts that a single id is within `[0, vocab_size)`.
#[inline]
pub fn assert_valid_token(token: TokenId, vocab_size: usize) {
    #[cfg(debug_assertions)]
    {
        debug_assert!(
            (token as usize) < vocab_size,
            "invariant violation: token {token} >= vocab_size ({vocab_size})"
        );
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (token, vocab_size);
    }
}

/// Asserts the BPE emission discipline (§8 invariant 5): every piece but
/// the last in `pieces` ends in the continuation suffix `@@`, and the last
/// does not.
#[inline]
pub fn assert_bpe_continuation_suffixes(pieces: &[String]) {
    #[cfg(debug_assertions)]
    {
        if pieces.len() <= 1 {
            if let Some(piece) = pieces.first() {
                debug_assert!(
                    !piece.ends_with("@@"),
                    "invariant violation: single-piece word still carries a continuation suffix"
                );
            }
            return;
        }

        let last = pieces.len() - 1;
        for (i, piece) in pieces.iter().enumerate() {
            if i == last {
                debug_assert!(
                    !piece.ends_with("@@"),
                    "invariant violation: final piece '{piece}' carries a continuation suffix"
                );
            } else {
                debug_assert!(
                    piece.ends_with("@@"),
                    "invariant violation: non-final piece '{piece}' is missing its continuation suffix"
                );
            }
        }
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = pieces;
    }
}

/// Asserts the padding/truncation contract (§8 invariants 1-2): `ids.len()`
/// equals `mxlen`, `length` equals `min(natural_count, mxlen)`, and any
/// positions past `length` (when padding occurred) are `PAD`.
#[inline]
pub fn assert_padded_ids_consistent(ids: &[TokenId], length: usize, mxlen: usize) {
    #[cfg(debug_assertions)]
    {
        debug_assert_eq!(
            ids.len(),
            mxlen,
            "invariant violation: padded/truncated id count {} != mxlen {}",
            ids.len(),
            mxlen
        );
        debug_assert!(
            length <= mxlen,
            "invariant violation: reported length {length} exceeds mxlen {mxlen}"
        );
        if length < mxlen {
            for (i, &id) in ids.iter().enumerate().skip(length) {
                debug_assert_eq!(
                    id,
                    crate::vocab::PAD,
                    "invariant violation: id[{i}] = {id} is not PAD past the reported length"
                );
            }
        }
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (ids, length, mxlen);
    }
}
