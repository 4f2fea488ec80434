//! # vecxx
//!
//! Converts whitespace-separated token streams into dense integer id
//! sequences, and back, using either a flat word vocabulary or a BPE
//! subword vocabulary behind the same [`vocab::Vocab`] contract.
//!
//! ## Example
//!
//! ```no_run
//! use vecxx::vocab::WordVocab;
//! use vecxx::vectorizer::VocabVectorizer;
//!
//! let vocab = WordVocab::from_list(vec!["hello", "world"]);
//! let vectorizer = VocabVectorizer::new(vocab);
//! let (ids, _length) = vectorizer.convert_to_ids(vec!["hello", "world"], None);
//! let text = vectorizer.decode(&ids);
//! # let _ = text;
//! ```
//!
//! ## Modules
//!
//! - [`vocab`] - the flat word vocabulary and the shared `Vocab` trait
//! - [`merges`] - the ordered BPE merge table
//! - [`segment`] - the BPE greedy merge algorithm
//! - [`cache`] - thread-safety modes for memoized segmentation
//! - [`bpe_vocab`] - `BPEVocab`, composing the above, plus the compiled snapshot format
//! - [`vectorizer`] - the public pipeline: pieces, ids, batches, decoding
//! - [`invariants`] - debug-only consistency assertions

pub mod bpe_vocab;
pub mod cache;
pub mod invariants;
pub mod merges;
pub mod segment;
pub mod vectorizer;
pub mod vocab;

pub use bpe_vocab::BPEVocab;
pub use vectorizer::{VocabMapVectorizer, VocabVectorizer};
pub use vocab::{Vocab, WordVocab};

/// Token id type. `u32` comfortably covers any vocabulary this crate is
/// meant to serve; ids are never negative and never exceed a few hundred
/// thousand in practice.
pub type TokenId = u32;

/// Failure modes, all of which occur only at construction time. Per-call
/// segmentation and vectorization operations are infallible by design
/// (unknown pieces map to `UNK` rather than failing).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open vocab file {path}: {source}")]
    VocabOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open codes file {path}: {source}")]
    CodesOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid compiled snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
