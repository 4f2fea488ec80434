//! The public pipeline: pieces, ids, batches, decoding.
//!
//! Two adapter variants share one core: [`VocabVectorizer`] consumes plain
//! strings, [`VocabMapVectorizer`] consumes records and extracts configured
//! fields. Both drive the same `BEGIN -> BODY -> END` emission machine over
//! whichever [`Vocab`] they were built with.

use std::collections::HashMap;

use crate::vocab::{Transform, Vocab, EOS, GO, PAD};
use crate::TokenId;

/// Something a [`VocabMapVectorizer`] can pull a named string field out of.
/// Missing fields are treated as empty strings, never an error.
pub trait RecordLike {
    fn field(&self, name: &str) -> Option<&str>;
}

impl RecordLike for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Shared pipeline state, generic over the vocabulary kind. Immutable after
/// construction; both public vectorizers are thin wrappers around this.
struct Core<V: Vocab> {
    vocab: V,
    transform: Option<Box<Transform>>,
    emit_begin_tok: Vec<String>,
    emit_end_tok: Vec<String>,
    mxlen: Option<usize>,
}

impl<V: Vocab> Core<V> {
    fn new(vocab: V) -> Self {
        Self {
            vocab,
            transform: None,
            emit_begin_tok: Vec::new(),
            emit_end_tok: Vec::new(),
            mxlen: None,
        }
    }

    fn normalize(&self, token: &str) -> String {
        match &self.transform {
            Some(f) => f(token),
            None => token.to_string(),
        }
    }

    /// `BEGIN -> BODY -> END`: begin pieces once, one segmentation per
    /// input token in order, end pieces once. No truncation here.
    fn convert_to_pieces<I, S>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pieces = Vec::new();
        pieces.extend(self.emit_begin_tok.iter().cloned());

        for token in tokens {
            let normalized = self.normalize(token.as_ref());
            pieces.extend(self.vocab.segment(&normalized));
        }

        pieces.extend(self.emit_end_tok.iter().cloned());
        pieces
    }

    fn convert_to_ids<I, S>(&self, tokens: I, mxlen: Option<usize>) -> (Vec<TokenId>, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pieces = self.convert_to_pieces(tokens);
        let ids: Vec<TokenId> = pieces
            .iter()
            .map(|piece| self.vocab.lookup(piece, self.transform.as_deref()))
            .collect();

        let mxlen = mxlen.or(self.mxlen);
        match mxlen {
            None => {
                let length = ids.len();
                (ids, length)
            }
            Some(width) if ids.len() >= width => (ids[..width].to_vec(), width),
            Some(width) => {
                let length = ids.len();
                let mut padded = ids;
                padded.resize(width, PAD);
                (padded, length)
            }
        }
    }

    fn decode(&self, ids: &[TokenId]) -> String {
        let mut words = Vec::new();
        let mut current = String::new();

        for &id in ids {
            if id == PAD || id == GO || id == EOS {
                continue;
            }

            let piece = self.vocab.rlookup(id);
            match piece.strip_suffix("@@") {
                Some(stripped) => current.push_str(stripped),
                None => {
                    current.push_str(&piece);
                    words.push(std::mem::take(&mut current));
                }
            }
        }

        if !current.is_empty() {
            words.push(current);
        }

        words.join(" ")
    }
}

/// Vectorizer over plain string tokens.
pub struct VocabVectorizer<V: Vocab> {
    core: Core<V>,
}

impl<V: Vocab> VocabVectorizer<V> {
    pub fn new(vocab: V) -> Self {
        Self {
            core: Core::new(vocab),
        }
    }

    pub fn with_transform(mut self, transform: Box<Transform>) -> Self {
        self.core.transform = Some(transform);
        self
    }

    pub fn with_begin_tok<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core.emit_begin_tok = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_end_tok<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core.emit_end_tok = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mxlen(mut self, mxlen: usize) -> Self {
        self.core.mxlen = Some(mxlen);
        self
    }

    pub fn convert_to_pieces<I, S>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.core.convert_to_pieces(tokens)
    }

    pub fn convert_to_ids<I, S>(&self, tokens: I, mxlen: Option<usize>) -> (Vec<TokenId>, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.core.convert_to_ids(tokens, mxlen)
    }

    /// Vectorize every row of `batch` to the same `mxlen`, returning the
    /// flat concatenation of row ids and a per-row length vector.
    pub fn convert_to_ids_stack<I, J, S>(&self, batch: I, mxlen: usize) -> (Vec<TokenId>, Vec<usize>)
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flat_ids = Vec::new();
        let mut lengths = Vec::new();
        for row in batch {
            let (ids, length) = self.core.convert_to_ids(row, Some(mxlen));
            flat_ids.extend(ids);
            lengths.push(length);
        }
        (flat_ids, lengths)
    }

    pub fn decode(&self, ids: &[TokenId]) -> String {
        self.core.decode(ids)
    }
}

/// Vectorizer over record tokens: each token contributes the configured
/// `fields`, extracted and joined with single spaces, before being fed
/// through the same pipeline as [`VocabVectorizer`].
pub struct VocabMapVectorizer<V: Vocab> {
    core: Core<V>,
    fields: Vec<String>,
}

impl<V: Vocab> VocabMapVectorizer<V> {
    pub fn new(vocab: V) -> Self {
        Self {
            core: Core::new(vocab),
            fields: vec!["text".to_string()],
        }
    }

    pub fn with_transform(mut self, transform: Box<Transform>) -> Self {
        self.core.transform = Some(transform);
        self
    }

    pub fn with_begin_tok<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core.emit_begin_tok = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_end_tok<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core.emit_end_tok = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mxlen(mut self, mxlen: usize) -> Self {
        self.core.mxlen = Some(mxlen);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn extract(&self, record: &impl RecordLike) -> String {
        self.fields
            .iter()
            .map(|name| record.field(name).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn convert_to_pieces<I, R>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = R>,
        R: RecordLike,
    {
        let strings: Vec<String> = tokens.into_iter().map(|r| self.extract(&r)).collect();
        self.core.convert_to_pieces(strings)
    }

    pub fn convert_to_ids<I, R>(&self, tokens: I, mxlen: Option<usize>) -> (Vec<TokenId>, usize)
    where
        I: IntoIterator<Item = R>,
        R: RecordLike,
    {
        let strings: Vec<String> = tokens.into_iter().map(|r| self.extract(&r)).collect();
        self.core.convert_to_ids(strings, mxlen)
    }

    pub fn convert_to_ids_stack<I, J, R>(&self, batch: I, mxlen: usize) -> (Vec<TokenId>, Vec<usize>)
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = R>,
        R: RecordLike,
    {
        let mut flat_ids = Vec::new();
        let mut lengths = Vec::new();
        for row in batch {
            let strings: Vec<String> = row.into_iter().map(|r| self.extract(&r)).collect();
            let (ids, length) = self.core.convert_to_ids(strings, Some(mxlen));
            flat_ids.extend(ids);
            lengths.push(length);
        }
        (flat_ids, lengths)
    }

    pub fn decode(&self, ids: &[TokenId]) -> String {
        self.core.decode(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::WordVocab;

    fn word_vectorizer() -> VocabVectorizer<WordVocab> {
        let vocab = WordVocab::from_list(vec!["hello", "world"]);
        VocabVectorizer::new(vocab)
            .with_begin_tok(vec!["<go>"])
            .with_end_tok(vec!["<eos>"])
    }

    #[test]
    fn convert_to_pieces_wraps_begin_and_end() {
        let vectorizer = word_vectorizer();
        let pieces = vectorizer.convert_to_pieces(vec!["hello", "world"]);
        assert_eq!(
            pieces,
            vec![
                "<go>".to_string(),
                "hello".to_string(),
                "world".to_string(),
                "<eos>".to_string()
            ]
        );
    }

    #[test]
    fn convert_to_ids_without_mxlen_has_natural_length() {
        let vectorizer = word_vectorizer();
        let (ids, length) = vectorizer.convert_to_ids(vec!["hello", "world"], None);
        assert_eq!(length, 4);
        assert_eq!(ids, vec![GO, 4, 5, EOS]);
    }

    #[test]
    fn convert_to_ids_pads_short_sequences() {
        let vectorizer = word_vectorizer();
        let (ids, length) = vectorizer.convert_to_ids(vec!["hello"], Some(6));
        assert_eq!(length, 3);
        assert_eq!(ids, vec![GO, 4, EOS, PAD, PAD, PAD]);
    }

    #[test]
    fn convert_to_ids_truncates_long_sequences_without_forcing_end_sentinel() {
        let vectorizer = word_vectorizer();
        let (ids, length) = vectorizer.convert_to_ids(vec!["hello", "world"], Some(3));
        assert_eq!(length, 3);
        assert_eq!(ids, vec![GO, 4, 5]);
    }

    #[test]
    fn convert_to_ids_stack_pads_every_row_to_the_same_width() {
        let vectorizer = word_vectorizer();
        let (flat_ids, lengths) =
            vectorizer.convert_to_ids_stack(vec![vec!["hello"], vec!["hello", "world"]], 5);
        assert_eq!(lengths, vec![3, 4]);
        assert_eq!(flat_ids.len(), 2 * 5);
        assert_eq!(&flat_ids[0..5], &[GO, 4, EOS, PAD, PAD]);
        assert_eq!(&flat_ids[5..10], &[GO, 4, 5, EOS, PAD]);
    }

    #[test]
    fn decode_suppresses_pad_go_eos_but_not_unk() {
        let vectorizer = word_vectorizer();
        let decoded = vectorizer.decode(&[GO, 4, 5, EOS, PAD, PAD]);
        assert_eq!(decoded, "hello world");

        let with_unk = vectorizer.decode(&[GO, 3, EOS]);
        assert_eq!(with_unk, "<unk>");
    }

    #[test]
    fn decode_joins_continuation_pieces_without_a_space() {
        // Reverse lookup of ids for pieces ["bo@@", "r"] should read back as "bor".
        let vocab = WordVocab::from_list(vec!["bo@@", "r", "bor"]);
        let vectorizer = VocabVectorizer::new(vocab);
        let bo_id = 4;
        let r_id = 5;
        let decoded = vectorizer.decode(&[bo_id, r_id]);
        assert_eq!(decoded, "bor");
    }

    #[test]
    fn record_adapter_matches_plain_adapter() {
        let plain = VocabVectorizer::new(WordVocab::from_list(vec!["hello", "world"]));
        let mapped = VocabMapVectorizer::new(WordVocab::from_list(vec!["hello", "world"]));

        let plain_result = plain.convert_to_ids(vec!["hello", "world"], None);

        let mut record = HashMap::new();
        record.insert("text".to_string(), "hello world".to_string());
        let mapped_result = mapped.convert_to_ids(vec![record], None);

        assert_eq!(plain_result, mapped_result);
    }

    #[test]
    fn map_adapter_joins_multiple_fields_with_a_space() {
        let vocab = WordVocab::from_list(vec!["hello", "world"]);
        let mapped = VocabMapVectorizer::new(vocab).with_fields(vec!["a", "b"]);

        let mut record = HashMap::new();
        record.insert("a".to_string(), "hello".to_string());
        record.insert("b".to_string(), "world".to_string());

        let pieces = mapped.convert_to_pieces(vec![record]);
        assert_eq!(pieces, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn map_adapter_treats_missing_fields_as_empty() {
        let vocab = WordVocab::from_list(vec!["hello"]);
        let mapped = VocabMapVectorizer::new(vocab);
        let record: HashMap<String, String> = HashMap::new();
        let pieces = mapped.convert_to_pieces(vec![record]);
        assert_eq!(pieces, vec!["".to_string()]);
    }
}
