//! A compact, hand-traced analogue of the seed scenarios: a small BPE
//! vocabulary and codes table (not the full reference 30k tables) driven
//! through the same pipeline, covering pieces, ids, padding, truncation,
//! and stacking end to end.

use std::io::Write;
use tempfile::NamedTempFile;
use vecxx::bpe_vocab::BPEVocab;
use vecxx::vectorizer::VocabVectorizer;
use vecxx::vocab::{EOS, GO, PAD};

fn fixture() -> BPEVocab {
    // "cat" fully merges to one piece; "cats" stops one merge short and
    // keeps its continuation suffix. Traced by hand against the same
    // merge loop exercised in tests/test_bpe_merge.rs.
    let mut vocab = NamedTempFile::new().unwrap();
    vocab.write_all(b"cat\nca@@\nt@@\ns\ndog\n").unwrap();
    let mut codes = NamedTempFile::new().unwrap();
    codes.write_all(b"c a\nca t</w>\n").unwrap();
    BPEVocab::new(vocab.path().to_str().unwrap(), codes.path().to_str().unwrap()).unwrap()
}

fn vectorizer(bpe: BPEVocab) -> VocabVectorizer<BPEVocab> {
    VocabVectorizer::new(bpe)
        .with_transform(Box::new(|s: &str| s.to_lowercase()))
        .with_begin_tok(vec!["<go>"])
        .with_end_tok(vec!["<eos>"])
}

#[test]
fn pieces_match_the_hand_traced_segmentation() {
    let vectorizer = vectorizer(fixture());
    let pieces = vectorizer.convert_to_pieces(vec!["Cat", "Cats", "Dog"]);
    assert_eq!(
        pieces,
        vec![
            "<go>".to_string(),
            "cat".to_string(),
            "ca@@".to_string(),
            "t@@".to_string(),
            "s".to_string(),
            "dog".to_string(),
            "<eos>".to_string(),
        ]
    );
}

#[test]
fn ids_match_the_hand_traced_vocabulary_assignment() {
    let vectorizer = vectorizer(fixture());
    let (ids, length) = vectorizer.convert_to_ids(vec!["Cat", "Cats", "Dog"], None);
    // reserved ids 0..3, then cat=4, ca@@=5, t@@=6, s=7, dog=8.
    assert_eq!(ids, vec![GO, 4, 5, 6, 7, 8, EOS]);
    assert_eq!(length, 7);
}

#[test]
fn padding_to_a_wider_fixed_length_leaves_the_natural_ids_untouched() {
    let vectorizer = vectorizer(fixture());
    let (ids, length) = vectorizer.convert_to_ids(vec!["Cat", "Cats", "Dog"], Some(12));
    assert_eq!(length, 7);
    assert_eq!(&ids[..7], &[GO, 4, 5, 6, 7, 8, EOS]);
    assert!(ids[7..].iter().all(|&id| id == PAD));
}

#[test]
fn truncation_to_a_narrower_fixed_length_keeps_only_the_prefix() {
    let vectorizer = vectorizer(fixture());
    let (ids, length) = vectorizer.convert_to_ids(vec!["Cat", "Cats", "Dog"], Some(4));
    assert_eq!(length, 4);
    assert_eq!(ids, vec![GO, 4, 5, 6]);
}

#[test]
fn stacking_applies_the_same_mxlen_to_every_row() {
    let vectorizer = vectorizer(fixture());
    let batch = vec![vec!["Cat"], vec!["Cats", "Dog"]];
    let (flat_ids, lengths) = vectorizer.convert_to_ids_stack(batch, 5);
    assert_eq!(lengths, vec![3, 5]);
    assert_eq!(&flat_ids[0..5], &[GO, 4, EOS, PAD, PAD]);
    assert_eq!(&flat_ids[5..10], &[GO, 5, 6, 7, 8]);
}
