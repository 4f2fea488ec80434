//! Basic usage demo for vecxx.
//!
//! Run with: cargo run --example basic

use std::collections::HashMap;
use vecxx::vectorizer::{VocabMapVectorizer, VocabVectorizer};
use vecxx::vocab::WordVocab;

fn main() {
    let vocab = WordVocab::from_list(vec!["hello", "world", "from", "vecxx"]);
    let vectorizer = VocabVectorizer::new(vocab)
        .with_transform(Box::new(|s: &str| s.to_lowercase()))
        .with_begin_tok(vec!["<go>"])
        .with_end_tok(vec!["<eos>"]);

    let tokens = vec!["Hello", "world", "from", "vecxx"];
    let pieces = vectorizer.convert_to_pieces(tokens.clone());
    println!("pieces: {pieces:?}");

    let (ids, length) = vectorizer.convert_to_ids(tokens.clone(), Some(10));
    println!("ids: {ids:?} (length {length})");

    let decoded = vectorizer.decode(&ids);
    println!("decoded: {decoded:?}");

    let vocab = WordVocab::from_list(vec!["hello", "world"]);
    let mapped = VocabMapVectorizer::new(vocab).with_fields(vec!["text"]);
    let mut record = HashMap::new();
    record.insert("text".to_string(), "hello world".to_string());
    let (ids, length) = mapped.convert_to_ids(vec![record], None);
    println!("record ids: {ids:?} (length {length})");
}
