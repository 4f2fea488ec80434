//! Composes [`MergeTable`] + [`WordVocab`] + a [`SegmentCache`] into the
//! BPE vocabulary surface, plus the compiled single-file snapshot format.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::cache::{LocalCache, SegmentCache};
use crate::merges::MergeTable;
use crate::segment;
use crate::vocab::{Transform, Vocab, WordVocab};
use crate::{Error, TokenId};

/// Signature identifying a compiled snapshot file. Chosen so it can never
/// collide with a plain-text vocab or codes file, which always start with
/// a printable piece.
const SNAPSHOT_MAGIC: &[u8; 4] = b"VCXS";
const SNAPSHOT_VERSION: u32 = 1;

/// BPE subword vocabulary: merge table, flat piece vocabulary, and a
/// memoizing segmenter. Immutable after construction.
pub struct BPEVocab {
    vocab: WordVocab,
    merges: MergeTable,
    cache: Box<dyn SegmentCache>,
    filter_unknown: bool,
}

impl BPEVocab {
    /// Load from a vocab file and a codes file. If `vocab_file`'s first
    /// four bytes match the compiled-snapshot signature, both files are
    /// assumed to be the same snapshot and `codes_file` is not opened.
    pub fn new<P: AsRef<Path>>(vocab_file: P, codes_file: P) -> Result<Self, Error> {
        Self::with_cache(vocab_file, codes_file, Box::<LocalCache>::default())
    }

    /// Same as [`BPEVocab::new`], with an explicit cache implementation —
    /// use [`crate::cache::SharedCache`] to share one vocabulary read-only
    /// across threads, or [`crate::cache::NoCache`] to disable caching.
    pub fn with_cache<P: AsRef<Path>>(
        vocab_file: P,
        codes_file: P,
        cache: Box<dyn SegmentCache>,
    ) -> Result<Self, Error> {
        if is_snapshot(vocab_file.as_ref())? {
            let (vocab, merges) = load_snapshot(vocab_file.as_ref())?;
            return Ok(Self {
                vocab,
                merges,
                cache,
                filter_unknown: false,
            });
        }

        let vocab = load_vocab_file(vocab_file.as_ref())?;
        let merges = MergeTable::from_file(codes_file.as_ref()).map_err(|e| match e {
            Error::Io(source) => Error::CodesOpen {
                path: codes_file.as_ref().display().to_string(),
                source,
            },
            other => other,
        })?;

        Ok(Self {
            vocab,
            merges,
            cache,
            filter_unknown: false,
        })
    }

    /// Enable the optional in-vocab re-segmentation pass (off by default;
    /// see §9's Open Question and DESIGN.md for the back-off strategy).
    pub fn with_in_vocab_filter(mut self, enabled: bool) -> Self {
        self.filter_unknown = enabled;
        self
    }

    /// Write a single-file snapshot containing both the vocabulary and the
    /// merges. The result is loadable by passing its path as both
    /// constructor arguments to [`BPEVocab::new`].
    pub fn compile_vocab<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        let mut writer = io::BufWriter::new(file);

        writer.write_all(SNAPSHOT_MAGIC).map_err(Error::Io)?;
        write_u32(&mut writer, SNAPSHOT_VERSION)?;

        let pieces = self.vocab.pieces();
        write_u32(&mut writer, pieces.len() as u32)?;
        for piece in pieces {
            write_string(&mut writer, piece)?;
        }

        let pairs = self.merges.pairs();
        write_u32(&mut writer, pairs.len() as u32)?;
        for (left, right) in pairs {
            write_string(&mut writer, left)?;
            write_string(&mut writer, right)?;
        }

        writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}

impl Vocab for BPEVocab {
    fn lookup(&self, piece: &str, normalize: Option<&Transform>) -> TokenId {
        self.vocab.lookup(piece, normalize)
    }

    fn rlookup(&self, id: TokenId) -> String {
        self.vocab.rlookup(id)
    }

    fn segment(&self, word: &str) -> Vec<String> {
        if let Some(pieces) = self.cache.get(word) {
            return pieces;
        }

        let mut pieces = segment::segment_word(word, &self.merges);
        if self.filter_unknown {
            pieces = filter_to_known_pieces(pieces, &self.vocab, &self.merges);
        }
        self.cache.put(word.to_string(), pieces.clone());
        pieces
    }

    fn size(&self) -> usize {
        self.vocab.size()
    }
}

/// In-vocab back-off: for any piece absent from the vocabulary, strip its
/// continuation marker, split it back into the two components of the
/// merge that produced it (if any), and retry down to single characters,
/// which are always representable (falling back to the lone character
/// itself, letting ordinary UNK lookup handle the rest).
///
/// The word's final symbol needs special handling: the merge table stores
/// its producing pair with the end-of-word marker still attached to the
/// right-hand component (e.g. codes `"ca t</w>"` for the last symbol of
/// `"cat"`), but that marker is already stripped from the piece by the
/// time it reaches here (`segment::emit_pieces`). So the search probe for
/// the final piece must have `</w>` re-appended, and only the final
/// symbol's own right-hand child inherits "final" status on recursion —
/// everything else in the word is a non-final, `@@`-suffixed piece.
fn filter_to_known_pieces(pieces: Vec<String>, vocab: &WordVocab, merges: &MergeTable) -> Vec<String> {
    let mut out = Vec::with_capacity(pieces.len());
    let last = pieces.len().saturating_sub(1);
    for (i, piece) in pieces.iter().enumerate() {
        let is_final = i == last;
        let core = if is_final {
            piece.as_str()
        } else {
            piece.strip_suffix("@@").unwrap_or(piece.as_str())
        };
        back_off_piece(core, is_final, vocab, merges, &mut out);
    }
    out
}

fn emit_with_suffix(core: &str, is_final: bool) -> String {
    if is_final {
        core.to_string()
    } else {
        format!("{core}@@")
    }
}

fn back_off_piece(core: &str, is_final: bool, vocab: &WordVocab, merges: &MergeTable, out: &mut Vec<String>) {
    if vocab.lookup(core, None) != crate::vocab::UNK || core.chars().count() <= 1 {
        out.push(emit_with_suffix(core, is_final));
        return;
    }

    // Find the merge whose merged form produced this symbol, and recurse
    // into its two components. Only the final symbol's probe carries the
    // end-of-word marker; its right-hand child is the one that inherits
    // `is_final`, since the left-hand child is never the word's last symbol.
    let probe = if is_final {
        format!("{core}</w>")
    } else {
        core.to_string()
    };
    for (left, right) in merges.pairs() {
        if format!("{left}{right}") == probe {
            back_off_piece(left, false, vocab, merges, out);
            let right_core = if is_final {
                right.strip_suffix("</w>").unwrap_or(right)
            } else {
                right.as_str()
            };
            back_off_piece(right_core, is_final, vocab, merges, out);
            return;
        }
    }

    out.push(emit_with_suffix(core, is_final));
}

fn load_vocab_file(path: &Path) -> Result<WordVocab, Error> {
    let file = File::open(path).map_err(|e| Error::VocabOpen {
        path: path.display().to_string(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let mut pieces = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(Error::Io)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        pieces.push(trimmed.to_string());
    }

    Ok(WordVocab::from_list(pieces))
}

fn is_snapshot(path: &Path) -> Result<bool, Error> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Ok(false),
    };
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == SNAPSHOT_MAGIC),
        Err(_) => Ok(false),
    }
}

fn load_snapshot(path: &Path) -> Result<(WordVocab, MergeTable), Error> {
    let file = File::open(path).map_err(|e| Error::VocabOpen {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(Error::Io)?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(Error::InvalidSnapshot(
            "missing VCXS signature".to_string(),
        ));
    }

    let version = read_u32(&mut reader)?;
    if version != SNAPSHOT_VERSION {
        return Err(Error::InvalidSnapshot(format!(
            "unsupported snapshot version: {version}"
        )));
    }

    let piece_count = read_u32(&mut reader)? as usize;
    let mut pieces = Vec::with_capacity(piece_count);
    for _ in 0..piece_count {
        pieces.push(read_string(&mut reader)?);
    }

    let merge_count = read_u32(&mut reader)? as usize;
    let mut pairs = Vec::with_capacity(merge_count);
    for _ in 0..merge_count {
        let left = read_string(&mut reader)?;
        let right = read_string(&mut reader)?;
        pairs.push((left, right));
    }

    Ok((WordVocab::from_dense_pieces(pieces), MergeTable::from_pairs(pairs)))
}

fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<(), Error> {
    writer.write_all(&value.to_le_bytes()).map_err(Error::Io)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), Error> {
    write_u32(writer, value.len() as u32)?;
    writer.write_all(value.as_bytes()).map_err(Error::Io)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, Error> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(Error::Io)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, Error> {
    let len = read_u32(reader)? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(Error::Io)?;
    String::from_utf8(buf)
        .map_err(|e| Error::InvalidSnapshot(format!("non-utf8 piece: {e}")))
}
