// core/src/corpus.rs
//
// Corpus ingestion: streams a text resource line by line and turns every
// non-blank line into a tokenized `Sentence`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Tokens of a single line together with their byte offsets in that line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<String>,
    /// `(start, end)` byte ranges, one per token.
    pub offsets: Vec<(usize, usize)>,
}

impl Sentence {
    fn push(&mut self, token: &str, start: usize, end: usize) {
        self.tokens.push(token.to_string());
        self.offsets.push((start, end));
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Splits raw text into tokens.
///
/// The model only ever sees the tokens; offsets are kept so that an
/// upstream tokenizer can be swapped in without changing the contract.
pub trait Tokenizer {
    fn decode(&self, text: &str) -> Sentence;
}

/// Whitespace splitting. Punctuation stays attached to its word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn decode(&self, text: &str) -> Sentence {
        let mut sentence = Sentence::default();
        let mut start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    sentence.push(&text[s..idx], s, idx);
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }
        if let Some(s) = start {
            sentence.push(&text[s..], s, text.len());
        }

        sentence
    }
}

/// Iterator over the non-empty tokenized lines of a corpus.
///
/// Records are separated by `\n`, `\r\n` or a lone `\r`. Blank records
/// are skipped. Read errors (including invalid UTF-8) are yielded
/// unchanged; callers stop at the first one with `?`.
pub struct CorpusReader<R, T = WhitespaceTokenizer> {
    lines: Lines<R>,
    /// Records left over from a physical line that contained bare `\r`s
    pending: VecDeque<String>,
    tokenizer: T,
    line_no: usize,
}

impl CorpusReader<BufReader<File>> {
    /// Open a UTF-8 corpus file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CorpusReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_tokenizer(reader, WhitespaceTokenizer)
    }
}

impl<R: BufRead, T: Tokenizer> CorpusReader<R, T> {
    pub fn with_tokenizer(reader: R, tokenizer: T) -> Self {
        Self {
            lines: reader.lines(),
            pending: VecDeque::new(),
            tokenizer,
            line_no: 0,
        }
    }

    /// Number of records consumed so far, blank ones included.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    fn next_record(&mut self) -> Option<io::Result<String>> {
        if let Some(record) = self.pending.pop_front() {
            return Some(Ok(record));
        }
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        if !line.contains('\r') {
            return Some(Ok(line));
        }
        self.pending.extend(line.split('\r').map(str::to_string));
        self.pending.pop_front().map(Ok)
    }
}

impl<R: BufRead, T: Tokenizer> Iterator for CorpusReader<R, T> {
    type Item = io::Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.next_record()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }
            let sentence = self.tokenizer.decode(&line);
            if sentence.is_empty() {
                continue;
            }
            return Some(Ok(sentence));
        }
    }
}
