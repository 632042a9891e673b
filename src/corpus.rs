//! The word list every other part of the crate works from.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::Deref,
    path::Path,
};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PuzzleError, Result};

lazy_static! {
    static ref WORD: Regex = Regex::new("^[a-z]+$").unwrap();
}

/// Normalizes a raw dictionary entry.
///
/// Surrounding whitespace is trimmed and the entry is lowercased. Entries
/// that then contain anything other than the letters `a` through `z` are
/// rejected.
///
/// # Examples
///
/// ```rust
/// use wordle_assist::corpus::normalize;
///
/// assert_eq!(normalize(" Crane\n").as_deref(), Some("crane"));
/// assert_eq!(normalize("don't"), None);
/// assert_eq!(normalize(""), None);
/// ```
pub fn normalize(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    WORD.is_match(&word).then(|| word)
}

/// A normalized, read-only word list.
///
/// Order is preserved and duplicates are kept, since the opener breaks
/// score ties by position in the list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Corpus {
    words: Vec<String>,
}

impl Corpus {
    /// Builds a corpus from raw entries, dropping the ones that do not
    /// normalize.
    ///
    /// Returns [`PuzzleError::EmptyCorpus`] when nothing is left.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wordle_assist::Corpus;
    ///
    /// let corpus = Corpus::new(["Crane", "sl8te", "TRACE"])?;
    /// assert_eq!(corpus.words(), ["crane", "trace"]);
    ///
    /// assert!(Corpus::new(["42", "??"]).is_err());
    /// #
    /// # Ok::<_, wordle_assist::AssistError>(())
    /// ```
    pub fn new<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rejected = 0_usize;
        let words: Vec<String> = raw
            .into_iter()
            .filter_map(|entry| {
                let word = normalize(entry.as_ref());
                if word.is_none() {
                    rejected += 1;
                }
                word
            })
            .collect();

        if rejected > 0 {
            debug!("dropped {} entries that are not alphabetic words", rejected);
        }

        Self::from_normalized(words)
    }

    fn from_normalized(words: Vec<String>) -> Result<Self> {
        if words.is_empty() {
            Err(PuzzleError::EmptyCorpus.into())
        } else {
            Ok(Corpus { words })
        }
    }

    /// Reads a corpus with one entry per line.
    ///
    /// Only the first comma-separated field of a line is used, so a CSV file
    /// whose first column holds the words also works. Lines that are not
    /// valid UTF-8 are dropped like any other entry that does not normalize.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut raw = Vec::new();
        for line in reader.split(b'\n') {
            let line = line?;
            if let Some(field) = line.split(|&b| b == b',').next() {
                raw.push(String::from_utf8_lossy(field).into_owned());
            }
        }

        Self::new(raw)
    }

    /// Reads a corpus from a file (see [`from_reader()`](Self::from_reader())).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let corpus = Self::from_reader(BufReader::new(file))?;
        debug!(
            "loaded {} words from {}",
            corpus.len(),
            path.as_ref().display()
        );
        Ok(corpus)
    }

    /// Keeps only the words that are exactly `length` letters long.
    pub fn with_length(self, length: usize) -> Result<Self> {
        let words = self
            .words
            .into_iter()
            .filter(|w| w.len() == length)
            .collect();
        Self::from_normalized(words)
    }

    /// Returns the words in their original order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns true if `word` is in the corpus.
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl Deref for Corpus {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::AssistError;

    #[test]
    fn drops_non_alphabetic_entries() -> Result<(), AssistError> {
        let corpus = Corpus::new(["Adieu", "cr3pt", "", "fresh ", "naïve", "bribe"])?;
        assert_eq!(corpus.words(), ["adieu", "fresh", "bribe"]);
        Ok(())
    }

    #[test]
    fn keeps_duplicates_and_order() -> Result<(), AssistError> {
        let corpus = Corpus::new(["crane", "slate", "crane"])?;
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus[2], "crane");
        Ok(())
    }

    #[test]
    fn empty_corpus() {
        let err = Corpus::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::EmptyCorpus));

        let err = Corpus::new(["123", "a-b"]).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::EmptyCorpus));
    }

    #[test]
    fn reads_first_csv_field() -> Result<(), AssistError> {
        let input = "crane,0.5\nslate\n\n9999,1\nTRACE,x,y\n";
        let corpus = Corpus::from_reader(input.as_bytes())?;
        assert_eq!(corpus.words(), ["crane", "slate", "trace"]);
        Ok(())
    }

    #[test]
    fn skips_lines_that_are_not_utf8() -> Result<(), AssistError> {
        let input: &[u8] = b"crane\ncaf\xe9\nslate\r\n\xff\xfe,1\n";
        let corpus = Corpus::from_reader(input)?;
        assert_eq!(corpus.words(), ["crane", "slate"]);
        Ok(())
    }

    #[test]
    fn length_filter() -> Result<(), AssistError> {
        let corpus = Corpus::new(["cat", "crane", "trace", "at"])?.with_length(5)?;
        assert_eq!(corpus.words(), ["crane", "trace"]);
        assert!(corpus.contains("trace"));
        assert!(!corpus.contains("cat"));

        let err = Corpus::new(["cat"])?.with_length(5).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::EmptyCorpus));
        Ok(())
    }
}
