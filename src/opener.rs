//! Choosing the opening guess.
//!
//! The opener is scored by letter coverage: a word scores highly when the
//! letters it is made of show up in many other words of the corpus. This is
//! a cheap proxy for how much a guess will reveal, not a true entropy.

use std::cmp::Ordering;

use itertools::Itertools;
use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Corpus, PuzzleError, Result};

const A_ASCII: usize = 0x61;

fn index(c: char) -> Option<usize> {
    c.is_ascii_lowercase().then(|| c as usize - A_ASCII)
}

/// Returns true if no letter appears twice in `word`.
pub fn has_distinct_letters(word: &str) -> bool {
    word.chars().unique().count() == word.chars().count()
}

/// How many words of a corpus contain each letter at least once.
///
/// A word counts once per letter no matter how often the letter repeats
/// inside it.
///
/// # Examples
///
/// ```rust
/// use wordle_assist::LetterFrequencies;
///
/// let freq = LetterFrequencies::from_words(["abba", "cat"]);
/// assert_eq!(freq.get('a'), 2);
/// assert_eq!(freq.get('b'), 1);
/// assert_eq!(freq.get('z'), 0);
/// assert_eq!(freq.total(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LetterFrequencies {
    counts: [u32; 26],
    total: u32,
}

impl LetterFrequencies {
    /// Counts letter presence over `words`.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = [0_u32; 26];
        let mut total = 0;

        for word in words {
            total += 1;
            for i in word.chars().unique().filter_map(index) {
                counts[i] += 1;
            }
        }

        LetterFrequencies { counts, total }
    }

    /// Counts letter presence over a whole corpus.
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self::from_words(corpus.iter().map(String::as_str))
    }

    /// Returns the number of words containing `letter`.
    pub fn get(&self, letter: char) -> u32 {
        index(letter).map_or(0, |i| self.counts[i])
    }

    /// Returns the number of words counted.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Scores a word as the product, over its distinct letters, of the
    /// fraction of words containing that letter.
    pub fn score(&self, word: &str) -> f64 {
        if self.total == 0 {
            return 0.;
        }

        word.chars()
            .unique()
            .map(|c| self.get(c) as f64 / self.total as f64)
            .product()
    }
}

/// Returns corpus indices sorted by score, best first. Equal scores keep
/// their corpus order.
fn ranked(corpus: &Corpus, freq: &LetterFrequencies) -> Vec<(usize, f64)> {
    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = corpus.words().par_iter().map(|w| freq.score(w)).collect();

    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = corpus.words().iter().map(|w| freq.score(w)).collect();

    scores
        .into_iter()
        .enumerate()
        .sorted_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal))
        .collect()
}

/// Returns up to `n` candidate openers with their scores, best first.
///
/// Only words with all distinct letters are listed.
pub fn ranked_openers(corpus: &Corpus, n: usize) -> Result<Vec<(&str, f64)>> {
    if corpus.is_empty() {
        return Err(PuzzleError::EmptyCorpus.into());
    }

    if !corpus.words().iter().any(|word| has_distinct_letters(word)) {
        return Err(PuzzleError::NoDistinctOpener.into());
    }

    let freq = LetterFrequencies::from_corpus(corpus);
    Ok(ranked(corpus, &freq)
        .into_iter()
        .map(|(i, score)| (corpus[i].as_str(), score))
        .filter(|(word, _)| has_distinct_letters(word))
        .take(n)
        .collect())
}

/// Selects the opening guess for a corpus.
///
/// Words are ranked by [`LetterFrequencies::score()`]; the best-ranked word
/// whose letters are all distinct wins, with ties going to the word that
/// comes first in the corpus. A corpus in which every word repeats a letter
/// is a configuration error and returns [`PuzzleError::NoDistinctOpener`].
///
/// # Examples
///
/// ```rust
/// use wordle_assist::{select_opening, Corpus};
///
/// let corpus = Corpus::new(["adieu", "bribe", "crept", "fresh"])?;
/// // "bribe" scores best but repeats a "b".
/// assert_eq!(select_opening(&corpus)?, "crept");
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
pub fn select_opening(corpus: &Corpus) -> Result<&str> {
    let (opener, score) = ranked_openers(corpus, 1)?[0];
    info!("opening with \"{}\" (score {:.6})", opener, score);
    debug!("scored {} words for the opener", corpus.len());
    Ok(opener)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::AssistError;

    #[test]
    fn counts_words_not_occurrences() {
        let freq = LetterFrequencies::from_words(["abba", "cat"]);
        assert_eq!(freq.get('a'), 2);
        assert_eq!(freq.get('b'), 1);
        assert_eq!(freq.get('c'), 1);
        assert_eq!(freq.get('t'), 1);
        assert_eq!(freq.get('q'), 0);
        assert_eq!(freq.get('A'), 0);
    }

    #[test]
    fn scores_distinct_letters_once() {
        let freq = LetterFrequencies::from_words(["abba", "cat"]);
        // a: 2/2, b: 1/2
        assert!((freq.score("abba") - 0.5).abs() < f64::EPSILON);
        assert!((freq.score("ab") - 0.5).abs() < f64::EPSILON);
        assert!((freq.score("cat") - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn scenario_opener() -> Result<(), AssistError> {
        let corpus = Corpus::new(["adieu", "bribe", "crept", "fresh"])?;
        let opener = select_opening(&corpus)?;
        assert_eq!(opener, "crept");
        assert!(["adieu", "crept"].contains(&opener));
        Ok(())
    }

    #[test]
    fn ties_go_to_corpus_order() -> Result<(), AssistError> {
        let corpus = Corpus::new(["ba", "ab"])?;
        assert_eq!(select_opening(&corpus)?, "ba");

        let corpus = Corpus::new(["ab", "ba"])?;
        assert_eq!(select_opening(&corpus)?, "ab");
        Ok(())
    }

    #[test]
    fn no_distinct_opener() -> Result<(), AssistError> {
        let corpus = Corpus::new(["abba", "noon", "eerie"])?;
        let err = select_opening(&corpus).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::NoDistinctOpener));
        Ok(())
    }

    #[test]
    fn ranked_lists_only_distinct_words() -> Result<(), AssistError> {
        let corpus = Corpus::new(["adieu", "bribe", "crept", "fresh"])?;
        let ranked = ranked_openers(&corpus, 10)?;
        let words: Vec<_> = ranked.iter().map(|(w, _)| *w).collect();
        assert_eq!(words, ["crept", "fresh", "adieu"]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));

        assert_eq!(ranked_openers(&corpus, 1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn zero_openers_is_not_an_error() -> Result<(), AssistError> {
        let corpus = Corpus::new(["crane", "slate"])?;
        assert!(ranked_openers(&corpus, 0)?.is_empty());

        let repeats = Corpus::new(["geese", "llama"])?;
        let err = ranked_openers(&repeats, 0).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::NoDistinctOpener));
        Ok(())
    }

    fn word() -> impl Strategy<Value = String> {
        "[a-f]{1,5}"
    }

    proptest! {
        #[test]
        fn frequency_is_word_count(words in prop::collection::vec(word(), 1..40)) {
            let freq = LetterFrequencies::from_words(words.iter().map(String::as_str));
            prop_assert_eq!(freq.total() as usize, words.len());

            for c in 'a'..='f' {
                let expected = words.iter().filter(|w| w.contains(c)).count();
                prop_assert_eq!(freq.get(c) as usize, expected);
                prop_assert!(freq.get(c) <= freq.total());
            }
        }

        #[test]
        fn opener_has_distinct_letters(words in prop::collection::vec(word(), 1..40)) {
            let corpus = Corpus::new(&words).unwrap();
            match select_opening(&corpus) {
                Ok(opener) => {
                    prop_assert!(has_distinct_letters(opener));
                    prop_assert!(corpus.contains(opener));
                }
                Err(e) => {
                    prop_assert_eq!(e.puzzle(), Some(&PuzzleError::NoDistinctOpener));
                    prop_assert!(words.iter().all(|w| !has_distinct_letters(w)));
                }
            }
        }
    }
}
