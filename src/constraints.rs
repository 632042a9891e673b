//! Accumulated feedback and the candidate filter built from it.
//!
//! Every round's feedback is folded into sets that only ever grow: letters
//! known to be absent, letters known to be somewhere else and letters known
//! to be in place. Candidates are recomputed from the whole
//! corpus each round, so the result never depends on the order in which
//! the constraints were learned.

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Code, Feedback, PuzzleError, Result};

/// How absent and misplaced codes are read.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub enum Policy {
    /// Any letter that ever receives [`Code::Absent`] is banned from every
    /// candidate, even when the same guess also marked another copy of it
    /// present or correct. Misplaced letters are only banned from their
    /// position; candidates are not required to contain them.
    ///
    /// This reading loses the target when a guess repeats a letter that
    /// the target holds only once.
    Literal,

    /// Reads codes the way Wordle hands them out. A letter marked absent
    /// is banned everywhere unless it is also known to be present, and is
    /// always banned from the position it was marked at. Every misplaced
    /// letter must occur somewhere in the candidate.
    ///
    /// Unlike [`Policy::Literal`], adding a constraint can admit words that
    /// were filtered out before, so the filter is only non-expansive for
    /// constraints coming from truthful feedback.
    Standard,
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Literal
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(Policy::Literal),
            "standard" => Ok(Policy::Standard),
            other => Err(format!(
                "unknown policy \"{}\", expected \"literal\" or \"standard\"",
                other
            )),
        }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Literal => write!(f, "literal"),
            Policy::Standard => write!(f, "standard"),
        }
    }
}

/// Everything learned about the target so far.
///
/// # Examples
///
/// ```rust
/// use wordle_assist::{Constraints, Corpus, Feedback};
///
/// let corpus = Corpus::new(["broad", "brash", "drool", "prawn", "arbor"])?;
///
/// let mut constraints = Constraints::default();
/// constraints.merge("crane", &Feedback::from_codes(&[0, 2, 1, 0, 0])?)?;
///
/// assert_eq!(constraints.filter(&corpus), ["broad", "drool", "arbor"]);
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Constraints {
    policy: Policy,
    excluded: BTreeSet<char>,
    misplaced: BTreeSet<(char, usize)>,
    fixed: BTreeSet<(char, usize)>,
    absent_at: BTreeSet<(char, usize)>,
}

impl Constraints {
    /// Creates an empty set of constraints read with `policy`.
    pub fn new(policy: Policy) -> Self {
        Constraints {
            policy,
            ..Self::default()
        }
    }

    /// Adds a letter known to be absent.
    pub fn exclude(mut self, letter: char) -> Self {
        self.excluded.insert(letter);
        self
    }

    /// Adds a letter known to be present but not at `position`.
    pub fn misplace(mut self, letter: char, position: usize) -> Self {
        self.misplaced.insert((letter, position));
        self
    }

    /// Adds a letter known to be at `position`.
    pub fn fix(mut self, letter: char, position: usize) -> Self {
        self.fixed.insert((letter, position));
        self
    }

    /// Folds the feedback for `guess` into the constraints.
    ///
    /// The feedback must have one code per letter of the guess; otherwise
    /// [`PuzzleError::InvalidFeedbackCode`] is returned and nothing changes.
    pub fn merge(&mut self, guess: &str, feedback: &Feedback) -> Result<()> {
        let letters = guess.chars().count();
        if feedback.len() != letters {
            return Err(PuzzleError::InvalidFeedbackCode(format!(
                "got {} codes for the {}-letter guess \"{}\"",
                feedback.len(),
                letters,
                guess
            ))
            .into());
        }

        for (i, (letter, &code)) in guess.chars().zip(feedback.iter()).enumerate() {
            match code {
                Code::Absent => {
                    self.excluded.insert(letter);
                    self.absent_at.insert((letter, i));
                }
                Code::Present => {
                    self.misplaced.insert((letter, i));
                }
                Code::Correct => {
                    self.fixed.insert((letter, i));
                }
            }
        }

        debug!(
            "after \"{}\" ({}): excluded {:?}, misplaced {:?}, fixed {:?}",
            guess, feedback, self.excluded, self.misplaced, self.fixed
        );

        Ok(())
    }

    /// Returns the policy used to read the constraints.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Letters known to be absent.
    pub fn excluded(&self) -> &BTreeSet<char> {
        &self.excluded
    }

    /// Letters known to be present, each with a position it is not at.
    pub fn misplaced(&self) -> &BTreeSet<(char, usize)> {
        &self.misplaced
    }

    /// Letters known to be at a position.
    pub fn fixed(&self) -> &BTreeSet<(char, usize)> {
        &self.fixed
    }

    /// Returns true if nothing has been learned yet.
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty() && self.misplaced.is_empty() && self.fixed.is_empty()
    }

    fn known_present(&self, letter: char) -> bool {
        self.fixed
            .iter()
            .chain(self.misplaced.iter())
            .any(|&(l, _)| l == letter)
    }

    /// Returns true if `word` is consistent with every constraint.
    ///
    /// A word is kept when none of its letters is excluded, no misplaced
    /// letter sits at the position it was marked at, and every fixed
    /// letter sits at its position. Requiring fixed letters in place also
    /// covers words that hold a fixed letter only somewhere else. A position
    /// past the end of the word holds no letter.
    pub fn admits(&self, word: &str) -> bool {
        let letters: Vec<char> = word.chars().collect();
        let at = |position: usize| letters.get(position).copied();

        let banned = |letter: char| match self.policy {
            Policy::Literal => true,
            Policy::Standard => !self.known_present(letter),
        };
        if self
            .excluded
            .iter()
            .any(|&l| banned(l) && letters.contains(&l))
        {
            return false;
        }

        if self.misplaced.iter().any(|&(l, p)| at(p) == Some(l)) {
            return false;
        }

        if !self.fixed.iter().all(|&(l, p)| at(p) == Some(l)) {
            return false;
        }

        match self.policy {
            Policy::Literal => true,
            Policy::Standard => {
                self.misplaced.iter().all(|(l, _)| letters.contains(l))
                    && !self.absent_at.iter().any(|&(l, p)| at(p) == Some(l))
            }
        }
    }

    /// Returns the words consistent with every constraint, in their
    /// original order.
    pub fn filter<'w>(&self, words: &'w [String]) -> Vec<&'w str> {
        words
            .iter()
            .map(String::as_str)
            .filter(|w| self.admits(w))
            .collect()
    }
}

/// Returns the words of `words` consistent with `constraints`.
///
/// This is a shorthand for [`Constraints::filter()`].
pub fn filter_candidates<'w>(words: &'w [String], constraints: &Constraints) -> Vec<&'w str> {
    constraints.filter(words)
}
