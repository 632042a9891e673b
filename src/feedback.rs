//! Per-letter feedback for a guess.

use std::{fmt::Display, ops::Deref, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AssistError, PuzzleError, Result};

/// The feedback given for a single letter of a guess.
///
/// The numeric codes (`0`, `1`, `2`) are the ones a player types in and the
/// ones [`Feedback::from_codes()`] accepts.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub enum Code {
    /// `0`: the letter does not occur in the target.
    Absent,

    /// `1`: the letter occurs in the target, but not at this position.
    Present,

    /// `2`: the letter occurs in the target at exactly this position.
    Correct,
}

impl Code {
    /// Converts a numeric code into a [`Code`].
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Code::Absent),
            1 => Ok(Code::Present),
            2 => Ok(Code::Correct),
            other => Err(PuzzleError::InvalidFeedbackCode(format!(
                "{} is not one of 0, 1 or 2",
                other
            ))
            .into()),
        }
    }

    /// Returns the numeric code.
    pub fn code(self) -> u8 {
        match self {
            Code::Absent => 0,
            Code::Present => 1,
            Code::Correct => 2,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            '0' | 'b' | 'x' => Some(Code::Absent),
            '1' | 'y' => Some(Code::Present),
            '2' | 'g' => Some(Code::Correct),
            _ => None,
        }
    }
}

/// The feedback for a whole guess, one [`Code`] per letter.
///
/// # Examples
///
/// ```rust
/// use wordle_assist::{Code, Feedback};
///
/// let feedback: Feedback = "02100".parse()?;
/// assert_eq!(feedback, Feedback::from_codes(&[0, 2, 1, 0, 0])?);
/// assert_eq!(feedback[1], Code::Correct);
/// assert!(!feedback.is_solved());
///
/// // Colors work too: b(lack), y(ellow), g(reen).
/// assert_eq!("bgybb".parse::<Feedback>()?, feedback);
///
/// assert!(Feedback::from_codes(&[0, 3]).is_err());
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Feedback {
    codes: Vec<Code>,
}

impl Feedback {
    /// Wraps a sequence of codes.
    pub fn new(codes: Vec<Code>) -> Self {
        Feedback { codes }
    }

    /// Builds feedback from numeric codes, rejecting anything outside
    /// `{0, 1, 2}`.
    pub fn from_codes(codes: &[u8]) -> Result<Self> {
        codes
            .iter()
            .map(|&c| Code::from_code(c))
            .collect::<Result<Vec<_>>>()
            .map(Feedback::new)
    }

    /// The feedback for a correct guess of `len` letters.
    pub fn solved(len: usize) -> Self {
        Feedback::new(vec![Code::Correct; len])
    }

    /// Returns true if every letter is [`Code::Correct`].
    pub fn is_solved(&self) -> bool {
        !self.codes.is_empty() && self.codes.iter().all(|&c| c == Code::Correct)
    }

    /// Returns the codes in order.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Grades `guess` against a known `target` the way Wordle does.
    ///
    /// Letters in the right position are marked first. The remaining letters
    /// of the guess are then marked [`Code::Present`] left to right, but
    /// only as long as the target has unmatched copies of that letter left;
    /// extra copies are [`Code::Absent`]. For instance, guessing `spool`
    /// against `sober` marks the first `o` present and the second absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wordle_assist::Feedback;
    ///
    /// let feedback = Feedback::grade("spool", "sober")?;
    /// assert_eq!(feedback.to_string(), "20100");
    ///
    /// assert!(Feedback::grade("sober", "sober")?.is_solved());
    /// #
    /// # Ok::<_, wordle_assist::AssistError>(())
    /// ```
    pub fn grade(guess: &str, target: &str) -> Result<Self> {
        let guess: Vec<char> = guess.chars().collect();
        let target: Vec<char> = target.chars().collect();
        if guess.len() != target.len() {
            return Err(PuzzleError::InvalidFeedbackCode(format!(
                "cannot grade a {}-letter guess against a {}-letter word",
                guess.len(),
                target.len()
            ))
            .into());
        }

        let mut codes = vec![Code::Absent; guess.len()];

        // go through correct letters first, since those get priority
        let mut unmatched = Vec::with_capacity(target.len());
        for (i, (&g, &t)) in guess.iter().zip(target.iter()).enumerate() {
            if g == t {
                codes[i] = Code::Correct;
            } else {
                unmatched.push(t);
            }
        }

        for (i, &g) in guess.iter().enumerate() {
            if codes[i] == Code::Correct {
                continue;
            }
            if let Some(pos) = unmatched.iter().position(|&t| t == g) {
                unmatched.swap_remove(pos);
                codes[i] = Code::Present;
            }
        }

        Ok(Feedback::new(codes))
    }
}

impl Deref for Feedback {
    type Target = [Code];

    fn deref(&self) -> &Self::Target {
        &self.codes
    }
}

impl FromStr for Feedback {
    type Err = AssistError;

    /// Parses codes written as digits (`"02100"`) or colors (`"bgybb"`).
    /// Whitespace and commas between codes are ignored.
    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|c| {
                Code::from_char(c).ok_or_else(|| {
                    AssistError::from(PuzzleError::InvalidFeedbackCode(format!(
                        "'{}' is not a feedback code",
                        c
                    )))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Feedback::new)
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for code in &self.codes {
            write!(f, "{}", code.code())?;
        }
        Ok(())
    }
}
