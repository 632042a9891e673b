#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]

// Required to rename serde
#[cfg(feature = "serde")]
extern crate serde_crate as serde;

use thiserror::Error;

pub mod corpus;
pub use corpus::Corpus;

pub mod opener;
pub use opener::{select_opening, LetterFrequencies};

pub mod feedback;
pub use feedback::{Code, Feedback};

pub mod constraints;
pub use constraints::{filter_candidates, Constraints, Policy};

pub mod solver;
pub use solver::{select_next_guess, Attempts, Episode, EpisodeConfig, Oracle, Outcome};

pub mod harness;
pub use harness::Harness;

pub mod perf;
pub use perf::{Perf, Summary};

#[cfg(feature = "stats")]
mod stats;

/// Shorthand for results produced by `wordle_assist`.
pub type Result<T, E = AssistError> = std::result::Result<T, E>;

/// The errors that `wordle_assist` can produce.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("puzzle encountered error")]
    Puzzle {
        #[from]
        kind: PuzzleError,
    },

    #[error("general IO error")]
    Io(#[from] std::io::Error),

    #[error("cannot compare a configuration with itself")]
    SelfComparison,

    #[error("the samples are too small or degenerate to compare")]
    Stats,

    #[error("the test harness encountered an error")]
    Harness {
        #[from]
        kind: HarnessError,
    },
}

impl AssistError {
    /// Returns the underlying puzzle error, if there is one.
    pub fn puzzle(&self) -> Option<&PuzzleError> {
        match self {
            AssistError::Puzzle { kind } => Some(kind),
            _ => None,
        }
    }
}

/// Errors raised while playing a single episode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// The word list was empty, or nothing in it survived normalization.
    #[error("the word list is empty after normalization")]
    EmptyCorpus,

    /// Every word in the corpus repeats at least one letter, so there is no
    /// opener to pick.
    #[error("no word in the corpus has all distinct letters")]
    NoDistinctOpener,

    /// The feedback for a guess contained a code outside `{0, 1, 2}` or did
    /// not line up with the guess.
    #[error("invalid feedback: {0}")]
    InvalidFeedbackCode(String),

    /// No word in the corpus satisfies the accumulated constraints.
    #[error("no word in the corpus matches the feedback so far")]
    Exhausted,

    /// The guess budget ran out before the puzzle was solved.
    #[error("the puzzle has already used all of its guesses")]
    OutOfGuesses,

    /// Feedback was submitted after the puzzle was solved.
    #[error("the puzzle has already been solved")]
    AlreadySolved,

    /// Feedback was submitted before the opening guess was made.
    #[error("the episode has not made its opening guess yet")]
    NotStarted,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no configurations have been added to the harness")]
    NoConfigsAdded,

    #[error("the baseline index {0} does not refer to a configuration")]
    MissingBaseline(usize),

    #[cfg(feature = "serde")]
    #[error("trouble serializing the record")]
    Serde(#[from] serde_json::Error),
}
