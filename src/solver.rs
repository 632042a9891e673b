//! Drawing guesses and playing whole episodes.
//!
//! An [`Episode`] is a small state machine. It makes its opening guess,
//! then waits for feedback; each piece of feedback either ends the episode
//! or produces the next guess:
//!
//! ```text
//! AwaitingFirstGuess -> AwaitingFeedback(guess) -> Solved
//!                                               -> Exhausted
//!                                               -> OutOfGuesses
//!                                               -> AwaitingFeedback(next)
//! ```
//!
//! Where the feedback comes from is up to the caller: anything that
//! implements [`FeedbackSource`] will do, including closures and the
//! [`Oracle`], which knows the answer.

use std::fmt::Display;

use log::{debug, info, warn};
use rand::{seq::SliceRandom, Rng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    corpus::normalize, opener::select_opening, Constraints, Corpus, Feedback, Policy, PuzzleError,
    Result,
};

/// Draws the next guess uniformly at random from `candidates`.
///
/// Returns [`PuzzleError::Exhausted`] when there is nothing to draw from.
///
/// # Examples
///
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use wordle_assist::select_next_guess;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let guess = select_next_guess(&["broad", "arbor"], &mut rng)?;
/// assert!(guess == "broad" || guess == "arbor");
///
/// assert!(select_next_guess(&[], &mut rng).is_err());
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
pub fn select_next_guess<'w, R: Rng + ?Sized>(candidates: &[&'w str], rng: &mut R) -> Result<&'w str> {
    candidates
        .choose(rng)
        .copied()
        .ok_or_else(|| PuzzleError::Exhausted.into())
}

/// Settings for a single episode.
///
/// Like the [harness](crate::Harness), the configuration methods consume
/// the existing value and return a new one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct EpisodeConfig {
    max_guesses: usize,
    policy: Policy,
    opener: Option<String>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        EpisodeConfig {
            max_guesses: 6,
            policy: Policy::default(),
            opener: None,
        }
    }
}

impl EpisodeConfig {
    /// Creates a configuration with the defaults: six guesses, the
    /// [`Literal`](Policy::Literal) policy and a scored opener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the guess budget. A budget of zero is treated as one.
    pub fn max_guesses(self, max_guesses: usize) -> Self {
        EpisodeConfig {
            max_guesses: max_guesses.max(1),
            ..self
        }
    }

    /// Sets the policy used to read feedback.
    pub fn policy(self, policy: Policy) -> Self {
        EpisodeConfig { policy, ..self }
    }

    /// Always opens with `word` instead of the scored opener.
    ///
    /// The word is normalized like a corpus entry. A word that is not made
    /// of letters is ignored and the scored opener is kept.
    pub fn opener(self, word: impl AsRef<str>) -> Self {
        let opener = normalize(word.as_ref());
        if opener.is_none() {
            warn!("ignoring opener {:?}, it is not a word", word.as_ref());
        }
        EpisodeConfig { opener, ..self }
    }

    /// Goes back to the scored opener.
    pub fn no_opener(self) -> Self {
        EpisodeConfig {
            opener: None,
            ..self
        }
    }

    /// Returns the guess budget.
    pub fn guess_budget(&self) -> usize {
        self.max_guesses
    }

    /// Returns the feedback policy.
    pub fn feedback_policy(&self) -> Policy {
        self.policy
    }

    /// Returns the fixed opener, if there is one.
    pub fn fixed_opener(&self) -> Option<&str> {
        self.opener.as_deref()
    }
}

impl Display for EpisodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} policy, {} guesses", self.policy, self.max_guesses)?;
        if let Some(opener) = &self.opener {
            write!(f, " (start: {})", opener)?;
        }
        Ok(())
    }
}

/// How an episode ended.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub enum Outcome {
    /// The last guess was the target.
    Solved,

    /// No word in the corpus matched the feedback.
    Exhausted,

    /// The guess budget ran out first.
    OutOfGuesses,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Solved => write!(f, "solved the puzzle"),
            Outcome::Exhausted => write!(f, "no word in the corpus matches the feedback"),
            Outcome::OutOfGuesses => write!(f, "ran out of guesses"),
        }
    }
}

/// Where an [`Episode`] currently is.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum State {
    /// The opener has not been chosen yet.
    AwaitingFirstGuess,

    /// The guess has been made and needs feedback.
    AwaitingFeedback(String),

    /// Terminal: the last guess was correct.
    Solved,

    /// Terminal: nothing in the corpus is consistent with the feedback.
    Exhausted,

    /// Terminal: the budget was used up without solving.
    OutOfGuesses,
}

impl State {
    /// Returns the outcome for a terminal state.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            State::Solved => Some(Outcome::Solved),
            State::Exhausted => Some(Outcome::Exhausted),
            State::OutOfGuesses => Some(Outcome::OutOfGuesses),
            State::AwaitingFirstGuess | State::AwaitingFeedback(_) => None,
        }
    }

    /// Returns true once the episode cannot continue.
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}

/// The guesses of one episode together with the feedback each received.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Attempts {
    inner: Vec<(String, Feedback)>,
    outcome: Option<Outcome>,
}

impl Attempts {
    fn push(&mut self, guess: String, feedback: Feedback) {
        self.inner.push((guess, feedback));
    }

    /// Returns every guess with its feedback, in order.
    pub fn inner(&self) -> &[(String, Feedback)] {
        self.inner.as_slice()
    }

    /// Returns the guesses in order.
    pub fn guesses(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(guess, _)| guess.as_str())
    }

    /// Returns the number of guesses that received feedback.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no guess has received feedback.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns how the episode ended, or `None` if it has not.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Returns true if the episode ended with a correct guess.
    pub fn solved(&self) -> bool {
        self.outcome == Some(Outcome::Solved)
    }
}

impl Display for Attempts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((last, rest)) = self.inner.split_last() {
            for (guess, feedback) in rest {
                writeln!(f, "{} {}", guess, feedback)?;
            }
            write!(f, "{} {}", last.0, last.1)?;
        }
        Ok(())
    }
}

/// Something that can tell how good a guess was.
///
/// Closures taking the guess and returning a [`Feedback`] implement this
/// trait, which makes canned feedback easy to write in tests.
pub trait FeedbackSource {
    /// Returns the feedback for `guess`.
    fn feedback(&mut self, guess: &str) -> Result<Feedback>;
}

impl<F> FeedbackSource for F
where
    F: FnMut(&str) -> Result<Feedback>,
{
    fn feedback(&mut self, guess: &str) -> Result<Feedback> {
        self(guess)
    }
}

/// A feedback source that knows the target and grades guesses with
/// [`Feedback::grade()`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oracle {
    target: String,
}

impl Oracle {
    /// Creates an oracle for `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Oracle {
            target: target.into(),
        }
    }

    /// Returns the word the oracle grades against.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl FeedbackSource for Oracle {
    fn feedback(&mut self, guess: &str) -> Result<Feedback> {
        Feedback::grade(guess, &self.target)
    }
}

/// One attempt at a puzzle, from the opener to a terminal [`State`].
///
/// # Examples
///
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use wordle_assist::{solver::Oracle, Corpus, Episode, EpisodeConfig, Outcome};
///
/// let corpus = Corpus::new(["adieu", "bribe", "crept", "fresh"])?;
/// let episode = Episode::new(&corpus, EpisodeConfig::new(), StdRng::seed_from_u64(0));
///
/// let attempts = episode.run(&mut Oracle::new("fresh"))?;
/// assert_eq!(attempts.outcome(), Some(Outcome::Solved));
/// assert_eq!(attempts.guesses().collect::<Vec<_>>(), ["crept", "fresh"]);
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
#[derive(Debug)]
pub struct Episode<'c, R> {
    corpus: &'c Corpus,
    config: EpisodeConfig,
    constraints: Constraints,
    state: State,
    attempts: Attempts,
    rng: R,
}

impl<'c, R: Rng> Episode<'c, R> {
    /// Creates an episode over `corpus` that draws guesses with `rng`.
    pub fn new(corpus: &'c Corpus, config: EpisodeConfig, rng: R) -> Self {
        let constraints = Constraints::new(config.policy);
        Episode {
            corpus,
            config,
            constraints,
            state: State::AwaitingFirstGuess,
            attempts: Attempts::default(),
            rng,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the constraints learned so far.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Returns the guesses that have received feedback so far.
    pub fn attempts(&self) -> &Attempts {
        &self.attempts
    }

    /// Returns the guess waiting for feedback, if there is one.
    pub fn current_guess(&self) -> Option<&str> {
        match &self.state {
            State::AwaitingFeedback(guess) => Some(guess),
            _ => None,
        }
    }

    /// Returns the number of the round in progress, starting at one.
    pub fn round(&self) -> usize {
        self.attempts.len() + usize::from(self.current_guess().is_some())
    }

    fn terminal_error(&self) -> PuzzleError {
        match self.state {
            State::Exhausted => PuzzleError::Exhausted,
            State::OutOfGuesses => PuzzleError::OutOfGuesses,
            _ => PuzzleError::AlreadySolved,
        }
    }

    /// Makes the opening guess.
    ///
    /// Calling this again while the opener waits for feedback returns the
    /// same guess.
    pub fn start(&mut self) -> Result<&str> {
        match self.state {
            State::AwaitingFirstGuess => {
                let opener = match &self.config.opener {
                    Some(word) => word.clone(),
                    None => select_opening(self.corpus)?.to_string(),
                };
                self.state = State::AwaitingFeedback(opener);
            }
            State::AwaitingFeedback(_) => {}
            _ => return Err(self.terminal_error().into()),
        }

        self.current_guess()
            .ok_or_else(|| PuzzleError::NotStarted.into())
    }

    /// Applies the feedback for the current guess and moves to the next
    /// state.
    ///
    /// Feedback that does not line up with the guess is rejected with
    /// [`PuzzleError::InvalidFeedbackCode`] and leaves the episode where it
    /// was. Submitting to a finished episode returns the error matching how
    /// it ended.
    pub fn submit(&mut self, feedback: Feedback) -> Result<&State> {
        let guess = match &self.state {
            State::AwaitingFeedback(guess) => guess.clone(),
            State::AwaitingFirstGuess => return Err(PuzzleError::NotStarted.into()),
            _ => return Err(self.terminal_error().into()),
        };

        self.constraints.merge(&guess, &feedback)?;
        let solved = feedback.is_solved();
        self.attempts.push(guess, feedback);

        let round = self.attempts.len();
        self.state = if solved {
            info!("solved in {} guesses", round);
            State::Solved
        } else {
            let candidates = self.constraints.filter(self.corpus);
            debug!("{} candidates left after round {}", candidates.len(), round);

            match select_next_guess(&candidates, &mut self.rng) {
                Err(_) => {
                    warn!("no candidates left after round {}", round);
                    State::Exhausted
                }
                Ok(_) if round >= self.config.max_guesses => {
                    info!("used all {} guesses", self.config.max_guesses);
                    State::OutOfGuesses
                }
                Ok(next) => State::AwaitingFeedback(next.to_string()),
            }
        };
        self.attempts.outcome = self.state.outcome();

        Ok(&self.state)
    }

    /// Plays the episode to the end, asking `source` for feedback on every
    /// guess.
    ///
    /// Errors from the source end the episode and are returned as-is.
    pub fn run<F: FeedbackSource + ?Sized>(mut self, source: &mut F) -> Result<Attempts> {
        let mut guess = self.start()?.to_string();
        loop {
            let feedback = source.feedback(&guess)?;
            match self.submit(feedback)? {
                State::AwaitingFeedback(next) => guess = next.clone(),
                _ => break,
            }
        }

        Ok(self.attempts)
    }

    /// Gives up the episode and returns its attempts.
    pub fn into_attempts(self) -> Attempts {
        self.attempts
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::AssistError;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(616)
    }

    fn scenario() -> Corpus {
        Corpus::new(["adieu", "bribe", "crept", "fresh"]).unwrap()
    }

    /// Hands out canned feedback in order.
    fn scripted(feedback: &[&'static str]) -> impl FnMut(&str) -> Result<Feedback> {
        let mut feedback = feedback.to_vec().into_iter();
        move |_: &str| match feedback.next() {
            Some(f) => f.parse(),
            None => panic!("ran out of canned feedback"),
        }
    }

    #[test]
    fn next_guess_comes_from_candidates() -> Result<(), AssistError> {
        let candidates = ["broad", "arbor", "drool"];
        let mut rng = rng();
        for _ in 0..20 {
            let guess = select_next_guess(&candidates, &mut rng)?;
            assert!(candidates.contains(&guess));
        }
        Ok(())
    }

    #[test]
    fn next_guess_is_reproducible() -> Result<(), AssistError> {
        let candidates = ["broad", "arbor", "drool", "brash", "trail"];
        let a: Vec<_> = {
            let mut rng = rng();
            (0..10)
                .map(|_| select_next_guess(&candidates, &mut rng))
                .collect::<Result<_>>()?
        };
        let b: Vec<_> = {
            let mut rng = rng();
            (0..10)
                .map(|_| select_next_guess(&candidates, &mut rng))
                .collect::<Result<_>>()?
        };
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn empty_candidates_are_exhausted() {
        let err = select_next_guess(&[], &mut rng()).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::Exhausted));
    }

    #[test]
    fn solves_with_oracle() -> Result<(), AssistError> {
        let corpus = scenario();
        let attempts = Episode::new(&corpus, EpisodeConfig::new(), rng()).run(&mut Oracle::new("fresh"))?;
        assert!(attempts.solved());
        assert_eq!(attempts.guesses().collect::<Vec<_>>(), ["crept", "fresh"]);
        assert_eq!(attempts.inner()[0].1.to_string(), "02200");
        assert_eq!(attempts.to_string(), "crept 02200\nfresh 22222");
        Ok(())
    }

    #[test]
    fn solves_on_the_opener() -> Result<(), AssistError> {
        let corpus = scenario();
        let attempts = Episode::new(&corpus, EpisodeConfig::new(), rng()).run(&mut Oracle::new("crept"))?;
        assert!(attempts.solved());
        assert_eq!(attempts.len(), 1);
        Ok(())
    }

    #[test]
    fn walks_the_states() -> Result<(), AssistError> {
        let corpus = scenario();
        let mut episode = Episode::new(&corpus, EpisodeConfig::new(), rng());
        assert_eq!(episode.state(), &State::AwaitingFirstGuess);
        assert_eq!(episode.round(), 0);

        let err = episode.submit(Feedback::solved(5)).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::NotStarted));

        assert_eq!(episode.start()?, "crept");
        assert_eq!(episode.start()?, "crept");
        assert_eq!(episode.round(), 1);

        let state = episode.submit("02200".parse()?)?;
        assert_eq!(state, &State::AwaitingFeedback("fresh".to_string()));
        assert_eq!(episode.round(), 2);
        assert!(episode.constraints().fixed().contains(&('r', 1)));

        assert_eq!(episode.submit(Feedback::solved(5))?, &State::Solved);
        assert_eq!(episode.attempts().outcome(), Some(Outcome::Solved));

        let err = episode.submit(Feedback::solved(5)).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::AlreadySolved));
        let err = episode.start().unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::AlreadySolved));
        Ok(())
    }

    #[test]
    fn invalid_feedback_leaves_state_alone() -> Result<(), AssistError> {
        let corpus = scenario();
        let mut episode = Episode::new(&corpus, EpisodeConfig::new(), rng());
        episode.start()?;

        let err = episode.submit("022".parse()?).unwrap_err();
        assert!(matches!(
            err.puzzle(),
            Some(PuzzleError::InvalidFeedbackCode(_))
        ));
        assert_eq!(episode.current_guess(), Some("crept"));
        assert!(episode.attempts().is_empty());
        assert!(episode.constraints().is_empty());

        episode.submit("02200".parse()?)?;
        assert_eq!(episode.current_guess(), Some("fresh"));
        Ok(())
    }

    #[test]
    fn exhausted_is_reported() -> Result<(), AssistError> {
        let corpus = scenario();
        // every other word shares a letter with "crept"
        let mut source = scripted(&["00000"]);
        let attempts = Episode::new(&corpus, EpisodeConfig::new(), rng()).run(&mut source)?;
        assert_eq!(attempts.outcome(), Some(Outcome::Exhausted));
        assert_eq!(attempts.len(), 1);

        let mut episode = Episode::new(&corpus, EpisodeConfig::new(), rng());
        episode.start()?;
        assert_eq!(episode.submit("00000".parse()?)?, &State::Exhausted);
        let err = episode.submit("00000".parse()?).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::Exhausted));
        Ok(())
    }

    #[test]
    fn out_of_guesses_is_reported() -> Result<(), AssistError> {
        let corpus = scenario();
        let config = EpisodeConfig::new().max_guesses(1);
        let mut episode = Episode::new(&corpus, config, rng());
        episode.start()?;
        assert_eq!(episode.submit("02200".parse()?)?, &State::OutOfGuesses);

        let err = episode.submit(Feedback::solved(5)).unwrap_err();
        assert_eq!(err.puzzle(), Some(&PuzzleError::OutOfGuesses));
        assert_eq!(episode.into_attempts().outcome(), Some(Outcome::OutOfGuesses));
        Ok(())
    }

    #[test]
    fn exhausted_wins_over_the_budget() -> Result<(), AssistError> {
        let corpus = scenario();
        let config = EpisodeConfig::new().max_guesses(1);
        let attempts = Episode::new(&corpus, config, rng()).run(&mut scripted(&["00000"]))?;
        assert_eq!(attempts.outcome(), Some(Outcome::Exhausted));
        Ok(())
    }

    #[test]
    fn fixed_opener() -> Result<(), AssistError> {
        let corpus = scenario();
        let config = EpisodeConfig::new().opener("adieu");
        assert_eq!(config.to_string(), "literal policy, 6 guesses (start: adieu)");

        let attempts = Episode::new(&corpus, config, rng()).run(&mut Oracle::new("adieu"))?;
        assert_eq!(attempts.guesses().collect::<Vec<_>>(), ["adieu"]);
        Ok(())
    }

    #[test]
    fn fixed_opener_is_normalized() {
        let config = EpisodeConfig::new().opener(" Crane ");
        assert_eq!(config.fixed_opener(), Some("crane"));
        assert_eq!(config.to_string(), "literal policy, 6 guesses (start: crane)");

        let config = EpisodeConfig::new().opener("cr4ne");
        assert_eq!(config.fixed_opener(), None);
    }

    #[test]
    fn source_errors_end_the_run() {
        let corpus = scenario();
        let mut source = |_: &str| Feedback::from_codes(&[0, 7, 0, 0, 0]);
        let err = Episode::new(&corpus, EpisodeConfig::new(), rng())
            .run(&mut source)
            .unwrap_err();
        assert!(matches!(
            err.puzzle(),
            Some(PuzzleError::InvalidFeedbackCode(_))
        ));
    }

    #[test]
    fn outcomes_read_differently() {
        let messages = [Outcome::Solved, Outcome::Exhausted, Outcome::OutOfGuesses]
            .map(|o| o.to_string());
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    proptest! {
        #[test]
        fn standard_policy_always_finds_the_target(
            words in prop::collection::vec("[a-e]{3}", 1..30),
            target in any::<prop::sample::Index>(),
            seed in any::<u64>(),
        ) {
            let corpus = Corpus::new(&words).unwrap();
            let target = target.get(&words).clone();
            let config = EpisodeConfig::new()
                .policy(Policy::Standard)
                .max_guesses(corpus.len() + 1);

            let episode = Episode::new(&corpus, config, StdRng::seed_from_u64(seed));
            match episode.run(&mut Oracle::new(target.clone())) {
                Ok(attempts) => {
                    prop_assert!(attempts.solved());
                    prop_assert_eq!(attempts.guesses().last(), Some(target.as_str()));
                }
                Err(e) => {
                    // only a corpus without a distinct-letter opener can fail
                    prop_assert_eq!(e.puzzle(), Some(&PuzzleError::NoDistinctOpener));
                }
            }
        }

        #[test]
        fn candidate_count_never_grows(
            words in prop::collection::vec("[a-e]{3}", 1..30),
            target in any::<prop::sample::Index>(),
            seed in any::<u64>(),
        ) {
            let corpus = Corpus::new(&words).unwrap();
            let target = target.get(&words).clone();
            let mut oracle = Oracle::new(target.clone());
            let config = EpisodeConfig::new().policy(Policy::Standard);
            let mut episode = Episode::new(&corpus, config, StdRng::seed_from_u64(seed));

            if let Ok(opener) = episode.start() {
                let mut guess = opener.to_string();
                let mut last = corpus.len();
                loop {
                    let feedback = oracle.feedback(&guess).unwrap();
                    let next = match episode.submit(feedback).unwrap() {
                        State::AwaitingFeedback(next) => Some(next.clone()),
                        _ => None,
                    };
                    let count = episode.constraints().filter(&corpus).len();
                    prop_assert!(count <= last);
                    prop_assert!(episode.constraints().admits(&target));
                    last = count;
                    match next {
                        Some(next) => guess = next,
                        None => break,
                    }
                }
            }
        }
    }
}
