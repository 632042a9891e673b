//! The test harness for evaluating episode configurations.

use std::ops::Deref;

#[cfg(all(feature = "fancy", not(feature = "parallel")))]
use indicatif::ProgressIterator;
#[cfg(feature = "parallel")]
use indicatif::ParallelProgressIterator;
use log::info;
use rand::{rngs::StdRng, seq::index::sample, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    corpus::normalize, perf::Perf, Attempts, Corpus, Episode, EpisodeConfig, HarnessError,
    Oracle, Result, Summary,
};

#[cfg(feature = "stats")]
use crate::AssistError;

/// A test harness that plays many configurations on many puzzles.
///
/// Create a new harness with [`new()`](Harness::new()), then configure it
/// with the methods below. Note that these configuration methods consume the
/// existing [`Harness`] and return a new one.
///
/// Every target gets its own random number generator, seeded from the
/// harness seed and the target's position, so a run is reproducible no
/// matter how the work is scheduled across threads.
///
/// # Examples
///
/// ```rust
/// use wordle_assist::{Corpus, EpisodeConfig, Harness, Policy};
///
/// let corpus = Corpus::new(["adieu", "bribe", "crept", "fresh"])?;
/// let harness = Harness::new()
///     .quiet()
///     .add_config(EpisodeConfig::new())
///     .add_config(EpisodeConfig::new().policy(Policy::Standard))
///     .test_all();
///
/// let record = harness.run(&corpus)?;
/// assert_eq!(record.len(), 2);
/// assert_eq!(record[0].num_tried(), 4);
/// #
/// # Ok::<_, wordle_assist::AssistError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Harness {
    configs: Vec<EpisodeConfig>,
    verbose: bool,
    num_targets: Option<usize>,
    targets: Option<Vec<String>>,
    baseline: Option<usize>,
    seed: u64,
}

impl Default for Harness {
    fn default() -> Self {
        Harness {
            configs: Vec::new(),
            verbose: false,
            num_targets: Some(100),
            targets: None,
            baseline: None,
            seed: 0,
        }
    }
}

impl Harness {
    /// Creates a new test harness with default configuration.
    ///
    /// Defaults:
    /// 1. tests no configurations
    /// 2. quiet mode
    /// 3. plays each configuration on 100 targets drawn from the corpus
    /// 4. does not compare against a baseline
    /// 5. seed `0`
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the harness show a progress bar while testing.
    pub fn verbose(self) -> Self {
        Harness {
            verbose: true,
            ..self
        }
    }

    /// Makes the harness silent while testing.
    pub fn quiet(self) -> Self {
        Harness {
            verbose: false,
            ..self
        }
    }

    /// Adds a configuration to the harness for testing.
    pub fn add_config(self, config: EpisodeConfig) -> Self {
        let mut configs = self.configs;
        configs.push(config);
        Harness { configs, ..self }
    }

    /// Adds a configuration to the harness for testing and sets it as the
    /// baseline for comparison.
    pub fn add_baseline(self, config: EpisodeConfig) -> Self {
        self.add_config(config).and_baseline()
    }

    /// Sets the most recently added configuration as the baseline for
    /// comparisons. Does nothing if no configuration has been added.
    pub fn and_baseline(self) -> Self {
        Self {
            baseline: self.configs.len().checked_sub(1),
            ..self
        }
    }

    /// Sets the harness to play every word of the corpus as a target.
    pub fn test_all(self) -> Self {
        Harness {
            num_targets: None,
            targets: None,
            ..self
        }
    }

    /// Sets the harness to play `n` targets drawn at random from the corpus.
    ///
    /// If the corpus has fewer than `n` words, every word is played.
    pub fn test_num(self, n: usize) -> Self {
        Harness {
            num_targets: Some(n),
            targets: None,
            ..self
        }
    }

    /// Sets the harness to play exactly the given targets, in order.
    ///
    /// Entries that are not alphabetic words are skipped.
    pub fn targets<I, S>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Harness {
            targets: Some(
                targets
                    .into_iter()
                    .filter_map(|t| normalize(t.as_ref()))
                    .collect(),
            ),
            ..self
        }
    }

    /// Sets the seed that target sampling and every episode derive their
    /// randomness from.
    pub fn seed(self, seed: u64) -> Self {
        Harness { seed, ..self }
    }

    fn choose_targets(&self, corpus: &Corpus) -> Vec<String> {
        if let Some(targets) = &self.targets {
            return targets.clone();
        }

        match self.num_targets {
            Some(n) => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                sample(&mut rng, corpus.len(), n.min(corpus.len()))
                    .iter()
                    .map(|i| corpus[i].clone())
                    .collect()
            }
            None => corpus.to_vec(),
        }
    }

    /// Runs the harness on `corpus` and produces a performance record for
    /// each configuration.
    ///
    /// The [`Perf`]s will be in the same order as the configurations were
    /// added to the harness, and the tries inside each in target order.
    pub fn run(&self, corpus: &Corpus) -> Result<Record> {
        if self.configs.is_empty() {
            return Err(HarnessError::NoConfigsAdded.into());
        }
        if let Some(n) = self.baseline {
            if n >= self.configs.len() {
                return Err(HarnessError::MissingBaseline(n).into());
            }
        }

        let targets = self.choose_targets(corpus);
        info!(
            "playing {} configurations on {} targets",
            self.configs.len(),
            targets.len()
        );

        let played = self.play_all(corpus, &targets)?;

        let mut perfs: Vec<Perf> = self.configs.iter().map(Perf::new).collect();
        for (target, attempts) in targets.iter().zip(played) {
            for (perf, attempts) in perfs.iter_mut().zip(attempts) {
                perf.tries.push((target.clone(), attempts));
            }
        }

        Ok(Record::new(perfs, self.baseline))
    }

    #[cfg(feature = "parallel")]
    fn play_all(&self, corpus: &Corpus, targets: &[String]) -> Result<Vec<Vec<Attempts>>> {
        if self.verbose {
            targets
                .par_iter()
                .enumerate()
                .progress_count(targets.len() as u64)
                .map(|(i, target)| self.play_target(corpus, i, target))
                .collect()
        } else {
            targets
                .par_iter()
                .enumerate()
                .map(|(i, target)| self.play_target(corpus, i, target))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn play_all(&self, corpus: &Corpus, targets: &[String]) -> Result<Vec<Vec<Attempts>>> {
        #[cfg(feature = "fancy")]
        if self.verbose {
            return targets
                .iter()
                .enumerate()
                .progress_count(targets.len() as u64)
                .map(|(i, target)| self.play_target(corpus, i, target))
                .collect();
        }

        targets
            .iter()
            .enumerate()
            .map(|(i, target)| self.play_target(corpus, i, target))
            .collect()
    }

    fn play_target(&self, corpus: &Corpus, index: usize, target: &str) -> Result<Vec<Attempts>> {
        self.configs
            .iter()
            .map(|config| {
                let rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64 + 1));
                Episode::new(corpus, config.clone(), rng).run(&mut Oracle::new(target))
            })
            .collect()
    }
}

/// The performance records of one harness run, with the baseline they
/// should be compared against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Record {
    perfs: Vec<Perf>,
    baseline: Option<usize>,
}

impl Deref for Record {
    type Target = [Perf];

    fn deref(&self) -> &Self::Target {
        &self.perfs
    }
}

impl Record {
    fn new(perfs: Vec<Perf>, baseline: impl Into<Option<usize>>) -> Self {
        Self {
            perfs,
            baseline: baseline.into(),
        }
    }

    /// Gets the baseline performance, if one was set.
    pub fn baseline(&self) -> Option<&Perf> {
        self.baseline.and_then(|n| self.perfs.get(n))
    }

    /// Summarizes every performance record, in order.
    pub fn summaries(&self) -> Vec<Summary> {
        self.perfs.iter().map(Perf::to_summary).collect()
    }

    /// Prints a summary and histogram of each configuration, compared against
    /// the baseline when there is one.
    pub fn print_report(&self) -> Result<()> {
        #[cfg(feature = "stats")]
        if let Some(baseline) = self.baseline() {
            let baseline_summary = baseline.to_summary();

            for (i, perf) in self.perfs.iter().enumerate() {
                let summary = perf.to_summary();
                let plain = Summary::print_options().histogram(true);
                if Some(i) == self.baseline {
                    summary.print(plain)?;
                    continue;
                }

                match summary.print(
                    Summary::print_options()
                        .compare(&baseline_summary)
                        .histogram(true),
                ) {
                    Ok(()) => {}
                    Err(AssistError::SelfComparison) | Err(AssistError::Stats) => {
                        summary.print(plain)?
                    }
                    Err(e) => return Err(e),
                }
            }

            return Ok(());
        }

        for perf in self.perfs.iter() {
            let summary = perf.to_summary();
            summary.print(Summary::print_options().histogram(true))?;
        }

        Ok(())
    }

    /// Serializes the summaries of this record to pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.summaries()).map_err(HarnessError::from)?;
        Ok(json)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AssistError, Outcome, Policy};

    fn corpus() -> Corpus {
        Corpus::new([
            "adieu", "bribe", "crept", "fresh", "broad", "arbor", "drool", "crane", "trace",
            "slate", "plant", "spoon", "sober", "tills",
        ])
        .unwrap()
    }

    #[test]
    fn needs_configs() {
        let err = Harness::new().run(&corpus()).unwrap_err();
        assert!(matches!(
            err,
            AssistError::Harness {
                kind: HarnessError::NoConfigsAdded
            }
        ));
    }

    #[test]
    fn baseline_without_configs_is_ignored() -> Result<(), AssistError> {
        let harness = Harness::new().and_baseline().add_config(EpisodeConfig::new());
        let record = harness.test_all().run(&corpus())?;
        assert!(record.baseline().is_none());
        Ok(())
    }

    #[test]
    fn plays_every_target() -> Result<(), AssistError> {
        let corpus = corpus();
        let record = Harness::new()
            .add_config(EpisodeConfig::new())
            .add_baseline(EpisodeConfig::new().policy(Policy::Standard))
            .test_all()
            .run(&corpus)?;

        assert_eq!(record.len(), 2);
        assert_eq!(record.baseline(), Some(&record[1]));
        for perf in record.iter() {
            assert_eq!(perf.num_tried() as usize, corpus.len());
            let targets: Vec<_> = perf.tries().iter().map(|(t, _)| t.as_str()).collect();
            assert_eq!(targets, corpus.words());
            for (target, attempts) in perf.tries() {
                if attempts.solved() {
                    assert_eq!(attempts.guesses().last(), Some(target.as_str()));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn samples_targets() -> Result<(), AssistError> {
        let corpus = corpus();
        let record = Harness::new()
            .add_config(EpisodeConfig::new())
            .test_num(5)
            .run(&corpus)?;
        assert_eq!(record[0].num_tried(), 5);

        let record = Harness::new()
            .add_config(EpisodeConfig::new())
            .test_num(500)
            .run(&corpus)?;
        assert_eq!(record[0].num_tried() as usize, corpus.len());
        Ok(())
    }

    #[test]
    fn same_seed_same_record() -> Result<(), AssistError> {
        let corpus = corpus();
        let harness = Harness::new()
            .add_config(EpisodeConfig::new())
            .add_config(EpisodeConfig::new().policy(Policy::Standard).max_guesses(3))
            .test_num(8)
            .seed(616);

        assert_eq!(harness.run(&corpus)?, harness.run(&corpus)?);
        Ok(())
    }

    #[test]
    fn explicit_targets() -> Result<(), AssistError> {
        let record = Harness::new()
            .add_config(EpisodeConfig::new())
            .targets(["Fresh", "trace", "no way"])
            .run(&corpus())?;

        let perf = &record[0];
        assert_eq!(perf.num_tried(), 2);
        assert_eq!(perf.tries()[0].0, "fresh");
        // "trace" is the opener for this corpus
        assert_eq!(perf.tries()[1].1.outcome(), Some(Outcome::Solved));
        assert_eq!(perf.tries()[1].1.len(), 1);
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn exports_json() -> Result<(), AssistError> {
        let record = Harness::new()
            .add_config(EpisodeConfig::new())
            .test_num(3)
            .run(&corpus())?;
        let json = record.to_json()?;
        assert!(json.contains("\"num_tried\": 3"));
        assert!(json.contains("literal policy, 6 guesses"));
        Ok(())
    }
}
