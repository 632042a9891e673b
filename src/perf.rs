//! Evaluating and comparing episode configurations.

use std::{fmt::Display, io::Write, ops::Deref};

#[cfg(feature = "fancy")]
use comfy_table::{Cell, Color, ColumnConstraint, Row, Table, Width};
#[cfg(feature = "stats")]
use either::Either;
#[cfg(feature = "stats")]
use fishers_exact::FishersExactPvalues;
#[cfg(feature = "fancy")]
use owo_colors::{AnsiColors, OwoColorize, Stream};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "stats")]
use crate::stats::{chi_squared_2x2, Tails, WelchsT};
#[cfg(feature = "stats")]
use crate::AssistError;
use crate::{solver::Outcome, Attempts, EpisodeConfig, Result};

/// Above this many tries per side, solve rates are compared with a
/// chi-squared test instead of Fisher's exact test.
#[cfg(feature = "stats")]
const FISHER_LIMIT: u32 = 10_000;

#[cfg(feature = "stats")]
const ALPHA: f64 = 0.05;

/// A record of one configuration's episodes after a run of the
/// [test harness](crate::Harness).
///
/// This struct can provide statistics about the attempts on its own, but it
/// is recommended to produce a [`Summary`] first to cache the computations.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Perf {
    pub(crate) tries: Vec<(String, Attempts)>,
    config: EpisodeConfig,
    config_name: String,
}

impl Perf {
    /// Creates a new empty performance record.
    pub(crate) fn new(config: &EpisodeConfig) -> Self {
        Perf {
            tries: Vec::new(),
            config: config.clone(),
            config_name: config.to_string(),
        }
    }

    /// Gets the name of the configuration that produced this record.
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Gets the configuration that produced this record.
    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Gets every target played together with the attempts made on it.
    pub fn tries(&self) -> &[(String, Attempts)] {
        &self.tries
    }

    fn count(&self, outcome: Outcome) -> u32 {
        self.tries
            .iter()
            .filter(|(_, attempts)| attempts.outcome() == Some(outcome))
            .count() as u32
    }

    /// Gets the number of puzzles attempted.
    pub fn num_tried(&self) -> u32 {
        self.tries.len() as u32
    }

    /// Gets the number of puzzles solved.
    ///
    /// This function always returns a number less than or equal to
    /// [`num_tried()`](Self::num_tried()).
    pub fn num_solved(&self) -> u32 {
        self.count(Outcome::Solved)
    }

    /// Gets the number of puzzles that ran out of candidate words.
    pub fn num_exhausted(&self) -> u32 {
        self.count(Outcome::Exhausted)
    }

    /// Gets the number of puzzles that ran out of guesses.
    pub fn num_out_of_guesses(&self) -> u32 {
        self.count(Outcome::OutOfGuesses)
    }

    /// Gets the fraction of puzzles solved.
    pub fn frac_solved(&self) -> f32 {
        (self.num_solved() as f32) / (self.num_tried() as f32)
    }

    /// Gets the number of guesses across all puzzle attempts.
    pub fn cumulative_guesses(&self) -> u32 {
        self.tries.iter().map(|(_, a)| a.len() as u32).sum()
    }

    /// Gets the number of guesses across all solved puzzles.
    pub fn cumulative_guesses_solved(&self) -> u32 {
        self.tries
            .iter()
            .filter(|(_, attempts)| attempts.solved())
            .map(|(_, a)| a.len() as u32)
            .sum()
    }

    /// Gets the average number of guesses needed to solve a puzzle.
    ///
    /// This function does not include guesses made on puzzles that were not
    /// solved.
    pub fn guesses_per_solution(&self) -> f32 {
        (self.cumulative_guesses_solved() as f32) / (self.num_solved() as f32)
    }

    /// Gets the number of puzzles that were not solved.
    pub fn num_missed(&self) -> u32 {
        self.num_tried() - self.num_solved()
    }

    /// Gets the fraction of puzzles that were not solved.
    pub fn frac_missed(&self) -> f32 {
        (self.num_missed() as f32) / (self.num_tried() as f32)
    }

    /// Lays out the attempts for each puzzle as a table, one cell per target.
    /// Unsolved targets are highlighted.
    #[cfg(feature = "fancy")]
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        if !table.is_tty() {
            table.set_table_width(80);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL);
        }
        let width = table.get_table_width().unwrap_or(80);
        let columns = ((width / 9) as usize).max(1);
        for chunk in self.tries.chunks(columns) {
            let mut row = Row::new();
            for (target, attempts) in chunk {
                let mut cell = Cell::new(format!("{}\n-----\n{}", target, attempts));
                if !attempts.solved() {
                    cell = cell.bg(Color::Red).fg(Color::Black);
                }
                row.add_cell(cell);
            }
            table.add_row(row);
        }
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(5));
            columns
        ]);
        table
    }

    /// Prints the summary and then the [`table()`](Self::table()) of attempts.
    #[cfg(feature = "fancy")]
    pub fn print(&self) {
        print!("{}", self);
        println!("{}", self.table());
    }

    /// Converts this performance record to a pre-calculated summary.
    pub fn to_summary(&self) -> Summary {
        let longest = self
            .tries
            .iter()
            .filter(|(_, attempts)| attempts.solved())
            .map(|(_, attempts)| attempts.len())
            .max()
            .unwrap_or(0)
            .max(self.config.guess_budget());
        let mut bins = vec![0; longest];

        self.tries
            .iter()
            .filter(|(_, attempts)| attempts.solved())
            .map(|(_, attempts)| attempts.len())
            .for_each(|n| bins[n - 1] += 1);

        Summary {
            config_name: &self.config_name,
            num_tried: self.num_tried(),
            num_solved: self.num_solved(),
            num_exhausted: self.num_exhausted(),
            num_out_of_guesses: self.num_out_of_guesses(),
            cumulative_guesses: self.cumulative_guesses(),
            histogram: bins.into(),
        }
    }
}

impl Display for Perf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let perf_summary = self.to_summary();
        write!(f, "{}", perf_summary)
    }
}

/// A summary of a configuration's performance generated by the
/// [test harness](crate::Harness).
///
/// It is recommended to convert the [`Perf`] struct to this via the
/// [`Perf::to_summary()`] method when you want to use the performance to run
/// statistics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Summary<'a> {
    config_name: &'a str,
    num_tried: u32,
    num_solved: u32,
    num_exhausted: u32,
    num_out_of_guesses: u32,
    cumulative_guesses: u32,
    histogram: Histogram,
}

impl<'a> Summary<'a> {
    /// Gets the name of the configuration that produced this summary.
    pub fn config_name(&self) -> &'a str {
        self.config_name
    }

    /// Gets the number of puzzles attempted.
    pub fn num_tried(&self) -> u32 {
        self.num_tried
    }

    /// Gets the number of puzzles solved.
    pub fn num_solved(&self) -> u32 {
        self.num_solved
    }

    /// Gets the number of puzzles that ran out of candidate words.
    pub fn num_exhausted(&self) -> u32 {
        self.num_exhausted
    }

    /// Gets the number of puzzles that ran out of guesses.
    pub fn num_out_of_guesses(&self) -> u32 {
        self.num_out_of_guesses
    }

    /// Gets the fraction of puzzles solved.
    pub fn frac_solved(&self) -> f32 {
        (self.num_solved as f32) / (self.num_tried as f32)
    }

    /// Gets the number of guesses across all puzzle attempts.
    pub fn cumulative_guesses(&self) -> u32 {
        self.cumulative_guesses
    }

    /// Gets the number of guesses across all solved puzzles.
    pub fn cumulative_guesses_solved(&self) -> u32 {
        self.histogram
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1) * v)
            .sum::<u32>()
    }

    /// Gets the average number of guesses needed to solve a puzzle.
    ///
    /// This function does not include guesses made on puzzles that were not
    /// solved.
    pub fn mean_guesses(&self) -> f32 {
        (self.cumulative_guesses_solved() as f32) / (self.num_solved as f32)
    }

    /// Gets the number of puzzles that were not solved.
    pub fn num_missed(&self) -> u32 {
        self.num_tried - self.num_solved
    }

    /// Gets the fraction of puzzles that were not solved.
    pub fn frac_missed(&self) -> f32 {
        (self.num_missed() as f32) / (self.num_tried as f32)
    }

    /// Gets the distribution of guess counts over solved puzzles.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Compares this summary against a baseline.
    #[cfg(feature = "stats")]
    pub fn compare<'b>(&self, baseline: &Summary<'b>) -> Result<Comparison<'a, 'b>> {
        if self == baseline {
            return Err(AssistError::SelfComparison);
        }

        Comparison::compare(self.clone(), baseline.clone(), ALPHA)
    }

    /// Prints the summary to standard output.
    pub fn print(&self, options: SummaryPrintOptions) -> Result<()> {
        self.write_report(&mut std::io::stdout(), options)
    }

    /// Writes the summary to `out`. Nothing is written when the comparison
    /// against `options.compare` fails.
    pub fn write_report(&self, out: &mut impl Write, options: SummaryPrintOptions) -> Result<()> {
        #[cfg(feature = "stats")]
        let comparison = match &options.compare {
            Some(baseline) => Some(self.compare(baseline)?),
            None => None,
        };

        writeln!(out, "{:-^80}", self.config_name)?;

        #[cfg(feature = "stats")]
        let compared = match comparison {
            Some(comparison) => {
                comparison.write_to(out)?;
                true
            }
            None => false,
        };

        #[cfg(not(feature = "stats"))]
        let compared = false;

        if !compared {
            write!(out, "{}", self.body())?;
        }

        if options.histogram {
            write!(out, "{}", self.histogram)?;
        }

        Ok(())
    }

    pub fn print_options() -> SummaryPrintOptions<'a> {
        SummaryPrintOptions::default()
    }

    fn body(&self) -> String {
        format!(
            "Ran {} words\n\
             Guessed {} correctly, or {:.1}%, and {} incorrectly\n\
             ({} without a matching word, {} out of guesses)\n\
             Correct guesses took {:.2} attempts on average\n",
            self.num_tried(),
            self.num_solved(),
            self.frac_solved() * 100.,
            self.num_missed(),
            self.num_exhausted(),
            self.num_out_of_guesses(),
            self.mean_guesses(),
        )
    }
}

#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SummaryPrintOptions<'a> {
    #[cfg(feature = "stats")]
    compare: Option<Summary<'a>>,
    #[cfg(not(feature = "stats"))]
    compare: std::marker::PhantomData<&'a ()>,
    histogram: bool,
}

impl<'a> SummaryPrintOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "stats")]
    pub fn compare(self, baseline: &Summary<'a>) -> Self {
        Self {
            compare: Some(baseline.clone()),
            ..self
        }
    }

    pub fn histogram(self, histogram: bool) -> Self {
        Self { histogram, ..self }
    }
}

impl<'a> Display for Summary<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:-^80}", self.config_name)?;
        write!(f, "{}", self.body())
    }
}

/// Colors `text` green when the change is an improvement and red otherwise,
/// if the terminal supports it.
#[cfg(feature = "stats")]
fn paint(text: String, better: bool) -> String {
    #[cfg(feature = "fancy")]
    {
        text.if_supports_color(Stream::Stdout, |text| {
            if better {
                text.color(AnsiColors::Green)
            } else {
                text.color(AnsiColors::Red)
            }
        })
        .to_string()
    }

    #[cfg(not(feature = "fancy"))]
    {
        let _ = better;
        text
    }
}

#[cfg(feature = "stats")]
fn emphasize(text: &str) -> String {
    #[cfg(feature = "fancy")]
    {
        text.if_supports_color(Stream::Stdout, |text| text.bold())
            .to_string()
    }

    #[cfg(not(feature = "fancy"))]
    {
        text.to_string()
    }
}

/// The result of comparing a summary against a baseline.
///
/// Solve rates are compared with Fisher's exact test, or a chi-squared test
/// when both sides tried more than 10 000 puzzles. Guess counts of solved
/// puzzles are compared with Welch's t-test.
#[cfg(feature = "stats")]
#[derive(Debug)]
pub struct Comparison<'a, 'b> {
    this: Summary<'a>,
    baseline: Summary<'b>,
    solved: Either<FishersExactPvalues, f64>,
    guesses: Option<WelchsT>,
}

#[cfg(feature = "stats")]
impl<'a, 'b> Comparison<'a, 'b> {
    pub fn compare(this: Summary<'a>, baseline: Summary<'b>, alpha: f64) -> Result<Self> {
        let table = [
            this.num_solved(),
            baseline.num_solved(),
            this.num_missed(),
            baseline.num_missed(),
        ];

        let solved = if this.num_tried().min(baseline.num_tried()) <= FISHER_LIMIT {
            let res = fishers_exact::fishers_exact(&table).map_err(|_| AssistError::Stats)?;
            Either::Left(res)
        } else {
            Either::Right(chi_squared_2x2(&table)?)
        };

        // too few solved puzzles on one side just means no verdict on guesses
        let guesses = WelchsT::two_sample(
            this.histogram.samples(),
            baseline.histogram.samples(),
            alpha,
            Tails::Two,
        )
        .ok();

        Ok(Self {
            this,
            baseline,
            solved,
            guesses,
        })
    }

    /// Gets the p-value of the difference in solve rates.
    pub fn solved_pvalue(&self) -> f64 {
        match &self.solved {
            Either::Left(fisher) => fisher.two_tail_pvalue,
            Either::Right(p) => *p,
        }
    }

    /// Returns true if the solve rates differ significantly.
    pub fn solved_significant(&self) -> bool {
        self.solved_pvalue() < ALPHA
    }

    /// Gets the p-value of the difference in guesses per solution, if there
    /// were enough solved puzzles to test it.
    pub fn guesses_pvalue(&self) -> Option<f64> {
        self.guesses.as_ref().map(|t| t.p)
    }

    /// Returns true if the guesses per solution differ significantly.
    pub fn guesses_significant(&self) -> bool {
        self.guesses.as_ref().map_or(false, WelchsT::is_significant)
    }

    pub fn tries_eq(&self) -> bool {
        self.this.num_tried == self.baseline.num_tried
    }

    pub fn num_solved_diff(&self) -> Option<i64> {
        self.tries_eq()
            .then(|| self.this.num_solved() as i64 - self.baseline.num_solved() as i64)
    }

    pub fn num_missed_diff(&self) -> Option<i64> {
        self.tries_eq()
            .then(|| self.this.num_missed() as i64 - self.baseline.num_missed() as i64)
    }

    pub fn frac_solved_diff(&self) -> f32 {
        self.this.frac_solved() - self.baseline.frac_solved()
    }

    pub fn frac_missed_diff(&self) -> f32 {
        self.this.frac_missed() - self.baseline.frac_missed()
    }

    pub fn mean_guesses_diff(&self) -> f32 {
        self.this.mean_guesses() - self.baseline.mean_guesses()
    }

    fn write_to(&self, out: &mut impl Write) -> Result<()> {
        writeln!(
            out,
            "Ran {} words and comp. with {}, {} words",
            self.this.num_tried(),
            self.baseline.config_name(),
            self.baseline.num_tried()
        )?;

        let solved_diff = format!("{:+.1}%", self.frac_solved_diff() * 100.);
        if self.solved_significant() {
            writeln!(
                out,
                "Guessed {} correctly, or {:.1}% ({}), and {} incorrectly, {}",
                self.this.num_solved(),
                self.this.frac_solved() * 100.,
                paint(solved_diff, self.frac_solved_diff().is_sign_positive()),
                self.this.num_missed(),
                emphasize("a sig. diff.")
            )?;
        } else {
            writeln!(
                out,
                "Guessed {} correctly, or {:.1}% ({}), and {} incorrectly, not a sig. diff.",
                self.this.num_solved(),
                self.this.frac_solved() * 100.,
                solved_diff,
                self.this.num_missed()
            )?;
        }

        writeln!(
            out,
            "({} without a matching word, {} out of guesses)",
            self.this.num_exhausted(),
            self.this.num_out_of_guesses()
        )?;

        let guesses_diff = format!("{:+.2}", self.mean_guesses_diff());
        if self.guesses_significant() {
            writeln!(
                out,
                "Correct guesses took {:.2} ({}) attempts on average, {}",
                self.this.mean_guesses(),
                paint(guesses_diff, self.mean_guesses_diff().is_sign_negative()),
                emphasize("a sig. diff.")
            )?;
        } else {
            writeln!(
                out,
                "Correct guesses took {:.2} ({}) attempts on average, not a sig. diff.",
                self.this.mean_guesses(),
                guesses_diff,
            )?;
        }

        Ok(())
    }
}

/// How many puzzles were solved in each number of guesses.
///
/// Bin `i` counts the puzzles solved on guess `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Histogram {
    bins: Vec<u32>,
}

impl Histogram {
    /// Expands the bins back into one guess count per solved puzzle.
    #[cfg(feature = "stats")]
    fn samples(&self) -> Vec<f64> {
        self.bins
            .iter()
            .enumerate()
            .flat_map(|(i, &v)| std::iter::repeat((i + 1) as f64).take(v as usize))
            .collect()
    }
}

impl From<Vec<u32>> for Histogram {
    fn from(bins: Vec<u32>) -> Self {
        Self { bins }
    }
}

impl Deref for Histogram {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.bins
    }
}

impl Display for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let max = self.iter().copied().max().unwrap_or(0);
        let digits =
            std::iter::successors(Some(max), |&n| (n >= 10).then(|| n / 10)).count() as u32;
        let label =
            std::iter::successors(Some(self.len()), |&n| (n >= 10).then(|| n / 10)).count();
        let count_per_mark =
            (max as f32 / (80. - digits as f32 - label as f32 - 5.)).max(1.0);

        for (i, &bin) in self.bins.iter().enumerate() {
            write!(f, "{:>label$} |", i + 1)?;
            let marks = (bin as f32 / count_per_mark).floor() as usize;
            writeln!(f, "{:■>marks$} ({})", "", bin)?;
        }

        Ok(())
    }
}
