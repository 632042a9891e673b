use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use wordle_assist::{
    opener::ranked_openers,
    solver::{Oracle, State},
    AssistError, Corpus, Episode, EpisodeConfig, Feedback, Harness, Policy, PuzzleError,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Word list, one word per line (only the first CSV column is read)
    #[clap(short, long, default_value = "words.txt")]
    words: PathBuf,

    /// Only use words of this length
    #[clap(short, long)]
    length: Option<usize>,

    /// Guesses allowed per puzzle
    #[clap(short, long, default_value = "6")]
    max_guesses: usize,

    /// How feedback is read: "literal" or "standard"
    #[clap(short, long, default_value = "literal")]
    policy: Policy,

    /// Seed for drawing guesses; random if not given
    #[clap(short, long)]
    seed: Option<u64>,

    /// Fixed opening guess
    #[clap(short, long)]
    opener: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the best opening guesses for the word list
    Opener {
        #[clap(short, long, default_value = "1")]
        top: usize,
    },

    /// Play along with a puzzle, typing in the feedback for each guess
    Play,

    /// Solve a puzzle whose answer is known
    Solve { target: String },

    /// Play many puzzles and report how well the assistant does
    Bench {
        /// Number of targets to draw from the word list
        #[clap(short, long, default_value = "100")]
        num: usize,

        /// Play every word in the list instead of a sample
        #[clap(long)]
        all: bool,

        /// Also run the standard policy and compare it against this one
        #[clap(long)]
        compare: bool,

        /// Write the summaries as JSON to this file
        #[clap(long)]
        json: Option<PathBuf>,

        /// Print every target's guesses and feedback as a table
        #[clap(long)]
        table: bool,
    },
}

impl Args {
    fn config(&self) -> EpisodeConfig {
        let config = EpisodeConfig::new()
            .max_guesses(self.max_guesses)
            .policy(self.policy);
        match &self.opener {
            Some(word) => config.opener(word),
            None => config,
        }
    }

    fn corpus(&self) -> Result<Corpus, AssistError> {
        let corpus = Corpus::load(&self.words)?;
        let corpus = match self.length {
            Some(n) => corpus.with_length(n)?,
            None => corpus,
        };
        info!("using {} words from {}", corpus.len(), self.words.display());
        Ok(corpus)
    }
}

fn main() -> Result<(), AssistError> {
    env_logger::init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    debug!("seed {}", seed);

    let corpus = args.corpus()?;

    match &args.command {
        Command::Opener { top } => {
            for (i, (word, score)) in ranked_openers(&corpus, *top)?.into_iter().enumerate() {
                println!("{:>3}. {} ({:.6})", i + 1, word, score);
            }
        }
        Command::Play => play(&corpus, args.config(), seed)?,
        Command::Solve { target } => {
            let episode = Episode::new(&corpus, args.config(), StdRng::seed_from_u64(seed));
            let attempts = episode.run(&mut Oracle::new(target.to_lowercase()))?;
            println!("{}", attempts);
            match attempts.outcome() {
                Some(outcome) => println!("{} after {} guesses", outcome, attempts.len()),
                None => println!("stopped after {} guesses", attempts.len()),
            }
        }
        Command::Bench {
            num,
            all,
            compare,
            json,
            table,
        } => {
            let mut harness = Harness::new().verbose().seed(seed);
            harness = if *compare {
                harness
                    .add_baseline(args.config().policy(Policy::Literal))
                    .add_config(args.config().policy(Policy::Standard))
            } else {
                harness.add_config(args.config())
            };
            harness = if *all {
                harness.test_all()
            } else {
                harness.test_num(*num)
            };

            let record = harness.run(&corpus)?;
            record.print_report()?;
            if *table {
                for perf in record.iter() {
                    perf.print();
                }
            }

            if let Some(path) = json {
                fs::write(path, record.to_json()?)?;
                info!("wrote summaries to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Prompts for feedback on each guess until the puzzle ends or input runs
/// out. Feedback that cannot be read is asked for again.
fn play(corpus: &Corpus, config: EpisodeConfig, seed: u64) -> Result<(), AssistError> {
    let mut episode = Episode::new(corpus, config, StdRng::seed_from_u64(seed));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    let mut guess = episode.start()?.to_string();
    println!("Enter feedback as 0 (absent), 1 (present) or 2 (correct) per letter.");

    loop {
        print!("Guess {}: {}  feedback> ", episode.round(), guess);
        stdout.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                println!();
                return Ok(());
            }
        };

        let submitted = line
            .parse::<Feedback>()
            .and_then(|feedback| episode.submit(feedback).map(State::clone));

        match submitted {
            Ok(State::AwaitingFeedback(next)) => guess = next,
            Ok(state) => {
                if let Some(outcome) = state.outcome() {
                    println!("{} after {} guesses", outcome, episode.attempts().len());
                }
                return Ok(());
            }
            Err(AssistError::Puzzle {
                kind: kind @ PuzzleError::InvalidFeedbackCode(_),
            }) => eprintln!("{}, try again", kind),
            Err(e) => return Err(e),
        }
    }
}
