use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use vocab_coach::coach::Coach;
use vocab_coach::config::Config;
use vocab_coach::engine::grading::{GradeResult, UsageLevel};
use vocab_coach::engine::word_score::WordScore;
use vocab_coach::logging;
use vocab_coach::store::score_store::DEFAULT_STALE_DAYS;

#[derive(Parser)]
#[command(
    name = "vocab-coach",
    version,
    about = "Vocabulary coach with spaced word selection"
)]
struct Cli {
    #[arg(long, help = "Directory holding scores, dictionary and selection state")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Percent chance of introducing an unseen word (0-100)")]
    new_words: Option<u8>,

    #[arg(long, help = "Number of recent words kept out of rotation")]
    max_recent: Option<usize>,

    #[arg(long, default_value = "warn", help = "Log level when RUST_LOG is unset")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the next word to practise
    Next,
    /// Record a 0-3 score for a word
    Record { word: String, score: u8 },
    /// Record the stars earned by a graded sentence
    Grade {
        word: String,
        #[arg(long)]
        grammar: bool,
        #[arg(long, value_enum, default_value = "incorrect")]
        usage: UsageArg,
        #[arg(long, default_value = "")]
        feedback: String,
    },
    /// Let a word back into rotation right away
    Learned { word: String },
    /// Print a word's definitions
    Define { word: String },
    /// List scored words within a doubled-average range
    Scores {
        #[arg(long, default_value_t = 0)]
        min: u8,
        #[arg(long, default_value_t = 6)]
        max: u8,
    },
    /// List words seen once or not reviewed lately
    Stale {
        #[arg(long, default_value_t = DEFAULT_STALE_DAYS)]
        days: i64,
    },
    /// Show progress counts
    Dashboard,
    /// Merge a word,definitions CSV file into the dictionary
    Import { path: PathBuf },
    /// Add or replace a dictionary word
    Add {
        word: String,
        #[arg(required = true)]
        definitions: Vec<String>,
    },
    /// Remove a dictionary word
    Remove { word: String },
    /// Reset part of the stored state
    Reset {
        #[arg(value_enum)]
        target: ResetTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UsageArg {
    Correct,
    Partial,
    Incorrect,
}

impl From<UsageArg> for UsageLevel {
    fn from(arg: UsageArg) -> Self {
        match arg {
            UsageArg::Correct => UsageLevel::Correct,
            UsageArg::Partial => UsageLevel::Partial,
            UsageArg::Incorrect => UsageLevel::Incorrect,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ResetTarget {
    Scores,
    Dictionary,
    Selection,
}

fn print_scores(words: &[WordScore]) {
    if words.is_empty() {
        println!("(none)");
        return;
    }
    for ws in words {
        let scores: Vec<String> = ws.scores.iter().map(|s| s.to_string()).collect();
        println!(
            "{:<20} avg {}  scores [{}]  {}",
            ws.word,
            ws.average_score_int(),
            scores.join(", "),
            ws.last_updated.format("%Y-%m-%d %H:%M")
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let mut config = Config::load().unwrap_or_default();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(pct) = cli.new_words {
        config.new_words_studied = pct;
    }
    if let Some(n) = cli.max_recent {
        config.max_recent_words = n;
    }
    config.validate();

    let mut coach = Coach::open(config)?;

    match cli.command {
        Command::Next => {
            let selection = coach.next_word();
            if selection.entry.is_empty() {
                println!("No words available. Import a dictionary first.");
            } else {
                println!("{}", selection.entry.word);
                for def in &selection.entry.definitions {
                    println!("  - {def}");
                }
            }
        }
        Command::Record { word, score } => {
            let ws = coach.record_score(&word, score)?;
            println!("{} now averages {} (doubled)", ws.word, ws.average_score_int());
        }
        Command::Grade {
            word,
            grammar,
            usage,
            feedback,
        } => {
            let grade = GradeResult {
                grammar,
                usage: usage.into(),
                feedback,
            };
            let ws = coach.submit_grade(&word, &grade)?;
            println!("{} stars; {} now averages {}", grade.stars(), ws.word, ws.average_score_int());
            if grade.is_perfect() {
                coach.mark_learned(&word);
            }
        }
        Command::Learned { word } => {
            coach.mark_learned(&word);
            println!("{word} marked as learned");
        }
        Command::Define { word } => {
            let entry = coach.dictionary().entry(&word);
            println!("{}\n{}", entry.word, entry.definition_text());
        }
        Command::Scores { min, max } => {
            print_scores(&coach.scores().scores_in_range(min, max, None));
        }
        Command::Stale { days } => {
            print_scores(&coach.scores().stale_words(days, Utc::now()));
        }
        Command::Dashboard => {
            let dash = coach.dashboard();
            println!("Attempted:          {}", dash.total_attempted);
            println!("You know it:        {}", dash.known);
            println!("Could be sharper:   {}", dash.almost);
            println!("Need to learn more: {}", dash.learning);
            println!("Dictionary size:    {}", coach.dictionary().len());
            println!("{}", coach.selection_stats());
        }
        Command::Import { path } => {
            let summary = coach.import_csv_file(&path)?;
            if summary.failed == 0 {
                println!("Imported {} words.", summary.imported);
            } else {
                println!(
                    "Imported {} words. {} rows failed to import.",
                    summary.imported, summary.failed
                );
            }
        }
        Command::Add { word, definitions } => {
            coach.add_word(&word, definitions)?;
            println!("Added {word}");
        }
        Command::Remove { word } => {
            coach.remove_word(&word)?;
            println!("Removed {word}");
        }
        Command::Reset { target } => match target {
            ResetTarget::Scores => {
                coach.reset_scores()?;
                println!("Score history cleared.");
            }
            ResetTarget::Dictionary => {
                coach.reset_dictionary()?;
                println!("Dictionary reset to {} default words.", coach.dictionary().len());
            }
            ResetTarget::Selection => {
                coach.reset_selection();
                println!("Selection state cleared.");
            }
        },
    }

    Ok(())
}
