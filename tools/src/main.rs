// tools/src/main.rs
//
// Build a bigram model from a corpus and generate sequences from it.
//
// Usage:
//   cargo run --bin bigram_generate -- dat/chronicles_of_narnia.txt --seed You --length 20
//   cargo run --bin bigram_generate -- corpus.txt --strategy both --stats
//   cargo run --bin bigram_generate -- corpus.txt --config generate.toml --json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use libbigram_core::{bigram_model, Config, Generation, ProbabilityTable, Strategy};
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Generate word sequences from a Laplace-smoothed bigram model")]
struct Args {
    /// corpus text file, one record per line
    corpus: PathBuf,

    /// TOML file with seed / length / strategy
    #[arg(long)]
    config: Option<PathBuf>,

    /// first token of the sequence (overrides config)
    #[arg(long)]
    seed: Option<String>,

    /// number of tokens, seed included; values <= 0 give an empty sequence
    #[arg(long, allow_negative_numbers = true)]
    length: Option<i64>,

    /// which generator to run (overrides config)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// also print the log-probability of this whitespace-separated text
    #[arg(long)]
    score: Option<String>,

    /// print vocabulary size and row count
    #[arg(long)]
    stats: bool,

    /// one JSON object per line instead of plain text
    #[arg(long)]
    json: bool,

    /// debug logging (otherwise RUST_LOG, default warn)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Greedy,
    Lookahead,
    Both,
}

impl StrategyArg {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            StrategyArg::Greedy => vec![Strategy::Greedy],
            StrategyArg::Lookahead => vec![Strategy::Lookahead],
            StrategyArg::Both => vec![Strategy::Greedy, Strategy::Lookahead],
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    strategy: &'a str,
    tokens: &'a [String],
    #[serde(serialize_with = "serialize_log_prob")]
    log_prob: f64,
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    text: &'a str,
    #[serde(serialize_with = "serialize_log_prob")]
    log_prob: f64,
}

/// JSON has no infinities: finite values stay numbers, the rest become
/// `"-inf"`, `"inf"` or `"NaN"`.
fn serialize_log_prob<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_negative() {
        serializer.serialize_str("-inf")
    } else {
        serializer.serialize_str("inf")
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_generation(strategy: Strategy, g: &Generation, json: bool) -> Result<()> {
    if json {
        let report = Report {
            strategy: strategy.name(),
            tokens: &g.tokens,
            log_prob: g.log_prob,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("[{}] {}", strategy, g.text());
        println!("  ln P = {:.6}", g.log_prob);
    }
    Ok(())
}

fn print_stats(table: &ProbabilityTable, json: bool) -> Result<()> {
    if json {
        let stats = serde_json::json!({
            "vocabulary": table.vocabulary_size(),
            "rows": table.row_count(),
        });
        println!("{}", stats);
    } else {
        println!("vocabulary: {}", table.vocabulary_size());
        println!("rows:       {}", table.row_count());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seed) = &args.seed {
        config.seed = seed.clone();
    }
    if let Some(length) = args.length {
        config.length = usize::try_from(length).unwrap_or(0);
    }
    let strategies = match args.strategy {
        Some(choice) => choice.strategies(),
        None => vec![config.strategy],
    };

    info!("Building bigram model from {}", args.corpus.display());
    let table = bigram_model(&args.corpus)
        .with_context(|| format!("reading corpus {}", args.corpus.display()))?;

    if args.stats {
        print_stats(&table, args.json)?;
    }

    for strategy in strategies {
        let g = strategy.generate(&table, &config.seed, config.length);
        print_generation(strategy, &g, args.json)?;
    }

    if let Some(text) = &args.score {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let score = table.score_sequence(&tokens);
        if args.json {
            let report = ScoreReport {
                text,
                log_prob: score,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("[score] {}", text);
            println!("  ln P = {:.6}", score);
        }
    }

    Ok(())
}
