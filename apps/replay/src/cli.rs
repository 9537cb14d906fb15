//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Swipe Replay - run pointer traces through the swipe recognizer
#[derive(Parser, Debug)]
#[command(name = "swipe-replay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding layouts/ and dict/ (searched before the defaults)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Layout name
    #[arg(short, long, global = true, default_value = "qwerty")]
    pub layout: String,

    /// Recognition strategy (key_sequence or template)
    #[arg(short, long, global = true)]
    pub strategy: Option<String>,

    /// Number of candidates to print
    #[arg(short = 'n', long, global = true, default_value = "5")]
    pub limit: usize,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded trace (one JSON event per line)
    Replay {
        /// Trace file
        file: PathBuf,
    },
    /// Swipe the ideal trace of each word and show what comes back
    Word {
        /// Words to trace
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Rank candidates for a key sequence such as "hlo"
    Keys {
        /// Joined key sequence
        sequence: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "swipe-replay",
            "word",
            "hello",
            "world",
            "--strategy",
            "template",
            "-n",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.strategy.as_deref(), Some("template"));
        assert_eq!(cli.limit, 3);
        assert_eq!(cli.layout, "qwerty");
        match cli.command {
            Commands::Word { words } => assert_eq!(words, vec!["hello", "world"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_word_requires_arguments() {
        assert!(Cli::try_parse_from(["swipe-replay", "word"]).is_err());
    }
}
