//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug)]
#[command(name = "kq")]
#[command(about = "Killer Queen cabinet event stream client")]
#[command(version)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["connect", "replay"]),
))]
pub struct Cli {
    /// Connect to a live cabinet at this address
    #[arg(short = 'c', long, value_name = "ADDRESS")]
    pub connect: Option<String>,

    /// Replay a recorded transcript file
    #[arg(short = 'r', long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Mirror raw traffic to this file for later replay
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long)]
    pub verbose: bool,
}

/// The traffic source picked on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Connect(String),
    Replay(PathBuf),
}

impl Cli {
    pub fn source(&self) -> Source {
        match (&self.connect, &self.replay) {
            (Some(address), None) => Source::Connect(address.clone()),
            (None, Some(path)) => Source::Replay(path.clone()),
            // The arg group requires exactly one of the two.
            _ => unreachable!("clap enforces exactly one source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_source() {
        assert!(Cli::try_parse_from(["kq"]).is_err());
    }

    #[test]
    fn sources_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["kq", "-c", "kq.local:12749", "-r", "game.log"]).is_err());
    }

    #[test]
    fn parses_live_mode() {
        let cli = Cli::try_parse_from(["kq", "-c", "kq.local:12749"]).unwrap();
        assert_eq!(cli.source(), Source::Connect("kq.local:12749".to_string()));
        assert!(!cli.verbose);
        assert!(cli.log.is_none());
    }

    #[test]
    fn parses_replay_mode_with_options() {
        let cli =
            Cli::try_parse_from(["kq", "-r", "game.log", "--log", "mirror.log", "-v"]).unwrap();
        assert_eq!(cli.source(), Source::Replay(PathBuf::from("game.log")));
        assert_eq!(cli.log, Some(PathBuf::from("mirror.log")));
        assert!(cli.verbose);
    }
}
