//! Hosting process for the cabinet event stream.
//!
//! Picks the traffic source (`-c` live, `-r` replay), wires the standard
//! consumers — the stats aggregator and the match tracker — and logs what
//! they see. Connect failures are fatal here: there is nothing useful to
//! do without a cabinet.

pub mod cli;
pub mod logging;

use std::fs::File;
use std::time::Duration;

use anyhow::Context;
use kq::{
    GameStats, KqStream, KqStreamOptions, Match, MatchEventKind, MatchNotification, Transcript,
    WriterSink,
};
use tracing::{debug, info};

use crate::cli::{Cli, Source};

/// Runs the selected mode to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut options = KqStreamOptions::default();
    if let Some(path) = &cli.log {
        let file = File::create(path)
            .with_context(|| format!("cannot create traffic log {}", path.display()))?;
        options.sink = Some(Box::new(WriterSink::new(file)));
    }

    let stream = KqStream::new(options);

    let stats = GameStats::new();
    stats.start(&stream);
    stats.on_change(|stat| {
        debug!(
            character = ?stat.character,
            statistic = ?stat.statistic,
            value = stat.value,
            "stat change"
        );
    });

    let tracker = Match::new();
    tracker.attach(&stream);
    tracker.on(MatchEventKind::Score, |notification| {
        if let MatchNotification::Score(score) = notification {
            info!(cab = ?score.cab, score = score.score, "score");
        }
    });

    // Announce concluded matches the way the chat bot used to repeat them.
    stream.on_current_match(|current| {
        if !current.concluded {
            return;
        }
        let [team1, team2] = &current.teams;
        let [score1, score2] = current.scores;
        if score1 > score2 {
            info!("{team1} defeats {team2}, {score1} - {score2}");
        } else if score2 > score1 {
            info!("{team2} defeats {team1}, {score2} - {score1}");
        } else {
            info!("{team1} and {team2} tie, {score1} - {score2}");
        }
        if let Some([next1, next2]) = &current.next_match_teams {
            info!("next up: {next1} vs {next2}");
        }
    });

    match cli.source() {
        Source::Connect(address) => {
            let address = normalize_address(&address);
            info!(%address, "connecting to cabinet");
            stream.connect(&address).await?;
            info!("connected; ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            stream.disconnect().await;
        }
        Source::Replay(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read transcript {}", path.display()))?;
            let transcript = Transcript::parse(&text)?;
            let span = transcript.span();
            info!(
                records = transcript.len(),
                span_ms = span.as_millis() as u64,
                "replaying transcript"
            );
            stream.replay(&transcript);
            // Replay reports no completion; wait out the recorded span
            // plus a grace period for the last timers to fire.
            tokio::time::sleep(span + Duration::from_millis(250)).await;
        }
    }

    for (character, counters) in stats.snapshot() {
        info!(
            character = ?character,
            kills = counters.kills,
            deaths = counters.deaths,
            queen_kills = counters.queen_kills,
            "final standings"
        );
    }
    Ok(())
}

/// Cabinets are addressed as `ws://<host>:<port>`; a bare host:port gets
/// the scheme filled in.
fn normalize_address(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("ws://{address}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_addresses_get_the_websocket_scheme() {
        assert_eq!(normalize_address("kq.local:12749"), "ws://kq.local:12749");
        assert_eq!(normalize_address("ws://kq.local:12749"), "ws://kq.local:12749");
        assert_eq!(normalize_address("wss://kq.example"), "wss://kq.example");
    }
}
