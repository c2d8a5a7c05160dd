//! Replay engine for recorded transcripts.
//!
//! A transcript is what the traffic sink wrote during a live session:
//! `<unixMillis>,<frame text>` per line. Replaying re-runs every line
//! through the same pipeline as live traffic, at its original offset from
//! the first record.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;

/// One recorded frame, offset in milliseconds from the transcript's first
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    pub offset_millis: i64,
    pub frame_text: String,
}

/// A parsed transcript: an ordered sequence of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    records: Vec<ReplayRecord>,
}

impl Transcript {
    /// Parses transcript text.
    ///
    /// The first line's timestamp is the zero reference. Everything after
    /// a line's first comma is the frame text, kept verbatim — payloads
    /// like `playerKill` are themselves comma-separated. Empty lines
    /// (including the one a trailing newline produces) are skipped.
    pub fn parse(text: &str) -> Result<Transcript> {
        let mut records = Vec::new();
        let mut reference = None;
        for (index, line) in text.split('\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            let (timestamp, frame_text) =
                line.split_once(',').ok_or_else(|| Error::Transcript {
                    line: index + 1,
                    reason: "missing timestamp field".to_string(),
                })?;
            let timestamp: i64 = timestamp.trim().parse().map_err(|_| Error::Transcript {
                line: index + 1,
                reason: format!("invalid timestamp `{timestamp}`"),
            })?;
            let reference = *reference.get_or_insert(timestamp);
            records.push(ReplayRecord {
                offset_millis: timestamp - reference,
                frame_text: frame_text.to_string(),
            });
        }
        Ok(Transcript { records })
    }

    pub fn records(&self) -> &[ReplayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time from the reference to the last-scheduled record.
    ///
    /// Playback reports no completion, so callers that need to wait out a
    /// replay bound it with this.
    pub fn span(&self) -> Duration {
        let millis = self
            .records
            .iter()
            .map(|record| record.offset_millis.max(0))
            .max()
            .unwrap_or(0);
        Duration::from_millis(millis as u64)
    }
}

/// Re-emits a transcript through a [`Pipeline`] at its original relative
/// timing.
pub struct Replayer {
    pipeline: Arc<Pipeline>,
}

impl Replayer {
    pub fn new(pipeline: Arc<Pipeline>) -> Replayer {
        Replayer { pipeline }
    }

    /// Schedules every record for emission at its offset from now.
    ///
    /// Records get independent timers in file order and are not re-sorted:
    /// a transcript whose lines are out of order replays faithfully
    /// mis-scheduled, with offsets earlier than the reference firing
    /// immediately. Emission runs the full pipeline, keepalive handling
    /// and traffic mirroring included. Returns once everything is
    /// scheduled; an in-flight replay cannot be cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play(&self, transcript: &Transcript) {
        debug!(records = transcript.len(), "replaying transcript");
        for record in transcript.records() {
            let pipeline = Arc::clone(&self.pipeline);
            let delay = Duration::from_millis(record.offset_millis.max(0) as u64);
            let frame_text = record.frame_text.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                pipeline.process_message(&frame_text);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kq_protocol::EventKind;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    #[test]
    fn offsets_are_relative_to_the_first_record() {
        let transcript =
            Transcript::parse("1000,![k[alive],v[]]!\n1500,![k[playerKill],v[1,2,1,2]]!\n")
                .unwrap();
        let offsets: Vec<i64> = transcript
            .records()
            .iter()
            .map(|r| r.offset_millis)
            .collect();
        assert_eq!(offsets, vec![0, 500]);
        assert_eq!(transcript.span(), Duration::from_millis(500));
    }

    #[test]
    fn frame_text_keeps_embedded_commas() {
        let transcript = Transcript::parse("1000,![k[playerKill],v[12,34,2,1]]!").unwrap();
        assert_eq!(
            transcript.records()[0].frame_text,
            "![k[playerKill],v[12,34,2,1]]!"
        );
    }

    #[test]
    fn trailing_newline_is_not_a_record() {
        let with = Transcript::parse("1000,![k[alive],v[]]!\n").unwrap();
        let without = Transcript::parse("1000,![k[alive],v[]]!").unwrap();
        assert_eq!(with, without);
        assert_eq!(with.len(), 1);
    }

    #[test]
    fn out_of_order_lines_keep_negative_offsets() {
        let transcript =
            Transcript::parse("2000,![k[alive],v[]]!\n1000,![k[alive],v[]]!").unwrap();
        assert_eq!(transcript.records()[1].offset_millis, -1000);
        // Negative offsets do not stretch the span.
        assert_eq!(transcript.span(), Duration::ZERO);
    }

    #[test]
    fn bad_timestamps_are_parse_errors() {
        let error = Transcript::parse("1000,![k[alive],v[]]!\nsoon,![k[alive],v[]]!")
            .unwrap_err();
        match error {
            Error::Transcript { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(Transcript::parse("1000").is_err());
    }

    #[test]
    fn empty_input_is_an_empty_transcript() {
        let transcript = Transcript::parse("").unwrap();
        assert!(transcript.is_empty());
        assert_eq!(transcript.span(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn replays_at_recorded_offsets() {
        let pipeline = Arc::new(Pipeline::new(None));
        let start = Instant::now();
        let hits: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
        let hits_inner = Arc::clone(&hits);
        pipeline
            .dispatcher()
            .subscribe(EventKind::PlayerKill, move |_| {
                hits_inner.lock().push(start.elapsed());
            });

        let transcript = Transcript::parse(
            "1000,![k[playerKill],v[1,2,1,2]]!\n1500,![k[playerKill],v[3,4,2,1]]!\n",
        )
        .unwrap();
        Replayer::new(Arc::clone(&pipeline)).play(&transcript);

        tokio::time::sleep(Duration::from_millis(600)).await;

        let hits = hits.lock();
        assert_eq!(hits.len(), 2);
        assert!(hits[0] < Duration::from_millis(100), "first: {:?}", hits[0]);
        assert!(
            hits[1] >= Duration::from_millis(500),
            "second fired early: {:?}",
            hits[1]
        );
        assert!(hits[1] < Duration::from_millis(600), "second: {:?}", hits[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn replayed_keepalives_are_answered() {
        let pipeline = Arc::new(Pipeline::new(None));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        pipeline.attach_outbound(tx);

        let transcript =
            Transcript::parse("1000,![k[alive],v[]]!\n1500,![k[playerKill],v[1,2,1,2]]!\n")
                .unwrap();
        Replayer::new(Arc::clone(&pipeline)).play(&transcript);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(rx.try_recv().unwrap(), "![k[im alive],v[]]!");
        assert!(rx.try_recv().is_err());
    }
}
