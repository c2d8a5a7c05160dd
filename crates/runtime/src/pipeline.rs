//! The shared decode path.
//!
//! Live traffic and replayed transcripts run through the same steps:
//! mirror the raw line, decode the envelope, answer keepalives, look the
//! key up in the parser table, fan the typed event out.

use std::time::{SystemTime, UNIX_EPOCH};

use kq_protocol::{EventRegistry, frame};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::dispatcher::Dispatcher;
use crate::sink::TrafficSink;

/// Decode → registry → dispatch, shared by every traffic source.
pub struct Pipeline {
    registry: EventRegistry,
    dispatcher: Dispatcher,
    sink: Option<Box<dyn TrafficSink>>,
    // Keepalive replies go here while a live connection is attached.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl Pipeline {
    pub fn new(sink: Option<Box<dyn TrafficSink>>) -> Pipeline {
        Pipeline {
            registry: EventRegistry::builtin(),
            dispatcher: Dispatcher::new(),
            sink,
            outbound: Mutex::new(None),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Attaches the channel keepalive replies are written to. The live
    /// connection owns the other end; replay runs with none attached.
    pub fn attach_outbound(&self, sender: mpsc::UnboundedSender<String>) {
        *self.outbound.lock() = Some(sender);
    }

    pub fn detach_outbound(&self) {
        *self.outbound.lock() = None;
    }

    /// Runs one raw line of cabinet traffic through the pipeline.
    ///
    /// The line is mirrored to the sink — timestamped, and regardless of
    /// whether it decodes — before anything else happens, so a recorded
    /// transcript always captures exactly what arrived.
    pub fn process_message(&self, message: &str) {
        if let Some(sink) = &self.sink {
            sink.write_line(&format!("{},{}", receipt_millis(), message));
        }

        let frame = match frame::decode(message) {
            Ok(frame) => frame,
            Err(_) => {
                warn!(line = message, "could not parse message");
                return;
            }
        };

        if frame.key == frame::KEEPALIVE_KEY {
            self.answer_keepalive();
            return;
        }

        match self.registry.parse(frame.key, frame.raw_value) {
            Some(event) => self.dispatcher.publish(&event),
            // Unknown keys are the extension point for traffic we choose
            // not to support; dropping them is not a fault.
            None => trace!(key = frame.key, "ignoring unrecognized event key"),
        }
    }

    fn answer_keepalive(&self) {
        match &*self.outbound.lock() {
            Some(sender) => {
                if sender.send(frame::keepalive_reply()).is_err() {
                    warn!("keepalive reply dropped: connection is gone");
                }
            }
            None => trace!("keepalive received with no transport attached"),
        }
    }
}

fn receipt_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kq_protocol::{EventKind, GameEvent};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemorySink {
        lines: Mutex<Vec<String>>,
    }

    impl MemorySink {
        fn new() -> Arc<MemorySink> {
            Arc::new(MemorySink {
                lines: Mutex::new(Vec::new()),
            })
        }
    }

    impl TrafficSink for Arc<MemorySink> {
        fn write_line(&self, line: &str) {
            self.lines.lock().push(line.to_string());
        }
    }

    #[test]
    fn dispatches_known_events() {
        let pipeline = Pipeline::new(None);
        let kills = Arc::new(AtomicUsize::new(0));
        let kills_inner = Arc::clone(&kills);
        pipeline.dispatcher().subscribe(EventKind::PlayerKill, move |event| {
            assert!(matches!(event, GameEvent::PlayerKill(_)));
            kills_inner.fetch_add(1, Ordering::SeqCst);
        });

        pipeline.process_message("![k[playerKill],v[12,34,2,1]]!");

        assert_eq!(kills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_lines_reach_no_listener() {
        let pipeline = Pipeline::new(None);
        let calls = Arc::new(AtomicUsize::new(0));
        for kind in [
            EventKind::PlayerNames,
            EventKind::PlayerKill,
            EventKind::CurrentMatch,
            EventKind::NextMatch,
        ] {
            let calls = Arc::clone(&calls);
            pipeline
                .dispatcher()
                .subscribe(kind, move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                });
        }

        pipeline.process_message("not a frame");
        pipeline.process_message("![k[playerKill]]!");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_keys_are_dropped_silently() {
        let pipeline = Pipeline::new(None);
        // No panic, no dispatch; nothing to observe beyond not crashing.
        pipeline.process_message("![k[gamestart],v[map_day]]!");
    }

    #[test]
    fn keepalive_is_answered_and_never_dispatched() {
        let pipeline = Pipeline::new(None);
        let calls = Arc::new(AtomicUsize::new(0));
        for kind in [
            EventKind::PlayerNames,
            EventKind::PlayerKill,
            EventKind::CurrentMatch,
            EventKind::NextMatch,
        ] {
            let calls = Arc::clone(&calls);
            pipeline
                .dispatcher()
                .subscribe(kind, move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                });
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        pipeline.attach_outbound(tx);

        pipeline.process_message("![k[alive],v[]]!");

        assert_eq!(rx.try_recv().unwrap(), "![k[im alive],v[]]!");
        assert!(rx.try_recv().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn keepalive_without_a_connection_is_dropped() {
        let pipeline = Pipeline::new(None);
        pipeline.process_message("![k[alive],v[]]!");
    }

    #[test]
    fn every_line_is_mirrored_before_decoding() {
        let sink = MemorySink::new();
        let pipeline = Pipeline::new(Some(Box::new(Arc::clone(&sink))));

        pipeline.process_message("![k[playerKill],v[1,2,3,4]]!");
        pipeline.process_message("garbage line");
        pipeline.process_message("![k[alive],v[]]!");

        let lines = sink.lines.lock();
        assert_eq!(lines.len(), 3);
        for (line, original) in lines.iter().zip([
            "![k[playerKill],v[1,2,3,4]]!",
            "garbage line",
            "![k[alive],v[]]!",
        ]) {
            let (timestamp, rest) = line.split_once(',').unwrap();
            assert!(timestamp.parse::<u64>().is_ok());
            assert_eq!(rest, original);
        }
    }
}
