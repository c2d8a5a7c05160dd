//! Raw traffic mirroring.

use std::io::{self, Write};

use parking_lot::Mutex;
use tracing::warn;

/// Write-only sink for mirrored cabinet traffic.
///
/// The pipeline hands every raw line — matched or not — to the sink as
/// `<receipt-millis>,<line>`, which is exactly the transcript format the
/// replay engine reads back. Implementations append the line terminator.
/// A failing sink must never disturb the pipeline.
pub trait TrafficSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// [`TrafficSink`] over any [`Write`], one line per record.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> WriterSink<W> {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> TrafficSink for WriterSink<W> {
    fn write_line(&self, line: &str) {
        if let Err(error) = self.try_write(line) {
            warn!(%error, "failed to mirror traffic line");
        }
    }
}

impl<W: Write + Send> WriterSink<W> {
    fn try_write(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}
