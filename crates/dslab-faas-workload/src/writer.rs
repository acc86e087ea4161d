//! Line-delimited JSON output of merged events.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::merge::MergedEvent;

/// Writes each event as soon as it is produced, one JSON object per line.
pub struct TraceWriter<W: Write> {
    out: W,
    written: usize,
}

impl TraceWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_event(&mut self, event: &MergedEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes the output and returns the number of written records.
    pub fn finish(mut self) -> std::io::Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
