//! Output sinks for perk assignments.

use perks_core::config::OutputFormat;
use perks_core::{PerkAssignment, PerkResult};
use std::io::Write;
use tracing::debug;

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    JsonLines(W),
}

/// Writes one row per assignment in the configured format. CSV leaves
/// undefined metrics empty, JSON Lines writes them as `null`.
pub struct AssignmentWriter<W: Write> {
    sink: Sink<W>,
    written: usize,
}

impl<W: Write> AssignmentWriter<W> {
    pub fn new(format: OutputFormat, writer: W) -> PerkResult<Self> {
        let sink = match format {
            OutputFormat::Csv => {
                let mut csv = csv::Writer::from_writer(writer);
                csv.write_record(PerkAssignment::COLUMNS)?;
                Sink::Csv(csv)
            }
            OutputFormat::JsonLines => Sink::JsonLines(writer),
        };
        Ok(Self { sink, written: 0 })
    }

    pub fn write(&mut self, assignment: &PerkAssignment) -> PerkResult<()> {
        match &mut self.sink {
            Sink::Csv(csv) => csv.write_record(assignment.to_record())?,
            Sink::JsonLines(out) => {
                serde_json::to_writer(&mut *out, assignment)?;
                out.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        assignments: impl IntoIterator<Item = &'a PerkAssignment>,
    ) -> PerkResult<usize> {
        let before = self.written;
        for assignment in assignments {
            self.write(assignment)?;
        }
        Ok(self.written - before)
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> PerkResult<W> {
        debug!(rows = self.written, "Output flushed");
        match self.sink {
            Sink::Csv(csv) => csv
                .into_inner()
                .map_err(|e| perks_core::PerkError::Io(e.into_error())),
            Sink::JsonLines(mut out) => {
                out.flush()?;
                Ok(out)
            }
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}
