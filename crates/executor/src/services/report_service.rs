use std::io::Write;

use common::models::{Sector, Snapshot, TickerOutcome, TimeRange};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportLine<'a> {
    Snapshot(&'a Snapshot),
    SectorMovement {
        sector: Sector,
        range: TimeRange,
        pct_change: f64,
    },
    Outcome(&'a TickerOutcome),
}

/// Writes the run as JSON lines, one record per snapshot, sector figure or ticker outcome.
pub struct ReportWriter<W: Write> {
    out: W,
    lines: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn snapshot(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.write_line(&ReportLine::Snapshot(snapshot))
    }

    pub fn sector_movement(
        &mut self,
        sector: Sector,
        range: TimeRange,
        pct_change: f64,
    ) -> anyhow::Result<()> {
        self.write_line(&ReportLine::SectorMovement {
            sector,
            range,
            pct_change,
        })
    }

    pub fn outcome(&mut self, outcome: &TickerOutcome) -> anyhow::Result<()> {
        self.write_line(&ReportLine::Outcome(outcome))
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(mut self) -> anyhow::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_line(&mut self, line: &ReportLine<'_>) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}
