//! Line-oriented reporters for non-interactive mode.

use std::io::{self, Write};

use clap::ValueEnum;

use crate::monitor::SpeedUpdate;

/// Output format for `--plain` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `[timestamp] N lines/sec | avg lines/sec (Ns)`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// `timestamp,count,average` with a header row.
    Csv,
}

/// Writes one record per speed update.
#[derive(Debug)]
pub struct Reporter<W> {
    format: OutputFormat,
    writer: W,
    average_interval: u64,
    header_written: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, writer: W, average_interval: u64) -> Self {
        Self {
            format,
            writer,
            average_interval,
            header_written: false,
        }
    }

    /// Write one update and flush, so piped consumers see it immediately.
    pub fn report(&mut self, update: &SpeedUpdate) -> io::Result<()> {
        let m = &update.measurement;
        match self.format {
            OutputFormat::Text => writeln!(
                self.writer,
                "[{}] {} lines/sec | {:.2} lines/sec ({}s)",
                m.timestamp, m.count, update.average, self.average_interval
            )?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, update)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Csv => {
                if !self.header_written {
                    writeln!(self.writer, "timestamp,count,average")?;
                    self.header_written = true;
                }
                writeln!(self.writer, "{},{},{:.4}", m.timestamp, m.count, update.average)?;
            }
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::SpeedMeasurement;

    fn update(second: u32, count: usize, average: f64) -> SpeedUpdate {
        SpeedUpdate {
            measurement: SpeedMeasurement {
                timestamp: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, second)
                    .unwrap(),
                count,
            },
            average,
        }
    }

    fn render(format: OutputFormat, updates: &[SpeedUpdate]) -> String {
        let mut reporter = Reporter::new(format, Vec::new(), 60);
        for u in updates {
            reporter.report(u).unwrap();
        }
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_text_format() {
        let out = render(OutputFormat::Text, &[update(1, 12, 10.5)]);
        assert_eq!(out, "[2024-03-01 12:00:01] 12 lines/sec | 10.50 lines/sec (60s)\n");
    }

    #[test]
    fn test_csv_writes_header_once() {
        let out = render(OutputFormat::Csv, &[update(1, 3, 3.0), update(2, 5, 4.0)]);
        assert_eq!(
            out,
            "timestamp,count,average\n\
             2024-03-01 12:00:01,3,3.0000\n\
             2024-03-01 12:00:02,5,4.0000\n"
        );
    }

    #[test]
    fn test_json_lines() {
        let out = render(OutputFormat::Json, &[update(1, 3, 3.0), update(2, 5, 4.0)]);
        let lines: Vec<serde_json::Value> =
            out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["count"], 5);
        assert_eq!(lines[1]["average"], 4.0);
    }
}
