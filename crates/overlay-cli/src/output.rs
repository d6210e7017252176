//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use overlay_domain::{Collection, PeerRecord};
use overlay_janitor::SweepReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    #[default]
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format peer records grouped by collection.
    pub fn format_records(&self, records: &[(Collection, PeerRecord)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = records
                    .iter()
                    .map(|(collection, record)| {
                        serde_json::json!({
                            "collection": collection.as_str(),
                            "record": record,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.records_table(records)),
        }
    }

    fn records_table(&self, records: &[(Collection, PeerRecord)]) -> String {
        if records.is_empty() {
            return "No records found.".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(["Collection", "ID", "Address", "Down"]);

        for (collection, record) in records {
            builder.push_record([
                collection.as_str().to_string(),
                record.id.to_string(),
                record.address().unwrap_or("-").to_string(),
                record.down.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the result of a sweep.
    pub fn format_report(&self, report: &SweepReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let collections: Vec<serde_json::Value> = report
                    .collections
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "collection": r.collection.as_str(),
                            "fetched": r.fetched,
                            "skipped": r.skipped,
                            "healthy": r.healthy,
                            "unhealthy": r.unhealthy,
                            "invalid": r.invalid,
                            "timeouts": r.timeouts,
                            "decremented": r.decremented,
                            "incremented": r.incremented,
                            "evicted": r.evicted,
                            "write_failures": r.write_failures,
                            "fetch_error": r.fetch_error,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                    "dry_run": report.dry_run,
                    "collections": collections,
                }))?)
            }
            OutputFormat::Table => Ok(self.report_table(report)),
        }
    }

    fn report_table(&self, report: &SweepReport) -> String {
        let evicted = if report.dry_run {
            "Would Evict"
        } else {
            "Evicted"
        };

        let mut builder = Builder::default();
        builder.push_record([
            "Collection",
            "Records",
            "Healthy",
            "Unhealthy",
            "Skipped",
            evicted,
            "Errors",
        ]);

        for r in &report.collections {
            match &r.fetch_error {
                Some(e) => builder.push_record([
                    r.collection.as_str().to_string(),
                    format!("fetch failed: {}", e),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]),
                None => builder.push_record([
                    r.collection.as_str().to_string(),
                    r.fetched.to_string(),
                    r.healthy.to_string(),
                    r.unhealthy.to_string(),
                    r.skipped.to_string(),
                    r.evicted.to_string(),
                    (r.write_failures + r.panics).to_string(),
                ]),
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        if report.dry_run {
            format!(
                "{}\nDry run completed in {:?}; no records were changed",
                table, report.elapsed
            )
        } else {
            format!("{}\nCompleted in {:?}", table, report.elapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_janitor::CollectionReport;
    use std::time::Duration;

    fn records() -> Vec<(Collection, PeerRecord)> {
        vec![
            (Collection::Ship, PeerRecord::with_domain("1", "a.example.com").down(2)),
            (Collection::Slap, PeerRecord::default()),
        ]
    }

    fn report() -> SweepReport {
        let mut ship = CollectionReport::new(Collection::Ship);
        ship.fetched = 3;
        ship.healthy = 2;
        ship.unhealthy = 1;
        let mut slap = CollectionReport::new(Collection::Slap);
        slap.fetch_error = Some("locked".to_string());
        SweepReport {
            collections: vec![ship, slap],
            elapsed: Duration::from_millis(120),
            dry_run: false,
        }
    }

    #[test]
    fn test_records_table() {
        let output = Formatter::new(OutputFormat::Table)
            .format_records(&records())
            .unwrap();
        assert!(output.contains("Address"));
        assert!(output.contains("a.example.com"));
        assert!(output.contains("shipRecords"));
    }

    #[test]
    fn test_records_json() {
        let output = Formatter::new(OutputFormat::Json)
            .format_records(&records())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["collection"], "shipRecords");
        assert_eq!(value[0]["record"]["down"], 2);
    }

    #[test]
    fn test_empty_records() {
        let output = Formatter::new(OutputFormat::Table).format_records(&[]).unwrap();
        assert!(output.contains("No records found"));
    }

    #[test]
    fn test_report_formats() {
        let table = Formatter::new(OutputFormat::Table)
            .format_report(&report())
            .unwrap();
        assert!(table.contains("fetch failed: locked"));

        let json = Formatter::new(OutputFormat::Json)
            .format_report(&report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["elapsed_ms"], 120);
        assert_eq!(value["collections"][0]["healthy"], 2);
        assert_eq!(value["collections"][1]["fetch_error"], "locked");
        assert_eq!(value["dry_run"], false);
    }

    #[test]
    fn test_dry_run_report_is_labelled() {
        let report = SweepReport {
            dry_run: true,
            ..report()
        };

        let table = Formatter::new(OutputFormat::Table)
            .format_report(&report)
            .unwrap();
        assert!(table.contains("Would Evict"));
        assert!(table.contains("Dry run completed"));
        assert!(table.contains("no records were changed"));

        let json = Formatter::new(OutputFormat::Json)
            .format_report(&report)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dry_run"], true);
    }
}
