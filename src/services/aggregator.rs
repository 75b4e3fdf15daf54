//! Aggregator service for merging installation reports

use chrono::{DateTime, Local, NaiveDateTime};

use super::duration::format_hours;
use crate::types::{
    AggregatedUsage, InstallationReport, ReportMetadata, ReporterError, Result, UsageRow,
};

/// Aggregator for merging per-installation reports into one usage table
pub struct Aggregator;

impl Aggregator {
    /// Merge reports in input order, stamping metadata with the current time
    pub fn aggregate(reports: &[InstallationReport]) -> Result<AggregatedUsage> {
        Self::aggregate_at(reports, Local::now().naive_local())
    }

    /// Merge reports in input order with an explicit generation timestamp.
    ///
    /// Rows keep report order, then entry order within each report.
    /// Metadata (range and timezone) comes from the first report only.
    pub fn aggregate_at(
        reports: &[InstallationReport],
        generated: NaiveDateTime,
    ) -> Result<AggregatedUsage> {
        let first = reports.first().ok_or(ReporterError::EmptyReportSet)?;

        let metadata = ReportMetadata {
            generated,
            from: parse_timestamp(&first.from_date)?,
            to: parse_timestamp(&first.end_date)?,
            timezone: first.installation_time_zone.clone(),
        };

        let rows = reports
            .iter()
            .flat_map(|report| {
                report.entries.iter().map(move |entry| UsageRow {
                    dimension: report.grouped_by.clone(),
                    group: entry.group.clone(),
                    energy: entry.energy,
                    duration: format_hours(entry.duration_hours),
                    sessions: entry.sessions,
                    installation: report.installation_name.clone(),
                })
            })
            .collect();

        Ok(AggregatedUsage { rows, metadata })
    }
}

/// Parse an API timestamp (`2024-12-01T00:00:00`, optionally with fraction
/// or UTC offset) into a naive wall-clock time.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.naive_local())
        .map_err(|e| ReporterError::Parse(format!("invalid timestamp {:?}: {}", value, e)))
}
