//! Normalized usage types produced by the aggregator

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Column names following the group-dimension column, in sheet order
pub const USAGE_COLUMNS: [&str; 4] = ["Energy", "Duration", "Sessions", "Installation"];

/// One row of the merged usage table
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    /// Grouping dimension name taken from the report (e.g. "Charger", "User")
    pub dimension: String,
    /// Value within that dimension (e.g. "NP1")
    pub group: String,
    /// kWh, unrounded
    pub energy: f64,
    /// Pre-formatted duration (e.g. "11 days 15:01:43")
    pub duration: String,
    pub sessions: u64,
    pub installation: String,
}

/// Serializes as a map keyed by the dynamic dimension name, so templates can
/// address `item.Charger` or `item.User` depending on the report.
impl Serialize for UsageRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(&self.dimension, &self.group)?;
        map.serialize_entry("Energy", &self.energy)?;
        map.serialize_entry("Duration", &self.duration)?;
        map.serialize_entry("Sessions", &self.sessions)?;
        map.serialize_entry("Installation", &self.installation)?;
        map.end()
    }
}

/// Value of one metadata entry
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Timestamp(NaiveDateTime),
    Text(String),
}

/// Report-wide metadata, sourced from the first installation report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    pub generated: NaiveDateTime,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub timezone: String,
}

impl ReportMetadata {
    /// Key/value pairs in sheet order
    pub fn entries(&self) -> [(&'static str, MetadataValue); 4] {
        [
            ("Generated", MetadataValue::Timestamp(self.generated)),
            ("From", MetadataValue::Timestamp(self.from)),
            ("To", MetadataValue::Timestamp(self.to)),
            ("Timezone", MetadataValue::Text(self.timezone.clone())),
        ]
    }
}

/// Output of one aggregation: the merged rows and their metadata
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedUsage {
    pub rows: Vec<UsageRow>,
    pub metadata: ReportMetadata,
}

impl AggregatedUsage {
    /// Distinct dimension names in first-appearance order
    pub fn dimensions(&self) -> Vec<&str> {
        let mut dims: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !dims.contains(&row.dimension.as_str()) {
                dims.push(&row.dimension);
            }
        }
        dims
    }

    /// Header row: dimension column(s) followed by the fixed usage columns
    pub fn header(&self) -> Vec<&str> {
        let mut header = self.dimensions();
        header.extend(USAGE_COLUMNS);
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn row(dimension: &str, group: &str) -> UsageRow {
        UsageRow {
            dimension: dimension.to_string(),
            group: group.to_string(),
            energy: 1.5,
            duration: "0 days 01:00:00".to_string(),
            sessions: 1,
            installation: "A".to_string(),
        }
    }

    fn usage(rows: Vec<UsageRow>) -> AggregatedUsage {
        AggregatedUsage {
            rows,
            metadata: ReportMetadata {
                generated: ts(2025, 1, 2),
                from: ts(2024, 12, 1),
                to: ts(2025, 1, 1),
                timezone: "UTC".to_string(),
            },
        }
    }

    #[test]
    fn test_row_serializes_with_dynamic_key() {
        let json = serde_json::to_value(row("Charger", "NP1")).unwrap();
        assert_eq!(json["Charger"], "NP1");
        assert_eq!(json["Energy"], 1.5);
        assert_eq!(json["Duration"], "0 days 01:00:00");
        assert_eq!(json["Sessions"], 1);
        assert_eq!(json["Installation"], "A");
    }

    #[test]
    fn test_metadata_entries_order() {
        let keys: Vec<&str> = usage(vec![])
            .metadata
            .entries()
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(keys, vec!["Generated", "From", "To", "Timezone"]);
    }

    #[test]
    fn test_header_single_dimension() {
        let usage = usage(vec![row("Charger", "NP1"), row("Charger", "NP2")]);
        assert_eq!(
            usage.header(),
            vec!["Charger", "Energy", "Duration", "Sessions", "Installation"]
        );
    }

    #[test]
    fn test_header_mixed_dimensions_first_appearance() {
        let usage = usage(vec![
            row("User", "alice"),
            row("Charger", "NP1"),
            row("User", "bob"),
        ]);
        assert_eq!(usage.dimensions(), vec!["User", "Charger"]);
    }
}
