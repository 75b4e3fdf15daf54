//! Spreadsheet renderer for usage reports
//!
//! Layout of the single "Report" sheet:
//! - rows 1-4: metadata key/value pairs (no header)
//! - row 5: blank
//! - row 6: column header
//! - row 7+: one row per usage row

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::types::{AggregatedUsage, MetadataValue, ReporterError, Result, UsageRow};

/// Sheet name for the rendered report
pub const SHEET_NAME: &str = "Report";

/// Number format applied to timestamp cells
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Decimal places used for energy cells unless configured otherwise
pub const DEFAULT_ENERGY_PRECISION: usize = 1;

/// Renders aggregated usage into an in-memory xlsx workbook
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    energy_precision: usize,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ENERGY_PRECISION)
    }
}

impl ReportRenderer {
    pub fn new(energy_precision: usize) -> Self {
        Self { energy_precision }
    }

    /// Render the dataset to xlsx bytes
    pub fn render(&self, usage: &AggregatedUsage) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let entries = usage.metadata.entries();
        for (row, (key, value)) in (0u32..).zip(entries.iter()) {
            worksheet.write_string(row, 0, *key)?;
            match value {
                MetadataValue::Timestamp(ts) => {
                    let cell = excel_datetime(ts)?;
                    worksheet.write_datetime_with_format(row, 1, &cell, &datetime_format)?;
                }
                MetadataValue::Text(text) => {
                    worksheet.write_string(row, 1, text.as_str())?;
                }
            }
        }

        if !usage.rows.is_empty() {
            let header_row = entries.len() as u32 + 1;
            let dimensions = usage.dimensions();

            for (col, name) in (0u16..).zip(usage.header()) {
                worksheet.write_string(header_row, col, name)?;
            }

            for (row, usage_row) in (header_row + 1..).zip(&usage.rows) {
                let dim_col = dimensions
                    .iter()
                    .position(|d| *d == usage_row.dimension)
                    .unwrap_or(0) as u16;
                let first_value_col = dimensions.len() as u16;
                self.write_usage_row(worksheet, row, dim_col, first_value_col, usage_row)?;
            }
        }

        worksheet.autofit();

        Ok(workbook.save_to_buffer()?)
    }

    fn write_usage_row(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        dim_col: u16,
        first_value_col: u16,
        usage_row: &UsageRow,
    ) -> Result<()> {
        worksheet.write_string(row, dim_col, usage_row.group.as_str())?;
        worksheet.write_number(row, first_value_col, self.round_energy(usage_row.energy))?;
        worksheet.write_string(row, first_value_col + 1, usage_row.duration.as_str())?;
        worksheet.write_number(row, first_value_col + 2, usage_row.sessions as f64)?;
        worksheet.write_string(row, first_value_col + 3, usage_row.installation.as_str())?;
        Ok(())
    }

    /// Round to the configured precision through decimal formatting, so the
    /// stored value matches what a `%.Nf` rendering would show.
    pub fn round_energy(&self, energy: f64) -> f64 {
        format!("{:.*}", self.energy_precision, energy)
            .parse()
            .unwrap_or(energy)
    }
}

fn excel_datetime(ts: &NaiveDateTime) -> Result<ExcelDateTime> {
    let year = u16::try_from(ts.year())
        .map_err(|_| ReporterError::Parse(format!("timestamp {} out of spreadsheet range", ts)))?;
    let datetime = ExcelDateTime::from_ymd(year, ts.month() as u8, ts.day() as u8)?.and_hms(
        ts.hour() as u16,
        ts.minute() as u8,
        ts.second(),
    )?;
    Ok(datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportMetadata;
    use calamine::{open_workbook_from_rs, Data, DataType, Range, Reader, Xlsx};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn row(
        dimension: &str,
        group: &str,
        energy: f64,
        duration: &str,
        sessions: u64,
        installation: &str,
    ) -> UsageRow {
        UsageRow {
            dimension: dimension.to_string(),
            group: group.to_string(),
            energy,
            duration: duration.to_string(),
            sessions,
            installation: installation.to_string(),
        }
    }

    fn two_installations() -> AggregatedUsage {
        AggregatedUsage {
            rows: vec![
                row("Charger", "NP1", 272.797, "11 days 15:01:43", 11, "Installation A"),
                row("Charger", "VP1", 43.114, "0 days 10:30:00", 2, "Installation B"),
            ],
            metadata: ReportMetadata {
                generated: NaiveDate::from_ymd_opt(2025, 1, 2)
                    .unwrap()
                    .and_hms_opt(8, 15, 30)
                    .unwrap(),
                from: ts(2024, 12, 1),
                to: ts(2025, 1, 1),
                timezone: "Central European Standard Time".to_string(),
            },
        }
    }

    fn read_back(buffer: Vec<u8>) -> Range<Data> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(buffer)).unwrap();
        workbook.worksheet_range(SHEET_NAME).unwrap()
    }

    fn cell(range: &Range<Data>, row: u32, col: u32) -> Data {
        range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
    }

    // ========== Layout ==========

    #[test]
    fn test_metadata_block() {
        let range = read_back(ReportRenderer::default().render(&two_installations()).unwrap());

        assert_eq!(cell(&range, 0, 0), Data::String("Generated".into()));
        assert_eq!(cell(&range, 1, 0), Data::String("From".into()));
        assert_eq!(cell(&range, 2, 0), Data::String("To".into()));
        assert_eq!(cell(&range, 3, 0), Data::String("Timezone".into()));

        assert_eq!(cell(&range, 1, 1).as_datetime(), Some(ts(2024, 12, 1)));
        assert_eq!(cell(&range, 2, 1).as_datetime(), Some(ts(2025, 1, 1)));
        assert_eq!(
            cell(&range, 3, 1),
            Data::String("Central European Standard Time".into())
        );
    }

    #[test]
    fn test_blank_separator_and_header() {
        let range = read_back(ReportRenderer::default().render(&two_installations()).unwrap());

        for col in 0..5 {
            assert_eq!(cell(&range, 4, col), Data::Empty);
        }
        let header: Vec<Data> = (0..5).map(|col| cell(&range, 5, col)).collect();
        assert_eq!(
            header,
            ["Charger", "Energy", "Duration", "Sessions", "Installation"]
                .iter()
                .map(|s| Data::String(s.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_data_rows_one_decimal() {
        let range = read_back(ReportRenderer::default().render(&two_installations()).unwrap());

        assert_eq!(cell(&range, 6, 0), Data::String("NP1".into()));
        assert_eq!(cell(&range, 6, 1), Data::Float(272.8));
        assert_eq!(cell(&range, 6, 2), Data::String("11 days 15:01:43".into()));
        assert_eq!(cell(&range, 6, 3), Data::Float(11.0));
        assert_eq!(cell(&range, 6, 4), Data::String("Installation A".into()));

        assert_eq!(cell(&range, 7, 0), Data::String("VP1".into()));
        assert_eq!(cell(&range, 7, 1), Data::Float(43.1));
        assert_eq!(cell(&range, 7, 2), Data::String("0 days 10:30:00".into()));
        assert_eq!(cell(&range, 7, 3), Data::Float(2.0));
        assert_eq!(cell(&range, 7, 4), Data::String("Installation B".into()));
    }

    #[test]
    fn test_data_rows_two_decimals() {
        let range = read_back(ReportRenderer::new(2).render(&two_installations()).unwrap());

        assert_eq!(cell(&range, 6, 1), Data::Float(272.8));
        assert_eq!(cell(&range, 7, 1), Data::Float(43.11));
    }

    #[test]
    fn test_no_rows_writes_metadata_only() {
        let mut usage = two_installations();
        usage.rows.clear();

        let range = read_back(ReportRenderer::default().render(&usage).unwrap());

        assert_eq!(cell(&range, 3, 0), Data::String("Timezone".into()));
        assert_eq!(cell(&range, 5, 0), Data::Empty);
    }

    #[test]
    fn test_mixed_dimensions_get_own_columns() {
        let mut usage = two_installations();
        usage.rows[1].dimension = "User".to_string();

        let range = read_back(ReportRenderer::default().render(&usage).unwrap());

        assert_eq!(cell(&range, 5, 0), Data::String("Charger".into()));
        assert_eq!(cell(&range, 5, 1), Data::String("User".into()));
        assert_eq!(cell(&range, 5, 2), Data::String("Energy".into()));
        assert_eq!(cell(&range, 6, 0), Data::String("NP1".into()));
        assert_eq!(cell(&range, 6, 1), Data::Empty);
        assert_eq!(cell(&range, 7, 0), Data::Empty);
        assert_eq!(cell(&range, 7, 1), Data::String("VP1".into()));
    }

    // ========== round_energy() ==========

    #[test]
    fn test_round_energy() {
        let one = ReportRenderer::new(1);
        assert!((one.round_energy(272.797) - 272.8).abs() < f64::EPSILON);
        assert!((one.round_energy(43.114) - 43.1).abs() < f64::EPSILON);
        // 0.25 is exact in binary: ties go to even
        assert!((one.round_energy(0.25) - 0.2).abs() < f64::EPSILON);

        let two = ReportRenderer::new(2);
        assert!((two.round_energy(43.114) - 43.11).abs() < f64::EPSILON);
    }
}
