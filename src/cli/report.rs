//! `zaptec-reporter report` subcommand

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Args;

use crate::context::RunContext;
use crate::services::date_normalizer::normalize;
use crate::services::{
    Aggregator, Dispatcher, EmailConfig, ReportRenderer, ReportTemplates, ZaptecClient,
};
use crate::types::{AggregatedUsage, GroupBy, InstallationReport, Result};

/// Generate a usage report
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Start date to cover in the report. Example: "2024-10" or "last month".
    /// Defaults to beginning of last month.
    #[arg(long, value_parser = parse_date_arg)]
    pub from_date: Option<NaiveDateTime>,

    /// End date to cover in the report. Example: "2025" or "next year".
    /// Defaults to beginning of this month.
    #[arg(long, value_parser = parse_date_arg)]
    pub to_date: Option<NaiveDateTime>,

    /// Excel output file. May contain template expressions,
    /// e.g. "usage-{{ Metadata.From.strftime('%Y-%m') }}.xlsx"
    #[arg(short = 'x', long, value_name = "PATH", required_unless_present = "email")]
    pub excelout: Option<String>,

    /// Email configuration file (.toml or .json)
    #[arg(short, long, value_name = "CONFIG")]
    pub email: Option<PathBuf>,

    /// Dimension to group usage by
    #[arg(long, value_enum, default_value_t = GroupBy::Charger)]
    pub group_by: GroupBy,

    /// Decimal places for energy values
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub precision: u8,

    /// IDs for the installations to collect usage from
    #[arg(required = true, num_args = 1..)]
    pub installations: Vec<String>,
}

impl ReportArgs {
    /// Load and validate the email config, if one was given
    pub fn load_email_config(&self) -> Result<Option<EmailConfig>> {
        self.email
            .as_deref()
            .map(EmailConfig::load)
            .transpose()
    }

    pub fn run(
        &self,
        ctx: &RunContext,
        client: &ZaptecClient,
        email: Option<&EmailConfig>,
    ) -> Result<()> {
        let from = match self.from_date {
            Some(date) => date,
            None => normalize("last month")?,
        };
        let to = match self.to_date {
            Some(date) => date,
            None => normalize("this month")?,
        };

        tracing::info!(
            "Collecting usage for {} installation(s) from {} to {}",
            self.installations.len(),
            from,
            to
        );

        let reports = self
            .installations
            .iter()
            .map(|id| client.fetch_installation_report(id, &from, &to, self.group_by))
            .collect::<Result<Vec<InstallationReport>>>()?;

        let usage = Aggregator::aggregate(&reports)?;
        let buffer = ReportRenderer::new(self.precision as usize).render(&usage)?;

        if let Some(template) = &self.excelout {
            write_report(ctx, &usage, template, &buffer)?;
        }

        if let Some(config) = email {
            send_report(ctx, config, &usage, &buffer)?;
        }

        Ok(())
    }
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDateTime, String> {
    normalize(s).map_err(|e| e.to_string())
}

/// Write the workbook to the rendered output path
fn write_report(
    ctx: &RunContext,
    usage: &AggregatedUsage,
    path_template: &str,
    buffer: &[u8],
) -> Result<PathBuf> {
    let path = PathBuf::from(ReportTemplates::new(usage).render(path_template)?);

    if ctx.dry_run {
        tracing::info!("Dry run: would write {} bytes to {}", buffer.len(), path.display());
    } else {
        fs::write(&path, buffer)?;
        tracing::info!("Wrote report to {}", path.display());
    }
    Ok(path)
}

fn send_report(
    ctx: &RunContext,
    config: &EmailConfig,
    usage: &AggregatedUsage,
    buffer: &[u8],
) -> Result<()> {
    let dispatcher = Dispatcher::new(config);

    if ctx.dry_run {
        let email = dispatcher.compose(usage, buffer)?;
        tracing::info!(
            "Dry run: would send {:?} to {} recipients",
            email.subject,
            email.recipient_count
        );
        return Ok(());
    }

    dispatcher.dispatch(usage, buffer)
}
