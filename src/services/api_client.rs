//! Zaptec Cloud API client
//!
//! Blocking, one request at a time. Only the first page of the installation
//! listing is fetched.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::types::{
    GroupBy, InstallationFilter, InstallationPage, InstallationReport, InstallationReportRequest,
    InstallationSummary, ReporterError, Result, TokenResponse,
};

/// Production API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.zaptec.com";

const TOKEN_PATH: &str = "/oauth/token";
const INSTALLATIONS_PATH: &str = "/api/installation";
const INSTALLATION_REPORT_PATH: &str = "/api/chargehistory/installationreport";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Timestamp format sent in report requests
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Thin authenticated client for the endpoints the reporter needs
pub struct ZaptecClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ZaptecClient {
    /// Create a client against `base_url`, optionally with a pre-issued token
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// `Authorization` header value, if a token is set
    pub fn auth_header(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }

    /// OAuth2 password grant; stores the returned access token
    pub fn authorize(&mut self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::Auth {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let token: TokenResponse = response.json()?;
        self.access_token = Some(token.access_token);
        tracing::debug!("authorized as {}", username);
        Ok(())
    }

    /// List installations visible to the caller, in the order the API returns them
    pub fn list_installations(
        &self,
        filter: &InstallationFilter,
    ) -> Result<Vec<InstallationSummary>> {
        let params = [
            ("Roles", filter.roles.bits().to_string()),
            ("InstallationType", filter.installation_type.code().to_string()),
            ("ReturnIdNameOnly", true.to_string()),
            ("SortDescending", false.to_string()),
            ("IncludeDisabled", filter.include_disabled.to_string()),
        ];

        let request = self.client.get(self.url(INSTALLATIONS_PATH)).query(&params);
        let response = check_status(self.authorized(request).send()?)?;
        let page: InstallationPage = response.json()?;
        tracing::debug!(pages = page.pages, count = page.data.len(), "installation listing");

        if page.pages > 1 {
            tracing::warn!(
                "Some installations may not be shown (showing page 1 of {})",
                page.pages
            );
        }

        Ok(page.data)
    }

    /// Fetch the usage report for one installation and date range
    pub fn fetch_installation_report(
        &self,
        installation_id: &str,
        from: &NaiveDateTime,
        to: &NaiveDateTime,
        group_by: GroupBy,
    ) -> Result<InstallationReport> {
        let from_date = from.format(API_DATETIME_FORMAT).to_string();
        let end_date = to.format(API_DATETIME_FORMAT).to_string();
        let body = InstallationReportRequest {
            from_date: &from_date,
            end_date: &end_date,
            installation_id,
            group_by: group_by.code(),
        };
        tracing::debug!(?body, "requesting installation report");

        let request = self.client.post(self.url(INSTALLATION_REPORT_PATH)).json(&body);
        let response = check_status(self.authorized(request).send()?)?;

        let mut report: InstallationReport = response.json()?;
        tracing::debug!(
            installation = %report.installation_name,
            entries = report.entries.len(),
            "installation report received"
        );
        report.installation_id.get_or_insert_with(|| installation_id.to_string());
        Ok(report)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token when one is set
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_header() {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ReporterError::Api {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}
