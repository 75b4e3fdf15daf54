//! Zaptec Cloud API contract types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Role bitmask accepted by the installation listing (`Roles` query param).
///
/// Roles can be OR-ed together: `UserRole::OWNER | UserRole::MAINTAINER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserRole(u32);

impl UserRole {
    pub const NONE: Self = Self(0);
    pub const USER: Self = Self(1);
    pub const OWNER: Self = Self(1 << 1);
    pub const MAINTAINER: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const ONBOARDING: Self = Self(1 << 4);
    pub const DEVICE_ADMINISTRATOR: Self = Self(1 << 5);
    pub const PARTNER_ADMINISTRATOR: Self = Self(1 << 6);
    pub const TECHNICAL: Self = Self(1 << 7);
    pub const INTERNAL_DATA: Self = Self(1 << 8);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for UserRole {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for UserRole {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Installation type filter (`InstallationType` query param)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InstallationType {
    #[default]
    Pro,
    Smart,
    OcppNative,
}

impl InstallationType {
    pub fn code(self) -> u8 {
        match self {
            Self::Pro => 0,
            Self::Smart => 1,
            Self::OcppNative => 2,
        }
    }
}

/// Server-side grouping dimension for installation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GroupBy {
    User,
    #[default]
    Charger,
    ChargeCardName,
}

impl GroupBy {
    pub fn code(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Charger => 1,
            Self::ChargeCardName => 2,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "User",
            Self::Charger => "Charger",
            Self::ChargeCardName => "ChargeCardName",
        };
        f.write_str(name)
    }
}

/// Filters for the installation listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallationFilter {
    pub roles: UserRole,
    pub installation_type: InstallationType,
    pub include_disabled: bool,
}

impl Default for InstallationFilter {
    fn default() -> Self {
        Self {
            roles: UserRole::OWNER,
            installation_type: InstallationType::Pro,
            include_disabled: false,
        }
    }
}

/// Token endpoint response (only the field we use)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// One page of the installation listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstallationPage {
    pub pages: u32,
    pub data: Vec<InstallationSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstallationSummary {
    pub id: String,
    pub name: String,
}

/// Request body for the chargehistory installation report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationReportRequest<'a> {
    pub from_date: &'a str,
    pub end_date: &'a str,
    pub installation_id: &'a str,
    pub group_by: u8,
}

/// Per-installation usage report as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct InstallationReport {
    #[serde(default)]
    pub installation_id: Option<String>,
    pub installation_name: String,
    #[serde(default)]
    pub installation_address: Option<String>,
    #[serde(default)]
    pub installation_zip_code: Option<String>,
    #[serde(default)]
    pub installation_city: Option<String>,
    pub installation_time_zone: String,
    pub grouped_by: String,
    #[serde(rename = "Fromdate")]
    pub from_date: String,
    #[serde(rename = "Enddate")]
    pub end_date: String,
    #[serde(rename = "totalUserChargerReportModel", default)]
    pub entries: Vec<UsageEntry>,
}

/// One aggregated usage row within an installation report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageEntry {
    #[serde(rename = "GroupAsString")]
    pub group: String,
    /// kWh
    #[serde(rename = "TotalChargeSessionEnergy")]
    pub energy: f64,
    /// Fractional hours
    #[serde(rename = "TotalChargeSessionDuration")]
    pub duration_hours: f64,
    #[serde(rename = "TotalChargeSessionCount")]
    pub sessions: u64,
}
