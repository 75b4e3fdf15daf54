//! `zaptec-reporter installations` subcommand

use clap::{Args, ValueEnum};
use serde::{Serialize, Serializer};

use crate::services::ZaptecClient;
use crate::types::{
    InstallationFilter, InstallationSummary, InstallationType, ReporterError, Result, UserRole,
};

/// Role filter accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    User,
    Owner,
    Maintainer,
    Administrator,
    Onboarding,
    DeviceAdministrator,
    PartnerAdministrator,
    Technical,
    InternalData,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => UserRole::USER,
            RoleArg::Owner => UserRole::OWNER,
            RoleArg::Maintainer => UserRole::MAINTAINER,
            RoleArg::Administrator => UserRole::ADMINISTRATOR,
            RoleArg::Onboarding => UserRole::ONBOARDING,
            RoleArg::DeviceAdministrator => UserRole::DEVICE_ADMINISTRATOR,
            RoleArg::PartnerAdministrator => UserRole::PARTNER_ADMINISTRATOR,
            RoleArg::Technical => UserRole::TECHNICAL,
            RoleArg::InternalData => UserRole::INTERNAL_DATA,
        }
    }
}

/// List installations visible to the account
#[derive(Args, Debug, Default)]
pub struct InstallationsArgs {
    /// Role(s) to filter by; repeat to combine. Defaults to owner.
    #[arg(long = "role", value_enum)]
    pub roles: Vec<RoleArg>,

    /// Installation type to list
    #[arg(long, value_enum, default_value_t = InstallationType::Pro)]
    pub installation_type: InstallationType,

    /// Include disabled installations
    #[arg(long)]
    pub include_disabled: bool,

    /// Print as JSON instead of tab-separated lines
    #[arg(long)]
    pub json: bool,
}

impl InstallationsArgs {
    pub fn filter(&self) -> InstallationFilter {
        let roles = if self.roles.is_empty() {
            UserRole::OWNER
        } else {
            self.roles
                .iter()
                .fold(UserRole::NONE, |acc, &role| acc | UserRole::from(role))
        };

        InstallationFilter {
            roles,
            installation_type: self.installation_type,
            include_disabled: self.include_disabled,
        }
    }

    pub fn run(&self, client: &ZaptecClient) -> Result<()> {
        let filter = self.filter();
        tracing::debug!(roles = filter.roles.bits(), "listing installations");

        let installations = client.list_installations(&filter)?;
        if installations.is_empty() {
            tracing::info!("No installations found");
        }

        let output = format_listing(&installations, self.json)?;
        if !output.is_empty() {
            println!("{}", output);
        }
        Ok(())
    }
}

/// `name -> id` JSON object that keeps listing order
struct Listing<'a>(&'a [InstallationSummary]);

impl Serialize for Listing<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|i| (&i.name, &i.id)))
    }
}

/// Render either as `name<TAB>id` lines or a JSON object, in API order
fn format_listing(installations: &[InstallationSummary], json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(&Listing(installations))
            .map_err(|e| ReporterError::Parse(e.to_string()));
    }

    Ok(installations
        .iter()
        .map(|i| format!("{}\t{}", i.name, i.id))
        .collect::<Vec<_>>()
        .join("\n"))
}
