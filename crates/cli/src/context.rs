//! Per-invocation plumbing shared by the commands: settings, the region
//! roster, the authenticated client and capability checks.

use std::path::PathBuf;

use edm_client::{load_auth, AuthCredentials, DroughtClient};
use edm_config::Settings;
use edm_core::regions::RegionDataset;
use edm_core::{Ability, Actor, Subject};

use crate::exit_codes::*;
use crate::CliError;

pub struct Context {
    pub settings: Settings,
}

impl Context {
    /// Config file, then env, then `--regions`.
    pub fn load(regions: Option<PathBuf>) -> Result<Self, CliError> {
        let mut settings = Settings::load().map_err(|e| CliError {
            code: EXIT_CONFIG,
            message: e.to_string(),
            hint: Some(format!("fix or remove {}", Settings::config_path_display())),
        })?;
        if regions.is_some() {
            settings.regions = regions;
        }
        Ok(Self { settings })
    }

    pub fn regions(&self) -> Result<RegionDataset, CliError> {
        let path = self.settings.regions.as_ref().ok_or_else(|| CliError {
            code: EXIT_DATA_REGIONS,
            message: "no region dataset configured".into(),
            hint: Some(
                "pass --regions <path>, set EDM_REGIONS, or add `regions` to config.toml".into(),
            ),
        })?;
        let dataset = RegionDataset::from_path(path)?;
        log::debug!("{} regions from {}", dataset.regions().len(), path.display());
        Ok(dataset)
    }

    /// Roster when one is configured; review commands fall back to ids.
    pub fn regions_if_configured(&self) -> Result<Option<RegionDataset>, CliError> {
        match self.settings.regions {
            Some(_) => self.regions().map(Some),
            None => Ok(None),
        }
    }

    /// Unauthenticated client for the public map endpoints.
    pub fn public_client(&self) -> Result<DroughtClient, CliError> {
        Ok(DroughtClient::public(&self.settings.api_base)?)
    }

    pub fn session(&self) -> Result<Session, CliError> {
        let creds = load_auth().ok_or_else(|| CliError {
            code: EXIT_API_NOT_AUTH,
            message: "not logged in".into(),
            hint: Some("run `edm login` first".into()),
        })?;
        let client = DroughtClient::new(&creds)?;
        Ok(Session { client, creds })
    }
}

pub struct Session {
    pub client: DroughtClient,
    pub creds: AuthCredentials,
}

impl Session {
    pub fn actor(&self) -> Option<Actor> {
        self.creds.user_id.map(|id| Actor { id })
    }

    /// Refuse locally when the cached grants do not allow the action.
    pub fn require(&self, action: &str, subject: &Subject) -> Result<(), CliError> {
        let ability: Ability = self.creds.ability();
        let actor = self.actor();
        if ability.can(action, subject, "owner", actor.as_ref()) {
            return Ok(());
        }
        log::warn!("denied: {action} {}", subject.kind());
        Err(CliError {
            code: EXIT_API_FORBIDDEN,
            message: format!("your account may not {action} {}", subject.kind()),
            hint: Some("log in again if your role changed".into()),
        })
    }
}
