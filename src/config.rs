use std::path::PathBuf;

use crate::auth::AdminCredentials;
use crate::model::BusinessHours;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_ADMIN_EMAIL: &str = "admin@fades.local";
const DEFAULT_ADMIN_PASSWORD: &str = "fades";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub admin: AdminCredentials,
    pub metrics_port: Option<u16>,
    pub hours: BusinessHours,
}

impl Config {
    /// `FADES_DATA_DIR`, `FADES_ADMIN_EMAIL`, `FADES_ADMIN_PASSWORD`,
    /// `FADES_METRICS_PORT`. Unset or unparsable values use defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("FADES_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let email = lookup("FADES_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.into());
        let password = lookup("FADES_ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into());
        let metrics_port = lookup("FADES_METRICS_PORT").and_then(|s| s.parse().ok());

        Self {
            data_dir: PathBuf::from(data_dir),
            admin: AdminCredentials::new(email, password),
            metrics_port,
            hours: BusinessHours::standard(),
        }
    }
}
