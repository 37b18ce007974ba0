//! Start-up configuration resolved from the environment

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::constants::{DATA_DIR_NAME, DB_FILE_NAME, LOG_FILE_NAME};

pub const HOME_ENV: &str = "COURIER_HOME";
pub const MAX_IN_FLIGHT_ENV: &str = "COURIER_MAX_IN_FLIGHT";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    /// Cap on concurrent requests; `None` means unbounded
    pub max_in_flight: Option<usize>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
        let limit = std::env::var(MAX_IN_FLIGHT_ENV).ok();
        Self::resolve(home, dirs::home_dir(), limit.as_deref())
    }

    /// `explicit` wins over `<user_home>/.courier`, which wins over `./.courier`
    pub fn resolve(
        explicit: Option<PathBuf>,
        user_home: Option<PathBuf>,
        max_in_flight: Option<&str>,
    ) -> anyhow::Result<Self> {
        let data_dir = explicit
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| user_home.map(|h| h.join(DATA_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".").join(DATA_DIR_NAME));

        let max_in_flight = match max_in_flight.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let n: usize = raw
                    .parse()
                    .with_context(|| format!("{MAX_IN_FLIGHT_ENV} must be a positive integer, got {raw:?}"))?;
                anyhow::ensure!(n > 0, "{MAX_IN_FLIGHT_ENV} must be at least 1");
                Some(n)
            }
            None => None,
        };

        Ok(Config {
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
            max_in_flight,
        })
    }

    pub fn ensure_data_dir(&self) -> anyhow::Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating data directory {}", self.data_dir.display()))?;
        Ok(&self.data_dir)
    }
}
