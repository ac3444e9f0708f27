//! Persisted user preferences.
//!
//! Holds the site's light/dark theme choice under a single key.

use std::fmt;
use std::str::FromStr;

use super::connection::CacheDb;
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    /// Pick the effective theme.
    ///
    /// A saved choice always wins; otherwise follow the system preference.
    pub fn resolve(saved: Option<ThemeMode>, system_prefers_dark: bool) -> ThemeMode {
        match saved {
            Some(mode) => mode,
            None if system_prefers_dark => ThemeMode::Dark,
            None => ThemeMode::Light,
        }
    }

    /// Class applied to the document root. Exactly one of the two is set.
    pub fn class_name(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for ThemeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(Error::InvalidInput(format!("unknown theme: {other}"))),
        }
    }
}

impl CacheDb {
    /// Get the saved theme, if any.
    ///
    /// An unrecognized stored value reads as unset.
    pub async fn get_theme(&self) -> Result<Option<ThemeMode>, Error> {
        let value = self
            .conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM preferences WHERE key = ?1",
                    params![THEME_KEY],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(v) => Ok(Some(v)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        Ok(value.and_then(|v| match v.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!("ignoring stored theme: {e}");
                None
            }
        }))
    }

    /// Save the theme choice, replacing any previous one.
    pub async fn set_theme(&self, mode: ThemeMode) -> Result<(), Error> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                    params![THEME_KEY, mode.class_name(), now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
