//! Generation and entry storage.
//!
//! A generation is created together with its entries in one transaction, so
//! a failed batch leaves no trace. Generations are only ever removed whole.

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response as stored in a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// Normalized request URL; also the lookup key.
    pub url: String,
    pub status_code: u16,
    /// Response headers in the order they were received.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of the fetch.
    pub fetched_at: String,
}

impl CapturedResponse {
    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Summary of one stored generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub created_at: String,
    pub entry_count: u64,
}

struct EntryRow {
    key: String,
    url: String,
    status_code: u16,
    headers_json: String,
    body: Vec<u8>,
    fetched_at: String,
}

impl CacheDb {
    /// Store a whole generation in one transaction.
    ///
    /// Creates the generation row if needed and writes every entry. Either all
    /// rows land or none do. Returns the number of entries written.
    pub async fn put_generation(&self, name: &str, entries: &[CapturedResponse]) -> Result<usize, Error> {
        let name = name.to_string();
        let rows = entries
            .iter()
            .map(|entry| {
                let headers_json =
                    serde_json::to_string(&entry.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                Ok(EntryRow {
                    key: compute_entry_key(&entry.url),
                    url: entry.url.clone(),
                    status_code: entry.status_code,
                    headers_json,
                    body: entry.body.clone(),
                    fetched_at: entry.fetched_at.clone(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&name, &created_at],
                )?;

                {
                    let mut stmt = tx.prepare(
                        "INSERT OR REPLACE INTO entries (
                        generation, key, url, status_code, headers_json, body, fetched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    )?;
                    for row in &rows {
                        stmt.execute(params![
                            &name,
                            &row.key,
                            &row.url,
                            row.status_code,
                            &row.headers_json,
                            &row.body,
                            &row.fetched_at,
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a stored response by normalized URL within one generation.
    ///
    /// Returns None if the generation or the entry doesn't exist.
    pub async fn match_entry(&self, generation: &str, url: &str) -> Result<Option<CapturedResponse>, Error> {
        let generation = generation.to_string();
        let key = compute_entry_key(url);
        self.conn
            .call(move |conn| -> Result<Option<CapturedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status_code, headers_json, body, fetched_at
                FROM entries WHERE generation = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![generation, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                });

                match result {
                    Ok((url, status_code, headers_json, body, fetched_at)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                        Ok(Some(CapturedResponse { url, status_code, headers, body, fetched_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stored generations, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All stored generations with their entry counts, oldest first.
    pub async fn generation_info(&self) -> Result<Vec<GenerationInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.created_at, COUNT(e.key)
                FROM generations g LEFT JOIN entries e ON e.generation = g.name
                GROUP BY g.name, g.created_at
                ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let info = stmt
                    .query_map([], |row| {
                        Ok(GenerationInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entry_count: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(info)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation with this name is stored.
    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no generation had this name.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![&name])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![&name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
