//! Connection and accessor configuration.

use crate::error::{Error, Result};
use crate::lazy::LazyConnection;
use serde::Deserialize;
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::Level;

/// Default `insert_many` batch limit.
pub const DEFAULT_INSERT_MANY_LIMIT: usize = 50;

/// Where and how to open a PostgreSQL connection.
///
/// Deserializable so hosts can embed it in their own config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// libpq-style connection string or `postgres://` URL.
    pub url: String,
    /// Give up on the initial handshake after this many seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout_secs: None,
        }
    }

    /// Read the connection string from `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::configuration("DATABASE_URL is not set"))?;
        Ok(Self::new(url))
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Open the connection and drive it on a background task.
    pub async fn connect(&self) -> Result<tokio_postgres::Client> {
        let connecting = tokio_postgres::connect(&self.url, NoTls);
        let (client, connection) = match self.connect_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), connecting)
                .await
                .map_err(|_| Error::storage(format!("connect timed out after {secs}s")))??,
            None => connecting.await?,
        };

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "rowsmith.connection", error = %e, "connection error");
            }
        });

        Ok(client)
    }

    /// A handle that connects on first use.
    pub fn lazy(self) -> LazyConnection<tokio_postgres::Client> {
        LazyConnection::new(move || {
            let config = self.clone();
            async move { config.connect().await }
        })
    }
}

/// Per-accessor behavior.
///
/// # Example
/// ```
/// use rowsmith::TableConfig;
///
/// let config = TableConfig::new().insert_many_limit(100).log_sql(true).no_truncate();
/// assert_eq!(config.insert_many_limit, 100);
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Largest batch `insert_many` accepts.
    pub insert_many_limit: usize,
    /// Log every statement, not only those with the debug option set.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Tracing event level for logged SQL.
    pub level: Level,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            insert_many_limit: DEFAULT_INSERT_MANY_LIMIT,
            log_sql: false,
            max_sql_length: Some(200),
            level: Level::DEBUG,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_many_limit(mut self, limit: usize) -> Self {
        self.insert_many_limit = limit;
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(sql.len());
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_config_defaults() {
        let config = TableConfig::default();
        assert_eq!(config.insert_many_limit, 50);
        assert!(!config.log_sql);
        assert_eq!(config.max_sql_length, Some(200));
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let config = TableConfig::new().max_sql_length(4);
        assert_eq!(config.truncate_sql("SELECT 1"), "SELE...");
        assert_eq!(config.truncate_sql("abc"), "abc");
        assert_eq!(config.truncate_sql("ab\u{e9}\u{e9}\u{e9}"), "ab\u{e9}...");
        assert_eq!(
            TableConfig::new().no_truncate().truncate_sql("SELECT 1"),
            "SELECT 1"
        );
    }

    #[test]
    fn connection_config_deserializes() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"url":"postgres://localhost/app","connect_timeout_secs":5}"#)
                .unwrap();
        assert_eq!(config.url, "postgres://localhost/app");
        assert_eq!(config.connect_timeout_secs, Some(5));

        let config: ConnectionConfig =
            serde_json::from_str(r#"{"url":"postgres://localhost/app"}"#).unwrap();
        assert_eq!(config.connect_timeout_secs, None);
    }
}
