//! HTTP catalog client
//!
//! Speaks the graph server's HTTP transaction endpoint
//! (`POST /db/system/tx/commit`) with basic auth. Only catalog-level
//! statements go through here; bulk data never does.

use crate::catalog::api::{Catalog, HealthProbes, HeapUsage, PagecacheUsage, Probe};
use crate::catalog::CatalogError;
use crate::config::ServerConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl HttpCatalog {
    pub fn new(server: &ServerConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: server.base_url(),
            user: server.user.clone(),
            password: server.password.clone(),
        })
    }

    /// Run one statement in the system database, auto-committed
    async fn run(&self, statement: &str) -> Result<Vec<Vec<Value>>, CatalogError> {
        let url = format!("{}/db/system/tx/commit", self.base_url);
        let body = serde_json::json!({
            "statements": [{ "statement": statement }]
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let parsed: TxResponse = response.json().await.map_err(|e| {
            CatalogError::Malformed(format!("status {status}: {e}"))
        })?;

        if let Some(error) = parsed.errors.into_iter().next() {
            return Err(CatalogError::Api {
                code: error.code,
                message: error.message,
            });
        }

        let rows = parsed
            .results
            .into_iter()
            .next()
            .map(|result| result.data.into_iter().map(|r| r.row).collect())
            .unwrap_or_default();

        Ok(rows)
    }

    /// First column of every row, as strings
    async fn run_strings(&self, statement: &str) -> Result<Vec<String>, CatalogError> {
        let rows = self.run(statement).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect())
    }
}

// Identifiers cannot be bound as statement parameters; quote them instead.
// Backticks inside the name are doubled per the server's escaping rules.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn value_as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().map(|f| f as u64))
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        self.run("RETURN 1").await.map(|_| ())
    }

    async fn list_databases(&self) -> Result<Vec<String>, CatalogError> {
        self.run_strings(
            "SHOW DATABASES YIELD name WHERE name <> 'system' RETURN DISTINCT name",
        )
        .await
    }

    async fn list_aliases(&self) -> Result<BTreeMap<String, String>, CatalogError> {
        let rows = self
            .run("SHOW ALIASES FOR DATABASE YIELD name, database RETURN name, database")
            .await?;

        let mut aliases = BTreeMap::new();
        for row in rows {
            let (Some(name), Some(target)) = (
                row.first().and_then(|v| v.as_str()),
                row.get(1).and_then(|v| v.as_str()),
            ) else {
                return Err(CatalogError::Malformed(
                    "alias row without name/database columns".to_string(),
                ));
            };
            aliases.insert(name.to_string(), target.to_string());
        }
        Ok(aliases)
    }

    async fn set_alias(&self, alias: &str, target: &str) -> Result<(), CatalogError> {
        let statement = format!(
            "CREATE OR REPLACE ALIAS {} FOR DATABASE {}",
            quote_ident(alias),
            quote_ident(target)
        );
        self.run(&statement).await.map(|_| ())
    }

    async fn drop_alias(&self, alias: &str) -> Result<(), CatalogError> {
        let statement = format!("DROP ALIAS {} IF EXISTS FOR DATABASE", quote_ident(alias));
        self.run(&statement).await.map(|_| ())
    }

    async fn drop_database(&self, name: &str) -> Result<(), CatalogError> {
        let statement = format!("DROP DATABASE {} IF EXISTS", quote_ident(name));
        self.run(&statement).await.map(|_| ())
    }
}

#[async_trait]
impl HealthProbes for HttpCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        Catalog::ping(self).await
    }

    async fn count_databases(&self) -> Result<usize, CatalogError> {
        let rows = self
            .run("SHOW DATABASES YIELD name WHERE name <> 'system' RETURN count(DISTINCT name) AS count")
            .await?;

        rows.first()
            .and_then(|row| row.first())
            .and_then(value_as_u64)
            .map(|count| count as usize)
            .ok_or_else(|| CatalogError::Malformed("database count missing".to_string()))
    }

    async fn heap_usage(&self) -> Result<Probe<HeapUsage>, CatalogError> {
        // Only available where the server exposes the JVM memory bean;
        // a statement-level refusal means "no probe", not "unhealthy"
        let result = self
            .run(
                "CALL dbms.queryJmx('java.lang:type=Memory') YIELD attributes \
                 WITH attributes['HeapMemoryUsage'] AS heap \
                 RETURN heap.used AS used, heap.committed AS committed, heap.max AS max",
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(CatalogError::Api { .. }) => return Ok(Probe::Unavailable),
            Err(other) => return Err(other),
        };

        let Some(row) = rows.first() else {
            return Ok(Probe::Unavailable);
        };
        let (Some(used), Some(committed), Some(max)) = (
            row.first().and_then(value_as_u64),
            row.get(1).and_then(value_as_u64),
            row.get(2).and_then(value_as_u64),
        ) else {
            return Ok(Probe::Unavailable);
        };

        Ok(Probe::Available(HeapUsage {
            used,
            committed,
            available: max.saturating_sub(used),
        }))
    }

    async fn pagecache_usage(&self) -> Result<Probe<PagecacheUsage>, CatalogError> {
        // The page-cache bean's attribute layout varies between server
        // versions; anything unexpected is treated as no probe
        let result = self
            .run(
                "CALL dbms.queryJmx('org.neo4j:instance=kernel#0,name=Page cache') \
                 YIELD attributes \
                 RETURN attributes['BytesUsed'] AS used, attributes['BytesTotal'] AS max",
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(CatalogError::Api { .. }) => return Ok(Probe::Unavailable),
            Err(other) => return Err(other),
        };

        let Some(row) = rows.first() else {
            return Ok(Probe::Unavailable);
        };
        let (Some(used), Some(max)) = (
            row.first().and_then(value_as_u64),
            row.get(1).and_then(value_as_u64),
        ) else {
            return Ok(Probe::Unavailable);
        };

        Ok(Probe::Available(PagecacheUsage { used, max }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_plain_name() {
        assert_eq!(quote_ident("customer1-100"), "`customer1-100`");
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_value_as_u64_accepts_float_encoded_numbers() {
        assert_eq!(value_as_u64(&serde_json::json!(42)), Some(42));
        assert_eq!(value_as_u64(&serde_json::json!(42.0)), Some(42));
        assert_eq!(value_as_u64(&serde_json::json!("42")), None);
    }

    #[test]
    fn test_tx_response_parses_rows_and_errors() {
        let raw = r#"{
            "results": [{"columns": ["name"], "data": [{"row": ["t1-100"]}, {"row": ["t1-200"]}]}],
            "errors": []
        }"#;
        let parsed: TxResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.results[0].data.len(), 2);
        assert_eq!(parsed.results[0].data[0].row[0], "t1-100");

        let raw_err = r#"{
            "results": [],
            "errors": [{"code": "Neo.ClientError.Database.DatabaseNotFound", "message": "gone"}]
        }"#;
        let parsed_err: TxResponse = serde_json::from_str(raw_err).unwrap();
        assert_eq!(parsed_err.errors[0].code, "Neo.ClientError.Database.DatabaseNotFound");
    }
}
