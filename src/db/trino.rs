//! Trino client over the REST statement protocol
//!
//! A statement is submitted with `POST /v1/statement`; the coordinator answers
//! with a page that may carry columns, data, an error and a `nextUri`. The
//! client follows `nextUri` until it disappears, which means the query has
//! finished.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::executor::{QueryResult, ResultRow, SqlExecutor, do_sql, statement_text};
use crate::config::{CLIENT_SOURCE, REQUEST_TIMEOUT};
use crate::credentials::TrinoConfig;
use crate::error::IngestError;

/// Failure reported by the coordinator for a submitted statement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Trino query {query_id} failed: {error_name} ({error_type}): {message}")]
pub struct TrinoQueryError {
    pub query_id: String,
    pub message: String,
    pub error_name: String,
    pub error_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementPage {
    id: String,
    next_uri: Option<String>,
    columns: Option<Vec<ColumnInfo>>,
    data: Option<Vec<ResultRow>>,
    error: Option<QueryErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct ColumnInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryErrorInfo {
    message: String,
    #[serde(default)]
    error_name: String,
    #[serde(default)]
    error_type: String,
}

/// Accumulates statement pages into a [`QueryResult`]
#[derive(Debug, Default)]
struct PageCollector {
    columns: Option<Vec<String>>,
    rows: Vec<ResultRow>,
}

impl PageCollector {
    /// Absorb one page, returning the URI of the next page if there is one
    fn absorb(&mut self, page: StatementPage) -> Result<Option<String>, TrinoQueryError> {
        if let Some(error) = page.error {
            return Err(TrinoQueryError {
                query_id: page.id,
                message: error.message,
                error_name: error.error_name,
                error_type: error.error_type,
            });
        }
        if let Some(columns) = page.columns
            && self.columns.is_none()
        {
            self.columns = Some(columns.into_iter().map(|c| c.name).collect());
        }
        if let Some(data) = page.data {
            self.rows.extend(data);
        }
        Ok(page.next_uri)
    }

    fn finish(self) -> QueryResult {
        match self.columns {
            Some(columns) => QueryResult {
                columns,
                rows: Some(self.rows),
            },
            None => QueryResult::empty(),
        }
    }
}

pub struct TrinoClient {
    http: reqwest::Client,
    statement_url: Url,
    user: String,
    password: String,
    host: String,
    port: u16,
    catalog: Option<String>,
    schema: Option<String>,
}

impl TrinoClient {
    /// Build a client; fails if `schema` is given without `catalog`
    pub fn new(config: &TrinoConfig, catalog: Option<&str>, schema: Option<&str>) -> Result<Self> {
        if schema.is_some() && catalog.is_none() {
            return Err(IngestError::SchemaWithoutCatalog.into());
        }

        let base = Url::parse(&format!(
            "{}://{}:{}/",
            config.http_scheme, config.host, config.port
        ))
        .with_context(|| format!("Invalid Trino host '{}'", config.host))?;
        let statement_url = base.join("v1/statement")?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            statement_url,
            user: config.user.clone(),
            password: config.password.clone(),
            host: config.host.clone(),
            port: config.port,
            catalog: catalog.map(str::to_string),
            schema: schema.map(str::to_string),
        })
    }

    /// `trino://user@host:port[/catalog[/schema]]`
    pub fn connect_string(&self) -> String {
        let mut s = format!("trino://{}@{}:{}", self.user, self.host, self.port);
        if let Some(catalog) = &self.catalog {
            s.push('/');
            s.push_str(catalog);
            if let Some(schema) = &self.schema {
                s.push('/');
                s.push_str(schema);
            }
        }
        s
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder
            .header("X-Trino-User", &self.user)
            .header("X-Trino-Source", CLIENT_SOURCE)
            .bearer_auth(&self.password);
        if let Some(catalog) = &self.catalog {
            builder = builder.header("X-Trino-Catalog", catalog);
        }
        if let Some(schema) = &self.schema {
            builder = builder.header("X-Trino-Schema", schema);
        }
        builder
    }

    async fn fetch_page(&self, builder: reqwest::RequestBuilder) -> Result<StatementPage> {
        let response = self
            .request(builder)
            .send()
            .await
            .context("Failed to reach Trino coordinator")?
            .error_for_status()
            .context("Trino coordinator rejected the request")?;
        response
            .json::<StatementPage>()
            .await
            .context("Failed to decode Trino statement response")
    }
}

#[async_trait]
impl SqlExecutor for TrinoClient {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let body = statement_text(sql);
        let mut page = self
            .fetch_page(self.http.post(self.statement_url.clone()).body(body))
            .await?;
        debug!(query_id = %page.id, "submitted statement");

        let mut collector = PageCollector::default();
        loop {
            let next = collector.absorb(page)?;
            let Some(next) = next else {
                break;
            };
            page = self.fetch_page(self.http.get(&next)).await?;
        }

        Ok(collector.finish())
    }
}

/// Connect to Trino and verify the connection with `select 1`
pub async fn attach_trino_engine(
    config: &TrinoConfig,
    catalog: Option<&str>,
    schema: Option<&str>,
    verbose: bool,
) -> Result<TrinoClient> {
    let client = TrinoClient::new(config, catalog, schema)?;
    if verbose {
        info!("connection string: {}", client.connect_string());
    }
    do_sql("select 1", &client, verbose)
        .await
        .with_context(|| format!("Failed to connect to {}", client.connect_string()))?;
    if verbose {
        info!("connected");
    }
    Ok(client)
}
