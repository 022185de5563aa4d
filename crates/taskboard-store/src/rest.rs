use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder, Response, Url,
    header::{ACCEPT, CONTENT_RANGE},
};
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use crate::{Row, Rows, Select, Store, StoreConfig, StoreError};

const REST_PATH: &str = "rest/v1/";

/// [`Store`] backed by a PostgREST endpoint (`{url}/rest/v1/{table}`).
///
/// Every request carries the access key as `apikey` and as a bearer token.
/// Totals are requested with `Prefer: count=exact` and read back from the
/// `Content-Range` header.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    key: Arc<str>,
}

/// Error payload PostgREST sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), config)
    }

    /// Use a preconfigured client (proxies, timeouts, TLS roots).
    pub fn with_client(client: Client, config: &StoreConfig) -> Result<Self, StoreError> {
        let root = format!("{}/", config.url.trim_end_matches('/'));
        let base = Url::parse(&root)
            .and_then(|url| url.join(REST_PATH))
            .map_err(|e| StoreError::InvalidEndpoint(format!("{}: {}", config.url, e)))?;

        Ok(Self {
            client,
            base,
            key: Arc::from(config.key.as_str()),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.base
            .join(table)
            .map_err(|e| StoreError::InvalidEndpoint(format!("table {table}: {e}")))
    }

    fn row_url(&self, table: &str, id: &str) -> Result<Url, StoreError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.key.as_ref())
            .bearer_auth(self.key.as_ref())
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl Store for RestStore {
    #[instrument(level = "debug", skip(self, query), fields(table = %query.table))]
    async fn select(&self, query: &Select) -> Result<Rows, StoreError> {
        let mut url = self.table_url(&query.table)?;
        url.query_pairs_mut().extend_pairs(query.to_params());
        trace!(%url, "select");

        let mut request = self.request(Method::GET, url);
        if query.count.is_some() {
            request = request.header("Prefer", "count=exact");
        }

        let response = check(request.send().await?).await?;
        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total);
        let rows: Vec<Row> = response.json().await?;

        debug!(rows = rows.len(), count = ?count, "select completed");
        Ok(Rows { rows, count })
    }

    #[instrument(level = "debug", skip(self, row))]
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let url = self.table_url(table)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let rows: Vec<Row> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse(format!("insert into {table} returned no rows")))
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError> {
        let url = self.row_url(table, id)?;
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        let rows: Vec<Row> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let url = self.row_url(table, id)?;
        let response = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=minimal")
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(rejected(status.as_u16(), &body))
}

fn rejected(status: u16, body: &str) -> StoreError {
    let fallback = || format!("store returned status {status}");
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => StoreError::Rejected {
            status,
            code: err.code,
            message: err.message.unwrap_or_else(fallback),
        },
        Err(_) => StoreError::Rejected {
            status,
            code: None,
            message: if body.trim().is_empty() {
                fallback()
            } else {
                body.trim().to_string()
            },
        },
    }
}

/// Total from a `Content-Range` value such as `0-9/25`; `*` means unknown.
fn parse_total(content_range: &str) -> Option<usize> {
    let (_, total) = content_range.rsplit_once('/')?;
    total.trim().parse().ok()
}
