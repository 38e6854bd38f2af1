//! Firebase Realtime Database REST backend.
//!
//! Every path maps to `<base_url>/<path>.json`. Reads use `GET`, full writes
//! `PUT`, partial writes `PATCH` and removals `DELETE`. When a token is
//! configured it is sent as the `auth` query parameter.
//!
//! The REST API does not report missing rows on `PATCH`/`DELETE` (a patch
//! creates the row, a delete of nothing succeeds), so this backend only
//! surfaces `NotFound` when the server itself answers 404.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::{split_path, DocumentStore};
use crate::config::StoreConfig;
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("join-board/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestStore {
    /// Create a backend for the database at `base_url`, without a timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None, None)
    }

    /// Create a backend from the `[store]` config section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            Error::InvalidConfig(
                "store.base_url is not set (use --store-url or JOIN_STORE_URL)".to_string(),
            )
        })?;
        Self::build(
            base_url,
            config.auth_token.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn build(base_url: String, auth_token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "store base url must be http(s): '{base_url}'"
            )));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| Error::InvalidConfig(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let response = request.send().await.map_err(|err| {
            warn!(%path, error = %err, "store request failed");
            Error::StoreUnavailable(format!("{path}: {err}"))
        })?;
        check_status(response, path).await
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = firebase_error_message(&body).unwrap_or(body);
    warn!(%path, %status, %detail, "store rejected request");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::PermissionDenied(format!("{path}: {detail}")))
        }
        StatusCode::NOT_FOUND => Err(Error::NotFound(path.to_string())),
        _ => Err(Error::StoreUnavailable(format!(
            "{path}: HTTP {status}: {detail}"
        ))),
    }
}

/// Firebase answers errors as `{"error": "..."}`.
fn firebase_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Flatten a table body into rows.
///
/// Tables come back as `null`, an object keyed by id, or (for numeric keys)
/// an array with `null` holes. Rows lacking an `id` field get their key.
pub(crate) fn rows_from_body(table: &str, body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, row)| with_key(row, key))
            .collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.is_null())
            .map(|(index, row)| with_key(row, index.to_string()))
            .collect()),
        other => Err(Error::StoreUnavailable(format!(
            "{table}: unexpected table body: {other}"
        ))),
    }
}

fn with_key(mut row: Value, key: String) -> Value {
    if let Some(fields) = row.as_object_mut() {
        fields.entry("id").or_insert(Value::String(key));
    }
    row
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get(&self, table: &str) -> Result<Vec<Value>> {
        split_path(table)?;
        debug!(%table, "GET");
        let response = self.send(self.request(Method::GET, table), table).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| Error::StoreUnavailable(format!("{table}: {err}")))?;
        rows_from_body(table, body)
    }

    async fn put(&self, path: &str, record: Value) -> Result<()> {
        split_path(path)?;
        debug!(%path, "PUT");
        self.send(self.request(Method::PUT, path).json(&record), path)
            .await?;
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> Result<()> {
        split_path(path)?;
        if !partial.is_object() {
            return Err(Error::InvalidArgument(format!(
                "expected an object for {path}"
            )));
        }
        debug!(%path, "PATCH");
        self.send(self.request(Method::PATCH, path).json(&partial), path)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        split_path(path)?;
        debug!(%path, "DELETE");
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }
}
