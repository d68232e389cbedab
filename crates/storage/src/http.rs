//! Remote worksheet store over HTTP.
//!
//! The service exposes each worksheet as a JSON document:
//! `GET {base}/worksheets/{name}` returns `{"rows": [...]}` (404 when the
//! worksheet does not exist) and `PUT` with the same body replaces it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::record::SheetRow;
use crate::repository::{SheetBackend, Storage, StorageError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize, Deserialize)]
struct TableBody {
    rows: Vec<SheetRow>,
}

#[derive(Debug, Serialize)]
struct TableBodyRef<'a> {
    rows: &'a [SheetRow],
}

/// Worksheets held by a remote table service.
#[derive(Clone)]
pub struct HttpSheet {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl HttpSheet {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(base: Url, api_key: Option<String>) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    /// Endpoint for `worksheet`, with the name percent-encoded as one path
    /// segment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the base URL cannot carry a path.
    pub fn worksheet_url(&self, worksheet: &str) -> Result<Url, StorageError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Connection(format!("invalid base url: {}", self.base)))?
            .pop_if_empty()
            .push("worksheets")
            .push(worksheet);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SheetBackend for HttpSheet {
    async fn read_table(&self, worksheet: &str) -> Result<Vec<SheetRow>, StorageError> {
        let url = self.worksheet_url(worksheet)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(conn)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound),
            status if status.is_success() => {
                let body: TableBody = response
                    .json()
                    .await
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(body.rows)
            }
            status => Err(StorageError::Connection(format!(
                "reading worksheet {worksheet} failed with HTTP {status}"
            ))),
        }
    }

    async fn write_table(&self, worksheet: &str, rows: &[SheetRow]) -> Result<(), StorageError> {
        let url = self.worksheet_url(worksheet)?;
        let response = self
            .authorize(self.client.put(url))
            .json(&TableBodyRef { rows })
            .send()
            .await
            .map_err(conn)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Connection(format!(
                "writing worksheet {worksheet} failed with HTTP {status}"
            )));
        }
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by a remote table service.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn http(base: Url, api_key: Option<String>, worksheet: &str) -> Result<Self, StorageError> {
        Ok(Self::from_backend(HttpSheet::new(base, api_key)?, worksheet))
    }
}
