use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use cxo_protocol::{endpoints, GetObjectHeadersResponse, HASH_PARAM};
use cxo_types::{ContentHash, Object, ObjectHeader};

use crate::client::TrackerClient;
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};

/// Tracker client speaking JSON over HTTP.
pub struct HttpTrackerClient {
    base: Url,
    client: Client,
    config: TrackerConfig,
}

impl HttpTrackerClient {
    pub fn new(config: TrackerConfig) -> TrackerResult<Self> {
        let base = Url::parse(&config.address)
            .map_err(|e| TrackerError::InvalidUrl(format!("{}: {e}", config.address)))?;
        if base.cannot_be_a_base() {
            return Err(TrackerError::InvalidUrl(config.address.clone()));
        }
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            base,
            client,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", self.base.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> TrackerResult<T> {
        let response = self
            .with_retry(&url, || self.client.get(url.clone()).send())
            .await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| TrackerError::Decode(e.to_string()))
    }

    async fn with_retry<F, Fut>(&self, url: &Url, send: F) -> TrackerResult<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => TrackerError::Status {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                },
                Err(e) => TrackerError::Transport(e),
            };

            if attempt >= self.config.max_retries || !err.is_transient() {
                return Err(err);
            }
            attempt += 1;
            tracing::warn!(
                url = %url,
                attempt,
                max_retries = self.config.max_retries,
                error = %err,
                "tracker request failed, retrying"
            );
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    async fn fetch_headers(&self, hashes: &[ContentHash]) -> TrackerResult<Vec<ObjectHeader>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint(endpoints::OBJECT_HEADER);
        {
            let mut query = url.query_pairs_mut();
            for hash in hashes {
                query.append_pair(HASH_PARAM, hash.as_str());
            }
        }

        tracing::debug!(count = hashes.len(), "fetching header batch");
        let response: GetObjectHeadersResponse = self.get_json(url).await?;
        if response.object_headers.len() != hashes.len() {
            return Err(TrackerError::BatchMismatch {
                requested: hashes.len(),
                received: response.object_headers.len(),
            });
        }
        Ok(response.object_headers)
    }

    async fn fetch_object(&self, hash: &ContentHash) -> TrackerResult<Object> {
        let mut url = self.endpoint(endpoints::OBJECT);
        url.query_pairs_mut().append_pair(HASH_PARAM, hash.as_str());

        tracing::debug!(hash = %hash, "fetching object");
        let object: Object = match self.get_json(url).await {
            Err(TrackerError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(TrackerError::NotFound(hash.clone()))
            }
            other => other?,
        };
        object
            .verify_length()
            .map_err(|e| TrackerError::Decode(format!("object {hash}: {e}")))?;
        Ok(object)
    }
}
