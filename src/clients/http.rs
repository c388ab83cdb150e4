//! HTTP client used for the object existence check.

use crate::{clients::store::STORE_REQUEST_TIMEOUT, errors::StoreResult};
use async_trait::async_trait;

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET to `url` and return the response status code.
    async fn get_status(&self, url: &str) -> StoreResult<u16>;
}

#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(STORE_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get_status(&self, url: &str) -> StoreResult<u16> {
        let resp = self.client.get(url).send().await?;
        Ok(resp.status().as_u16())
    }
}
