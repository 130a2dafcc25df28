use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::contract::{FetchError, MediaFetcher};
use crate::playlist::check_status;

/// Plain HTTP GET of artwork and preview files.
pub struct HttpMediaFetcher {
    http: Client,
}

impl HttpMediaFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!(url, "[ENRICH] Fetching media");
        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}
