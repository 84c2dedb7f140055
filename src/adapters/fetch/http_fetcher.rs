use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_CHARSET, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use tracing::warn;

use crate::application::ports::MediaFetcherPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Descarga HTTP con cabeceras de navegador de escritorio, para que los
/// servidores que bloquean bots ingenuos sirvan la imagen.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new() -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .build()
            .map_err(|e| DomainError::OperationFailed(format!("cliente HTTP: {e}")))?;
        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_2)"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("ISO-8859-1,utf-8;q=0.7,*;q=0.3"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("none"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[async_trait]
impl MediaFetcherPort for HttpMediaFetcher {
    async fn fetch(&self, url: &url::Url) -> DomainResult<Vec<u8>> {
        let fetch_err = |e: reqwest::Error| DomainError::Fetch { url: url.to_string(), reason: e.to_string() };

        let res = self.client.get(url.clone()).send().await.map_err(fetch_err)?;
        let status = res.status();
        if !status.is_success() {
            // El cuerpo se guarda igualmente; el filtro de formato decide después
            warn!("⚠️ {} respondió {}", url, status);
        }
        let body = res.bytes().await.map_err(fetch_err)?;
        Ok(body.to_vec())
    }
}
