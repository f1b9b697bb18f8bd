use async_trait::async_trait;
use reqwest::{Client, Method, Response};

use super::{CatalogBackend, CatalogDocument};
use crate::config::TOKEN_ENV;
use crate::{ClipperError, Result};

/// Catalog stored as one JSON document behind a plain HTTP endpoint.
///
/// `OPTIONS url?t=token` checks the token, `GET url` reads, `PUT url?t=token` replaces.
pub struct HttpCatalogBackend {
    client: Client,
    url: String,
    token: String,
}

impl HttpCatalogBackend {
    pub fn new(url: &str, token: &str) -> Result<Self> {
        let parsed = crate::utils::validate_and_normalize_url(url)
            .map_err(|e| ClipperError::Validation(format!("Invalid catalog URL: {}", e)))?;

        let client = Client::builder()
            .user_agent(concat!("clipper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: parsed,
            token: token.to_string(),
        })
    }
}

/// Turn a non-success response into a `Remote` error carrying the body text
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    }
}

#[async_trait]
impl CatalogBackend for HttpCatalogBackend {
    async fn authorize(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(ClipperError::Auth(format!(
                "no token given, set {} or pass --token",
                TOKEN_ENV
            )));
        }
        tracing::debug!("Checking catalog token against {}", self.url);

        let response = self
            .client
            .request(Method::OPTIONS, &self.url)
            .query(&[("t", &self.token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClipperError::Auth(error_detail(response).await));
        }

        Ok(())
    }

    async fn fetch(&self) -> Result<CatalogDocument> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(ClipperError::Remote(format!(
                "Catalog download failed: {}",
                error_detail(response).await
            )));
        }

        let document = response
            .json::<CatalogDocument>()
            .await
            .map_err(|e| ClipperError::Remote(format!("Catalog is not valid JSON: {}", e)))?;

        Ok(document)
    }

    async fn push(&self, document: &CatalogDocument) -> Result<()> {
        tracing::debug!("Uploading catalog to {}", self.url);

        let response = self
            .client
            .put(&self.url)
            .query(&[("t", &self.token)])
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClipperError::Remote(format!(
                "Upload failed: {}",
                error_detail(response).await
            )));
        }

        Ok(())
    }
}
