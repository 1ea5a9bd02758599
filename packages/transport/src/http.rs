//! [`HttpTransport`] backed by `reqwest`.

use std::time::Duration;

use serde::Serialize;

use crate::{HttpTransport, TransportError};

/// Maximum length of the response body preview included in logs.
const BODY_PREVIEW_LEN: usize = 500;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Sends requests through a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the client cannot be built (e.g.
    /// the TLS backend fails to initialize).
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let response = self.client.get(url).query(query).send().await?;
        read_body(response).await
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<String, TransportError> {
        let response = self.client.post(url).json(body).send().await?;
        read_body(response).await
    }
}

/// Returns the body of a 2xx response, or [`TransportError::Status`].
async fn read_body(response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let url = response.url().to_string();

    if status.is_success() {
        return Ok(response.text().await?);
    }

    let body = response.text().await.unwrap_or_default();
    log::warn!(
        "HTTP {status} from {url}\n  body preview: {}",
        preview(&body)
    );

    Err(TransportError::Status {
        status: status.as_u16(),
        url,
    })
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
