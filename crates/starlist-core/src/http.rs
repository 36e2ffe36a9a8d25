use std::time::Duration;

use anyhow::Context;

use crate::rpc::{
  Transport,
  TransportResponse
};

const REQUEST_TIMEOUT: Duration =
  Duration::from_secs(15);

/// Native HTTP transport for the
/// terminal client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client
}

impl ReqwestTransport {
  pub fn new() -> anyhow::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!(
        "starlist/",
        env!("CARGO_PKG_VERSION")
      ))
      .build()
      .context(
        "failed to build http client"
      )?;
    Ok(Self {
      client
    })
  }
}

impl Transport for ReqwestTransport {
  #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
  async fn post_json(
    &self,
    url: &str,
    body: String
  ) -> anyhow::Result<TransportResponse> {
    let response = self
      .client
      .post(url)
      .header(
        reqwest::header::CONTENT_TYPE,
        "application/json"
      )
      .body(body)
      .send()
      .await
      .with_context(|| {
        format!("request to {url} failed")
      })?;

    let status = response.status().as_u16();
    let body =
      response.text().await.with_context(
        || {
          format!(
            "failed to read response from \
             {url}"
          )
        }
      )?;
    tracing::debug!(
      status,
      body_len = body.len(),
      "rpc response"
    );

    Ok(TransportResponse {
      status,
      body
    })
  }
}
