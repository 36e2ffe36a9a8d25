use anyhow::anyhow;
use gloo::net::http::Request;
use starlist_core::config::BackendConfig;
use starlist_core::rpc::{
  ConnectClient,
  Transport,
  TransportResponse
};
use starlist_core::service::TaskService;

pub type BrowserTaskService =
  TaskService<ConnectClient<FetchTransport>>;

/// Sends RPC bodies with the browser's
/// `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
  async fn post_json(
    &self,
    url: &str,
    body: String
  ) -> anyhow::Result<TransportResponse> {
    let request = Request::post(url)
      .header(
        "Content-Type",
        "application/json"
      )
      .body(body)
      .map_err(|e| {
        anyhow!(
          "failed to build request: {e}"
        )
      })?;

    let response =
      request.send().await.map_err(|e| {
        anyhow!(
          "request to {url} failed: {e}"
        )
      })?;
    let status = response.status();
    let body =
      response.text().await.map_err(|e| {
        anyhow!(
          "failed to read response: {e}"
        )
      })?;

    tracing::debug!(
      url,
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

pub fn task_service(
  backend: &BackendConfig
) -> BrowserTaskService {
  tracing::info!(
    base_url = %backend.base_url,
    service = %backend.service,
    "connecting to task service"
  );
  TaskService::new(
    ConnectClient::from_config(
      FetchTransport,
      backend
    )
  )
}
