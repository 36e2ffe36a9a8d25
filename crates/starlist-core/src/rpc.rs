//! Client side of the task service.
//!
//! The backend speaks the Connect
//! protocol: every unary call is a
//! `POST {base}/{service}/{Method}`
//! with a JSON body, answered with a
//! JSON message or a Connect error
//! body.

use anyhow::{
  Context,
  anyhow,
  bail
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use starlist_shared::{
  AddTaskRequest,
  AddTaskResponse,
  ConnectErrorBody,
  DeleteTaskRequest,
  DeleteTaskResponse,
  GetTasksRequest,
  GetTasksResponse,
  Task,
  UpdateTaskRequest,
  UpdateTaskResponse
};

use crate::config::BackendConfig;

/// The four calls the client relies on.
///
/// Futures are not required to be
/// `Send`: the whole client runs on a
/// single thread.
#[allow(async_fn_in_trait)]
pub trait TodoRpc {
  async fn get_tasks(
    &self
  ) -> anyhow::Result<Vec<Task>>;

  async fn add_task(
    &self,
    text: &str
  ) -> anyhow::Result<Task>;

  async fn update_task(
    &self,
    request: &UpdateTaskRequest
  ) -> anyhow::Result<Task>;

  async fn delete_task(
    &self,
    id: &str
  ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
  pub status: u16,
  pub body:   String
}

impl TransportResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Moves one JSON request body to a URL
/// and hands back the raw reply.
#[allow(async_fn_in_trait)]
pub trait Transport {
  async fn post_json(
    &self,
    url: &str,
    body: String
  ) -> anyhow::Result<TransportResponse>;
}

#[derive(Debug, Clone)]
pub struct ConnectClient<T> {
  transport: T,
  base_url:  String,
  service:   String
}

impl<T: Transport> ConnectClient<T> {
  pub fn new(
    transport: T,
    base_url: impl Into<String>,
    service: impl Into<String>
  ) -> Self {
    let base_url = base_url.into();
    Self {
      transport,
      base_url: base_url
        .trim_end_matches('/')
        .to_string(),
      service: service.into()
    }
  }

  pub fn from_config(
    transport: T,
    config: &BackendConfig
  ) -> Self {
    Self::new(
      transport,
      config.base_url.clone(),
      config.service.clone()
    )
  }

  pub fn method_url(
    &self,
    method: &str
  ) -> String {
    format!(
      "{}/{}/{}",
      self.base_url, self.service, method
    )
  }

  async fn call<Req, Resp>(
    &self,
    method: &str,
    request: &Req
  ) -> anyhow::Result<Resp>
  where
    Req: Serialize,
    Resp: DeserializeOwned
  {
    let url = self.method_url(method);
    let body = serde_json::to_string(
      request
    )
    .with_context(|| {
      format!(
        "failed to encode {method} \
         request"
      )
    })?;

    tracing::debug!(
      %url,
      body_len = body.len(),
      "sending rpc"
    );
    let response = self
      .transport
      .post_json(&url, body)
      .await
      .with_context(|| {
        format!("{method} call failed")
      })?;

    if !response.is_success() {
      return Err(connect_error(
        method, &response
      ));
    }

    let raw = if response
      .body
      .trim()
      .is_empty()
    {
      "{}"
    } else {
      response.body.as_str()
    };
    serde_json::from_str(raw)
      .with_context(|| {
        format!(
          "failed to decode {method} \
           response"
        )
      })
  }
}

fn connect_error(
  method: &str,
  response: &TransportResponse
) -> anyhow::Error {
  match serde_json::from_str::<
    ConnectErrorBody
  >(&response.body)
  {
    | Ok(error)
      if !error.code.is_empty() =>
    {
      anyhow!(
        "{method} failed with {} \
         (http {}): {}",
        error.code,
        response.status,
        error.message
      )
    }
    | _ => {
      anyhow!(
        "{method} failed with http {}",
        response.status
      )
    }
  }
}

impl<T: Transport> TodoRpc
  for ConnectClient<T>
{
  async fn get_tasks(
    &self
  ) -> anyhow::Result<Vec<Task>> {
    let response: GetTasksResponse = self
      .call(
        "GetTasks",
        &GetTasksRequest::default()
      )
      .await?;
    Ok(response.tasks)
  }

  async fn add_task(
    &self,
    text: &str
  ) -> anyhow::Result<Task> {
    let response: AddTaskResponse = self
      .call("AddTask", &AddTaskRequest {
        text: text.to_string()
      })
      .await?;
    response.task.ok_or_else(|| {
      anyhow!(
        "AddTask response carried no \
         task"
      )
    })
  }

  async fn update_task(
    &self,
    request: &UpdateTaskRequest
  ) -> anyhow::Result<Task> {
    let response: UpdateTaskResponse =
      self
        .call("UpdateTask", request)
        .await?;
    match (response.success, response.task)
    {
      | (true, Some(task)) => Ok(task),
      | _ => {
        bail!(
          "no task with id {}",
          request.id
        )
      }
    }
  }

  async fn delete_task(
    &self,
    id: &str
  ) -> anyhow::Result<()> {
    let response: DeleteTaskResponse =
      self
        .call(
          "DeleteTask",
          &DeleteTaskRequest {
            id: id.to_string()
          }
        )
        .await?;
    if !response.success {
      bail!("no task with id {id}");
    }
    Ok(())
  }
}
