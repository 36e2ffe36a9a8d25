use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

/// A task as the backend reports it.
///
/// Field names follow the proto3 JSON
/// mapping. The server may omit
/// default values (`false`, `""`), so
/// every field defaults on decode.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  #[serde(default)]
  pub id:         String,
  #[serde(default)]
  pub text:       String,
  #[serde(default)]
  pub completed:  bool,
  #[serde(default)]
  pub favorite:   bool,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub due_at:     String
}

impl Task {
  pub fn has_due(&self) -> bool {
    !self.due_at.trim().is_empty()
  }
}

/// One field of a partial update.
///
/// `Keep` is left out of the request
/// entirely; `Set` is always sent, even
/// when it carries an empty value.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub enum PatchField<T> {
  Keep,
  Set(T)
}

impl<T> PatchField<T> {
  pub fn is_keep(&self) -> bool {
    matches!(self, Self::Keep)
  }

  pub fn as_set(&self) -> Option<&T> {
    match self {
      | Self::Keep => None,
      | Self::Set(value) => Some(value)
    }
  }
}

impl<T> Default for PatchField<T> {
  fn default() -> Self {
    Self::Keep
  }
}

impl<T: Serialize> Serialize
  for PatchField<T>
{
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match self {
      | Self::Keep => {
        serializer.serialize_none()
      }
      | Self::Set(value) => {
        value.serialize(serializer)
      }
    }
  }
}

impl<'de, T: Deserialize<'de>>
  Deserialize<'de> for PatchField<T>
{
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    T::deserialize(deserializer)
      .map(Self::Set)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct GetTasksRequest {}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct GetTasksResponse {
  #[serde(default)]
  pub tasks: Vec<Task>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct AddTaskRequest {
  pub text: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct AddTaskResponse {
  #[serde(default)]
  pub task: Option<Task>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
  pub id:        String,
  #[serde(
    default,
    skip_serializing_if = "PatchField::is_keep"
  )]
  pub completed: PatchField<bool>,
  #[serde(
    default,
    skip_serializing_if = "PatchField::is_keep"
  )]
  pub favorite:  PatchField<bool>,
  #[serde(
    default,
    skip_serializing_if = "PatchField::is_keep"
  )]
  pub due_at:    PatchField<String>
}

impl UpdateTaskRequest {
  pub fn new(
    id: impl Into<String>
  ) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  pub fn completed(
    mut self,
    completed: bool
  ) -> Self {
    self.completed =
      PatchField::Set(completed);
    self
  }

  pub fn favorite(
    mut self,
    favorite: bool
  ) -> Self {
    self.favorite =
      PatchField::Set(favorite);
    self
  }

  pub fn due_at(
    mut self,
    due_at: impl Into<String>
  ) -> Self {
    self.due_at =
      PatchField::Set(due_at.into());
    self
  }

  pub fn clear_due_at(self) -> Self {
    self.due_at(String::new())
  }

  pub fn is_empty(&self) -> bool {
    self.completed.is_keep()
      && self.favorite.is_keep()
      && self.due_at.is_keep()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct UpdateTaskResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub task:    Option<Task>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct DeleteTaskRequest {
  pub id: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct DeleteTaskResponse {
  #[serde(default)]
  pub success: bool
}

/// Error body of a failed Connect
/// unary call.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct ConnectErrorBody {
  #[serde(default)]
  pub code:    String,
  #[serde(default)]
  pub message: String
}
