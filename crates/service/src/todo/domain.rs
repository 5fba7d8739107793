use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub content: String,
    pub completed: bool,
}

impl Todo {
    pub fn new(content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), content: content.into(), completed: false }
    }
}

/// Body of create and update requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoPayload {
    pub content: String,
}
