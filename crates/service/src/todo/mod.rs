//! Todo list kept as a single JSON array under one store key.

pub mod domain;
pub mod service;

pub use domain::{Todo, TodoPayload};
pub use service::{TodoService, TODOS_KEY};
