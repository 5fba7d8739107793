use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::storage::{get_json, set_json, KvStore};
use crate::todo::domain::Todo;

/// Store key holding the whole list.
pub const TODOS_KEY: &str = "all_todos";

/// Todo list manager.
///
/// Every mutation loads the full list, changes it in memory and writes it
/// back with one `set`. There is no versioning: concurrent writers race and
/// the last one wins.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn KvStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    async fn load(&self) -> Result<Vec<Todo>, ServiceError> {
        let todos = get_json::<Vec<Todo>>(self.store.as_ref(), TODOS_KEY).await?;
        Ok(todos.unwrap_or_default())
    }

    async fn save(&self, todos: &[Todo]) -> Result<(), ServiceError> {
        debug!(count = todos.len(), "saving todos");
        set_json(self.store.as_ref(), TODOS_KEY, todos).await
    }

    /// All todos in insertion order; empty when nothing was stored yet.
    pub async fn list(&self) -> Result<Vec<Todo>, ServiceError> {
        self.load().await
    }

    /// Append a new todo. Empty content is rejected before the store is touched.
    #[instrument(skip(self, content))]
    pub async fn add(&self, content: &str) -> Result<Todo, ServiceError> {
        if content.is_empty() {
            return Err(ServiceError::Validation("content for new todo can't be empty".into()));
        }
        let todo = Todo::new(content);
        let mut todos = self.load().await?;
        todos.push(todo.clone());
        self.save(&todos).await?;
        info!(id = %todo.id, "todo_added");
        Ok(todo)
    }

    /// Replace the content of the first todo with `id`. `Ok(None)` when there is no such todo.
    #[instrument(skip(self, content))]
    pub async fn update(&self, id: &str, content: &str) -> Result<Option<Todo>, ServiceError> {
        self.modify(id, |t| t.content = content.to_string()).await
    }

    /// Flip `completed` on the first todo with `id`. `Ok(None)` when there is no such todo.
    #[instrument(skip(self))]
    pub async fn toggle(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        self.modify(id, |t| t.completed = !t.completed).await
    }

    async fn modify<F>(&self, id: &str, f: F) -> Result<Option<Todo>, ServiceError>
    where
        F: FnOnce(&mut Todo),
    {
        let mut todos = self.load().await?;
        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        f(todo);
        let changed = todo.clone();
        self.save(&todos).await?;
        Ok(Some(changed))
    }

    /// Remove every todo with `id`; the list is only written back when something matched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let mut todos = self.load().await?;
        let before = todos.len();
        todos.retain(|t| t.id != id);
        if todos.len() == before {
            return Ok(false);
        }
        self.save(&todos).await?;
        info!(removed = before - todos.len(), "todo_deleted");
        Ok(true)
    }

    /// Drop completed todos and return the ones left.
    #[instrument(skip(self))]
    pub async fn delete_completed(&self) -> Result<Vec<Todo>, ServiceError> {
        let mut todos = self.load().await?;
        todos.retain(|t| !t.completed);
        self.save(&todos).await?;
        Ok(todos)
    }
}
