//! Persistence for lists and todos.
//!
//! A [`Backend`] is opened once at startup and hands out one [`Store`] per
//! request. The store is released when the request's [`Storage`] guard
//! drops, whatever path the handler took to return.

pub mod kv;
pub mod sql;

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use crate::config::StoreKind;
use crate::error::StoreResult;
use crate::models::{List, ListId, ListSummary, Todo, TodoId};

pub use kv::KvBackend;
pub use sql::SqlBackend;

pub trait Store {
    /// Every list with its todo counts, ordered by name.
    fn all_lists(&self) -> StoreResult<Vec<ListSummary>>;
    fn find_list(&self, id: ListId) -> StoreResult<Option<List>>;
    fn find_todos_for_list(&self, list_id: ListId) -> StoreResult<Vec<Todo>>;
    fn create_list(&self, name: &str) -> StoreResult<ListId>;
    /// Removes the list together with its todos.
    fn delete_list(&self, id: ListId) -> StoreResult<()>;
    fn rename_list(&self, id: ListId, name: &str) -> StoreResult<()>;
    fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<TodoId>;
    fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()>;
    fn set_todo_status(&self, list_id: ListId, todo_id: TodoId, completed: bool)
        -> StoreResult<()>;
    fn complete_all_todos(&self, list_id: ListId) -> StoreResult<()>;
    /// Releases the underlying connection. Safe to call more than once.
    fn disconnect(&mut self) -> StoreResult<()>;
}

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    fn connect(&self) -> StoreResult<Box<dyn Store + Send>>;
}

pub fn open_backend(kind: StoreKind, path: &Path) -> StoreResult<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match kind {
        StoreKind::Sqlite => Arc::new(SqlBackend::open(path)?),
        StoreKind::Sled => Arc::new(KvBackend::open(path)?),
        StoreKind::Memory => Arc::new(KvBackend::temporary()?),
    };
    tracing::info!(backend = backend.name(), path = %path.display(), "store opened");
    Ok(backend)
}

/// Request-scoped store handle; disconnects on drop.
pub struct Storage {
    store: Box<dyn Store + Send>,
}
impl Storage {
    pub fn connect(backend: &dyn Backend) -> StoreResult<Self> {
        let store = backend.connect()?;
        Ok(Self { store })
    }
}

impl Deref for Storage {
    type Target = dyn Store + Send;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Err(err) = self.store.disconnect() {
            tracing::warn!("failed to release store: {err}");
        }
    }
}
