//! Key-value store on sled.
//!
//! Each list is one record holding its todos, so removing the record is the
//! cascade. A temporary sled tree makes this the in-memory store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Backend, Store};
use crate::db::driver::Db;
use crate::error::{StoreError, StoreResult};
use crate::models::{next_todo_id, List, ListId, ListSummary, Todo, TodoId};

const LIST_PREFIX: &str = "list:";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListRecord {
    id: ListId,
    name: String,
    last_todo_id: i64,
    todos: Vec<Todo>,
}
impl ListRecord {
    fn into_list(self) -> List {
        List {
            id: self.id,
            name: self.name,
            todos: self.todos,
        }
    }
}

// Zero-padded so sled's byte ordering matches id ordering.
fn list_key(id: ListId) -> String {
    format!("{LIST_PREFIX}{:020}", id.0)
}

#[derive(Debug)]
pub struct KvBackend {
    db: Db,
    temporary: bool,
}
impl KvBackend {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            db: Db::open(path)?,
            temporary: false,
        })
    }
    pub fn temporary() -> StoreResult<Self> {
        Ok(Self {
            db: Db::temporary()?,
            temporary: true,
        })
    }
}

impl Backend for KvBackend {
    fn name(&self) -> &'static str {
        if self.temporary {
            "memory"
        } else {
            "sled"
        }
    }

    fn connect(&self) -> StoreResult<Box<dyn Store + Send>> {
        Ok(Box::new(KvStore {
            db: Some(self.db.clone()),
        }))
    }
}

pub struct KvStore {
    db: Option<Db>,
}
impl KvStore {
    fn db(&self) -> StoreResult<&Db> {
        self.db.as_ref().ok_or(StoreError::Disconnected)
    }

    fn load(&self, id: ListId) -> StoreResult<Option<ListRecord>> {
        self.db()?.get(list_key(id))
    }

    // Read-modify-write of one list record. Absent lists are left alone.
    fn update(&self, id: ListId, apply: impl FnOnce(&mut ListRecord)) -> StoreResult<()> {
        let Some(mut record) = self.load(id)? else {
            return Ok(());
        };
        apply(&mut record);
        self.db()?.insert(list_key(id), &record)
    }
}

impl Store for KvStore {
    fn all_lists(&self) -> StoreResult<Vec<ListSummary>> {
        tracing::debug!(op = "scan", prefix = LIST_PREFIX, "kv read");
        let mut lists = self
            .db()?
            .iter_prefix::<ListRecord>(LIST_PREFIX)
            .map(|record| record.map(|record| record.into_list().summary()))
            .collect::<StoreResult<Vec<_>>>()?;
        lists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lists)
    }

    fn find_list(&self, id: ListId) -> StoreResult<Option<List>> {
        tracing::debug!(op = "get", key = %list_key(id), "kv read");
        Ok(self.load(id)?.map(ListRecord::into_list))
    }

    fn find_todos_for_list(&self, list_id: ListId) -> StoreResult<Vec<Todo>> {
        tracing::debug!(op = "get", key = %list_key(list_id), "kv read");
        Ok(self
            .load(list_id)?
            .map(|record| record.todos)
            .unwrap_or_default())
    }

    fn create_list(&self, name: &str) -> StoreResult<ListId> {
        let db = self.db()?;
        let id = ListId(db.next_id()? as i64 + 1);
        tracing::info!(op = "insert", key = %list_key(id), name, "kv write");
        let record = ListRecord {
            id,
            name: name.to_string(),
            last_todo_id: 0,
            todos: Vec::new(),
        };
        db.insert(list_key(id), &record)?;
        Ok(id)
    }

    fn delete_list(&self, id: ListId) -> StoreResult<()> {
        tracing::info!(op = "remove", key = %list_key(id), "kv write");
        self.db()?.remove(list_key(id))?;
        Ok(())
    }

    fn rename_list(&self, id: ListId, name: &str) -> StoreResult<()> {
        tracing::info!(op = "rename_list", key = %list_key(id), name, "kv write");
        self.update(id, |record| record.name = name.to_string())
    }

    fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<TodoId> {
        let mut record = self
            .load(list_id)?
            .ok_or(StoreError::ListNotFound(list_id))?;
        let id = next_todo_id(&record.todos, record.last_todo_id);
        tracing::info!(
            op = "create_todo",
            key = %list_key(list_id),
            todo_id = id.0,
            name,
            "kv write"
        );
        record.last_todo_id = id.0;
        record.todos.push(Todo::new(id, name.to_string()));
        self.db()?.insert(list_key(list_id), &record)?;
        Ok(id)
    }

    fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()> {
        tracing::info!(
            op = "delete_todo",
            key = %list_key(list_id),
            todo_id = todo_id.0,
            "kv write"
        );
        self.update(list_id, |record| {
            record.todos.retain(|todo| todo.id != todo_id)
        })
    }

    fn set_todo_status(
        &self,
        list_id: ListId,
        todo_id: TodoId,
        completed: bool,
    ) -> StoreResult<()> {
        tracing::info!(
            op = "set_todo_status",
            key = %list_key(list_id),
            todo_id = todo_id.0,
            completed,
            "kv write"
        );
        self.update(list_id, |record| {
            if let Some(todo) = record.todos.iter_mut().find(|todo| todo.id == todo_id) {
                todo.completed = completed;
            }
        })
    }

    fn complete_all_todos(&self, list_id: ListId) -> StoreResult<()> {
        tracing::info!(op = "complete_all_todos", key = %list_key(list_id), "kv write");
        self.update(list_id, |record| {
            for todo in &mut record.todos {
                todo.completed = true;
            }
        })
    }

    fn disconnect(&mut self) -> StoreResult<()> {
        if let Some(db) = self.db.take() {
            db.flush()?;
            tracing::debug!("sled handle released");
        }
        Ok(())
    }
}
