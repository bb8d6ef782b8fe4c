//! Relational store on SQLite.
//!
//! One connection per request. Foreign keys are switched on for every
//! connection so deleting a list takes its todos with it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use super::{Backend, Store};
use crate::db::schema::apply_migrations;
use crate::error::{StoreError, StoreResult};
use crate::models::{next_todo_id, List, ListId, ListSummary, Todo, TodoId};

const ALL_LISTS_SQL: &str = "SELECT list.id, list.name,
        COUNT(todo.id) AS todos_count,
        COUNT(NULLIF(todo.completed, 1)) AS todos_remaining_count
    FROM list
    LEFT JOIN todo ON todo.list_id = list.id
    GROUP BY list.id
    ORDER BY list.name;";

#[derive(Debug)]
pub struct SqlBackend {
    path: PathBuf,
}
impl SqlBackend {
    /// Opens (or creates) the database file and brings its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut conn = Connection::open(&path)?;
        apply_migrations(&mut conn)?;
        Ok(Self { path })
    }
}

impl Backend for SqlBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self) -> StoreResult<Box<dyn Store + Send>> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        tracing::debug!(path = %self.path.display(), "sqlite connection opened");
        Ok(Box::new(SqlStore { conn: Some(conn) }))
    }
}

pub struct SqlStore {
    conn: Option<Connection>,
}
impl SqlStore {
    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::Disconnected)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> StoreResult<usize> {
        tracing::info!(sql, ?params, "execute");
        let changed = self.conn()?.execute(sql, params_from_iter(params))?;
        Ok(changed)
    }

    fn last_todo_id(&self, list_id: ListId) -> StoreResult<Option<i64>> {
        let sql = "SELECT last_todo_id FROM list WHERE id = ?1;";
        tracing::debug!(sql, list_id = list_id.0, "query");
        let last = self
            .conn()?
            .query_row(sql, [list_id.0], |row| row.get(0))
            .optional()?;
        Ok(last)
    }
}

impl Store for SqlStore {
    fn all_lists(&self) -> StoreResult<Vec<ListSummary>> {
        tracing::debug!(sql = ALL_LISTS_SQL, "query");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(ALL_LISTS_SQL)?;
        let lists = stmt
            .query_map([], |row| {
                Ok(ListSummary {
                    id: ListId(row.get(0)?),
                    name: row.get(1)?,
                    todos_count: row.get(2)?,
                    todos_remaining_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    fn find_list(&self, id: ListId) -> StoreResult<Option<List>> {
        let sql = "SELECT id, name FROM list WHERE id = ?1;";
        tracing::debug!(sql, id = id.0, "query");
        let row = self
            .conn()?
            .query_row(sql, [id.0], |row| {
                Ok((ListId(row.get(0)?), row.get::<_, String>(1)?))
            })
            .optional()?;

        let Some((id, name)) = row else {
            return Ok(None);
        };
        let todos = self.find_todos_for_list(id)?;
        Ok(Some(List { id, name, todos }))
    }

    fn find_todos_for_list(&self, list_id: ListId) -> StoreResult<Vec<Todo>> {
        let sql = "SELECT id, name, completed FROM todo WHERE list_id = ?1 ORDER BY id;";
        tracing::debug!(sql, list_id = list_id.0, "query");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let todos = stmt
            .query_map([list_id.0], |row| {
                Ok(Todo {
                    id: TodoId(row.get(0)?),
                    name: row.get(1)?,
                    completed: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    fn create_list(&self, name: &str) -> StoreResult<ListId> {
        self.execute(
            "INSERT INTO list (name) VALUES (?1);",
            &[Value::from(name.to_string())],
        )?;
        Ok(ListId(self.conn()?.last_insert_rowid()))
    }

    fn delete_list(&self, id: ListId) -> StoreResult<()> {
        self.execute("DELETE FROM list WHERE id = ?1;", &[Value::from(id.0)])?;
        Ok(())
    }

    fn rename_list(&self, id: ListId, name: &str) -> StoreResult<()> {
        self.execute(
            "UPDATE list SET name = ?1 WHERE id = ?2;",
            &[Value::from(name.to_string()), Value::from(id.0)],
        )?;
        Ok(())
    }

    fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<TodoId> {
        let tx = self.conn()?.unchecked_transaction()?;
        let last = self
            .last_todo_id(list_id)?
            .ok_or(StoreError::ListNotFound(list_id))?;
        let id = next_todo_id(&self.find_todos_for_list(list_id)?, last);

        self.execute(
            "UPDATE list SET last_todo_id = ?1 WHERE id = ?2;",
            &[Value::from(id.0), Value::from(list_id.0)],
        )?;
        self.execute(
            "INSERT INTO todo (list_id, id, name) VALUES (?1, ?2, ?3);",
            &[
                Value::from(list_id.0),
                Value::from(id.0),
                Value::from(name.to_string()),
            ],
        )?;
        tx.commit()?;
        Ok(id)
    }

    fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()> {
        self.execute(
            "DELETE FROM todo WHERE id = ?1 AND list_id = ?2;",
            &[Value::from(todo_id.0), Value::from(list_id.0)],
        )?;
        Ok(())
    }

    fn set_todo_status(
        &self,
        list_id: ListId,
        todo_id: TodoId,
        completed: bool,
    ) -> StoreResult<()> {
        self.execute(
            "UPDATE todo SET completed = ?1 WHERE id = ?2 AND list_id = ?3;",
            &[
                Value::from(completed),
                Value::from(todo_id.0),
                Value::from(list_id.0),
            ],
        )?;
        Ok(())
    }

    fn complete_all_todos(&self, list_id: ListId) -> StoreResult<()> {
        self.execute(
            "UPDATE todo SET completed = 1 WHERE list_id = ?1;",
            &[Value::from(list_id.0)],
        )?;
        Ok(())
    }

    fn disconnect(&mut self) -> StoreResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| err)?;
            tracing::debug!("sqlite connection closed");
        }
        Ok(())
    }
}
