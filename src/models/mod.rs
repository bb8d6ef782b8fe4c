use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TodoId(pub i64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub name: String,
    pub completed: bool,
}
impl Todo {
    pub fn new(id: TodoId, name: String) -> Self {
        Self {
            id,
            name,
            completed: false,
        }
    }
}

/// A list with all of its todos resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub todos: Vec<Todo>,
}
impl List {
    pub fn todos_count(&self) -> usize {
        self.todos.len()
    }
    pub fn todos_remaining_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }
    pub fn is_complete(&self) -> bool {
        self.todos_count() > 0 && self.todos_remaining_count() == 0
    }
    pub fn summary(&self) -> ListSummary {
        ListSummary {
            id: self.id,
            name: self.name.clone(),
            todos_count: self.todos_count(),
            todos_remaining_count: self.todos_remaining_count(),
        }
    }
}

/// Row of the list index: a list without its todos, plus the counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub id: ListId,
    pub name: String,
    pub todos_count: usize,
    pub todos_remaining_count: usize,
}
impl ListSummary {
    pub fn is_complete(&self) -> bool {
        self.todos_count > 0 && self.todos_remaining_count == 0
    }
}

/// Incomplete lists first, then complete ones. Each group keeps its incoming order.
pub fn sort_lists(lists: &[ListSummary]) -> Vec<&ListSummary> {
    let (complete, incomplete): (Vec<_>, Vec<_>) = lists.iter().partition(|l| l.is_complete());
    incomplete.into_iter().chain(complete).collect()
}

/// Incomplete todos first, then completed ones. Stable within each group.
pub fn sort_todos(todos: &[Todo]) -> Vec<&Todo> {
    let (complete, incomplete): (Vec<_>, Vec<_>) = todos.iter().partition(|t| t.completed);
    incomplete.into_iter().chain(complete).collect()
}

/// Next todo id for a list: one past both the largest live id and the
/// highest id ever issued, so deleted ids are never handed out again.
pub fn next_todo_id<'a>(todos: impl IntoIterator<Item = &'a Todo>, last_issued: i64) -> TodoId {
    let max = todos
        .into_iter()
        .map(|todo| todo.id.0)
        .max()
        .unwrap_or(0);
    TodoId(max.max(last_issued) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: i64, completed: bool) -> Todo {
        Todo {
            id: TodoId(id),
            name: format!("todo {id}"),
            completed,
        }
    }

    fn summary(name: &str, count: usize, remaining: usize) -> ListSummary {
        ListSummary {
            id: ListId(0),
            name: name.to_string(),
            todos_count: count,
            todos_remaining_count: remaining,
        }
    }

    #[test]
    fn test_new_todo_is_incomplete() {
        let todo = Todo::new(TodoId(1), "Milk".to_string());
        assert!(!todo.completed);
    }

    #[test]
    fn test_empty_list_is_not_complete() {
        let list = List {
            id: ListId(1),
            name: "Empty".to_string(),
            todos: vec![],
        };
        assert!(!list.is_complete());
        assert!(!list.summary().is_complete());
    }

    #[test]
    fn test_list_counts() {
        let list = List {
            id: ListId(1),
            name: "Groceries".to_string(),
            todos: vec![todo(1, true), todo(2, false)],
        };
        assert_eq!(list.todos_count(), 2);
        assert_eq!(list.todos_remaining_count(), 1);
        assert!(!list.is_complete());

        let done = List {
            todos: vec![todo(1, true), todo(2, true)],
            ..list
        };
        assert!(done.is_complete());
        let summary = done.summary();
        assert_eq!(summary.todos_count, 2);
        assert_eq!(summary.todos_remaining_count, 0);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_sort_lists_puts_complete_last() {
        let lists = vec![
            summary("a", 1, 0),
            summary("b", 0, 0),
            summary("c", 2, 1),
            summary("d", 3, 0),
        ];
        let names: Vec<_> = sort_lists(&lists).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_sort_todos_puts_completed_last() {
        let todos = vec![todo(1, true), todo(2, false), todo(3, true), todo(4, false)];
        let ids: Vec<_> = sort_todos(&todos).iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_next_todo_id() {
        assert_eq!(next_todo_id(std::iter::empty(), 0), TodoId(1));
        assert_eq!(next_todo_id(&[todo(2, false), todo(5, true)], 0), TodoId(6));
        // the highest issued id was deleted
        assert_eq!(next_todo_id(&[todo(2, false)], 3), TodoId(4));
    }
}
