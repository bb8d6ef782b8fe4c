use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::Markup;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{ListId, TodoId};
use crate::repository::Storage;
use crate::session::{Flash, Session};
use crate::validation::{validate_list_name, validate_todo_name};
use crate::views;
use crate::AppState;

const LIST_NOT_FOUND: &str = "The specified list was not found.";

#[async_trait]
impl FromRequestParts<AppState> for Storage {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        Ok(Storage::connect(state.backend())?)
    }
}

// === Requests ===
#[derive(Debug, Deserialize)]
pub struct ListPath {
    id: i64,
}
impl ListPath {
    fn list_id(&self) -> ListId {
        ListId(self.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct TodoPath {
    id: i64,
    todo_id: i64,
}
impl TodoPath {
    fn list_id(&self) -> ListId {
        ListId(self.id)
    }
    fn todo_id(&self) -> TodoId {
        TodoId(self.todo_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListNameForm {
    list_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoForm {
    todo: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoStatusForm {
    #[serde(default)]
    completed: String,
}

fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn list_url(id: ListId) -> String {
    format!("/lists/{id}")
}

async fn list_not_found(session: &Session) -> Response {
    session.flash_error(LIST_NOT_FOUND).await;
    Redirect::to("/lists").into_response()
}

// Background deletes get the next location as text instead of a redirect.
async fn list_not_found_xhr(session: &Session, headers: &HeaderMap) -> Response {
    if !is_xhr(headers) {
        return list_not_found(session).await;
    }
    session.flash_error(LIST_NOT_FOUND).await;
    "/lists".into_response()
}

// The form comes back with the error on top and the rejected input kept.
async fn invalid(session: &Session, error: String, page: impl FnOnce(&Flash) -> Markup) -> Response {
    let flash = Flash {
        error: Some(error),
        ..session.take_flash().await
    };
    (StatusCode::UNPROCESSABLE_ENTITY, page(&flash)).into_response()
}

// === Routes ===
pub async fn root() -> Redirect {
    Redirect::to("/lists")
}

pub async fn index(storage: Storage, session: Session) -> Result<Markup, AppError> {
    let lists = storage.all_lists()?;
    let flash = session.take_flash().await;
    Ok(views::lists_page(&flash, &lists))
}

pub async fn new_list(session: Session) -> Markup {
    let flash = session.take_flash().await;
    views::new_list_page(&flash, "")
}

pub async fn create_list(
    storage: Storage,
    session: Session,
    Form(ListNameForm { list_name }): Form<ListNameForm>,
) -> Result<Response, AppError> {
    let list_name = list_name.trim();
    let lists = storage.all_lists()?;
    if let Err(err) = validate_list_name(list_name, &lists) {
        let page = |flash: &Flash| views::new_list_page(flash, list_name);
        return Ok(invalid(&session, err.to_string(), page).await);
    }

    let id = storage.create_list(list_name)?;
    tracing::info!(list_id = id.0, "list created");
    session.flash_success("The list has been created.").await;
    Ok(Redirect::to("/lists").into_response())
}

pub async fn show_list(
    storage: Storage,
    session: Session,
    Path(path): Path<ListPath>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };
    let flash = session.take_flash().await;
    Ok(views::list_page(&flash, &list, "").into_response())
}

pub async fn edit_list(
    storage: Storage,
    session: Session,
    Path(path): Path<ListPath>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };
    let flash = session.take_flash().await;
    Ok(views::edit_list_page(&flash, &list, &list.name).into_response())
}

pub async fn rename_list(
    storage: Storage,
    session: Session,
    Path(path): Path<ListPath>,
    Form(ListNameForm { list_name }): Form<ListNameForm>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };

    let list_name = list_name.trim();
    let lists = storage.all_lists()?;
    if let Err(err) = validate_list_name(list_name, &lists) {
        let page = |flash: &Flash| views::edit_list_page(flash, &list, list_name);
        return Ok(invalid(&session, err.to_string(), page).await);
    }

    storage.rename_list(list.id, list_name)?;
    session.flash_success("The list has been updated.").await;
    Ok(Redirect::to(&list_url(list.id)).into_response())
}

pub async fn delete_list(
    storage: Storage,
    session: Session,
    headers: HeaderMap,
    Path(path): Path<ListPath>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found_xhr(&session, &headers).await);
    };

    storage.delete_list(list.id)?;
    session.flash_success("The list has been deleted.").await;
    if is_xhr(&headers) {
        Ok("/lists".into_response())
    } else {
        Ok(Redirect::to("/lists").into_response())
    }
}

pub async fn complete_all(
    storage: Storage,
    session: Session,
    Path(path): Path<ListPath>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };

    storage.complete_all_todos(list.id)?;
    session.flash_success("All items have been completed.").await;
    Ok(Redirect::to(&list_url(list.id)).into_response())
}

pub async fn create_todo(
    storage: Storage,
    session: Session,
    Path(path): Path<ListPath>,
    Form(TodoForm { todo }): Form<TodoForm>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };

    let todo = todo.trim();
    if let Err(err) = validate_todo_name(todo) {
        let page = |flash: &Flash| views::list_page(flash, &list, todo);
        return Ok(invalid(&session, err.to_string(), page).await);
    }

    storage.create_todo(list.id, todo)?;
    session.flash_success("The todo was added.").await;
    Ok(Redirect::to(&list_url(list.id)).into_response())
}

pub async fn set_todo_status(
    storage: Storage,
    session: Session,
    Path(path): Path<TodoPath>,
    Form(form): Form<TodoStatusForm>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found(&session).await);
    };

    let completed = form.completed == "true";
    storage.set_todo_status(list.id, path.todo_id(), completed)?;
    session.flash_success("The todo has been updated.").await;
    Ok(Redirect::to(&list_url(list.id)).into_response())
}

pub async fn delete_todo(
    storage: Storage,
    session: Session,
    headers: HeaderMap,
    Path(path): Path<TodoPath>,
) -> Result<Response, AppError> {
    let list = storage.find_list(path.list_id())?;
    let Some(list) = list else {
        return Ok(list_not_found_xhr(&session, &headers).await);
    };

    storage.delete_todo(list.id, path.todo_id())?;
    if is_xhr(&headers) {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    session.flash_success("List item deleted.").await;
    Ok(Redirect::to(&list_url(list.id)).into_response())
}
