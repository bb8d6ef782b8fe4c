use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::models::{sort_lists, sort_todos, List, ListSummary, Todo};
use crate::session::Flash;

// Submits `.delete` forms in the background. Todo rows disappear on 204;
// other answers carry the page to go to next, either as a followed redirect
// or as the response text.
const DELETE_SCRIPT: &str = r#"
document.addEventListener("submit", async (event) => {
  const form = event.target;
  if (!form.classList.contains("delete")) return;
  event.preventDefault();
  if (!confirm("Are you sure? This cannot be undone!")) return;
  const response = await fetch(form.action, {
    method: "POST",
    headers: { "X-Requested-With": "XMLHttpRequest" },
  });
  if (response.status === 204) {
    form.closest("li").remove();
  } else if (response.redirected) {
    window.location = response.url;
  } else if (response.ok) {
    window.location = await response.text();
  }
});
"#;

// === Layout ===
pub fn layout(title: &str, flash: &Flash, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) " | Todos" }
                script src="https://cdn.tailwindcss.com" {}
                script { (PreEscaped(DELETE_SCRIPT)) }
            }
            body class="bg-gray-100 font-sans leading-normal tracking-normal" {
                div class="container mx-auto p-8" {
                    h1 class="text-4xl text-center text-gray-700 mb-6" {
                        a href="/lists" { "Todos" }
                    }
                    (flash_html(flash))
                    (content)
                }
            }
        }
    }
}

fn flash_html(flash: &Flash) -> Markup {
    html! {
        @if let Some(error) = &flash.error {
            div class="flash error bg-red-100 text-red-700 rounded p-2 mb-4" { (error) }
        }
        @if let Some(success) = &flash.success {
            div class="flash success bg-green-100 text-green-700 rounded p-2 mb-4" { (success) }
        }
    }
}

// === Components ===
fn list_row_html(list: &ListSummary) -> Markup {
    html! {
        li class={ "flex items-center bg-white rounded-lg shadow-lg my-2 py-2 px-4" @if list.is_complete() { " complete line-through" } } {
            a class="flex-grow" href={ "/lists/" (list.id.0) } {
                h2 { (list.name) }
                p class="text-sm text-gray-500" {
                    (list.todos_remaining_count) " / " (list.todos_count)
                }
            }
        }
    }
}

fn todo_html(list: &List, todo: &Todo) -> Markup {
    html! {
        li class={ "flex items-center bg-white rounded-lg shadow-lg my-2 py-2 px-4" @if todo.completed { " complete" } } {
            form class="flex-grow" action={ "/lists/" (list.id.0) "/todos/" (todo.id.0) } method="post" {
                input type="hidden" name="completed" value=(if todo.completed { "false" } else { "true" });
                button type="submit" class="mr-2" {
                    @if todo.completed { "☑" } @else { "☐" }
                }
                span class={@if todo.completed { "line-through" } @else { "" }} { (todo.name) }
            }
            form class="delete" action={ "/lists/" (list.id.0) "/todos/" (todo.id.0) "/delete" } method="post" {
                button class="bg-red-500 hover:bg-red-700 text-white font-bold py-1 px-2 rounded" type="submit" { "Delete" }
            }
        }
    }
}

// an input box to add a todo to the list
fn new_todo_html(list: &List, todo: &str) -> Markup {
    html! {
        form class="flex justify-between items-center mt-6" action={ "/lists/" (list.id.0) "/todos" } method="post" {
            input class="w-full rounded p-2 mr-4" type="text" name="todo" placeholder="Something to do" value=(todo);
            button class="bg-blue-500 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded" type="submit" { "Add" }
        }
    }
}

fn list_name_form_html(action: &str, list_name: &str, submit: &str) -> Markup {
    html! {
        form class="flex justify-between items-center" action=(action) method="post" {
            label class="mr-4" for="list_name" { "List name:" }
            input class="w-full rounded p-2 mr-4" id="list_name" type="text" name="list_name" value=(list_name);
            button class="bg-blue-500 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded" type="submit" { (submit) }
        }
    }
}

// === Pages ===
pub fn lists_page(flash: &Flash, lists: &[ListSummary]) -> Markup {
    layout(
        "All lists",
        flash,
        html! {
            ul id="lists" class="list-none p-0" {
                @for list in sort_lists(lists) {
                    (list_row_html(list))
                }
            }
            a class="text-blue-600" href="/lists/new" { "New list" }
        },
    )
}

pub fn new_list_page(flash: &Flash, list_name: &str) -> Markup {
    layout(
        "New list",
        flash,
        list_name_form_html("/lists", list_name, "Save"),
    )
}

pub fn list_page(flash: &Flash, list: &List, todo: &str) -> Markup {
    layout(
        &list.name,
        flash,
        html! {
            header class="flex justify-between items-center" {
                h2 class={ "text-2xl" @if list.is_complete() { " complete" } } { (list.name) }
                div class="flex" {
                    form action={ "/lists/" (list.id.0) "/complete_all" } method="post" {
                        button class="text-blue-600 mr-4" type="submit" { "Complete all" }
                    }
                    a class="text-blue-600" href={ "/lists/" (list.id.0) "/edit" } { "Edit list" }
                }
            }
            ul id="todos" class="list-none p-0" {
                @for todo in sort_todos(&list.todos) {
                    (todo_html(list, todo))
                }
            }
            (new_todo_html(list, todo))
        },
    )
}

pub fn edit_list_page(flash: &Flash, list: &List, list_name: &str) -> Markup {
    let action = format!("/lists/{}", list.id);
    layout(
        &format!("Editing {}", list.name),
        flash,
        html! {
            (list_name_form_html(&action, list_name, "Save"))
            form class="delete mt-6" action={ (action) "/delete" } method="post" {
                button class="bg-red-500 hover:bg-red-700 text-white font-bold py-1 px-2 rounded" type="submit" { "Delete list" }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListId, TodoId};

    fn groceries() -> List {
        List {
            id: ListId(3),
            name: "Groceries".to_string(),
            todos: vec![
                Todo {
                    id: TodoId(1),
                    name: "Milk".to_string(),
                    completed: true,
                },
                Todo::new(TodoId(2), "Eggs".to_string()),
            ],
        }
    }

    #[test]
    fn test_list_page_orders_incomplete_first() {
        let page = list_page(&Flash::default(), &groceries(), "").into_string();
        let eggs = page.find("Eggs").unwrap();
        let milk = page.find("Milk").unwrap();
        assert!(eggs < milk);
        assert!(page.contains(r#"action="/lists/3/todos/2/delete""#));
    }

    #[test]
    fn test_toggle_form_posts_inverted_status() {
        let page = list_page(&Flash::default(), &groceries(), "").into_string();
        assert!(page.contains(r#"name="completed" value="false""#));
        assert!(page.contains(r#"name="completed" value="true""#));
    }

    #[test]
    fn test_flash_and_input_are_rendered_escaped() {
        let flash = Flash {
            error: Some("The list name must be unique.".to_string()),
            success: None,
        };
        let page = new_list_page(&flash, "<b>Groceries</b>").into_string();
        assert!(page.contains("The list name must be unique."));
        assert!(page.contains("&lt;b&gt;Groceries&lt;/b&gt;"));
        assert!(!page.contains("<b>Groceries</b>"));
    }

    #[test]
    fn test_delete_script_follows_redirects() {
        let page = lists_page(&Flash::default(), &[]).into_string();
        let redirected = page.find("response.redirected").unwrap();
        let text = page.find("await response.text()").unwrap();
        assert!(redirected < text);
        assert!(page.contains("window.location = response.url"));
    }

    #[test]
    fn test_complete_list_is_marked() {
        let lists = vec![ListSummary {
            id: ListId(1),
            name: "Done".to_string(),
            todos_count: 2,
            todos_remaining_count: 0,
        }];
        let page = lists_page(&Flash::default(), &lists).into_string();
        assert!(page.contains("complete line-through"));
        assert!(page.contains("0 / 2"));
    }
}
