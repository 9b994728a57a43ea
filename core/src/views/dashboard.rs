//! Todo list screen.
//!
//! # Design
//! `DashboardView` keeps the last list fetched from the server plus purely
//! local state: the selection, an edit draft and the inline error. Every
//! mutation is followed by a reload, so the list always shows server truth,
//! including after a partially failed bulk delete.

use std::collections::BTreeSet;
use std::panic;
use std::thread;

use tracing::{info, warn};

use crate::api::TodoApi;
use crate::error::ApiError;
use crate::types::{NewTodo, Todo, TodoPatch};

use super::{Confirm, Outcome};

/// Most DELETE requests a bulk delete keeps in flight at once.
const MAX_IN_FLIGHT: usize = 8;

/// In-progress edit of a single todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// Todo list screen: the last fetched list plus selection and edit state.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub todos: Vec<Todo>,
    pub selected: BTreeSet<i64>,
    pub editing: Option<EditDraft>,
    pub error: Option<String>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the local list with the server's. Selected ids that no longer
    /// exist are dropped.
    pub fn load(&mut self, api: &TodoApi) -> Outcome {
        match api.list_todos() {
            Ok(todos) => {
                self.selected
                    .retain(|id| todos.iter().any(|todo| todo.id == *id));
                self.todos = todos;
                Outcome::Completed
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn add(&mut self, api: &TodoApi, title: &str, description: &str) -> Outcome {
        let title = title.trim();
        if title.is_empty() {
            self.error = Some("Title is required".to_string());
            return Outcome::Failed;
        }
        let input = NewTodo {
            title: title.to_string(),
            description: non_blank(description),
        };
        let result = api.create_todo(&input).map(|_| ());
        self.after_mutation(api, result)
    }

    /// Flip the completion flag of a loaded todo.
    pub fn toggle_complete(&mut self, api: &TodoApi, id: i64) -> Outcome {
        let Some(todo) = self.find(id) else {
            return self.unknown(id);
        };
        let patch = TodoPatch {
            completed: Some(!todo.completed),
            ..TodoPatch::default()
        };
        let result = api.update_todo(id, &patch).map(|_| ());
        self.after_mutation(api, result)
    }

    pub fn start_edit(&mut self, id: i64) -> Outcome {
        let Some(todo) = self.find(id) else {
            return self.unknown(id);
        };
        self.editing = Some(EditDraft {
            id,
            title: todo.title.clone(),
            description: todo.description.clone().unwrap_or_default(),
        });
        Outcome::Completed
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Send the draft's title and description. The draft is kept on failure
    /// so the user can retry.
    pub fn save_edit(&mut self, api: &TodoApi) -> Outcome {
        let Some(draft) = self.editing.clone() else {
            return Outcome::Skipped;
        };
        let title = draft.title.trim();
        if title.is_empty() {
            self.error = Some("Title is required".to_string());
            return Outcome::Failed;
        }
        let patch = TodoPatch {
            title: Some(title.to_string()),
            description: Some(draft.description.trim().to_string()),
            completed: None,
        };
        let result = api.update_todo(draft.id, &patch).map(|_| ());
        let outcome = self.after_mutation(api, result);
        if outcome != Outcome::Failed {
            self.editing = None;
        }
        outcome
    }

    pub fn toggle_select(&mut self, id: i64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.todos.iter().map(|todo| todo.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn delete(&mut self, api: &TodoApi, id: i64, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Delete this todo?") {
            return Outcome::Declined;
        }
        let result = api.delete_todo(id);
        self.selected.remove(&id);
        self.after_mutation(api, result)
    }

    /// Delete every selected todo, one request per id, up to
    /// `MAX_IN_FLIGHT` of them concurrently.
    pub fn delete_selected(&mut self, api: &TodoApi, confirm: &dyn Confirm) -> Outcome {
        if self.selected.is_empty() {
            return Outcome::Skipped;
        }
        let prompt = format!("Delete {} selected todo(s)?", self.selected.len());
        if !confirm.confirm(&prompt) {
            return Outcome::Declined;
        }
        let ids: Vec<i64> = self.selected.iter().copied().collect();
        self.delete_many(api, ids)
    }

    pub fn delete_all(&mut self, api: &TodoApi, confirm: &dyn Confirm) -> Outcome {
        if self.todos.is_empty() {
            return Outcome::Skipped;
        }
        if !confirm.confirm("Delete all todos?") {
            return Outcome::Declined;
        }
        let mut ids: Vec<i64> = self.todos.iter().map(|todo| todo.id).collect();
        ids.sort_unstable();
        self.delete_many(api, ids)
    }

    /// End the session. The local token is dropped even when the server call
    /// fails.
    pub fn logout(&mut self, api: &TodoApi, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Log out?") {
            return Outcome::Declined;
        }
        let result = api.logout();
        if let Err(e) = api.credentials().clear_token() {
            warn!(error = %e, "failed to clear token");
        }
        self.todos.clear();
        self.selected.clear();
        self.editing = None;
        match result {
            Ok(()) => {
                info!("logged out");
                self.error = None;
                Outcome::Completed
            }
            Err(e) => self.fail(e),
        }
    }

    fn delete_many(&mut self, api: &TodoApi, ids: Vec<i64>) -> Outcome {
        let mut results: Vec<(i64, Result<(), ApiError>)> = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_IN_FLIGHT) {
            results.extend(thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|&id| (id, scope.spawn(move || api.delete_todo(id))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(id, handle)| {
                        let result = handle
                            .join()
                            .unwrap_or_else(|payload| panic::resume_unwind(payload));
                        (id, result)
                    })
                    .collect::<Vec<_>>()
            }));
        }

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(requested = ids.len(), failed, "bulk delete finished");

        let first_error = results.into_iter().find_map(|(id, result)| {
            result.err().map(|e| {
                warn!(id, error = %e, "delete failed");
                e
            })
        });
        self.selected.clear();
        self.after_mutation(api, first_error.map_or(Ok(()), Err))
    }

    /// Reload after a mutation. A successful mutation always reloads; a
    /// failed one reloads too but its error wins over any reload error.
    fn after_mutation(&mut self, api: &TodoApi, result: Result<(), ApiError>) -> Outcome {
        match result {
            Ok(()) => {
                self.error = None;
                self.load(api)
            }
            Err(e) => {
                let message = e.to_string();
                self.load(api);
                self.error = Some(message);
                Outcome::Failed
            }
        }
    }

    fn find(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    fn unknown(&mut self, id: i64) -> Outcome {
        self.error = Some(format!("No todo with id {id} in the current list"));
        Outcome::Failed
    }

    fn fail(&mut self, err: ApiError) -> Outcome {
        self.error = Some(err.to_string());
        Outcome::Failed
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
