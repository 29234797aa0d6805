use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use super::render::{capitalize_words, sanitize_terminal};
use super::{TaskRow, ViewModel};
use crate::api::{ApiClient, ApiError, ApiResponse};
use crate::location::{Location, Page};
use crate::models::{AuthStatus, Task};

const SESSION_CHECK_FAILED: &str = "Could not verify session. Please try logging in.";

pub fn delete_prompt(row: &TaskRow) -> String {
    format!(
        "Are you sure you want to delete \"{}\"?",
        sanitize_terminal(&row.name)
    )
}

fn display_name(username: Option<&str>, capitalize: bool) -> String {
    match username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) if capitalize => capitalize_words(name),
        Some(name) => name.to_string(),
        None => "User".to_string(),
    }
}

fn message_or(err: &ApiError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Drives the main page: session status, the task list and the add/edit form.
///
/// Every operation catches its own errors and reports them through `view`.
/// A redirect from the gateway is left to whoever watches the `Location`.
pub struct TaskController {
    api: ApiClient,
    capitalize_names: bool,
    pub view: ViewModel,
}

impl TaskController {
    pub fn new(api: ApiClient, capitalize_names: bool) -> Self {
        Self {
            api,
            capitalize_names,
            view: ViewModel::default(),
        }
    }

    pub fn location(&self) -> &Arc<Location> {
        self.api.location()
    }

    pub async fn check_session(&mut self) {
        let status = match self.api.request("/auth/status", Method::GET, None, false).await {
            Ok(response) => response.decode::<AuthStatus>(),
            Err(e) => Err(e),
        };

        match status {
            Ok(status) if status.logged_in => {
                let name = display_name(status.username.as_deref(), self.capitalize_names);
                log::info!("Session active for {}", name);
                self.view.show_logged_in(&name);
                self.load_tasks().await;
            }
            Ok(_) => {
                log::info!("No active session");
                self.view.show_logged_out();
            }
            Err(e) => {
                log::error!("Error checking auth status: {}", e);
                if !e.is_redirect() {
                    self.view.display_error(SESSION_CHECK_FAILED);
                }
                self.view.show_logged_out();
            }
        }
    }

    /// True only when the server ended the session.
    pub async fn logout(&mut self) -> bool {
        match self.api.request("/auth/logout", Method::POST, None, true).await {
            Ok(_) => {
                self.view.tasks.clear();
                self.view.show_logged_out();
                self.location().navigate(Page::Login);
                true
            }
            Err(e) if e.is_redirect() => false,
            Err(e) => {
                log::error!("Logout failed: {}", e);
                self.view.display_error(&message_or(&e, "Logout failed."));
                false
            }
        }
    }

    async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        match self.api.request("/tasks", Method::GET, None, true).await? {
            response @ ApiResponse::Json(Value::Array(_)) => response.decode(),
            _ => Err(ApiError::InvalidResponse("Invalid response format".to_string())),
        }
    }

    pub async fn load_tasks(&mut self) {
        self.view.clear_error();
        match self.fetch_tasks().await {
            Ok(tasks) => {
                log::debug!("Loaded {} tasks", tasks.len());
                self.view.show_tasks(tasks);
            }
            Err(e) if e.is_redirect() => {}
            Err(e) => {
                log::error!("Failed to load tasks: {}", e);
                self.view.show_load_error(&message_or(&e, "Could not load tasks."));
            }
        }
    }

    pub fn show_form(&mut self) {
        self.reset_form();
        self.view.form.visible = true;
    }

    pub fn close_form(&mut self) {
        self.view.form.visible = false;
    }

    pub fn reset_form(&mut self) {
        self.view.form.reset();
        self.view.clear_error();
    }

    /// Create when the form has no id, update otherwise. Returns true when the
    /// server accepted the change.
    pub async fn submit_task(&mut self) -> bool {
        self.view.clear_error();

        let body = match self.view.form.payload().and_then(|p| ApiClient::encode(&p)) {
            Ok(body) => body,
            Err(e) => {
                self.view.display_error(&e.to_string());
                return false;
            }
        };

        let (result, done) = match self.view.form.id.clone() {
            Some(id) => (
                self.api
                    .request(&format!("/tasks/{}", id), Method::PUT, Some(&body), true)
                    .await,
                "Task updated successfully!",
            ),
            None => (
                self.api.request("/tasks", Method::POST, Some(&body), true).await,
                "Task added successfully!",
            ),
        };

        match result {
            Ok(_) => {
                self.view.display_success(done);
                self.view.form.reset();
                self.view.form.visible = false;
                self.load_tasks().await;
                true
            }
            Err(e) if e.is_redirect() => false,
            Err(e) => {
                log::error!("Failed to save task: {}", e);
                self.view.display_error(&message_or(&e, "Could not save task."));
                false
            }
        }
    }

    /// Put the row at `index` into the form, switching it to update mode.
    pub fn edit(&mut self, index: usize) -> bool {
        let Some(row) = self.view.tasks.get(index).cloned() else {
            return false;
        };

        self.view.clear_error();
        self.view.form.fill_from(&row);
        self.view.form.visible = true;
        true
    }

    /// Ask `confirm` first; nothing is sent when it says no.
    pub async fn delete<F>(&mut self, index: usize, confirm: F) -> bool
    where
        F: FnOnce(&TaskRow) -> bool,
    {
        let Some(row) = self.view.tasks.get(index).cloned() else {
            return false;
        };
        if !confirm(&row) {
            log::debug!("Deletion of task {} cancelled", row.id);
            return false;
        }

        match self
            .api
            .request(&format!("/tasks/{}", row.id), Method::DELETE, None, true)
            .await
        {
            Ok(_) => {
                self.view.display_success("Task deleted successfully!");
                self.load_tasks().await;
                true
            }
            Err(e) if e.is_redirect() => false,
            Err(e) => {
                log::error!("Failed to delete task: {}", e);
                self.view.display_error(&message_or(&e, "Could not delete task."));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::SESSION_EXPIRED_NOTICE;
    use crate::view::{FormMode, Section, LOAD_ERROR_MESSAGE, NO_TASKS_MESSAGE};
    use serde_json::json;

    fn controller(transport: ScriptedTransport) -> (TaskController, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let api = ApiClient::new(
            transport.clone(),
            "http://localhost:5000/api",
            Arc::new(Location::new(Page::Main)),
        );
        (TaskController::new(api, true), transport)
    }

    fn two_tasks() -> serde_json::Value {
        json!([
            {"id": 11, "name": "Buy milk", "due_date": "2025-03-05", "due_time": "17:45"},
            {"id": 12, "name": "<b>x</b>", "due_date": null, "due_time": null}
        ])
    }

    #[tokio::test]
    async fn logged_in_session_loads_tasks() {
        let (mut ctl, transport) = controller(
            ScriptedTransport::new()
                .json(200, json!({"logged_in": true, "username": "jane doe"}))
                .json(200, two_tasks()),
        );

        ctl.check_session().await;

        assert_eq!(transport.calls(), vec!["GET /auth/status", "GET /tasks"]);
        assert_eq!(ctl.view.section, Section::Tasks);
        assert_eq!(ctl.view.greeting.as_deref(), Some("Jane Doe"));
        assert_eq!(ctl.view.tasks.len(), 2);
        assert_eq!(ctl.view.tasks[1].name, "<b>x</b>");
        assert_eq!(ctl.view.placeholder, None);
    }

    #[tokio::test]
    async fn missing_username_greets_user() {
        let (mut ctl, _) = controller(
            ScriptedTransport::new()
                .json(200, json!({"logged_in": true}))
                .json(200, json!([])),
        );

        ctl.check_session().await;

        assert_eq!(ctl.view.greeting.as_deref(), Some("User"));
        assert_eq!(ctl.view.placeholder.as_deref(), Some(NO_TASKS_MESSAGE));
    }

    #[tokio::test]
    async fn logged_out_session_shows_welcome() {
        let (mut ctl, transport) =
            controller(ScriptedTransport::new().json(200, json!({"logged_in": false})));

        ctl.check_session().await;

        assert_eq!(transport.calls(), vec!["GET /auth/status"]);
        assert_eq!(ctl.view.section, Section::Welcome);
        assert!(ctl.view.error.is_none());
    }

    #[tokio::test]
    async fn failed_session_check_is_treated_as_logged_out() {
        let (mut ctl, _) = controller(ScriptedTransport::new().fail("connection refused"));

        ctl.check_session().await;

        assert_eq!(ctl.view.section, Section::Welcome);
        assert_eq!(ctl.view.error.as_deref(), Some(SESSION_CHECK_FAILED));
    }

    #[tokio::test]
    async fn non_array_task_response_is_an_error() {
        let (mut ctl, _) =
            controller(ScriptedTransport::new().json(200, json!({"tasks": []})));

        ctl.load_tasks().await;

        assert_eq!(ctl.view.error.as_deref(), Some("Invalid response format"));
        assert_eq!(ctl.view.placeholder.as_deref(), Some(LOAD_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn unauthorized_load_redirects_without_inline_error() {
        let (mut ctl, _) = controller(
            ScriptedTransport::new().json(401, json!({"message": "Authentication required"})),
        );

        ctl.load_tasks().await;

        assert!(ctl.view.error.is_none());
        assert_eq!(ctl.location().current(), Page::Login);
        assert_eq!(ctl.location().take_notices(), vec![SESSION_EXPIRED_NOTICE]);
    }

    #[tokio::test]
    async fn submit_without_id_creates() {
        let (mut ctl, transport) = controller(
            ScriptedTransport::new()
                .json(201, json!({"message": "Task created", "task_id": 3}))
                .json(200, json!([{"id": 3, "name": "Walk dog"}])),
        );
        ctl.show_form();
        ctl.view.form.name = "Walk dog".to_string();

        assert!(ctl.submit_task().await);

        assert_eq!(transport.calls(), vec!["POST /tasks", "GET /tasks"]);
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({"name": "Walk dog", "due_date": null, "due_time": null}))
        );
        assert_eq!(ctl.view.success.as_deref(), Some("Task added successfully!"));
        assert!(!ctl.view.form.visible);
        assert_eq!(ctl.view.form.mode(), FormMode::Add);
        assert_eq!(ctl.view.tasks.len(), 1);
    }

    #[tokio::test]
    async fn edit_then_submit_updates_that_id() {
        let (mut ctl, transport) = controller(
            ScriptedTransport::new()
                .json(200, two_tasks())
                .json(200, json!({"message": "Task updated"}))
                .json(200, two_tasks()),
        );
        ctl.load_tasks().await;

        assert!(ctl.edit(0));
        assert_eq!(ctl.view.form.mode(), FormMode::Update);
        assert!(ctl.view.form.visible);
        assert_eq!(ctl.view.form.due_date, "2025-03-05");
        assert_eq!(ctl.view.form.due_time, "17:45");

        ctl.view.form.name = "Buy oat milk".to_string();
        assert!(ctl.submit_task().await);

        assert_eq!(
            transport.calls(),
            vec!["GET /tasks", "PUT /tasks/11", "GET /tasks"]
        );
        assert_eq!(
            transport.requests()[1].body,
            Some(json!({"name": "Buy oat milk", "due_date": "2025-03-05", "due_time": "17:45"}))
        );
    }

    #[tokio::test]
    async fn submit_with_blank_name_sends_nothing() {
        let (mut ctl, transport) = controller(ScriptedTransport::new());

        assert!(!ctl.submit_task().await);

        assert!(transport.calls().is_empty());
        assert_eq!(ctl.view.error.as_deref(), Some("Task name is required."));
    }

    #[tokio::test]
    async fn failed_submit_keeps_form_and_reports() {
        let (mut ctl, _) = controller(
            ScriptedTransport::new().json(400, json!({"message": "Task name is required"})),
        );
        ctl.show_form();
        ctl.view.form.name = "x".to_string();

        assert!(!ctl.submit_task().await);

        assert!(ctl.view.form.visible);
        assert_eq!(ctl.view.error.as_deref(), Some("Task name is required"));
    }

    #[test]
    fn delete_prompt_strips_control_characters() {
        let task: Task = serde_json::from_value(json!({"id": 5, "name": "Rent\u{1b}[2J"})).unwrap();
        let row = TaskRow::from(task);

        assert_eq!(delete_prompt(&row), "Are you sure you want to delete \"Rent [2J\"?");
    }

    #[tokio::test]
    async fn confirmed_delete_calls_server_and_reloads() {
        let (mut ctl, transport) = controller(
            ScriptedTransport::new()
                .json(200, two_tasks())
                .json(200, json!({"message": "Task deleted"}))
                .json(200, json!([{"id": 12, "name": "<b>x</b>"}])),
        );
        ctl.load_tasks().await;

        let mut prompt = String::new();
        let deleted = ctl
            .delete(0, |row| {
                prompt = delete_prompt(row);
                true
            })
            .await;

        assert!(deleted);
        assert_eq!(prompt, "Are you sure you want to delete \"Buy milk\"?");
        assert_eq!(
            transport.calls(),
            vec!["GET /tasks", "DELETE /tasks/11", "GET /tasks"]
        );
        assert_eq!(ctl.view.tasks.len(), 1);
    }

    #[tokio::test]
    async fn declined_delete_issues_no_call() {
        let (mut ctl, transport) = controller(ScriptedTransport::new().json(200, two_tasks()));
        ctl.load_tasks().await;

        assert!(!ctl.delete(1, |_| false).await);

        assert_eq!(transport.calls(), vec!["GET /tasks"]);
        assert_eq!(ctl.view.tasks.len(), 2);
    }

    #[tokio::test]
    async fn logout_navigates_to_login() {
        let (mut ctl, transport) = controller(
            ScriptedTransport::new().json(200, json!({"message": "Logout successful"})),
        );
        ctl.view.show_logged_in("Sam");

        assert!(ctl.logout().await);

        assert_eq!(transport.calls(), vec!["POST /auth/logout"]);
        assert_eq!(ctl.location().current(), Page::Login);
        assert!(!ctl.view.is_logged_in());
    }

    #[tokio::test]
    async fn failed_logout_stays_put() {
        let (mut ctl, _) = controller(ScriptedTransport::new().text(500, "boom"));

        assert!(!ctl.logout().await);

        assert_eq!(ctl.location().current(), Page::Main);
        assert_eq!(ctl.view.error.as_deref(), Some("boom"));
    }

    #[test]
    fn display_name_respects_capitalize_flag() {
        assert_eq!(display_name(Some("ada lovelace"), true), "Ada Lovelace");
        assert_eq!(display_name(Some("ada lovelace"), false), "ada lovelace");
        assert_eq!(display_name(Some("  "), true), "User");
    }
}
