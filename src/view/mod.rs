pub mod auth;
pub mod controller;
pub mod render;

use crate::api::ApiError;
use crate::models::{Task, TaskId, TaskPayload};

pub const NO_TASKS_MESSAGE: &str = "No tasks yet. Add one to get started!";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading tasks.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Home,
    About,
    Login,
    Signup,
    Logout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavLink {
    pub label: String,
    pub target: NavTarget,
}

impl NavLink {
    fn new(label: impl Into<String>, target: NavTarget) -> Self {
        NavLink {
            label: label.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Welcome,
    Tasks,
}

/// One rendered entry of the task list. Keeps the server's canonical
/// date/time next to the display label.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub name: String,
    pub due_date: Option<String>,
    pub due_time: Option<String>,
    pub due_label: Option<String>,
}

impl From<Task> for TaskRow {
    fn from(task: Task) -> Self {
        let due_label = render::due_label(task.due_date.as_deref(), task.due_time.as_deref());
        TaskRow {
            id: task.id,
            name: task.name,
            due_date: task.due_date,
            due_time: task.due_time,
            due_label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Update,
}

/// The add/edit form. `id` plays the part of the hidden identifier field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub id: Option<TaskId>,
    pub name: String,
    pub due_date: String,
    pub due_time: String,
    pub visible: bool,
}

impl TaskForm {
    pub fn mode(&self) -> FormMode {
        if self.id.is_some() {
            FormMode::Update
        } else {
            FormMode::Add
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode() {
            FormMode::Add => "Add New Task",
            FormMode::Update => "Edit Task",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode() {
            FormMode::Add => "Add Task",
            FormMode::Update => "Update Task",
        }
    }

    /// Back to an empty form in add mode. Visibility is left alone.
    pub fn reset(&mut self) {
        self.id = None;
        self.name.clear();
        self.due_date.clear();
        self.due_time.clear();
    }

    pub fn fill_from(&mut self, row: &TaskRow) {
        self.id = Some(row.id.clone());
        self.name = row.name.clone();
        self.due_date = row.due_date.clone().unwrap_or_default();
        self.due_time = row.due_time.clone().unwrap_or_default();
    }

    pub fn payload(&self) -> Result<TaskPayload, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Task name is required.".to_string()));
        }

        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Ok(TaskPayload {
            name: name.to_string(),
            due_date: optional(&self.due_date),
            due_time: optional(&self.due_time),
        })
    }
}

/// Everything a front end needs to draw the main page.
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    pub section: Section,
    pub greeting: Option<String>,
    pub nav: Vec<NavLink>,
    pub tasks: Vec<TaskRow>,
    pub placeholder: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub form: TaskForm,
}

impl ViewModel {
    pub fn is_logged_in(&self) -> bool {
        self.section == Section::Tasks
    }

    pub fn show_logged_in(&mut self, display_name: &str) {
        self.section = Section::Tasks;
        self.greeting = Some(display_name.to_string());
        self.nav = vec![
            NavLink::new("Home", NavTarget::Home),
            NavLink::new("About Us", NavTarget::About),
            NavLink::new(format!("Hello, {}!", display_name), NavTarget::Home),
            NavLink::new("Logout", NavTarget::Logout),
        ];
    }

    pub fn show_logged_out(&mut self) {
        self.section = Section::Welcome;
        self.greeting = None;
        self.nav = vec![
            NavLink::new("Home", NavTarget::Home),
            NavLink::new("About Us", NavTarget::About),
            NavLink::new("Login", NavTarget::Login),
            NavLink::new("Sign Up", NavTarget::Signup),
        ];
    }

    /// Replace the list with the server's latest response.
    pub fn show_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks.into_iter().map(TaskRow::from).collect();
        self.placeholder = self
            .tasks
            .is_empty()
            .then(|| NO_TASKS_MESSAGE.to_string());
    }

    pub fn show_load_error(&mut self, message: &str) {
        self.tasks.clear();
        self.placeholder = Some(LOAD_ERROR_MESSAGE.to_string());
        self.display_error(message);
    }

    pub fn display_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn display_success(&mut self, message: &str) {
        self.success = Some(message.to_string());
    }
}
