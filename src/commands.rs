use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Write};

use crate::api::ApiClient;
use crate::cli::ListFormat;
use crate::location::Page;
use crate::lookup::resolve_task;
use crate::view::auth::AuthController;
use crate::view::controller::{delete_prompt, TaskController};
use crate::view::render::{nav_text, sanitize_terminal, task_list_html, task_list_text};
use crate::view::ViewModel;

const LOGIN_HINT: &str = "You are not logged in. Run `todo-client login <IDENTIFIER>` first.";

// Read a password without echoing it
fn read_secret(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    enable_raw_mode()?;
    let mut secret = String::new();
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter => break Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break Err(anyhow::anyhow!("Cancelled"))
                }
                KeyCode::Char(c) => secret.push(c),
                KeyCode::Backspace => {
                    secret.pop();
                }
                _ => {}
            },
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };
    disable_raw_mode()?;
    println!();

    result.map(|_| secret)
}

/// Print the outcome of a controller operation. Returns false on error.
fn report(view: &ViewModel) -> bool {
    if let Some(error) = &view.error {
        eprintln!("Error: {}", sanitize_terminal(error));
        return false;
    }
    if let Some(success) = &view.success {
        println!("{}", success);
    }
    true
}

/// The gateway sent us to the login page; main prints the notice.
fn redirected(ctl: &TaskController) -> bool {
    ctl.location().current() == Page::Login
}

pub async fn login(api: ApiClient, identifier: &str, password: Option<String>) -> Result<bool> {
    let password = match password {
        Some(password) => password,
        None => read_secret("Password: ")?,
    };

    let mut auth = AuthController::new(api);
    if auth.login(identifier, &password).await {
        println!("Login successful");
        return Ok(true);
    }
    if let Some(error) = &auth.error {
        eprintln!("Error: {}", sanitize_terminal(error));
    }
    Ok(false)
}

pub async fn signup(
    api: ApiClient,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<bool> {
    let password = match password {
        Some(password) => password,
        None => read_secret("Choose a password: ")?,
    };

    let mut auth = AuthController::new(api);
    if auth.signup(username, email, &password).await {
        println!("User created successfully");
        return Ok(true);
    }
    if let Some(error) = &auth.error {
        eprintln!("Error: {}", sanitize_terminal(error));
    }
    Ok(false)
}

pub async fn logout(mut ctl: TaskController) -> Result<bool> {
    if !ctl.logout().await {
        // A redirect leaves no error; main prints its notice
        report(&ctl.view);
        return Ok(false);
    }
    println!("Logged out.");
    Ok(true)
}

pub async fn status(mut ctl: TaskController) -> Result<bool> {
    ctl.check_session().await;

    println!("{}", nav_text(&ctl.view.nav));
    match &ctl.view.greeting {
        Some(name) => println!(
            "Logged in as {} ({} tasks)",
            sanitize_terminal(name),
            ctl.view.tasks.len()
        ),
        None => println!("Not logged in."),
    }
    Ok(report(&ctl.view))
}

pub async fn list(mut ctl: TaskController, format: ListFormat) -> Result<bool> {
    ctl.check_session().await;
    if !report(&ctl.view) {
        return Ok(false);
    }
    if !ctl.view.is_logged_in() {
        eprintln!("{}", LOGIN_HINT);
        return Ok(false);
    }

    println!("{}", render_list(&ctl.view, format));
    Ok(true)
}

fn render_list(view: &ViewModel, format: ListFormat) -> String {
    match format {
        ListFormat::Text => {
            let mut lines = Vec::new();
            if let Some(greeting) = &view.greeting {
                lines.push(format!("Hello, {}!", sanitize_terminal(greeting)));
            }
            lines.extend(task_list_text(view));
            lines.join("\n")
        }
        ListFormat::Html => task_list_html(view),
    }
}

pub async fn add(
    mut ctl: TaskController,
    name: String,
    date: Option<String>,
    time: Option<String>,
) -> Result<bool> {
    ctl.show_form();
    ctl.view.form.name = name;
    ctl.view.form.due_date = date.unwrap_or_default();
    ctl.view.form.due_time = time.unwrap_or_default();

    let saved = ctl.submit_task().await;
    Ok(report(&ctl.view) && saved)
}

pub struct EditArgs {
    pub task: String,
    pub name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub clear_date: bool,
    pub clear_time: bool,
}

pub async fn edit<F>(mut ctl: TaskController, args: EditArgs, confirm: F) -> Result<bool>
where
    F: Fn(&str) -> bool,
{
    ctl.load_tasks().await;
    if !report(&ctl.view) || redirected(&ctl) {
        return Ok(false);
    }
    let Some(index) = resolve_task(&ctl.view.tasks, &args.task, &confirm) else {
        return Ok(false);
    };

    ctl.edit(index);
    let form = &mut ctl.view.form;
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(date) = args.date {
        form.due_date = date;
    }
    if let Some(time) = args.time {
        form.due_time = time;
    }
    if args.clear_date {
        form.due_date.clear();
    }
    if args.clear_time {
        form.due_time.clear();
    }

    let saved = ctl.submit_task().await;
    Ok(report(&ctl.view) && saved)
}

/// `confirm` answers both the "did you mean" and the delete prompt.
pub async fn delete<F>(mut ctl: TaskController, task: &str, yes: bool, confirm: F) -> Result<bool>
where
    F: Fn(&str) -> bool,
{
    ctl.load_tasks().await;
    if !report(&ctl.view) || redirected(&ctl) {
        return Ok(false);
    }
    let Some(index) = resolve_task(&ctl.view.tasks, task, &confirm) else {
        return Ok(false);
    };

    let deleted = ctl
        .delete(index, |row| yes || confirm(&delete_prompt(row)))
        .await;
    if !deleted && ctl.view.error.is_none() && !redirected(&ctl) {
        println!("Operation cancelled.");
        return Ok(true);
    }
    Ok(report(&ctl.view) && deleted)
}
