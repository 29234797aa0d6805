use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

use crate::api::ApiClient;
use crate::form::{FormInput, InputField};
use crate::location::Page;
use crate::view::auth::AuthController;
use crate::view::controller::{delete_prompt, TaskController};
use crate::view::render::{nav_text, sanitize_terminal};
use crate::view::Section;

const FIELD_NAME: &str = "Name";
const FIELD_DATE: &str = "Due date (YYYY-MM-DD)";
const FIELD_TIME: &str = "Due time (HH:MM)";
const FIELD_IDENTIFIER: &str = "Username or email";
const FIELD_USERNAME: &str = "Username";
const FIELD_EMAIL: &str = "Email";
const FIELD_PASSWORD: &str = "Password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Task,
    Login,
    Signup,
}

pub enum Popup {
    None,
    Form(FormKind, FormInput),
    ConfirmDelete(usize),
    Notice(String),
}

/// Work that needs the network, run after the key handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    CheckSession,
    Reload,
    SubmitForm,
    Delete(usize),
    Logout,
}

pub struct App {
    tasks: TaskController,
    auth: AuthController,
    pub list_state: ListState,
    pub popup: Popup,
    pub busy: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(tasks: TaskController, auth: AuthController) -> Self {
        App {
            tasks,
            auth,
            list_state: ListState::default(),
            popup: Popup::None,
            busy: false,
            should_quit: false,
        }
    }

    fn selected(&self) -> Option<usize> {
        self.list_state
            .selected()
            .filter(|i| *i < self.tasks.view.tasks.len())
    }

    fn clamp_selection(&mut self) {
        let len = self.tasks.view.tasks.len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            None => self.list_state.select(Some(0)),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    pub fn next_item(&mut self) {
        let len = self.tasks.view.tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        let len = self.tasks.view.tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn task_form(&self) -> FormInput {
        let form = &self.tasks.view.form;
        FormInput::new(
            form.title(),
            vec![
                InputField::new(FIELD_NAME, &form.name),
                InputField::new(FIELD_DATE, &form.due_date),
                InputField::new(FIELD_TIME, &form.due_time),
            ],
        )
    }

    pub fn open_task_form(&mut self) {
        self.tasks.show_form();
        self.popup = Popup::Form(FormKind::Task, self.task_form());
    }

    pub fn edit_selected_task(&mut self) {
        if let Some(i) = self.selected() {
            if self.tasks.edit(i) {
                self.popup = Popup::Form(FormKind::Task, self.task_form());
            }
        }
    }

    pub fn open_login_form(&mut self) {
        self.auth.clear_error();
        self.tasks.location().navigate(Page::Login);
        self.popup = Popup::Form(
            FormKind::Login,
            FormInput::new(
                "Login",
                vec![
                    InputField::new(FIELD_IDENTIFIER, ""),
                    InputField::masked(FIELD_PASSWORD),
                ],
            ),
        );
    }

    pub fn open_signup_form(&mut self) {
        self.auth.clear_error();
        self.tasks.location().navigate(Page::Signup);
        self.popup = Popup::Form(
            FormKind::Signup,
            FormInput::new(
                "Sign Up",
                vec![
                    InputField::new(FIELD_USERNAME, ""),
                    InputField::new(FIELD_EMAIL, ""),
                    InputField::masked(FIELD_PASSWORD),
                ],
            ),
        );
    }

    pub fn close_popup(&mut self) {
        if let Popup::Form(kind, _) = &self.popup {
            match kind {
                FormKind::Task => self.tasks.close_form(),
                FormKind::Login | FormKind::Signup => self.tasks.location().navigate(Page::Main),
            }
        }
        self.popup = Popup::None;
    }

    fn form_error(&self, kind: FormKind) -> Option<&str> {
        match kind {
            FormKind::Task => self.tasks.view.error.as_deref(),
            FormKind::Login | FormKind::Signup => self.auth.error.as_deref(),
        }
    }

    /// Surface queued notices as a modal.
    fn show_notices(&mut self) {
        let notices = self.tasks.location().take_notices();
        if !notices.is_empty() {
            self.popup = Popup::Notice(notices.join("\n"));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match &mut self.popup {
            Popup::Notice(_) => {
                self.popup = Popup::None;
                if self.tasks.location().current() == Page::Login {
                    self.open_login_form();
                }
                Action::None
            }
            Popup::ConfirmDelete(index) => {
                let index = *index;
                self.popup = Popup::None;
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => Action::Delete(index),
                    _ => Action::None,
                }
            }
            Popup::Form(kind, form) => match key.code {
                KeyCode::Esc => {
                    let kind = *kind;
                    self.close_popup();
                    if kind == FormKind::Task {
                        Action::None
                    } else {
                        Action::CheckSession
                    }
                }
                KeyCode::Enter => Action::SubmitForm,
                KeyCode::Tab | KeyCode::Down => {
                    form.next_field();
                    Action::None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.previous_field();
                    Action::None
                }
                KeyCode::Left => {
                    form.move_cursor_left();
                    Action::None
                }
                KeyCode::Right => {
                    form.move_cursor_right();
                    Action::None
                }
                KeyCode::Home => {
                    form.move_to_start_of_line();
                    Action::None
                }
                KeyCode::End => {
                    form.move_to_end_of_line();
                    Action::None
                }
                KeyCode::Backspace => {
                    form.delete_char();
                    Action::None
                }
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    if *kind == FormKind::Task {
                        self.tasks.reset_form();
                        self.popup = Popup::Form(FormKind::Task, self.task_form());
                    } else {
                        form.clear();
                        self.auth.clear_error();
                    }
                    Action::None
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    form.insert_char(c);
                    Action::None
                }
                _ => Action::None,
            },
            Popup::None => self.handle_main_key(key),
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('q') {
            return Action::Quit;
        }

        if self.tasks.view.section == Section::Welcome {
            return match key.code {
                KeyCode::Char('l') => {
                    self.open_login_form();
                    Action::None
                }
                KeyCode::Char('s') => {
                    self.open_signup_form();
                    Action::None
                }
                KeyCode::Char('r') => Action::CheckSession,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Down => self.next_item(),
            KeyCode::Up => self.previous_item(),
            KeyCode::Char('a') => self.open_task_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.edit_selected_task(),
            KeyCode::Char('d') => {
                if let Some(i) = self.selected() {
                    self.popup = Popup::ConfirmDelete(i);
                }
            }
            KeyCode::Char('r') => return Action::Reload,
            KeyCode::Char('o') => return Action::Logout,
            _ => {}
        }
        Action::None
    }

    async fn submit_form(&mut self) {
        let Popup::Form(kind, form) = &self.popup else {
            return;
        };
        let (kind, form) = (*kind, form.clone());

        let done = match kind {
            FormKind::Task => {
                let task = &mut self.tasks.view.form;
                task.name = form.value(FIELD_NAME).to_string();
                task.due_date = form.value(FIELD_DATE).to_string();
                task.due_time = form.value(FIELD_TIME).to_string();
                self.tasks.submit_task().await
            }
            FormKind::Login => {
                self.auth
                    .login(form.value(FIELD_IDENTIFIER), form.value(FIELD_PASSWORD))
                    .await
            }
            FormKind::Signup => {
                self.auth
                    .signup(
                        form.value(FIELD_USERNAME),
                        form.value(FIELD_EMAIL),
                        form.value(FIELD_PASSWORD),
                    )
                    .await
            }
        };

        if done {
            self.popup = Popup::None;
            if kind != FormKind::Task {
                self.tasks.check_session().await;
            }
        }
    }

    async fn perform(&mut self, action: Action) {
        self.tasks.view.success = None;
        match action {
            Action::None | Action::Quit => {}
            Action::CheckSession => self.tasks.check_session().await,
            Action::Reload => self.tasks.load_tasks().await,
            Action::SubmitForm => self.submit_form().await,
            Action::Delete(index) => {
                // Already confirmed through the popup
                self.tasks.delete(index, |_| true).await;
            }
            Action::Logout => {
                if self.tasks.logout().await {
                    self.open_login_form();
                }
            }
        }
        self.clamp_selection();
        self.show_notices();
    }
}

pub async fn run_tui(tasks: TaskController, api: ApiClient) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tasks, AuthController::new(api));
    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_with_indicator<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    action: Action,
) -> Result<()> {
    app.busy = true;
    terminal.draw(|f| ui(f, app))?;
    app.perform(action).await;
    app.busy = false;
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    run_with_indicator(terminal, app, Action::CheckSession).await?;

    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match app.handle_key(key) {
                    Action::None => {}
                    Action::Quit => app.should_quit = true,
                    action => run_with_indicator(terminal, app, action).await?,
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let header = Paragraph::new(nav_text(&app.tasks.view.nav))
        .block(Block::default().borders(Borders::ALL).title("To-Do"))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, chunks[0]);

    match app.tasks.view.section {
        Section::Tasks => render_tasks(f, app, chunks[1]),
        Section::Welcome => render_welcome(f, chunks[1]),
    }

    render_status(f, app, chunks[2]);

    match &app.popup {
        Popup::None => {}
        Popup::Form(kind, form) => render_form(f, app, *kind, form),
        Popup::ConfirmDelete(index) => {
            if let Some(row) = app.tasks.view.tasks.get(*index) {
                let text = format!(
                    "{}\n\ny: Delete | any other key: Cancel",
                    delete_prompt(row)
                );
                render_message(f, "Delete Task", &text);
            }
        }
        Popup::Notice(notice) => {
            let text = format!("{}\n\nPress any key", sanitize_terminal(notice));
            render_message(f, "Notice", &text);
        }
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_welcome(f: &mut Frame, area: Rect) {
    let text = "Welcome!\n\nLog in or create an account to manage your tasks.\n\n\
                l: Login | s: Sign Up | r: Retry | q: Quit";
    let welcome = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    f.render_widget(welcome, area);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let title = match &app.tasks.view.greeting {
        Some(name) => format!("{}'s Tasks", sanitize_terminal(name)),
        None => "Tasks".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(placeholder) = &app.tasks.view.placeholder {
        let empty = Paragraph::new(placeholder.as_str())
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = app
            .tasks
            .view
            .tasks
            .iter()
            .map(|row| {
                let mut spans = vec![Span::styled(
                    format!("{} ", sanitize_terminal(&row.name)),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )];
                if let Some(label) = &row.due_label {
                    spans.push(Span::styled(
                        format!("[{}]", sanitize_terminal(label)),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[0], &mut app.list_state);
    }

    let controls = "Controls:\n• ↑/↓: Navigate\n• a: Add task\n• e/Enter: Edit task\n• d: Delete task\n• r: Reload\n• o: Logout\n• q: Quit";
    let info_text = match app.selected().and_then(|i| app.tasks.view.tasks.get(i)) {
        Some(row) => format!(
            "Task: {}\nId: {}\n{}\n\n{}",
            sanitize_terminal(&row.name),
            sanitize_terminal(row.id.as_str()),
            row.due_label.as_deref().unwrap_or("No due date"),
            controls
        ),
        None => format!("No task selected\n\n{}", controls),
    };
    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Task Info"))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));
    f.render_widget(info, chunks[1]);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.tasks.view;
    let (text, color) = if app.busy {
        ("Working...".to_string(), Color::Yellow)
    } else if let Some(error) = &view.error {
        (sanitize_terminal(error), Color::Red)
    } else if let Some(success) = &view.success {
        (success.clone(), Color::Green)
    } else {
        (String::new(), Color::Gray)
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(color)), area);
}

fn render_message(f: &mut Frame, title: &str, text: &str) {
    let area = centered_rect(50, 25, f.area());
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let content = Paragraph::new(text.to_string())
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));

    f.render_widget(Clear, area);
    f.render_widget(content, area);
}

fn render_form(f: &mut Frame, app: &App, kind: FormKind, form: &FormInput) {
    let area = centered_rect(60, 50, f.area());

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));

        let shown: Vec<char> = sanitize_terminal(&field.display()).chars().collect();
        if focused {
            let cursor = field.cursor.min(shown.len());
            let before: String = shown[..cursor].iter().collect();
            let at: String = shown.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
            let after: String = shown.iter().skip(cursor + 1).collect();
            lines.push(Line::from(vec![
                Span::raw(before),
                Span::styled(at, Style::default().bg(Color::Cyan).fg(Color::Black)),
                Span::raw(after),
            ]));
        } else {
            lines.push(Line::from(shown.into_iter().collect::<String>()));
        }
        lines.push(Line::from(""));
    }

    if let Some(error) = app.form_error(kind) {
        lines.push(Line::from(Span::styled(
            sanitize_terminal(error),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    let footer = match kind {
        FormKind::Task => format!(
            "Enter: {} | Tab: Next field | Ctrl+U: Clear | Esc: Close",
            app.tasks.view.form.submit_label()
        ),
        FormKind::Login => "Enter: Login | Tab: Next field | Ctrl+U: Clear | Esc: Close".to_string(),
        FormKind::Signup => "Enter: Sign Up | Tab: Next field | Ctrl+U: Clear | Esc: Close".to_string(),
    };
    lines.push(Line::from(Span::styled(footer, Style::default().fg(Color::Yellow))));

    let block = Block::default()
        .title(form.title.clone())
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let content = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(content, area);
}
