//! Pure formatting helpers. Nothing here touches the network or the terminal.

use chrono::NaiveDate;

use super::{NavLink, TaskRow, ViewModel};

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Strip control characters so task text can't smuggle escape sequences
/// into the terminal.
pub fn sanitize_terminal(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Uppercase the first character of every word ("jane doe" -> "Jane Doe").
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !in_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        in_word = is_word;
    }
    out
}

/// `2025-03-05` -> `Mar 5, 2025`. Unparseable input is shown as-is.
pub fn format_date(iso: &str) -> String {
    match NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => iso.to_string(),
    }
}

/// "Due: Mar 5, 2025 at 14:30". Time alone is not shown without a date.
pub fn due_label(due_date: Option<&str>, due_time: Option<&str>) -> Option<String> {
    let date = due_date.filter(|d| !d.is_empty())?;
    let mut label = format!("Due: {}", format_date(date));
    if let Some(time) = due_time.filter(|t| !t.is_empty()) {
        label.push_str(&format!(" at {}", time));
    }
    Some(label)
}

pub fn nav_text(links: &[NavLink]) -> String {
    links
        .iter()
        .map(|link| sanitize_terminal(&link.label))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn row_html(row: &TaskRow) -> String {
    let mut html = format!("<li data-id=\"{}\"", escape_html(row.id.as_str()));
    if let Some(date) = &row.due_date {
        html.push_str(&format!(" data-due-date=\"{}\"", escape_html(date)));
    }
    if let Some(time) = &row.due_time {
        html.push_str(&format!(" data-due-time=\"{}\"", escape_html(time)));
    }
    html.push_str(&format!(
        "><div class=\"task-info\"><strong>{}</strong>",
        escape_html(&row.name)
    ));
    if let Some(label) = &row.due_label {
        html.push_str(&format!("<div class=\"task-meta\">{}</div>", escape_html(label)));
    }
    html.push_str(
        "</div><div class=\"task-actions\"><button class=\"edit-btn\">Edit</button>\
         <button class=\"delete-btn danger\">Delete</button></div></li>",
    );
    html
}

/// Static HTML fragment of the task list, with every user-supplied string escaped.
pub fn task_list_html(view: &ViewModel) -> String {
    if let Some(placeholder) = &view.placeholder {
        return format!("<p id=\"noTasksMessage\">{}</p>", escape_html(placeholder));
    }

    let rows: String = view.tasks.iter().map(row_html).collect();
    format!("<ul id=\"taskList\">{}</ul>", rows)
}

/// One line per task for plain terminal output.
pub fn task_list_text(view: &ViewModel) -> Vec<String> {
    if let Some(placeholder) = &view.placeholder {
        return vec![placeholder.clone()];
    }

    view.tasks
        .iter()
        .map(|row| match &row.due_label {
            Some(label) => format!(
                "[{}] {}  ({})",
                sanitize_terminal(row.id.as_str()),
                sanitize_terminal(&row.name),
                label
            ),
            None => format!(
                "[{}] {}",
                sanitize_terminal(row.id.as_str()),
                sanitize_terminal(&row.name)
            ),
        })
        .collect()
}
