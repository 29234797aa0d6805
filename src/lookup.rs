use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::io::{self, Write};

use crate::view::render::sanitize_terminal;
use crate::view::TaskRow;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskMatch {
    /// Id or exact name hit.
    Exact(usize),
    Suggested { index: usize, score: i64 },
    NotFound,
}

/// Find the row a user meant: id first, then exact name (case-insensitive),
/// then the best fuzzy name match.
pub fn find_task(rows: &[TaskRow], query: &str) -> TaskMatch {
    let query = query.trim();
    if let Some(index) = rows.iter().position(|row| row.id.as_str() == query) {
        return TaskMatch::Exact(index);
    }
    if let Some(index) = rows
        .iter()
        .position(|row| row.name.eq_ignore_ascii_case(query))
    {
        return TaskMatch::Exact(index);
    }

    let matcher = SkimMatcherV2::default();
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            matcher
                .fuzzy_match(&row.name, query)
                .map(|score| (index, score))
        })
        .max_by_key(|(_, score)| *score)
        .map(|(index, score)| TaskMatch::Suggested { index, score })
        .unwrap_or(TaskMatch::NotFound)
}

// Ask user whether the suggested task is the one they meant
pub fn ask_user_confirmation(prompt: &str) -> bool {
    print!("{} (y/n): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    let answer = input.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

/// Resolve `query` to a row index, confirming fuzzy suggestions with `confirm`.
pub fn resolve_task<F>(rows: &[TaskRow], query: &str, confirm: F) -> Option<usize>
where
    F: FnOnce(&str) -> bool,
{
    match find_task(rows, query) {
        TaskMatch::Exact(index) => Some(index),
        TaskMatch::Suggested { index, score } => {
            log::debug!("Fuzzy match for '{}': '{}' ({})", query, rows[index].name, score);
            let prompt = format!(
                "'{}' not found. Did you mean '{}'?",
                sanitize_terminal(query),
                sanitize_terminal(&rows[index].name)
            );
            if confirm(&prompt) {
                Some(index)
            } else {
                println!("Operation cancelled.");
                None
            }
        }
        TaskMatch::NotFound => {
            println!("Task '{}' not found.", sanitize_terminal(query));
            None
        }
    }
}
