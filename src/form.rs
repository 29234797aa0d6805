#[derive(Debug, Clone)]
pub struct InputField {
    pub label: &'static str,
    pub value: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub masked: bool,
}

impl InputField {
    pub fn new(label: &'static str, value: &str) -> Self {
        InputField {
            label,
            value: value.to_string(),
            cursor: value.chars().count(),
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        InputField {
            masked: true,
            ..InputField::new(label, "")
        }
    }

    fn byte_offset(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// What to draw: the value, or bullets for a password.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// A popup form made of single-line fields with one focused at a time.
#[derive(Debug, Clone)]
pub struct FormInput {
    pub title: String,
    pub fields: Vec<InputField>,
    pub focus: usize,
}

impl FormInput {
    pub fn new(title: impl Into<String>, fields: Vec<InputField>) -> Self {
        FormInput {
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    fn focused_mut(&mut self) -> Option<&mut InputField> {
        self.fields.get_mut(self.focus)
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(field) = self.focused_mut() {
            let at = field.byte_offset(field.cursor);
            field.value.insert(at, c);
            field.cursor += 1;
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(field) = self.focused_mut() {
            if field.cursor > 0 {
                let at = field.byte_offset(field.cursor - 1);
                field.value.remove(at);
                field.cursor -= 1;
            }
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(field) = self.focused_mut() {
            field.cursor = field.cursor.saturating_sub(1);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(field) = self.focused_mut() {
            if field.cursor < field.value.chars().count() {
                field.cursor += 1;
            }
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        if let Some(field) = self.focused_mut() {
            field.cursor = 0;
        }
    }

    pub fn move_to_end_of_line(&mut self) {
        if let Some(field) = self.focused_mut() {
            field.cursor = field.value.chars().count();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
            field.cursor = 0;
        }
        self.focus = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_form() -> FormInput {
        FormInput::new(
            "Login",
            vec![InputField::new("Username or email", ""), InputField::masked("Password")],
        )
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let mut form = login_form();
        for c in "sam".chars() {
            form.insert_char(c);
        }
        form.next_field();
        for c in "pw!".chars() {
            form.insert_char(c);
        }

        assert_eq!(form.value("Username or email"), "sam");
        assert_eq!(form.value("Password"), "pw!");
        assert_eq!(form.fields[1].display(), "•••");
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut form = FormInput::new("Task", vec![InputField::new("Name", "café")]);
        form.move_cursor_left();
        form.delete_char();
        form.insert_char('ﬀ');
        form.move_to_start_of_line();
        form.insert_char('[');
        form.move_to_end_of_line();
        form.insert_char(']');

        assert_eq!(form.value("Name"), "[caﬀé]");
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = login_form();
        form.previous_field();
        assert_eq!(form.focus, 1);
        form.next_field();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn clear_resets_values_and_focus() {
        let mut form = FormInput::new(
            "Task",
            vec![InputField::new("Name", "x"), InputField::new("Date", "2025-01-01")],
        );
        form.next_field();
        form.clear();

        assert_eq!(form.focus, 0);
        assert!(form.fields.iter().all(|f| f.value.is_empty() && f.cursor == 0));
        assert_eq!(form.value("Missing"), "");
    }
}
