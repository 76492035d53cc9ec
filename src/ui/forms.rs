use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Internal representation of the new-entry form fields.
#[derive(Default, Clone)]
pub(crate) struct BlogForm {
    pub(crate) name: String,
    pub(crate) body: String,
    pub(crate) active: BlogField,
    pub(crate) error: Option<String>,
}

/// Fields available within the entry form.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlogField {
    Name,
    Body,
}

impl Default for BlogField {
    fn default() -> Self {
        BlogField::Name
    }
}

impl BlogForm {
    /// Swap focus between the name and body fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BlogField::Name => BlogField::Body,
            BlogField::Body => BlogField::Name,
        };
    }

    /// Append a character to the active field, rejecting control input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BlogField::Name => self.name.push(ch),
            BlogField::Body => self.body.push(ch),
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BlogField::Name => {
                self.name.pop();
            }
            BlogField::Body => {
                self.body.pop();
            }
        }
    }

    /// Validate the inputs and return trimmed values ready for persistence.
    /// Both fields are required; the message matches the footer feedback the
    /// rest of the app shows for an invalid add.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let name = self.name.trim();
        let body = self.body.trim();
        if name.is_empty() || body.is_empty() {
            return Err(anyhow!("Please enter both name and body"));
        }
        Ok((name.to_string(), body.to_string()))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BlogField) -> Line<'static> {
        let (value, is_active) = match field {
            BlogField::Name => (&self.name, self.active == BlogField::Name),
            BlogField::Body => (&self.body, self.active == BlogField::Body),
        };

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character count for the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: BlogField) -> usize {
        match field {
            BlogField::Name => self.name.chars().count(),
            BlogField::Body => self.body.chars().count(),
        }
    }
}

/// State for confirming a bulk delete of the selected entries.
#[derive(Clone)]
pub(crate) struct ConfirmDeleteSelected {
    pub(crate) count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_char_targets_the_active_field() {
        let mut form = BlogForm::default();
        assert!(form.push_char('T'));
        form.toggle_field();
        assert!(form.push_char('b'));
        assert_eq!(form.name, "T");
        assert_eq!(form.body, "b");
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut form = BlogForm::default();
        assert!(!form.push_char('\u{7}'));
        assert!(form.name.is_empty());
    }

    #[test]
    fn parse_inputs_trims_and_requires_both_fields() {
        let mut form = BlogForm::default();
        form.name = "  Trip ".to_string();
        form.body = " Went hiking ".to_string();
        let (name, body) = form.parse_inputs().unwrap();
        assert_eq!(name, "Trip");
        assert_eq!(body, "Went hiking");

        form.body = "   ".to_string();
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Please enter both name and body");
    }

    #[test]
    fn backspace_only_touches_the_active_field() {
        let mut form = BlogForm::default();
        form.name = "Trip".to_string();
        form.body = "body".to_string();
        form.backspace();
        assert_eq!(form.name, "Tri");
        assert_eq!(form.body, "body");
    }
}
