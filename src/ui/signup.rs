use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::components::popup::centered_rect;
use crate::ui::next_key;
use crate::validation::{ValidationErrors, validate_signup};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SignupField {
    Name,
    Email,
    Password,
}

impl SignupField {
    const ALL: [SignupField; 3] = [SignupField::Name, SignupField::Email, SignupField::Password];

    fn key(&self) -> &'static str {
        match self {
            SignupField::Name => "name",
            SignupField::Email => "email",
            SignupField::Password => "password",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SignupField::Name => "Name",
            SignupField::Email => "Email",
            SignupField::Password => "Password",
        }
    }
}

pub enum SignupAction {
    Cancel,
    Submit { name: String, email: String, password: String },
}

#[derive(Default)]
pub struct SignupState {
    name: String,
    email: String,
    password: String,
    current: usize,
    errors: ValidationErrors,
}

impl SignupState {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_field(&self) -> SignupField {
        SignupField::ALL[self.current]
    }

    fn value_mut(&mut self, field: SignupField) -> &mut String {
        match field {
            SignupField::Name => &mut self.name,
            SignupField::Email => &mut self.email,
            SignupField::Password => &mut self.password,
        }
    }

    fn submit(&mut self) -> Option<SignupAction> {
        self.errors = validate_signup(&self.name, &self.email, &self.password);
        if !self.errors.is_empty() {
            if let Some(pos) = SignupField::ALL.iter().position(|f| self.errors.get(f.key()).is_some()) {
                self.current = pos;
            }
            return None;
        }
        Some(SignupAction::Submit {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SignupAction> {
        match key.code {
            KeyCode::Esc => return Some(SignupAction::Cancel),
            KeyCode::Down | KeyCode::Tab => self.current = (self.current + 1) % SignupField::ALL.len(),
            KeyCode::Up | KeyCode::BackTab => {
                self.current = (self.current + SignupField::ALL.len() - 1) % SignupField::ALL.len()
            }
            KeyCode::Enter => {
                if self.current + 1 < SignupField::ALL.len() {
                    self.current += 1;
                } else {
                    return self.submit();
                }
            }
            KeyCode::Backspace => {
                let field = self.current_field();
                self.value_mut(field).pop();
                self.errors.clear(field.key());
            }
            KeyCode::Char(c) => {
                let field = self.current_field();
                self.value_mut(field).push(c);
                self.errors.clear(field.key());
            }
            _ => {}
        }
        None
    }
}

pub fn render_signup<B: Backend>(f: &mut Frame<B>, state: &mut SignupState) {
    let area = centered_rect(60, 50, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)].as_ref())
        .split(area);

    let items: Vec<ListItem> = SignupField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = match field {
                SignupField::Name => state.name.clone(),
                SignupField::Email => state.email.clone(),
                SignupField::Password => "*".repeat(state.password.chars().count()),
            };
            let selected = i == state.current;
            let mut lines = vec![Spans::from(vec![
                Span::styled(
                    format!("{:<10}", format!("{}:", field.label())),
                    if selected { Style::default().fg(Color::Yellow) } else { Style::default() },
                ),
                Span::styled(
                    format!("{}{}", value, if selected { "|" } else { "" }),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ])];
            if let Some(error) = state.errors.get(field.key()) {
                lines.push(Spans::from(Span::styled(format!("          {}", error), Style::default().fg(Color::Red))));
            }
            ListItem::new(lines)
        })
        .collect();

    // Render form
    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Create Admin Account"));
    f.render_widget(form, chunks[0]);

    let help = Paragraph::new("Enter - Next / Submit | Up/Down - Move | Esc - Cancel")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[1]);
}

pub fn handle_input(state: &mut SignupState) -> Result<Option<SignupAction>> {
    match next_key()? {
        Some(key) => Ok(state.handle_key(key)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn type_text(state: &mut SignupState, text: &str) {
        for c in text.chars() {
            state.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn enter(state: &mut SignupState) -> Option<SignupAction> {
        state.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[test]
    fn complete_form_submits_trimmed_values() {
        let mut s = SignupState::new();
        type_text(&mut s, " Priya ");
        enter(&mut s);
        type_text(&mut s, "priya@example.com");
        enter(&mut s);
        type_text(&mut s, "secret123");
        match enter(&mut s) {
            Some(SignupAction::Submit { name, email, password }) => {
                assert_eq!(name, "Priya");
                assert_eq!(email, "priya@example.com");
                assert_eq!(password, "secret123");
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn invalid_email_moves_focus_back() {
        let mut s = SignupState::new();
        type_text(&mut s, "Priya");
        enter(&mut s);
        type_text(&mut s, "not-an-email");
        enter(&mut s);
        type_text(&mut s, "secret123");
        assert!(enter(&mut s).is_none());
        assert_eq!(s.current_field(), SignupField::Email);
        assert!(s.errors.get("email").is_some());
    }
}
