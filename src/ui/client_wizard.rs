use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::capture::{CaptureInput, CaptureState, CapturedImage, FrameSource};
use crate::models::{ClientField, DocumentType, GENDERS, MARITAL_STATUSES};
use crate::session::{ClientUpload, DocumentSlot, EditSession, PhotoState};
use crate::ui::components::capture_panel::{describe, render_capture_panel};
use crate::ui::components::date_input::DateInputState;
use crate::ui::next_key;
use crate::validation::format_phone;

pub enum ClientWizardAction {
    Cancel,
    Save(ClientUpload),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WizardStep {
    Details,
    Photo,
    Documents,
}

impl WizardStep {
    const ALL: [WizardStep; 3] = [WizardStep::Details, WizardStep::Photo, WizardStep::Documents];

    fn title(&self) -> &'static str {
        match self {
            WizardStep::Details => "Details",
            WizardStep::Photo => "Photo",
            WizardStep::Documents => "Documents",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

pub struct ClientWizardState {
    session: EditSession,
    step: WizardStep,
    current_field: usize,
    current_document: usize,
    editing: bool,
    dob_input: DateInputState,
    capture: CaptureInput,
    upload_path: Option<String>,
    message: Option<String>,
    today: NaiveDate,
}

impl ClientWizardState {
    pub fn new(session: EditSession, source: Box<dyn FrameSource>, today: NaiveDate) -> Self {
        let dob_base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(today);
        Self {
            dob_input: DateInputState::new(session.client().dob, dob_base),
            session,
            step: WizardStep::Details,
            current_field: 0,
            current_document: 0,
            editing: false,
            capture: CaptureInput::new("photo", source),
            upload_path: None,
            message: None,
            today,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Fields shown in the form; spouse details only appear for married clients.
    pub fn form_fields(&self) -> Vec<ClientField> {
        ClientField::ALL
            .into_iter()
            .filter(|f| f.applies_to(self.session.client()))
            .collect()
    }

    fn selected_field(&self) -> ClientField {
        let fields = self.form_fields();
        fields[self.current_field.min(fields.len() - 1)]
    }

    fn selected_document(&self) -> DocumentType {
        DocumentType::ALL[self.current_document.min(DocumentType::ALL.len() - 1)]
    }

    /// Name the camera gives its stills on the current step.
    fn capture_name(&self) -> &'static str {
        match self.step {
            WizardStep::Documents => self.selected_document().key(),
            _ => "photo",
        }
    }

    fn go_to(&mut self, step: WizardStep) {
        if self.step != step {
            self.step = step;
            self.upload_path = None;
            self.capture.reset(self.capture_name());
        }
    }

    fn next_step(&mut self) {
        let next = WizardStep::ALL[(self.step.index() + 1) % WizardStep::ALL.len()];
        self.go_to(next);
    }

    fn previous_step(&mut self) {
        let len = WizardStep::ALL.len();
        let previous = WizardStep::ALL[(self.step.index() + len - 1) % len];
        self.go_to(previous);
    }

    fn set_field(&mut self, field: ClientField, value: &str) {
        self.session.set_field(field, value, self.today);
        let len = self.form_fields().len();
        self.current_field = self.current_field.min(len - 1);
    }

    /// Left/Right on a fixed-choice field.
    fn cycle_choice(&mut self, field: ClientField, forward: bool) {
        let options: &[&str] = match field {
            ClientField::Gender => &GENDERS,
            ClientField::MaritalStatus => &MARITAL_STATUSES,
            _ => return,
        };
        let current = field.value(self.session.client());
        let next = match options.iter().position(|o| *o == current) {
            Some(i) if forward => (i + 1) % options.len(),
            Some(i) => (i + options.len() - 1) % options.len(),
            None if forward => 0,
            None => options.len() - 1,
        };
        self.set_field(field, options[next]);
    }

    fn edit_text(&mut self, field: ClientField, key: KeyCode) {
        let mut value = field.value(self.session.client());
        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => return,
        }
        self.set_field(field, &value);
    }

    fn accept_capture(&mut self, image: CapturedImage) {
        match self.step {
            WizardStep::Documents => {
                let ty = self.selected_document();
                self.session.capture_document(ty, image);
                self.message = Some(format!("{} captured", ty.label()));
            }
            _ => {
                self.session.capture_photo(image);
                self.message = Some("Photo captured".to_string());
            }
        }
        self.capture.reset(self.capture_name());
    }

    fn load_upload(&mut self, path: &str) {
        let key = match self.step {
            WizardStep::Documents => self.selected_document().key(),
            _ => "photo",
        };
        match CapturedImage::from_file(Path::new(path.trim())) {
            Ok(image) => {
                self.upload_path = None;
                self.accept_capture(image);
            }
            Err(e) => {
                self.session.flag(key, e.to_string());
                self.message = Some(e.to_string());
            }
        }
    }

    fn save(&mut self) -> Option<ClientWizardAction> {
        match self.session.build_upload(self.today) {
            Ok(upload) => {
                self.message = None;
                Some(ClientWizardAction::Save(upload))
            }
            Err(errors) => {
                // Jump to the first problem
                let first = errors.first().unwrap_or("some fields are invalid").to_string();
                self.message = Some(format!("Please fix: {}", first));
                if errors.len() == 1 && errors.get("photo").is_some() {
                    self.go_to(WizardStep::Photo);
                } else {
                    self.go_to(WizardStep::Details);
                    let fields = self.form_fields();
                    if let Some(pos) = fields.iter().position(|f| errors.get(f.key()).is_some()) {
                        self.current_field = pos;
                    }
                }
                None
            }
        }
    }

    /// Camera and upload keys shared by the photo and documents steps. Returns true when consumed.
    fn handle_capture_key(&mut self, key: KeyCode) -> bool {
        // Typing a file path
        if let Some(path) = self.upload_path.as_mut() {
            match key {
                KeyCode::Char(c) => path.push(c),
                KeyCode::Backspace => {
                    path.pop();
                }
                KeyCode::Esc => self.upload_path = None,
                KeyCode::Enter => {
                    let path = path.clone();
                    self.load_upload(&path);
                }
                _ => {}
            }
            return true;
        }

        match (self.capture.state().clone(), key) {
            (CaptureState::Idle, KeyCode::Char('c')) => self.capture.start(),
            (CaptureState::Idle, KeyCode::Char('u')) => self.upload_path = Some(String::new()),
            (CaptureState::Live { .. }, KeyCode::Char(' ')) => match self.capture.capture() {
                Ok(_) => self.message = None,
                Err(e) => self.message = Some(e.to_string()),
            },
            (CaptureState::Live { .. }, KeyCode::Char('f')) => self.capture.switch_camera(),
            (CaptureState::Live { .. }, KeyCode::Esc) => self.capture.stop(),
            (CaptureState::Captured { .. }, KeyCode::Char('r')) => self.capture.retake(),
            (CaptureState::Captured { image }, KeyCode::Enter) => self.accept_capture(image),
            (CaptureState::Live { .. } | CaptureState::Captured { .. }, _) => {}
            _ => return false,
        }
        true
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ClientWizardAction> {
        // Ctrl-S saves from anywhere
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return self.save();
        }

        // Inline field editing
        if self.editing {
            let field = self.selected_field();
            match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    if field == ClientField::Dob {
                        self.dob_input.toggle_editing();
                    }
                    self.editing = false;
                }
                code if field == ClientField::Dob => {
                    if self.dob_input.handle_input(code) {
                        self.session.set_dob(self.dob_input.date, self.today);
                    }
                }
                code => self.edit_text(field, code),
            }
            return None;
        }

        // Camera and upload keys take precedence on the image steps
        if self.step != WizardStep::Details && self.handle_capture_key(key.code) {
            return None;
        }

        match key.code {
            KeyCode::Esc => return Some(ClientWizardAction::Cancel),
            KeyCode::Tab => self.next_step(),
            KeyCode::BackTab => self.previous_step(),
            KeyCode::Char('s') => return self.save(),
            KeyCode::Up => match self.step {
                WizardStep::Details => self.current_field = self.current_field.saturating_sub(1),
                WizardStep::Documents => {
                    self.current_document = self.current_document.saturating_sub(1);
                    self.capture.reset(self.capture_name());
                }
                WizardStep::Photo => {}
            },
            KeyCode::Down => match self.step {
                WizardStep::Details => {
                    self.current_field = (self.current_field + 1).min(self.form_fields().len() - 1)
                }
                WizardStep::Documents => {
                    self.current_document = (self.current_document + 1).min(DocumentType::ALL.len() - 1);
                    self.capture.reset(self.capture_name());
                }
                WizardStep::Photo => {}
            },
            KeyCode::Left | KeyCode::Right if self.step == WizardStep::Details => {
                self.cycle_choice(self.selected_field(), key.code == KeyCode::Right);
            }
            KeyCode::Enter if self.step == WizardStep::Details => {
                let field = self.selected_field();
                match field {
                    ClientField::Gender | ClientField::MaritalStatus => self.cycle_choice(field, true),
                    ClientField::Age if self.session.client().dob.is_some() => {
                        self.message = Some("Age follows the date of birth".to_string());
                    }
                    ClientField::Dob => {
                        self.dob_input.toggle_editing();
                        self.editing = true;
                    }
                    _ => self.editing = true,
                }
            }
            KeyCode::Char('x') => match self.step {
                WizardStep::Photo => self.session.discard_photo(),
                WizardStep::Documents => self.session.remove_document(self.selected_document()),
                WizardStep::Details => {}
            },
            _ => {}
        }
        None
    }
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.session.is_new() {
        "New Client".to_string()
    } else {
        format!("Editing {}", state.session.client().display_name())
    };
    let titles: Vec<Spans> = WizardStep::ALL.iter().map(|s| Spans::from(s.title())).collect();
    let tabs = Tabs::new(titles)
        .select(state.step.index())
        .block(Block::default().borders(Borders::ALL).title(title_text))
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    match state.step {
        WizardStep::Details => render_form(f, state, chunks[1]),
        WizardStep::Photo => render_photo(f, state, chunks[1]),
        WizardStep::Documents => render_documents(f, state, chunks[1]),
    }

    let help_text = if state.editing {
        "Type to edit | Enter/Esc - Done"
    } else {
        match state.step {
            WizardStep::Details => "Enter - Edit | Left/Right - Choose | Up/Down - Move | Tab - Next step | S - Save | Esc - Cancel",
            WizardStep::Photo => "X - Discard new photo | Tab - Next step | S - Save | Esc - Cancel",
            WizardStep::Documents => "Up/Down - Document | X - Remove | Tab - Next step | S - Save | Esc - Cancel",
        }
    };
    let mut help = vec![Spans::from(help_text)];
    if let Some(message) = &state.message {
        help.push(Spans::from(Span::styled(message.clone(), Style::default().fg(Color::Red))));
    }
    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState, area: Rect) {
    let client = state.session.client();
    let errors = state.session.errors();
    let fields = state.form_fields();

    let items: Vec<ListItem> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = i == state.current_field;
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value = match field {
                ClientField::Dob => state.dob_input.get_display_string(),
                ClientField::Gender | ClientField::MaritalStatus => format!("< {} >", field.value(client)),
                _ if field.is_phone() => format_phone(&field.value(client)),
                _ => field.value(client),
            };
            let cursor = if selected && state.editing && *field != ClientField::Dob { "|" } else { "" };
            let mut spans = vec![
                Span::styled(format!("{:<18}", format!("{}:", field.label())), label_style),
                Span::styled(
                    format!("{}{}", value, cursor),
                    if selected && state.editing {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                ),
            ];
            if *field == ClientField::Age && client.dob.is_some() {
                spans.push(Span::styled("  (from date of birth)", Style::default().fg(Color::DarkGray)));
            }
            if let Some(error) = errors.get(field.key()) {
                spans.push(Span::styled(format!("  {}", error), Style::default().fg(Color::Red)));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.current_field.min(fields.len().saturating_sub(1))));
    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Client Details"))
        .highlight_symbol("> ");
    f.render_stateful_widget(form_list, area, &mut list_state);
}

fn render_photo<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState, area: Rect) {
    let current = match state.session.photo() {
        PhotoState::None => None,
        PhotoState::Existing(url) => Some(format!("stored ({})", url)),
        PhotoState::Captured(image) => Some(format!("new, {}", describe(image))),
    };
    let mut lines = vec![Spans::from("The client photo is required.")];
    if let Some(error) = state.session.errors().get("photo") {
        lines.push(Spans::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))));
    }

    let columns = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)].as_ref())
        .split(area);
    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Photo"));
    f.render_widget(info, columns[0]);
    render_capture_panel(
        f,
        columns[1],
        "Camera",
        &state.capture,
        current.as_deref(),
        state.upload_path.as_deref(),
    );
}

fn render_documents<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(area);

    let items: Vec<ListItem> = DocumentType::ALL
        .iter()
        .map(|ty| {
            let (status, color) = match state.session.document(*ty) {
                Some(DocumentSlot::Stored(_)) => ("on file", Color::Green),
                Some(DocumentSlot::Pending(_)) => ("new", Color::Yellow),
                None => ("—", Color::DarkGray),
            };
            let mut spans = vec![
                Span::raw(format!("{:<26}", ty.label())),
                Span::styled(status, Style::default().fg(color)),
            ];
            if let Some(error) = state.session.errors().get(ty.key()) {
                spans.push(Span::styled(format!("  {}", error), Style::default().fg(Color::Red)));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.current_document));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Documents"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, columns[0], &mut list_state);

    let selected = state.selected_document();
    let current = match state.session.document(selected) {
        Some(DocumentSlot::Stored(url)) => Some(format!("stored ({})", url)),
        Some(DocumentSlot::Pending(image)) => Some(format!("new, {}", describe(image))),
        None => None,
    };
    render_capture_panel(
        f,
        columns[1],
        selected.label(),
        &state.capture,
        current.as_deref(),
        state.upload_path.as_deref(),
    );
}

pub fn handle_input(state: &mut ClientWizardState) -> Result<Option<ClientWizardAction>> {
    match next_key()? {
        Some(key) => Ok(state.handle_key(key)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureError, FacingMode};
    use crate::models::Client;

    struct FakeCamera;

    impl FrameSource for FakeCamera {
        fn snapshot(&mut self, _facing: FacingMode) -> Result<Vec<u8>, CaptureError> {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn wizard(session: EditSession) -> ClientWizardState {
        ClientWizardState::new(session, Box::new(FakeCamera), today())
    }

    fn press(state: &mut ClientWizardState, code: KeyCode) -> Option<ClientWizardAction> {
        state.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn select(state: &mut ClientWizardState, field: ClientField) {
        state.current_field = state.form_fields().iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn phone_typing_keeps_digits_only() {
        let mut w = wizard(EditSession::new_client());
        select(&mut w, ClientField::Contact);
        press(&mut w, KeyCode::Enter);
        for c in "98a7-6".chars() {
            press(&mut w, KeyCode::Char(c));
        }
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.session().client().contact, "9876");
        assert_eq!(w.session().errors().get("contact"), Some("Must be 10 digits"));
    }

    #[test]
    fn spouse_fields_follow_marital_status() {
        let mut w = wizard(EditSession::new_client());
        assert!(!w.form_fields().contains(&ClientField::SpouseName));
        select(&mut w, ClientField::MaritalStatus);
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.session().client().marital_status, "Married");
        assert!(w.form_fields().contains(&ClientField::SpouseName));
    }

    #[test]
    fn date_of_birth_drives_age() {
        let mut w = wizard(EditSession::new_client());
        select(&mut w, ClientField::Dob);
        press(&mut w, KeyCode::Enter);
        for c in "20000615".chars() {
            press(&mut w, KeyCode::Char(c));
        }
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.session().client().dob, NaiveDate::from_ymd_opt(2000, 6, 15));
        assert_eq!(w.session().client().age, Some(24));
    }

    #[test]
    fn camera_capture_becomes_the_photo() {
        let mut w = wizard(EditSession::new_client());
        press(&mut w, KeyCode::Tab);
        assert_eq!(w.step(), WizardStep::Photo);
        press(&mut w, KeyCode::Char('c'));
        press(&mut w, KeyCode::Char(' '));
        press(&mut w, KeyCode::Enter);
        assert!(matches!(w.session().photo(), PhotoState::Captured(img) if img.file_name == "photo.jpg"));
    }

    #[test]
    fn document_capture_targets_the_selected_type() {
        let mut w = wizard(EditSession::new_client());
        press(&mut w, KeyCode::BackTab);
        assert_eq!(w.step(), WizardStep::Documents);
        press(&mut w, KeyCode::Down);
        press(&mut w, KeyCode::Down);
        press(&mut w, KeyCode::Char('c'));
        press(&mut w, KeyCode::Char(' '));
        press(&mut w, KeyCode::Enter);
        match w.session().document(DocumentType::PanFront) {
            Some(DocumentSlot::Pending(img)) => assert_eq!(img.file_name, "panFront.jpg"),
            other => panic!("expected a pending capture, got {:?}", other),
        }
        press(&mut w, KeyCode::Char('x'));
        assert_eq!(w.session().document(DocumentType::PanFront), None);
    }

    #[test]
    fn escape_stops_the_camera_before_cancelling() {
        let mut w = wizard(EditSession::new_client());
        press(&mut w, KeyCode::Tab);
        press(&mut w, KeyCode::Char('c'));
        assert!(press(&mut w, KeyCode::Esc).is_none());
        assert!(matches!(press(&mut w, KeyCode::Esc), Some(ClientWizardAction::Cancel)));
    }

    #[test]
    fn invalid_save_points_at_the_first_problem() {
        let mut w = wizard(EditSession::edit(&Client {
            id: Some("c1".into()),
            client_name: "Asha".into(),
            ..Client::default()
        }));
        press(&mut w, KeyCode::Tab);
        assert!(press(&mut w, KeyCode::Char('s')).is_none());
        assert_eq!(w.step(), WizardStep::Details);
        assert_eq!(w.message(), Some("Please fix: Please select gender"));
        assert_eq!(w.selected_field(), ClientField::Gender);
    }

    #[test]
    fn bad_upload_is_a_photo_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut w = wizard(EditSession::new_client());
        press(&mut w, KeyCode::Tab);
        press(&mut w, KeyCode::Char('u'));
        for c in path.to_string_lossy().chars() {
            press(&mut w, KeyCode::Char(c));
        }
        press(&mut w, KeyCode::Enter);
        assert!(w.session().errors().get("photo").is_some());
        assert_eq!(w.session().photo(), &PhotoState::None);
    }
}
