use anyhow::Result;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::models::{Client, DocumentType, FieldSection};
use crate::ui::components::popup::render_confirm;
use crate::ui::next_key;
use crate::validation::format_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Personal,
    Family,
    Documents,
}

impl DetailTab {
    const ALL: [DetailTab; 3] = [DetailTab::Personal, DetailTab::Family, DetailTab::Documents];

    fn title(&self) -> &'static str {
        match self {
            DetailTab::Personal => "Personal",
            DetailTab::Family => "Family",
            DetailTab::Documents => "Documents",
        }
    }

    fn sections(&self) -> &'static [FieldSection] {
        match self {
            DetailTab::Personal => &[FieldSection::Personal, FieldSection::Contact, FieldSection::GovernmentIds],
            DetailTab::Family => &[FieldSection::Family],
            DetailTab::Documents => &[],
        }
    }
}

pub struct ClientDetailState {
    client: Client,
    tab: DetailTab,
    scroll: u16,
    show_delete_confirmation: bool,
}

pub enum ClientDetailAction {
    Back,
    Edit(Client),
    Delete(String),
    Report(Client),
}

impl ClientDetailState {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            tab: DetailTab::Personal,
            scroll: 0,
            show_delete_confirmation: false,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn next_tab(&mut self) {
        let i = DetailTab::ALL.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.tab = DetailTab::ALL[(i + 1) % DetailTab::ALL.len()];
        self.scroll = 0;
    }

    pub fn previous_tab(&mut self) {
        let i = DetailTab::ALL.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.tab = DetailTab::ALL[(i + DetailTab::ALL.len() - 1) % DetailTab::ALL.len()];
        self.scroll = 0;
    }

    /// Lines shown on the current tab.
    pub fn tab_lines(&self) -> Vec<(String, String)> {
        if self.tab == DetailTab::Documents {
            let mut lines = vec![(
                "Photo".to_string(),
                if self.client.photo.as_deref().is_some_and(|p| !p.is_empty()) { "On file" } else { "Missing" }
                    .to_string(),
            )];
            lines.extend(DocumentType::ALL.iter().map(|ty| {
                let on_file = self
                    .client
                    .documents
                    .iter()
                    .any(|d| d.document_type == *ty && d.image_url.as_deref().is_some_and(|u| !u.is_empty()));
                (ty.label().to_string(), if on_file { "On file" } else { "—" }.to_string())
            }));
            return lines;
        }

        let mut lines = Vec::new();
        for section in self.tab.sections() {
            lines.push((format!("# {}", section.title()), String::new()));
            for field in section.fields().filter(|f| f.applies_to(&self.client)) {
                let value = field.value(&self.client);
                let value = if field.is_phone() { format_phone(&value) } else { value };
                lines.push((field.label().to_string(), value));
            }
        }
        lines
    }
}

pub fn render_client_detail<B: Backend>(f: &mut Frame<B>, state: &mut ClientDetailState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)].as_ref())
        .split(f.size());

    let created = state.client.created_at.as_deref().and_then(|s| s.get(..10)).unwrap_or("unknown");
    let title = Paragraph::new(Spans::from(vec![
        Span::styled(state.client.display_name(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(format!("   registered {}", created), Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    // Tabs
    let titles: Vec<Spans> = DetailTab::ALL.iter().map(|t| Spans::from(t.title())).collect();
    let selected = DetailTab::ALL.iter().position(|t| *t == state.tab()).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[1]);

    let lines: Vec<Spans> = state
        .tab_lines()
        .into_iter()
        .map(|(label, value)| {
            if let Some(heading) = label.strip_prefix("# ") {
                Spans::from(Span::styled(
                    heading.to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else {
                let value = if value.is_empty() { "Not provided".to_string() } else { value };
                Spans::from(vec![
                    Span::styled(format!("{:<24}", label), Style::default().fg(Color::Gray)),
                    Span::raw(value),
                ])
            }
        })
        .collect();
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(body, chunks[2]);

    let help = Paragraph::new("<Tab> Next tab | <Up/Down> Scroll | <E> Edit | <D> Delete | <P> PDF report | <Esc> Back")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);

    if state.show_delete_confirmation {
        let prompt = format!("Delete {}?", state.client.display_name());
        render_confirm(f, "Confirm Delete", &[prompt.as_str(), "This cannot be undone."]);
    }
}

pub fn handle_input(state: &mut ClientDetailState) -> Result<Option<ClientDetailAction>> {
    let Some(key) = next_key()? else {
        return Ok(None);
    };

    // Handle delete confirmation
    if state.show_delete_confirmation {
        match key.code {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(id) = state.client.id.clone() {
                    return Ok(Some(ClientDetailAction::Delete(id)));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return Ok(None);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Ok(Some(ClientDetailAction::Back)),
        KeyCode::Tab | KeyCode::Right => state.next_tab(),
        KeyCode::BackTab | KeyCode::Left => state.previous_tab(),
        KeyCode::Down => state.scroll = state.scroll.saturating_add(1),
        KeyCode::Up => state.scroll = state.scroll.saturating_sub(1),
        KeyCode::Char('e') => return Ok(Some(ClientDetailAction::Edit(state.client.clone()))),
        KeyCode::Char('p') => return Ok(Some(ClientDetailAction::Report(state.client.clone()))),
        KeyCode::Char('d') => state.show_delete_confirmation = true,
        _ => {}
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn client() -> Client {
        Client {
            id: Some("c1".into()),
            client_name: "Asha".into(),
            contact: "9876543210".into(),
            spouse_name: "Ravi".into(),
            documents: vec![Document {
                document_type: DocumentType::PanFront,
                image_url: Some("https://cdn/pan.jpg".into()),
            }],
            ..Client::default()
        }
    }

    #[test]
    fn tabs_cycle_both_ways() {
        let mut s = ClientDetailState::new(client());
        s.previous_tab();
        assert_eq!(s.tab(), DetailTab::Documents);
        s.next_tab();
        assert_eq!(s.tab(), DetailTab::Personal);
    }

    #[test]
    fn personal_tab_formats_phones() {
        let s = ClientDetailState::new(client());
        assert!(s.tab_lines().contains(&("Contact".to_string(), "987-654-3210".to_string())));
    }

    #[test]
    fn family_tab_hides_spouse_unless_married() {
        let mut s = ClientDetailState::new(client());
        s.next_tab();
        assert!(!s.tab_lines().iter().any(|(label, _)| label == "Spouse Name"));

        let mut married = client();
        married.marital_status = "Married".into();
        let mut s = ClientDetailState::new(married);
        s.next_tab();
        assert!(s.tab_lines().contains(&("Spouse Name".to_string(), "Ravi".to_string())));
    }

    #[test]
    fn documents_tab_marks_what_is_on_file() {
        let mut s = ClientDetailState::new(client());
        s.previous_tab();
        let lines = s.tab_lines();
        assert!(lines.contains(&("Photo".to_string(), "Missing".to_string())));
        assert!(lines.contains(&("PAN Card (Front)".to_string(), "On file".to_string())));
        assert!(lines.contains(&("PAN Card (Back)".to_string(), "—".to_string())));
    }
}
