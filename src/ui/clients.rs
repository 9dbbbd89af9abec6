use anyhow::Result;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::Client;
use crate::ui::components::popup::render_confirm;
use crate::ui::next_key;
use crate::validation::format_phone;

// Represents the state of the client table screen
pub struct ClientsState {
    clients: Vec<Client>,
    visible: Vec<usize>,
    query: String,
    searching: bool,
    table_state: TableState,
    show_delete_confirmation: bool,
}

impl ClientsState {
    pub fn new(clients: Vec<Client>) -> Self {
        let mut state = Self {
            clients,
            visible: Vec::new(),
            query: String::new(),
            searching: false,
            table_state: TableState::default(),
            show_delete_confirmation: false,
        };
        state.refilter();
        state
    }

    /// Swap in a fresh list, keeping the search and, where possible, the selection.
    pub fn replace_clients(&mut self, clients: Vec<Client>) {
        let selected_id = self.selected_client().and_then(|c| c.id.clone());
        self.clients = clients;
        self.refilter();
        if let Some(id) = selected_id {
            if let Some(pos) = self.visible.iter().position(|&i| self.clients[i].id.as_deref() == Some(&id)) {
                self.table_state.select(Some(pos));
            }
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible_clients(&self) -> impl Iterator<Item = &Client> {
        self.visible.iter().map(|&i| &self.clients[i])
    }

    fn refilter(&mut self) {
        let query = self.query.trim().to_lowercase();
        self.visible = self
            .clients
            .iter()
            .enumerate()
            .filter(|(_, c)| matches_query(c, &query))
            .map(|(i, _)| i)
            .collect();
        let selected = match self.table_state.selected() {
            _ if self.visible.is_empty() => None,
            Some(i) => Some(i.min(self.visible.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    pub fn push_search(&mut self, c: char) {
        self.query.push(c);
        self.refilter();
    }

    pub fn pop_search(&mut self) {
        self.query.pop();
        self.refilter();
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.table_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .map(|&i| &self.clients[i])
    }

    pub fn selected_client_id(&self) -> Option<String> {
        self.selected_client().and_then(|c| c.id.clone())
    }
}

/// Case-insensitive match on name, contact, email or nationality. `query` must be lowercase.
fn matches_query(client: &Client, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    [
        client.display_name().as_str(),
        client.contact.as_str(),
        client.email.as_str(),
        client.nationality.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(query))
}

pub enum ClientAction {
    Quit,
    Refresh,
    NewClient,
    Signup,
    ViewClient(String),
    EditClient(String),
    DeleteClient(String),
    Report(String),
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    // Search bar
    let search_style = if state.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let search = Paragraph::new(Spans::from(vec![
        Span::styled("Search: ", search_style),
        Span::raw(format!("{}{}", state.query(), if state.searching { "|" } else { "" })),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(search, chunks[0]);

    // Client table
    let header = Row::new(["Name", "Contact", "Email", "Age", "Nationality", "Docs"].map(|h| {
        Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
    }));
    let rows: Vec<Row> = state
        .visible_clients()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.display_name()),
                Cell::from(format_phone(&c.contact)),
                Cell::from(c.email.clone()),
                Cell::from(c.age.map(|a| a.to_string()).unwrap_or_default()),
                Cell::from(c.nationality.clone()),
                Cell::from(c.documents.len().to_string()),
            ])
        })
        .collect();

    let title = format!("Clients ({} of {})", state.visible.len(), state.clients.len());
    let widths = [
        Constraint::Percentage(25),
        Constraint::Percentage(15),
        Constraint::Percentage(25),
        Constraint::Percentage(7),
        Constraint::Percentage(18),
        Constraint::Percentage(10),
    ];
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .widths(&widths)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    // Render buttons
    let buttons_text = if state.searching {
        "Type to filter | <Enter>/<Esc> Done"
    } else if state.selected_client().is_some() {
        "</> Search | <N> New | <Enter> View | <E> Edit | <D> Delete | <P> PDF report | <R> Refresh | <S> Sign up | <Q> Quit"
    } else {
        "</> Search | <N> New | <R> Refresh | <S> Sign up | <Q> Quit"
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    if state.show_delete_confirmation {
        render_confirm(
            frame,
            "Confirm Delete",
            &["Are you sure you want to delete this client?", "Their photo and documents go too."],
        );
    }
}

pub fn handle_input(state: &mut ClientsState) -> Result<Option<ClientAction>> {
    let Some(key) = next_key()? else {
        return Ok(None);
    };

    // Keys go to the search box while it is focused
    if state.searching {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => state.searching = false,
            KeyCode::Backspace => state.pop_search(),
            KeyCode::Char(c) => state.push_search(c),
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            _ => {}
        }
        return Ok(None);
    }

    // Handle delete confirmation
    if state.show_delete_confirmation {
        match key.code {
            KeyCode::Char('y') => {
                state.toggle_delete_confirmation();
                if let Some(id) = state.selected_client_id() {
                    return Ok(Some(ClientAction::DeleteClient(id)));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.toggle_delete_confirmation(),
            _ => {}
        }
        return Ok(None);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(ClientAction::Quit)),
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Char('n') => return Ok(Some(ClientAction::NewClient)),
        KeyCode::Char('r') => return Ok(Some(ClientAction::Refresh)),
        KeyCode::Char('s') => return Ok(Some(ClientAction::Signup)),
        KeyCode::Char('e') => {
            if let Some(id) = state.selected_client_id() {
                return Ok(Some(ClientAction::EditClient(id)));
            }
        }
        KeyCode::Char('p') => {
            if let Some(id) = state.selected_client_id() {
                return Ok(Some(ClientAction::Report(id)));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_client().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Enter => {
            if let Some(id) = state.selected_client_id() {
                return Ok(Some(ClientAction::ViewClient(id)));
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str, name: &str, contact: &str) -> Client {
        Client {
            id: Some(id.into()),
            client_name: name.into(),
            contact: contact.into(),
            ..Client::default()
        }
    }

    fn state() -> ClientsState {
        ClientsState::new(vec![
            client("1", "Asha", "9876543210"),
            client("2", "Ravi", "9123456780"),
            client("3", "Meera", "8000000001"),
        ])
    }

    #[test]
    fn search_filters_by_name_or_contact() {
        let mut s = state();
        for c in "RAV".chars() {
            s.push_search(c);
        }
        let names: Vec<String> = s.visible_clients().map(|c| c.client_name.clone()).collect();
        assert_eq!(names, vec!["Ravi"]);

        s.pop_search();
        s.pop_search();
        s.pop_search();
        s.push_search('8');
        s.push_search('0');
        s.push_search('0');
        assert_eq!(s.selected_client_id().as_deref(), Some("3"));
    }

    #[test]
    fn selection_wraps_around() {
        let mut s = state();
        s.previous();
        assert_eq!(s.selected_client_id().as_deref(), Some("3"));
        s.next();
        assert_eq!(s.selected_client_id().as_deref(), Some("1"));
    }

    #[test]
    fn no_match_clears_the_selection() {
        let mut s = state();
        s.push_search('z');
        assert!(s.selected_client().is_none());
        assert_eq!(s.query(), "z");
    }

    #[test]
    fn refresh_keeps_the_selected_client() {
        let mut s = state();
        s.next();
        s.replace_clients(vec![client("9", "Zoya", ""), client("2", "Ravi", "9123456780")]);
        assert_eq!(s.selected_client_id().as_deref(), Some("2"));
    }
}
